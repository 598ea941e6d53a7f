//! PostgREST (Supabase) store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use traineval_core::model::{
    CompletedTask, FinalJustification, Justification, MasterTask, NewCompletedTask,
    NewParticipantScore, Participant, ParticipantScore, Training,
};
use traineval_core::{RecordStore, StoreError};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const REST_PATH: &str = "/rest/v1";

/// A [`RecordStore`] backed by PostgREST tables.
pub struct RestStore {
    base_url: String,
    api_key: String,
    timeout_secs: u64,
    upsert_scores: bool,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
            upsert_scores: false,
            client,
        })
    }

    /// Insert score rows as an upsert that ignores rows already present.
    ///
    /// Needs a unique constraint on `(participant_id, training_id)`.
    pub fn with_upsert_scores(mut self, enabled: bool) -> Self {
        self.upsert_scores = enabled;
        self
    }

    fn request(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<RequestBuilder, StoreError> {
        let mut url = Url::parse(&format!("{}{REST_PATH}/{table}", self.base_url))
            .map_err(|e| StoreError::Network(format!("invalid base URL {}: {e}", self.base_url)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout_secs)
            } else {
                StoreError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<PostgrestError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(StoreError::Api { status, message });
        }
        Ok(response)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let mut params = vec![("select", "*".to_string())];
        params.extend_from_slice(query);
        let request = self.request(Method::GET, table, &params)?;
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("{table}: {e}")))
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        id: Uuid,
    ) -> Result<Option<T>, StoreError> {
        let rows = self
            .select(table, &[("id", eq(id)), ("limit", "1".into())])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
        prefer: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let request = self
            .request(Method::POST, table, query)?
            .header("Prefer", prefer)
            .json(body);
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("{table}: {e}")))
    }
}

#[derive(Deserialize)]
struct PostgrestError {
    message: String,
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn in_list(values: &[Uuid]) -> String {
    let joined: Vec<String> = values.iter().map(Uuid::to_string).collect();
    format!("in.({})", joined.join(","))
}

#[async_trait]
impl RecordStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    #[instrument(skip(self))]
    async fn trainings(&self) -> Result<Vec<Training>, StoreError> {
        self.select("trainings", &[("order", "created_at.desc".into())])
            .await
    }

    #[instrument(skip(self))]
    async fn training(&self, id: Uuid) -> Result<Option<Training>, StoreError> {
        self.select_one("trainings", id).await
    }

    #[instrument(skip(self))]
    async fn participants_by_training(
        &self,
        training_id: Uuid,
    ) -> Result<Vec<Participant>, StoreError> {
        self.select(
            "participants",
            &[
                ("training_id", eq(training_id)),
                ("order", "created_at.asc".into()),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        self.select_one("participants", id).await
    }

    #[instrument(skip(self))]
    async fn master_tasks(&self) -> Result<Vec<MasterTask>, StoreError> {
        self.select("master_tasks", &[("order", "day_number.asc".into())])
            .await
    }

    #[instrument(skip(self, participant_ids), fields(count = participant_ids.len()))]
    async fn completed_tasks_for(
        &self,
        participant_ids: &[Uuid],
    ) -> Result<Vec<CompletedTask>, StoreError> {
        if participant_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select(
            "completed_tasks",
            &[("participant_id", in_list(participant_ids))],
        )
        .await
    }

    #[instrument(skip(self, record), fields(participant = %record.participant_id))]
    async fn insert_completed_task(
        &self,
        record: NewCompletedTask,
    ) -> Result<CompletedTask, StoreError> {
        let rows: Vec<CompletedTask> = self
            .insert("completed_tasks", &record, "return=representation", &[])
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".into()))
    }

    #[instrument(skip(self))]
    async fn delete_completed_task(&self, id: Uuid) -> Result<(), StoreError> {
        let request = self.request(Method::DELETE, "completed_tasks", &[("id", eq(id))])?;
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn justifications(&self) -> Result<Vec<Justification>, StoreError> {
        self.select("justifications", &[("order", "min_tasks.asc,id.asc".into())])
            .await
    }

    #[instrument(skip(self))]
    async fn final_justifications(&self) -> Result<Vec<FinalJustification>, StoreError> {
        self.select(
            "final_justifications",
            &[("order", "min_score.asc,id.asc".into())],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn participant_scores(
        &self,
        training_id: Uuid,
    ) -> Result<Vec<ParticipantScore>, StoreError> {
        self.select("participant_scores", &[("training_id", eq(training_id))])
            .await
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn insert_participant_scores(
        &self,
        rows: Vec<NewParticipantScore>,
    ) -> Result<Vec<ParticipantScore>, StoreError> {
        if self.upsert_scores {
            self.insert(
                "participant_scores",
                &rows,
                "return=representation,resolution=ignore-duplicates",
                &[("on_conflict", "participant_id,training_id".into())],
            )
            .await
        } else {
            self.insert("participant_scores", &rows, "return=representation", &[])
                .await
        }
    }
}
