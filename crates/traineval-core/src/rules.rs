//! Range-rule lookups: task counts to scores, final grades to descriptions.
//!
//! Both tables share one policy. When a table's intervals are pairwise
//! disjoint they are sorted by lower bound and searched with a binary search.
//! When they overlap, the table keeps the rules in the order it received
//! them and returns the first match, so the result is arbitrary but stable
//! for a given input order. Rules whose lower bound exceeds the upper bound
//! can never match and are dropped.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{FinalJustification, Justification, Role};

/// Description returned when no final-grade rule matches.
pub const UNCLASSIFIED: &str = "N/A";

/// A rule with an inclusive `[min, max]` range.
trait Ranged {
    type Key: Copy + PartialOrd;

    fn min(&self) -> Self::Key;
    fn max(&self) -> Self::Key;

    fn contains(&self, key: Self::Key) -> bool {
        self.min() <= key && key <= self.max()
    }

    fn is_inverted(&self) -> bool {
        self.min() > self.max()
    }
}

impl Ranged for Justification {
    type Key = u32;

    fn min(&self) -> u32 {
        self.min_tasks
    }
    fn max(&self) -> u32 {
        self.max_tasks
    }
}

impl Ranged for FinalJustification {
    type Key = f64;

    fn min(&self) -> f64 {
        self.min_score
    }
    fn max(&self) -> f64 {
        self.max_score
    }
}

fn by_min<R: Ranged>(a: &R, b: &R) -> Ordering {
    a.min().partial_cmp(&b.min()).unwrap_or(Ordering::Equal)
}

/// Interval list with the disjoint/overlapping lookup policy.
#[derive(Debug, Clone)]
struct IntervalList<R> {
    rules: Vec<R>,
    sorted: bool,
}

impl<R: Ranged + Clone> IntervalList<R> {
    fn new(rules: Vec<R>) -> Self {
        let rules: Vec<R> = rules.into_iter().filter(|r| !r.is_inverted()).collect();

        let mut ordered = rules.clone();
        ordered.sort_by(by_min);
        let disjoint = ordered.windows(2).all(|w| w[0].max() < w[1].min());

        if disjoint {
            Self {
                rules: ordered,
                sorted: true,
            }
        } else {
            Self {
                rules,
                sorted: false,
            }
        }
    }

    fn find(&self, key: R::Key) -> Option<&R> {
        if self.sorted {
            let idx = self.rules.partition_point(|r| r.min() <= key);
            idx.checked_sub(1)
                .map(|i| &self.rules[i])
                .filter(|r| r.contains(key))
        } else {
            self.rules.iter().find(|r| r.contains(key))
        }
    }
}

/// Per-role lookup from a task count to a converted score.
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    by_role: HashMap<Role, IntervalList<Justification>>,
}

impl ConversionTable {
    pub fn new(rules: &[Justification]) -> Self {
        let mut grouped: HashMap<Role, Vec<Justification>> = HashMap::new();
        for rule in rules {
            grouped.entry(rule.role).or_default().push(rule.clone());
        }

        let by_role = grouped
            .into_iter()
            .map(|(role, rules)| (role, IntervalList::new(rules)))
            .collect();

        Self { by_role }
    }

    /// The rule covering `count` for `role`, if any.
    pub fn rule_for(&self, role: Role, count: u32) -> Option<&Justification> {
        self.by_role.get(&role).and_then(|list| list.find(count))
    }

    /// Converted score for `count`; 0 when no rule covers it.
    pub fn score(&self, role: Role, count: u32) -> f64 {
        self.rule_for(role, count).map(|r| r.score).unwrap_or(0.0)
    }

    /// Whether `role`'s rules are disjoint and looked up by binary search.
    pub fn is_disjoint(&self, role: Role) -> bool {
        self.by_role.get(&role).map(|l| l.sorted).unwrap_or(true)
    }
}

/// Lookup from a rounded final grade to its description.
#[derive(Debug, Clone)]
pub struct GradeTable {
    rules: IntervalList<FinalJustification>,
}

impl GradeTable {
    pub fn new(rules: &[FinalJustification]) -> Self {
        Self {
            rules: IntervalList::new(rules.to_vec()),
        }
    }

    pub fn rule_for(&self, grade: i64) -> Option<&FinalJustification> {
        self.rules.find(grade as f64)
    }

    /// Description for `grade`; [`UNCLASSIFIED`] when no rule covers it.
    pub fn describe(&self, grade: i64) -> String {
        self.rule_for(grade)
            .map(|r| r.description.clone())
            .unwrap_or_else(|| UNCLASSIFIED.to_string())
    }

    pub fn is_disjoint(&self) -> bool {
        self.rules.sorted
    }
}

impl Default for GradeTable {
    fn default() -> Self {
        Self::new(&[])
    }
}

// ---------------------------------------------------------------------------
// Rule-set validation
// ---------------------------------------------------------------------------

/// A data-quality problem found in a rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleWarning {
    /// Role the warning applies to; `None` for final-grade rules.
    pub role: Option<Role>,
    pub message: String,
}

/// Check conversion rules for inverted ranges, overlaps, and gaps.
pub fn validate_conversion_rules(rules: &[Justification]) -> Vec<RuleWarning> {
    let mut warnings = Vec::new();

    for role in Role::ALL {
        let mut role_rules: Vec<&Justification> = rules.iter().filter(|r| r.role == role).collect();
        if role_rules.is_empty() {
            warnings.push(RuleWarning {
                role: Some(role),
                message: "no conversion rules; every count scores 0".into(),
            });
            continue;
        }

        for rule in role_rules.iter().filter(|r| r.is_inverted()) {
            warnings.push(RuleWarning {
                role: Some(role),
                message: format!(
                    "inverted range {}..={} never matches",
                    rule.min_tasks, rule.max_tasks
                ),
            });
        }

        role_rules.retain(|r| !r.is_inverted());
        role_rules.sort_by_key(|r| r.min_tasks);

        if let Some(first) = role_rules.first() {
            if first.min_tasks > 0 {
                warnings.push(RuleWarning {
                    role: Some(role),
                    message: format!("counts 0..={} are not covered", first.min_tasks - 1),
                });
            }
        }

        for pair in role_rules.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.min_tasks <= prev.max_tasks {
                warnings.push(RuleWarning {
                    role: Some(role),
                    message: format!(
                        "ranges {}..={} and {}..={} overlap; first match wins",
                        prev.min_tasks, prev.max_tasks, next.min_tasks, next.max_tasks
                    ),
                });
            } else if next.min_tasks > prev.max_tasks + 1 {
                warnings.push(RuleWarning {
                    role: Some(role),
                    message: format!(
                        "counts {}..={} are not covered",
                        prev.max_tasks + 1,
                        next.min_tasks - 1
                    ),
                });
            }
        }
    }

    warnings
}

/// Check final-grade rules for inverted ranges, overlaps, and integer gaps.
pub fn validate_grade_rules(rules: &[FinalJustification]) -> Vec<RuleWarning> {
    let mut warnings = Vec::new();

    if rules.is_empty() {
        warnings.push(RuleWarning {
            role: None,
            message: format!("no grade rules; every grade is described as {UNCLASSIFIED}"),
        });
        return warnings;
    }

    for rule in rules.iter().filter(|r| r.is_inverted()) {
        warnings.push(RuleWarning {
            role: None,
            message: format!(
                "inverted range {}..={} never matches",
                rule.min_score, rule.max_score
            ),
        });
    }

    let mut ordered: Vec<&FinalJustification> = rules.iter().filter(|r| !r.is_inverted()).collect();
    ordered.sort_by(|a, b| by_min(*a, *b));

    for pair in ordered.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next.min_score <= prev.max_score {
            warnings.push(RuleWarning {
                role: None,
                message: format!(
                    "grade ranges {}..={} and {}..={} overlap; first match wins",
                    prev.min_score, prev.max_score, next.min_score, next.max_score
                ),
            });
        } else if next.min_score > prev.max_score + 1.0 {
            warnings.push(RuleWarning {
                role: None,
                message: format!(
                    "grades between {} and {} are not covered",
                    prev.max_score, next.min_score
                ),
            });
        }
    }

    warnings
}

/// Display order for conversion rules: by role, then lower bound.
pub fn sorted_conversion_rules(rules: &[Justification]) -> Vec<Justification> {
    let mut sorted = rules.to_vec();
    sorted.sort_by(|a, b| {
        a.role
            .label()
            .cmp(b.role.label())
            .then(a.min_tasks.cmp(&b.min_tasks))
    });
    sorted
}

/// Display order for grade rules: by lower bound.
pub fn sorted_grade_rules(rules: &[FinalJustification]) -> Vec<FinalJustification> {
    let mut sorted = rules.to_vec();
    sorted.sort_by(by_min);
    sorted
}
