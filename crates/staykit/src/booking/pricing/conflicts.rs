use serde::Serialize;

use super::adjustment::{AdjustmentKind, AdjustmentPolicy, PolicyStatus};
use crate::booking::domain::{PolicyId, UnitId};

/// What two adjustment policies collide on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    DateOverlap,
    SharedItems,
    PromotionalOverlap,
}

impl ConflictKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DateOverlap => "date_overlap",
            Self::SharedItems => "shared_items",
            Self::PromotionalOverlap => "promotional_overlap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    High,
    Medium,
    Low,
}

/// One advisory finding against a sibling policy.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyConflict {
    pub kind: ConflictKind,
    pub severity: ConflictSeverity,
    pub other_policy: PolicyId,
    pub other_name: String,
    pub description: String,
}

/// Compare one policy against its active and draft siblings. Advisory only:
/// the report never blocks the caller. Linear in the number of siblings;
/// each sibling arrives paired with its current unit assignments.
pub fn detect_conflicts(
    policy: &AdjustmentPolicy,
    policy_units: &[UnitId],
    siblings: &[(AdjustmentPolicy, Vec<UnitId>)],
) -> Vec<PolicyConflict> {
    let season_months = policy.kind.season_months();
    let mut conflicts = Vec::new();

    for (sibling, sibling_units) in siblings {
        if sibling.id == policy.id {
            continue;
        }
        if !matches!(sibling.status, PolicyStatus::Active | PolicyStatus::Draft) {
            continue;
        }

        if !season_months.is_empty() {
            let sibling_months = sibling.kind.season_months();
            let shared: Vec<String> = season_months
                .intersection(&sibling_months)
                .map(|month| month.to_string())
                .collect();
            if !shared.is_empty() {
                conflicts.push(PolicyConflict {
                    kind: ConflictKind::DateOverlap,
                    severity: ConflictSeverity::High,
                    other_policy: sibling.id.clone(),
                    other_name: sibling.name.clone(),
                    description: format!(
                        "season months {} are also claimed by {}",
                        shared.join(", "),
                        sibling.name
                    ),
                });
            }
        }

        let shared_units = policy_units
            .iter()
            .filter(|unit| sibling_units.contains(unit))
            .count();
        if shared_units > 0 {
            conflicts.push(PolicyConflict {
                kind: ConflictKind::SharedItems,
                severity: ConflictSeverity::Medium,
                other_policy: sibling.id.clone(),
                other_name: sibling.name.clone(),
                description: format!(
                    "{shared_units} unit(s) are assigned to both this policy and {}",
                    sibling.name
                ),
            });
        }

        if matches!(policy.kind, AdjustmentKind::Promotional { .. })
            && matches!(sibling.kind, AdjustmentKind::Promotional { .. })
        {
            if let (Some(ours), Some(theirs)) = (policy.effective, sibling.effective) {
                if ours.intersects(&theirs) {
                    conflicts.push(PolicyConflict {
                        kind: ConflictKind::PromotionalOverlap,
                        severity: ConflictSeverity::Low,
                        other_policy: sibling.id.clone(),
                        other_name: sibling.name.clone(),
                        description: format!(
                            "promotional window {} to {} intersects {} to {}",
                            ours.from, ours.to, theirs.from, theirs.to
                        ),
                    });
                }
            }
        }
    }

    conflicts
}
