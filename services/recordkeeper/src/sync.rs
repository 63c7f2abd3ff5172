//! Report/officer association synchronization.
//!
//! # Purpose
//! Reconciles a report's associated officers to a caller-supplied set by
//! computing the minimal delta and applying it inside an open
//! [`StoreTransaction`]. This is the only code path that writes association
//! rows.
//!
//! # Key invariants
//! - Officers present in both the current and desired sets are never touched.
//! - Empty halves of the delta issue no store call.
//! - Nothing here commits; the caller's transaction decides whether the delta
//!   and any scalar update become visible together.
use crate::observability;
use crate::store::{StoreResult, StoreTransaction};
use roster_common::ids::{OfficerId, ReportId};
use std::collections::BTreeSet;

/// Additions and removals that turn one association set into another.
///
/// ```rust
/// use recordkeeper::sync::AssociationDelta;
/// use roster_common::ids::OfficerId;
/// use std::collections::BTreeSet;
///
/// let (a, b) = (OfficerId::new(), OfficerId::new());
/// let delta = AssociationDelta::between(&BTreeSet::from([a]), &BTreeSet::from([b]));
/// assert!(delta.to_remove.contains(&a));
/// assert!(delta.to_add.contains(&b));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationDelta {
    pub to_remove: BTreeSet<OfficerId>,
    pub to_add: BTreeSet<OfficerId>,
}

impl AssociationDelta {
    pub fn between(current: &BTreeSet<OfficerId>, desired: &BTreeSet<OfficerId>) -> Self {
        Self {
            to_remove: current.difference(desired).copied().collect(),
            to_add: desired.difference(current).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Apply `delta` to the report's associations within `tx`.
pub async fn synchronize(
    tx: &mut dyn StoreTransaction,
    report_id: ReportId,
    delta: &AssociationDelta,
) -> StoreResult<()> {
    if !delta.to_remove.is_empty() {
        tx.delete_report_officers(report_id, &delta.to_remove).await?;
        metrics::counter!(observability::ASSOCIATION_CHANGES, "op" => "removed")
            .increment(delta.to_remove.len() as u64);
    }
    if !delta.to_add.is_empty() {
        tx.insert_report_officers(report_id, &delta.to_add).await?;
        metrics::counter!(observability::ASSOCIATION_CHANGES, "op" => "added")
            .increment(delta.to_add.len() as u64);
    }
    tracing::debug!(
        report_id = %report_id,
        removed = delta.to_remove.len(),
        added = delta.to_add.len(),
        "report associations synchronized"
    );
    Ok(())
}

/// Load the current associations, diff them against `desired`, and apply.
pub async fn reconcile(
    tx: &mut dyn StoreTransaction,
    report_id: ReportId,
    desired: &BTreeSet<OfficerId>,
) -> StoreResult<AssociationDelta> {
    let current = tx.report_officers(report_id).await?;
    let delta = AssociationDelta::between(&current, desired);
    synchronize(tx, report_id, &delta).await?;
    Ok(delta)
}
