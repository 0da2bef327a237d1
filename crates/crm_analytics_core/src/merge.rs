//! Stage merge policy for deal insights.
//!
//! A deal insight submission either becomes a new row (first time its stage is
//! seen) or is folded into the existing row for that stage: counts add, totals
//! add when both are present, and an absent incoming total leaves the stored
//! total alone. Stage matching is exact string equality.
//!
//! The functions here are pure. Stores call [`plan`] while holding whatever
//! lock or transaction makes the lookup and the write atomic.

use rust_decimal::Decimal;

use crate::error::CrmError;
use crate::types::{DealInsight, DealInsightDraft};

/// What the store must write for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePlan {
    /// No row for this stage yet: insert the candidate as-is.
    Insert(DealInsightDraft),
    /// Replace the existing row (same id) with the merged values.
    Replace(DealInsight),
}

/// Combine two optional totals. Overflow is a caller error.
pub fn merge_totals(
    existing: Option<Decimal>,
    incoming: Option<Decimal>,
) -> Result<Option<Decimal>, CrmError> {
    match (existing, incoming) {
        (current, None) => Ok(current),
        (None, Some(added)) => Ok(Some(added)),
        (Some(current), Some(added)) => current
            .checked_add(added)
            .map(Some)
            .ok_or_else(|| {
                CrmError::InvalidInput(format!("total value overflow ({current} + {added})"))
            }),
    }
}

/// Fold `candidate` into `existing`. The candidate's stage and id are not
/// consulted; only `count` and `total_value` change.
pub fn merge_into(
    existing: &DealInsight,
    candidate: &DealInsightDraft,
) -> Result<DealInsight, CrmError> {
    let count = existing.count.checked_add(candidate.count).ok_or_else(|| {
        CrmError::InvalidInput(format!(
            "count overflow merging stage '{}' ({} + {})",
            existing.stage, existing.count, candidate.count
        ))
    })?;
    let total_value = merge_totals(existing.total_value, candidate.total_value)?;
    Ok(DealInsight {
        id: existing.id,
        stage: existing.stage.clone(),
        count,
        total_value,
    })
}

/// Decide how to persist `candidate` given the row currently stored for its
/// stage, if any.
pub fn plan(
    existing: Option<&DealInsight>,
    mut candidate: DealInsightDraft,
) -> Result<MergePlan, CrmError> {
    match existing {
        Some(found) => {
            debug_assert_eq!(found.stage, candidate.stage);
            merge_into(found, &candidate).map(MergePlan::Replace)
        }
        None => {
            candidate.id = None;
            Ok(MergePlan::Insert(candidate))
        }
    }
}
