//! Candidate selection from bin snapshots.
//!
//! A bin is collected when it is flagged for pickup or its latest fill level
//! reached the threshold. Bins that crossed the threshold without being
//! flagged produce a [`PickupNotice`] the caller can act on (mark the bin,
//! notify the owner); nothing is broadcast from here.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::model::{CandidatePoint, Coordinate};
use crate::traits::Id;

/// Fill percentage at which a bin is collected by default.
pub const DEFAULT_FILL_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinStatus {
    Normal,
    NeedsPickup,
    OutOfService,
}

/// Current state of a bin as reported by the bin store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSnapshot<I> {
    pub id: I,
    pub label: String,
    pub location: Coordinate,
    pub fill_pct: f64,
    pub status: BinStatus,
}

/// A bin that crossed the fill threshold while still marked normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupNotice<I> {
    pub bin_id: I,
    pub fill_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection<I> {
    pub candidates: Vec<CandidatePoint<I>>,
    pub notices: Vec<PickupNotice<I>>,
}

/// Picks the bins to visit, preserving input order.
pub fn select_candidates<I: Id>(bins: &[BinSnapshot<I>], threshold: f64) -> Result<Selection<I>, PlanError> {
    if !(0.0..=100.0).contains(&threshold) {
        return Err(PlanError::InvalidThreshold(threshold));
    }

    let mut candidates = Vec::new();
    let mut notices = Vec::new();

    for bin in bins {
        let over_threshold = bin.fill_pct >= threshold;
        let selected = match bin.status {
            BinStatus::NeedsPickup => true,
            BinStatus::Normal => {
                if over_threshold {
                    notices.push(PickupNotice {
                        bin_id: bin.id.clone(),
                        fill_pct: bin.fill_pct,
                    });
                }
                over_threshold
            }
            BinStatus::OutOfService => false,
        };

        if selected {
            candidates.push(CandidatePoint::new(bin.id.clone(), bin.label.clone(), bin.location));
        }
    }

    tracing::debug!(
        bins = bins.len(),
        selected = candidates.len(),
        notices = notices.len(),
        threshold,
        "selected pickup candidates"
    );
    Ok(Selection { candidates, notices })
}
