use rand::seq::SliceRandom;

use crate::session::sample_id;

/// Session-randomized presentation order for the formal block (Fisher-Yates).
/// Distinct from the canonical S1..Sn order, which is only used for export.
pub fn presentation_order(sample_count: usize) -> Vec<String> {
    let mut ids: Vec<String> = (1..=sample_count).map(sample_id).collect();
    ids.shuffle(&mut rand::thread_rng());
    ids
}
