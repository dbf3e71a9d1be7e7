use crate::session::SessionRecord;

/// Dashboard-level counts over the whole collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Mean of the per-record total durations, rounded to whole minutes.
    pub avg_duration_mins: u64,
}

impl CollectionStats {
    pub fn from_records(records: &[SessionRecord]) -> Self {
        let total = records.len();
        let valid = records.iter().filter(|r| r.is_valid).count();
        let duration_sum: u64 = records.iter().map(|r| r.total_duration).sum();
        let avg_duration_mins = if total > 0 {
            (duration_sum as f64 / total as f64).round() as u64
        } else {
            0
        };
        Self {
            total,
            valid,
            invalid: total - valid,
            avg_duration_mins,
        }
    }
}

/// Most recent submissions first, capped at `limit` (the preview slice).
pub fn recent(records: &[SessionRecord], limit: usize) -> Vec<&SessionRecord> {
    records.iter().rev().take(limit).collect()
}
