use chrono::DateTime;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Canonical id for the sample at 1-based `index`: "S1", "S2", ...
pub fn sample_id(index: usize) -> String {
    format!("S{}", index)
}

/// One sample's rating event: a set of Likert scores for one image stimulus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub sample_id: String,
    /// One slot per configured trait item, 1-7; `None` while unanswered.
    #[serde(default)]
    pub ratings: Vec<Option<u8>>,
    /// Answering time for this trial, in seconds.
    #[serde(default)]
    pub duration: Option<u64>,
}

/// One participant's full submission. Field names serialize in camelCase so
/// records produced by the web client deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub participant_id: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: String,
    /// Chosen option index for attention check 1, if answered.
    #[serde(default)]
    pub attention_check_1: Option<u32>,
    #[serde(default)]
    pub attention_check_2: Option<u32>,
    #[serde(default)]
    pub open_question_1: Option<String>,
    #[serde(default)]
    pub open_question_2: Option<String>,
    /// Formal trials in presentation order; practice trials are never stored.
    #[serde(default)]
    pub trials: Vec<TrialRecord>,
    /// Whole-session duration in rounded minutes, derived at submission time.
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub invalid_reason: String,
}

impl SessionRecord {
    /// Milliseconds between start and end, or `None` when either timestamp
    /// fails to parse as RFC 3339.
    pub fn elapsed_millis(&self) -> Option<i64> {
        let start = DateTime::parse_from_rfc3339(&self.start_time).ok()?;
        let end = DateTime::parse_from_rfc3339(&self.end_time).ok()?;
        Some(end.signed_duration_since(start).num_milliseconds())
    }

    /// Rounded minutes between start and end, clamped at zero.
    pub fn derive_total_duration(&self) -> Option<u64> {
        let ms = self.elapsed_millis()?;
        Some((ms as f64 / 60_000.0).round().max(0.0) as u64)
    }
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque participant id: "P" + unix millis + "_" + 9 random base36 chars.
pub fn generate_participant_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("P{}_{}", millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_sample_id_format() {
        assert_eq!(sample_id(1), "S1");
        assert_eq!(sample_id(12), "S12");
    }

    #[test]
    fn test_participant_id_shape() {
        let id = generate_participant_id();
        assert!(id.starts_with('P'));
        let (_, suffix) = id.split_once('_').unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_participant_ids_are_unique() {
        let a = generate_participant_id();
        let b = generate_participant_id();
        assert_ne!(a, b);
    }

    fn record_with_times(start: &str, end: &str) -> SessionRecord {
        SessionRecord {
            participant_id: "P1_abcdefghi".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            age: String::new(),
            gender: String::new(),
            attention_check_1: None,
            attention_check_2: None,
            open_question_1: None,
            open_question_2: None,
            trials: vec![],
            total_duration: 0,
            is_valid: false,
            invalid_reason: String::new(),
        }
    }

    #[test]
    fn test_derive_total_duration_rounds() {
        let r = record_with_times("2024-05-01T10:00:00+00:00", "2024-05-01T10:12:29+00:00");
        assert_matches!(r.derive_total_duration(), Some(12));

        let r = record_with_times("2024-05-01T10:00:00+00:00", "2024-05-01T10:12:30+00:00");
        assert_matches!(r.derive_total_duration(), Some(13));
    }

    #[test]
    fn test_derive_total_duration_respects_offsets() {
        // Same instant expressed in two zones is a zero-length session
        let r = record_with_times("2024-05-01T10:00:00+08:00", "2024-05-01T02:00:00+00:00");
        assert_matches!(r.derive_total_duration(), Some(0));
    }

    #[test]
    fn test_derive_total_duration_unparsable() {
        let r = record_with_times("not a timestamp", "2024-05-01T10:12:00+00:00");
        assert_matches!(r.derive_total_duration(), None);
        assert_matches!(r.elapsed_millis(), None);
    }

    #[test]
    fn test_deserializes_web_client_json() {
        let json = r#"{
            "participantId": "P1714500000000_k3j9x2m1q",
            "startTime": "2024-05-01T10:00:00+08:00",
            "endTime": "2024-05-01T10:12:00+08:00",
            "age": "23",
            "gender": "female",
            "attentionCheck1": 6,
            "attentionCheck2": null,
            "trials": [
                {"sampleId": "S3", "ratings": [1, null, 7], "duration": 42}
            ],
            "totalDuration": 12,
            "isValid": true,
            "invalidReason": ""
        }"#;
        let record: SessionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.participant_id, "P1714500000000_k3j9x2m1q");
        assert_eq!(record.attention_check_1, Some(6));
        assert_eq!(record.attention_check_2, None);
        assert_eq!(record.trials.len(), 1);
        assert_eq!(record.trials[0].sample_id, "S3");
        assert_eq!(record.trials[0].ratings, vec![Some(1), None, Some(7)]);
        assert_eq!(record.trials[0].duration, Some(42));
        assert!(record.is_valid);
    }

    #[test]
    fn test_serde_roundtrip_uses_camel_case() {
        let r = record_with_times("2024-05-01T10:00:00+00:00", "2024-05-01T10:12:00+00:00");
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"participantId\""));
        assert!(json.contains("\"startTime\""));
        assert!(json.contains("\"isValid\""));
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
