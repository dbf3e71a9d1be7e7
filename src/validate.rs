use crate::config::Config;
use crate::session::SessionRecord;

/// Outcome of validating one submission. `invalid_reason` holds the failed
/// rule messages joined with "; ", in rule-evaluation order; empty when valid.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub is_valid: bool,
    pub invalid_reason: String,
}

/// Evaluate one completed session against the configured policy. Rules are
/// independent; a record can fail several and each reason is appended once.
/// Pure and deterministic, no I/O.
pub fn validate(record: &SessionRecord, config: &Config) -> Verdict {
    let policy = &config.validation;
    let mut reasons: Vec<String> = Vec::new();

    // Rule 1: whole-session duration. Unparsable timestamps never trip this
    // rule (the web client always writes both before submitting).
    if let Some(elapsed_ms) = record.elapsed_millis() {
        if elapsed_ms < policy.min_duration as i64 * 60_000 {
            reasons.push(format!(
                "completion time under {} minutes",
                policy.min_duration
            ));
        }
    }

    // Rule 2: straight-lining. Count consecutive trials whose ratings are all
    // present and identical; any other trial resets the run.
    let mut run = 0usize;
    let mut flagged = false;
    for trial in &record.trials {
        if is_flat(&trial.ratings) {
            run += 1;
        } else {
            run = 0;
        }
        if run >= policy.max_consecutive_same_score && !flagged {
            flagged = true;
            reasons.push(format!(
                "{} or more consecutive trials with identical ratings",
                policy.max_consecutive_same_score
            ));
        }
    }

    // Rule 3: attention checks. Only a present, mismatched answer fails; a
    // skipped answer is deliberately lenient.
    if policy.require_attention_check {
        let answers = [record.attention_check_1, record.attention_check_2];
        for (i, check) in config.attention_checks.iter().take(2).enumerate() {
            if let (Some(correct), Some(answer)) = (check.correct, answers[i]) {
                if answer as usize != correct {
                    reasons.push(format!("failed attention check {}", i + 1));
                }
            }
        }
    }

    Verdict {
        is_valid: reasons.is_empty(),
        invalid_reason: reasons.join("; "),
    }
}

/// A trial is flat iff it has at least one rating and every slot is answered
/// with the same score.
fn is_flat(ratings: &[Option<u8>]) -> bool {
    match ratings.first() {
        Some(&Some(first)) => ratings.iter().all(|r| *r == Some(first)),
        _ => false,
    }
}
