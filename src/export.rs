use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io;

use crate::config::Config;
use crate::session::{sample_id, SessionRecord, TrialRecord};

/// Byte-order mark prepended so spreadsheet tools pick up non-ASCII text.
const BOM: &str = "\u{feff}";

/// Flatten collected records into a fixed-column CSV table.
///
/// `start_date`/`end_date` are inclusive "YYYY-MM-DD" bounds on each record's
/// start time (the end bound covers the whole day). An absent or unparsable
/// bound filters nothing on that side. Cells containing a comma, quote or
/// newline are quoted with internal quotes doubled; everything else is
/// written bare. The result carries no trailing newline.
pub fn export_csv(
    records: &[SessionRecord],
    config: &Config,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> io::Result<String> {
    let start = start_date.and_then(parse_start_bound);
    let end = end_date.and_then(parse_end_bound);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(build_headers(config))?;
    for record in records.iter().filter(|r| in_range(r, start, end)) {
        writer.write_record(build_row(record, config))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let mut body = String::from_utf8(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if body.ends_with('\n') {
        body.pop();
    }
    Ok(format!("{}{}", BOM, body))
}

/// Same table offered under an .xlsx filename; spreadsheet tools open the
/// CSV text directly, no real workbook format is produced.
pub fn export_excel(
    records: &[SessionRecord],
    config: &Config,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> io::Result<String> {
    export_csv(records, config, start_date, end_date)
}

/// Leading identity columns, one block per sample in canonical order, then
/// the summary columns. Total width: 3 + sample_count * (2 + traits) + 5.
fn build_headers(config: &Config) -> Vec<String> {
    let mut headers = vec![
        "participant_id".to_string(),
        "gender".to_string(),
        "age".to_string(),
    ];
    for i in 1..=config.sample_count {
        headers.push(format!("sample_{}_id", i));
        for trait_name in &config.default_traits {
            headers.push(format!("{} (score)", trait_name));
        }
        headers.push(format!("sample_{}_duration_secs", i));
    }
    headers.push("total_duration_mins".to_string());
    headers.push("attention_check_1".to_string());
    headers.push("attention_check_2".to_string());
    headers.push("validity".to_string());
    headers.push("invalid_reason".to_string());
    headers
}

fn build_row(record: &SessionRecord, config: &Config) -> Vec<String> {
    let mut row = vec![
        record.participant_id.clone(),
        record.gender.clone(),
        record.age.clone(),
    ];

    // Index trials by sample id; a duplicate sample overwrites (last write
    // wins). Export order is canonical S1..Sn, not presentation order.
    let mut by_sample: HashMap<&str, &TrialRecord> = HashMap::new();
    for trial in &record.trials {
        by_sample.insert(trial.sample_id.as_str(), trial);
    }

    for i in 1..=config.sample_count {
        let id = sample_id(i);
        match by_sample.get(id.as_str()) {
            Some(trial) => {
                row.push(id.clone());
                for slot in 0..config.default_traits.len() {
                    let cell = trial
                        .ratings
                        .get(slot)
                        .copied()
                        .flatten()
                        .map(|r| r.to_string())
                        .unwrap_or_default();
                    row.push(cell);
                }
                row.push(trial.duration.unwrap_or(0).to_string());
            }
            None => {
                // Sample never completed: whole block blank, id cell included
                for _ in 0..config.default_traits.len() + 2 {
                    row.push(String::new());
                }
            }
        }
    }

    row.push(record.total_duration.to_string());
    row.push(
        record
            .attention_check_1
            .map(|v| v.to_string())
            .unwrap_or_default(),
    );
    row.push(
        record
            .attention_check_2
            .map(|v| v.to_string())
            .unwrap_or_default(),
    );
    row.push(if record.is_valid { "valid" } else { "invalid" }.to_string());
    row.push(record.invalid_reason.clone());
    row
}

fn parse_start_bound(s: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_end_bound(s: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(23, 59, 59))
}

/// A record with an unparsable start time passes any active filter.
fn in_range(
    record: &SessionRecord,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> bool {
    let ts = match DateTime::parse_from_rfc3339(&record.start_time) {
        Ok(t) => t.naive_utc(),
        Err(_) => return true,
    };
    if let Some(s) = start {
        if ts < s {
            return false;
        }
    }
    if let Some(e) = end {
        if ts > e {
            return false;
        }
    }
    true
}
