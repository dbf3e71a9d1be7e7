use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use time_humanize::{Accuracy, HumanTime, Tense};

use skala::config::{Config, ConfigStore, FileConfigStore};
use skala::export::{export_csv, export_excel};
use skala::sampling::presentation_order;
use skala::session::{generate_participant_id, SessionRecord};
use skala::store::{RecordStore, SessionDb};
use skala::summary::{recent, CollectionStats};
use skala::validate::validate;

/// admin cli for likert-scale image rating experiments
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Collects participant session records from the web client, judges their validity, and exports the collection as a fixed-column CSV table."
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate and store a submitted session record (JSON file from the web client)
    Ingest {
        /// path to the submitted record
        file: PathBuf,
    },
    /// export collected records as a BOM-prefixed table
    Export {
        #[clap(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// earliest submission date to include (YYYY-MM-DD, inclusive)
        #[clap(long)]
        start_date: Option<String>,
        /// latest submission date to include (YYYY-MM-DD, inclusive)
        #[clap(long)]
        end_date: Option<String>,
        /// output path; defaults to experiment_data_<today>.<ext>
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// print collection statistics
    Summary,
    /// preview the ten most recent submissions
    Recent,
    /// print a randomized presentation order for a new session
    Order,
    /// delete every stored record
    Clear {
        /// confirm deletion
        #[clap(long)]
        yes: bool,
    },
    /// print the active experiment configuration
    ShowConfig,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            // Same CSV text under the spreadsheet extension
            ExportFormat::Excel => "xlsx",
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = FileConfigStore::new().load();

    match cli.command {
        Command::Ingest { file } => ingest(&file, &config)?,
        Command::Export {
            format,
            start_date,
            end_date,
            output,
        } => export(&config, format, start_date, end_date, output)?,
        Command::Summary => summary()?,
        Command::Recent => recent_preview()?,
        Command::Order => {
            for id in presentation_order(config.sample_count) {
                println!("{}", id);
            }
        }
        Command::Clear { yes } => clear(yes)?,
        Command::ShowConfig => show_config(&config)?,
    }

    Ok(())
}

fn ingest(file: &PathBuf, config: &Config) -> Result<(), Box<dyn Error>> {
    let bytes = fs::read(file)?;
    let mut record: SessionRecord = serde_json::from_slice(&bytes)?;

    if record.participant_id.is_empty() {
        record.participant_id = generate_participant_id();
    }
    if let Some(minutes) = record.derive_total_duration() {
        record.total_duration = minutes;
    }

    let verdict = validate(&record, config);
    record.is_valid = verdict.is_valid;
    record.invalid_reason = verdict.invalid_reason;

    let mut db = SessionDb::new()?;
    db.append(&record)?;

    if record.is_valid {
        println!("stored {} (valid)", record.participant_id);
    } else {
        println!(
            "stored {} (invalid: {})",
            record.participant_id, record.invalid_reason
        );
    }
    Ok(())
}

fn export(
    config: &Config,
    format: ExportFormat,
    start_date: Option<String>,
    end_date: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let db = SessionDb::new()?;
    let records = db.load_all()?;

    let text = match format {
        ExportFormat::Csv => export_csv(
            &records,
            config,
            start_date.as_deref(),
            end_date.as_deref(),
        )?,
        ExportFormat::Excel => export_excel(
            &records,
            config,
            start_date.as_deref(),
            end_date.as_deref(),
        )?,
    };

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "experiment_data_{}.{}",
            Local::now().format("%Y-%m-%d"),
            format.extension()
        ))
    });
    fs::write(&path, text)?;
    println!("exported {} to {}", format, path.display());
    Ok(())
}

fn summary() -> Result<(), Box<dyn Error>> {
    let db = SessionDb::new()?;
    let records = db.load_all()?;
    let stats = CollectionStats::from_records(&records);

    println!("participants:     {}", stats.total);
    println!("valid:            {}", stats.valid);
    println!("invalid:          {}", stats.invalid);
    println!("avg duration:     {} min", stats.avg_duration_mins);
    Ok(())
}

fn recent_preview() -> Result<(), Box<dyn Error>> {
    let db = SessionDb::new()?;
    let records = db.load_all()?;

    if records.is_empty() {
        println!("no data collected yet");
        return Ok(());
    }

    for record in recent(&records, 10) {
        let validity = if record.is_valid { "valid" } else { "invalid" };
        println!(
            "{}  {}  age {}  {}  {} min  {} trial(s)  {}",
            record.participant_id,
            submitted_ago(&record.start_time),
            record.age,
            record.gender,
            record.total_duration,
            record.trials.len(),
            validity,
        );
    }
    Ok(())
}

fn submitted_ago(start_time: &str) -> String {
    match DateTime::parse_from_rfc3339(start_time) {
        Ok(ts) => {
            let secs = Utc::now().signed_duration_since(ts).num_seconds().max(0) as u64;
            HumanTime::from(std::time::Duration::from_secs(secs))
                .to_text_en(Accuracy::Rough, Tense::Past)
        }
        Err(_) => start_time.to_string(),
    }
}

fn clear(yes: bool) -> Result<(), Box<dyn Error>> {
    if !yes {
        eprintln!("refusing to delete all records; pass --yes to confirm");
        return Ok(());
    }
    let mut db = SessionDb::new()?;
    db.clear()?;
    println!("all records deleted");
    Ok(())
}

fn show_config(config: &Config) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
