//! drug-intake: record medication intakes and report daily totals,
//! overdose warnings and interaction advisories.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drug_intake_core::export::SafetySnapshot;
use drug_intake_core::{Database, Tracker, TrackerConfig};
use drug_intake_ingest::console;
use drug_intake_ingest::logbook::{LogEntry, Logbook, DEFAULT_LOG_FILE, LOG_TIME_FORMAT};
use drug_intake_ingest::sample::{SampleConfig, SampleGenerator};

#[derive(Parser)]
#[command(name = "drug-intake")]
#[command(about = "Medication intake tracking with overdose and interaction checks")]
struct Cli {
    /// Tracker configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a sample history and print the full analysis
    Demo {
        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Days of history
        #[arg(long, default_value = "30")]
        days: u32,

        /// Number of patient reports to print
        #[arg(long, default_value = "2")]
        reports: usize,

        /// Save events and reference table to a SQLite database
        #[arg(long)]
        save: Option<PathBuf>,

        /// Write a JSON snapshot of all derived results
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Write chart-ready usage series as JSON
        #[arg(long)]
        series: Option<PathBuf>,
    },

    /// Append an intake to the CSV log
    Log {
        /// Drug name, e.g. Aspirin
        drug: String,

        /// Dosage with unit, e.g. "500 mg"
        dosage: String,

        /// Free-text notes
        #[arg(short, long, default_value = "")]
        notes: String,

        /// Patient ID (default patient when omitted)
        #[arg(short, long)]
        patient: Option<String>,

        /// Intake time as "YYYY-MM-DD HH:MM:SS" (now when omitted)
        #[arg(long)]
        time: Option<String>,

        /// Log file
        #[arg(short, long, default_value = DEFAULT_LOG_FILE)]
        file: PathBuf,
    },

    /// Show the CSV log
    History {
        /// Log file
        #[arg(short, long, default_value = DEFAULT_LOG_FILE)]
        file: PathBuf,
    },

    /// Import the CSV log and print warnings and patient reports
    Report {
        /// Log file
        #[arg(short, long, default_value = DEFAULT_LOG_FILE)]
        file: PathBuf,

        /// Only report on this patient
        #[arg(short, long)]
        patient: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let tracker = build_tracker(cli.config.as_ref())?;

    match cli.command {
        Commands::Demo {
            seed,
            days,
            reports,
            save,
            snapshot,
            series,
        } => run_demo(&tracker, seed, days, reports, save, snapshot, series),
        Commands::Log {
            drug,
            dosage,
            notes,
            patient,
            time,
            file,
        } => run_log(drug, dosage, notes, patient, time, file),
        Commands::History { file } => {
            let entries = Logbook::new(&file).entries()?;
            print!("{}", console::history(&entries));
            Ok(())
        }
        Commands::Report { file, patient } => run_report(&tracker, file, patient),
    }
}

fn build_tracker(config: Option<&PathBuf>) -> Result<Tracker> {
    match config {
        Some(path) => {
            let config = TrackerConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            Ok(Tracker::from_config(&config)?)
        }
        None => Ok(Tracker::with_defaults()),
    }
}

fn run_demo(
    tracker: &Tracker,
    seed: u64,
    days: u32,
    reports: usize,
    save: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    series: Option<PathBuf>,
) -> Result<()> {
    println!("DRUG INTAKE TRACKING SYSTEM\n");
    let mut generator = SampleGenerator::new(SampleConfig::recent(days, seed));
    generator.populate(tracker)?;

    let builder = tracker.reports();
    let fleet = tracker.fleet_summary();

    println!("{}", console::overview(&fleet));
    println!("{}", console::drug_database(tracker.reference()));
    println!("{}", console::recent_records(&builder.recent_events(10)));
    println!("{}", console::top_daily_totals(&builder.top_daily_totals(5)));
    println!("{}", console::overdose_warnings(&tracker.overdose_warnings(None)));

    for patient in tracker.store().patients().iter().take(reports) {
        if let Some(report) = tracker.patient_report(patient) {
            println!("{}", console::patient_report(&report));
        }
    }

    println!("{}", console::type_analysis(&fleet));

    if let Some(path) = save {
        let mut db = Database::open(&path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        db.save_reference_table(tracker.reference())?;
        let saved = db.insert_intake_events(&tracker.store().all())?;
        println!("Saved {} events to {}", saved, path.display());
    }

    if let Some(path) = snapshot {
        fs::write(&path, SafetySnapshot::capture(tracker).to_json()?)?;
        println!("Wrote snapshot to {}", path.display());
    }

    if let Some(path) = series {
        fs::write(&path, serde_json::to_string_pretty(&builder.usage_series())?)?;
        println!("Wrote usage series to {}", path.display());
    }

    Ok(())
}

fn run_log(
    drug: String,
    dosage: String,
    notes: String,
    patient: Option<String>,
    time: Option<String>,
    file: PathBuf,
) -> Result<()> {
    let drug = drug.trim().to_string();
    if drug.is_empty() {
        bail!("Drug name must not be empty");
    }

    let time = match time {
        Some(text) => NaiveDateTime::parse_from_str(text.trim(), LOG_TIME_FORMAT)
            .with_context(|| format!("Invalid time '{}', expected {}", text, LOG_TIME_FORMAT))?,
        None => Local::now().naive_local(),
    };

    let mut entry = LogEntry::new(drug, dosage.trim(), time).with_notes(notes.trim());
    if let Some(patient) = patient {
        entry = entry.with_patient(patient);
    }
    entry.parsed_dosage()?;

    Logbook::new(&file).append(&entry)?;
    println!(
        "Drug intake for '{}' logged at {}.",
        entry.drug_name,
        entry.time.format(LOG_TIME_FORMAT)
    );
    Ok(())
}

fn run_report(tracker: &Tracker, file: PathBuf, patient: Option<String>) -> Result<()> {
    let logbook = Logbook::new(&file);
    let summary = logbook
        .import_into(tracker)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    if summary.imported == 0 {
        println!("No logs found yet.");
        return Ok(());
    }
    for drug in &summary.unknown_drugs {
        let hint = tracker
            .reference()
            .suggest(drug)
            .map(|s| format!(" (did you mean {}?)", s))
            .unwrap_or_default();
        println!("Note: '{}' is not in the drug database; no dose limit applied{}", drug, hint);
    }

    println!("{}", console::overview(&tracker.fleet_summary()));
    println!("{}", console::overdose_warnings(&tracker.overdose_warnings(patient.as_deref())));

    let patients: Vec<String> = match patient {
        Some(p) => vec![p],
        None => tracker.store().patients().into_iter().collect(),
    };
    for patient in patients {
        match tracker.patient_report(&patient) {
            Some(report) => println!("{}", console::patient_report(&report)),
            None => println!("No data found for patient {}\n", patient),
        }
    }
    Ok(())
}
