//! Curve Report
//!
//! Glucose and insulin tolerance test reports: reference ranges, diagnostic
//! interpretation, PDF output and a local archive.
//!
//! Usage:
//!   curve-report                          - Launch GUI
//!   curve-report evaluate <record.json>   - Print statuses and findings
//!   curve-report --help                   - Show help
//!   CURVE_REPORT_DBG=1 curve-report ...   - Enable debug output

// Hide console window on Windows when running GUI mode (doesn't affect CLI when run from terminal)
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::env;
use std::fs;
use std::path::Path;

use log::{info, warn};

use curve_report::classify::StatusRow;
use curve_report::config::{
    config_file_path, default_export_dir, ensure_data_dir, get_data_dir, settings_file_path, Config,
    ReportSettings,
};
use curve_report::diagnosis::DiagnosticEngine;
use curve_report::error::ReportError;
use curve_report::export::export_to_pdf;
use curve_report::gui;
use curve_report::report::{Report, ReportRecord};
use curve_report::storage::Storage;
use curve_report::units::{format_value, Analyte};

/// Attach to parent console on Windows (needed for CLI output with windows_subsystem = "windows")
#[cfg(windows)]
fn attach_console() {
    #[link(name = "kernel32")]
    extern "system" {
        fn AttachConsole(dw_process_id: u32) -> i32;
    }

    #[link(name = "msvcrt")]
    extern "C" {
        fn freopen(filename: *const i8, mode: *const i8, stream: *mut std::ffi::c_void) -> *mut std::ffi::c_void;
        fn __acrt_iob_func(index: u32) -> *mut std::ffi::c_void;
    }

    const ATTACH_PARENT_PROCESS: u32 = 0xFFFFFFFF;

    unsafe {
        if AttachConsole(ATTACH_PARENT_PROCESS) != 0 {
            let conout = b"CONOUT$\0".as_ptr() as *const i8;
            let mode_w = b"w\0".as_ptr() as *const i8;

            freopen(conout, mode_w, __acrt_iob_func(1)); // stdout
            freopen(conout, mode_w, __acrt_iob_func(2)); // stderr
        }
    }
}

#[cfg(not(windows))]
fn attach_console() {}

fn main() -> Result<(), ReportError> {
    let args: Vec<String> = env::args().collect();

    // Any argument means CLI mode
    if args.len() > 1 {
        attach_console();
    }

    if env::var("CURVE_REPORT_DBG").is_ok() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();
    }

    if let Err(e) = ensure_data_dir() {
        eprintln!("Warning: Could not create data directory: {}", e);
    }

    let cfg_path = config_file_path();
    if !cfg_path.exists() {
        if let Err(e) = Config::create_default(&cfg_path) {
            warn!("Could not create default config: {}", e);
        }
    }

    // Data directory first, then current directory
    let config = Config::load(&cfg_path)
        .or_else(|_| Config::load("config.txt"))
        .unwrap_or_else(|e| {
            warn!("Could not load config: {}. Using defaults.", e);
            Config::default()
        });
    let db_path = config.database_path();

    match args.get(1).map(|s| s.as_str()) {
        Some("evaluate") => {
            let path = required_arg(&args, 2, "evaluate <record.json>")?;
            cmd_evaluate(&config, path)?;
        }
        Some("pdf") => {
            let input = required_arg(&args, 2, "pdf <record.json> <out.pdf>")?;
            let output = required_arg(&args, 3, "pdf <record.json> <out.pdf>")?;
            cmd_pdf(input, output)?;
        }
        Some("archive") => {
            let storage = Storage::new(&db_path)?;
            cmd_archive(&storage, &args[2..])?;
        }
        Some("--help") | Some("-h") | Some("help") => {
            print_help();
        }
        Some("--version") | Some("-V") => {
            println!("curve-report {}", env!("CARGO_PKG_VERSION"));
        }
        Some("path") | Some("paths") => {
            cmd_show_paths(&config);
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_help();
        }
        None => {
            info!("Starting GUI with archive {}", db_path.display());
            gui::run_gui(db_path, config).map_err(|e| ReportError::Gui(e.to_string()))?;
        }
    }

    Ok(())
}

fn required_arg<'a>(args: &'a [String], idx: usize, usage: &str) -> Result<&'a str, ReportError> {
    args.get(idx)
        .map(|s| s.as_str())
        .ok_or_else(|| ReportError::Usage(usage.to_string()))
}

fn load_record(path: &str) -> Result<ReportRecord, ReportError> {
    ReportRecord::from_json(&fs::read_to_string(path)?)
}

/// Show data paths
fn cmd_show_paths(config: &Config) {
    println!("Curve Report Data Paths:");
    println!("  Data directory:  {}", get_data_dir().display());
    println!("  Database:        {}", config.database_path().display());
    println!("  Config file:     {}", config_file_path().display());
    println!("  Settings file:   {}", settings_file_path().display());
    println!("  Export default:  {}", default_export_dir().display());
}

/// Evaluate a record file and print the result tables and findings
fn cmd_evaluate(config: &Config, path: &str) -> Result<(), ReportError> {
    let record = load_record(path)?;
    let mut options = record.options;
    options.hypoglycemia_screening |= config.hypoglycemia_screening;
    let report = Report::build(&record, &DiagnosticEngine::default().with_options(options));

    println!("{}", record.config.preset_name);
    if record.config.curve.has_glycemia() {
        print_rows(Analyte::Glycemia, record.config.glyc_unit.label(), &report.glycemic_rows);
    }
    if record.config.curve.has_insulin() {
        print_rows(Analyte::Insulin, record.config.ins_unit.label(), &report.insulin_rows);
    }

    println!();
    println!("INTERPRETATION (overall: {})", report.severity.label());
    for finding in &report.findings {
        println!("  [{}] {} ({})", finding.severity.prefix(), finding.message, finding.source.id());
    }
    if !report.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &report.sources {
            println!("  - {}", source);
        }
    }
    Ok(())
}

fn print_rows(analyte: Analyte, unit: &str, rows: &[StatusRow]) {
    println!();
    println!("{} ({})", analyte.curve_title(), unit);
    for row in rows {
        println!(
            "  {:<8} {:>8}  {:<20} {}",
            row.time.label(),
            row.value.map(format_value).unwrap_or_else(|| "-".to_string()),
            row.range.map(|r| r.format(unit)).unwrap_or_else(|| "-".to_string()),
            row.status.map(|s| s.label()).unwrap_or("-")
        );
    }
}

fn cmd_pdf(input: &str, output: &str) -> Result<(), ReportError> {
    let record = load_record(input)?;
    let settings = ReportSettings::load_or_default(settings_file_path());
    export_to_pdf(Path::new(output), &record, &record.report(), &settings)?;
    eprintln!("PDF written to {}", output);
    Ok(())
}

fn cmd_archive(storage: &Storage, args: &[String]) -> Result<(), ReportError> {
    match args.first().map(|s| s.as_str()) {
        Some("list") | None => {
            let query = args.get(1).map(|s| s.as_str()).unwrap_or("");
            for summary in storage.search_reports(query)? {
                println!(
                    "{}  {}  {:<30} {:<12} {}{}",
                    summary.id,
                    summary.created_at.get(..10).unwrap_or(summary.created_at.as_str()),
                    summary.patient_label(),
                    summary.exam_date,
                    summary.preset_name,
                    if summary.has_pdf { "  [pdf]" } else { "" }
                );
            }
        }
        Some("show") => {
            let id = required_arg(args, 1, "archive show <id>")?;
            println!("{}", serde_json::to_string_pretty(&storage.load_report(id)?)?);
        }
        Some("delete") => {
            let id = required_arg(args, 1, "archive delete <id>")?;
            if storage.delete_report(id)? {
                eprintln!("Deleted {}", id);
            } else {
                return Err(ReportError::ReportNotFound(id.to_string()));
            }
        }
        Some("export") => {
            let path = required_arg(args, 1, "archive export <file.json>")?;
            fs::write(path, storage.export_json()?)?;
            eprintln!("Exported {} reports to {}", storage.count()?, path);
        }
        Some("import") => {
            let path = required_arg(args, 1, "archive import <file.json>")?;
            let added = storage.import_json(&fs::read_to_string(path)?)?;
            eprintln!("Imported {} new reports ({} total)", added, storage.count()?);
        }
        Some("stats") => {
            let stats = storage.stats()?;
            println!("Reports:   {}", stats.reports);
            println!("Patients:  {}", stats.patients);
            println!("Pregnancy: {}", stats.pregnant);
        }
        Some(other) => {
            eprintln!("Unknown archive command: {}", other);
            print_help();
        }
    }
    Ok(())
}

fn print_help() {
    eprintln!("Curve Report v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  curve-report                            Launch GUI application");
    eprintln!("  curve-report evaluate <record.json>     Print statuses and findings");
    eprintln!("  curve-report pdf <record.json> <out>    Render a PDF report");
    eprintln!("  curve-report archive list [query]       List (or search) saved reports");
    eprintln!("  curve-report archive show <id>          Print a saved report as JSON");
    eprintln!("  curve-report archive delete <id>        Delete a saved report");
    eprintln!("  curve-report archive export <file>      Export the archive as JSON");
    eprintln!("  curve-report archive import <file>      Import reports from JSON");
    eprintln!("  curve-report archive stats              Archive statistics");
    eprintln!("  curve-report path                       Show data file locations");
    eprintln!("  curve-report help                       Show this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("  CURVE_REPORT_DBG=1                      Enable debug output");
    eprintln!();
    eprintln!("DATA LOCATIONS:");
    eprintln!("  Config:    {}", config_file_path().display());
}
