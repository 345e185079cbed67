//! Configuration file parsing and data locations

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::diagnosis::EvaluationOptions;
use crate::error::ReportError;
use crate::report::DEFAULT_GLUCOSE_LOAD;
use crate::units::{GlycemiaUnit, InsulinUnit};

const APP_DIR: &str = "curve-report";

/// Per-user data directory (`<data_dir>/curve-report`)
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn ensure_data_dir() -> Result<PathBuf, ReportError> {
    let dir = get_data_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn default_database_path() -> PathBuf {
    get_data_dir().join("archive.db")
}

pub fn config_file_path() -> PathBuf {
    get_data_dir().join("config.txt")
}

pub fn settings_file_path() -> PathBuf {
    get_data_dir().join("settings.json")
}

/// Where export dialogs start: Documents, else home, else the data dir
pub fn default_export_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(get_data_dir)
}

/// Configuration loaded from config.txt
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: Option<String>,
    pub glucose_load: u32,
    pub glyc_unit: GlycemiaUnit,
    pub ins_unit: InsulinUnit,
    pub hypoglycemia_screening: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            glucose_load: DEFAULT_GLUCOSE_LOAD,
            glyc_unit: GlycemiaUnit::default(),
            ins_unit: InsulinUnit::default(),
            hypoglycemia_screening: false,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ReportError> {
        let mut config = Config::default();

        for line in reader.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse "key value" or "key value # comment"
            if let Some((key, rest)) = Self::parse_line(line) {
                let value = rest.split('#').next().unwrap_or("").trim();
                if !value.is_empty() {
                    config.apply(key, value);
                }
            }
        }

        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "database_path" => self.database_path = Some(value.to_string()),
            "glucose_load" => match value.parse::<u32>() {
                Ok(grams) if grams > 0 => self.glucose_load = grams,
                _ => warn!("Ignoring invalid glucose_load: {}", value),
            },
            "glyc_unit" => match GlycemiaUnit::parse(value) {
                Some(unit) => self.glyc_unit = unit,
                None => warn!("Ignoring unknown glyc_unit: {}", value),
            },
            "ins_unit" => match InsulinUnit::parse(value) {
                Some(unit) => self.ins_unit = unit,
                None => warn!("Ignoring unknown ins_unit: {}", value),
            },
            "hypoglycemia_screening" => self.hypoglycemia_screening = value == "1",
            _ => {}
        }
    }

    /// Parse a single config line, returning (key, value)
    fn parse_line(line: &str) -> Option<(&str, &str)> {
        // Find first whitespace to separate key from value
        let mut parts = line.splitn(2, |c: char| c.is_whitespace());
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();

        if key.is_empty() || value.is_empty() {
            return None;
        }

        Some((key, value))
    }

    /// Write a commented default config file
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<(), ReportError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        writeln!(file, "# curve-report configuration")?;
        writeln!(file, "# Format: key value  # comment")?;
        writeln!(file)?;
        writeln!(file, "# database_path /path/to/archive.db   # default: data directory")?;
        writeln!(file, "glucose_load {}   # grams of oral glucose", DEFAULT_GLUCOSE_LOAD)?;
        writeln!(file, "glyc_unit mg/dL   # mg/dL or mmol/L (label only)")?;
        writeln!(file, "ins_unit µUI/mL   # µUI/mL or pmol/L (label only)")?;
        writeln!(file, "hypoglycemia_screening 0   # 1 = flag hypoglycemia and hypoinsulinemia")?;
        Ok(())
    }

    pub fn evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions { hypoglycemia_screening: self.hypoglycemia_screening }
    }

    /// Configured archive path, or the default one in the data directory
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path)
    }
}

/// Report settings kept between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub pdf_title: String,
    pub methodology: String,
    pub default_notes: String,
    pub include_interpretation: bool,
    pub include_charts: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            pdf_title: "GLUCOSE TOLERANCE TEST REPORT".to_string(),
            methodology: "Enzymatic hexokinase method (glucose); chemiluminescent immunoassay (insulin)."
                .to_string(),
            default_notes: String::new(),
            include_interpretation: true,
            include_charts: true,
        }
    }
}

impl ReportSettings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load settings, falling back to defaults when missing or unreadable
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!("Could not read settings {}: {}. Using defaults.", path.display(), e);
            Self::default()
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ReportError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
