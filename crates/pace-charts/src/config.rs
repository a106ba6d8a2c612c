use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

use pace_core::calendar::{CalendarError, RaceCalendar};
use pace_core::pair::{DEFAULT_MIN_RACES, EligibilityPolicy};

const DEFAULT_CHART_WIDTH: u32 = 3_000;
const DEFAULT_CHART_HEIGHT: u32 = 1_500;
const MIN_CHART_DIMENSION: u32 = 200;
const MAX_CHART_DIMENSION: u32 = 8_000;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root renderer configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RenderConfig {
    pub run_id: String,
    pub input: InputConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub pairs: PairsConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    /// Races in season order; the bundled 2021 calendar when omitted.
    #[serde(default)]
    pub calendar: Option<Vec<String>>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RenderConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: RenderConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.input.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.pairs.validate()?;
        self.chart.validate()?;
        self.race_calendar()?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            input_csv: resolve_template(&self.run_id, &self.input.csv),
            charts_dir: resolve_template(&self.run_id, &self.outputs.charts_dir),
            format: self.outputs.format,
        }
    }

    pub fn race_calendar(&self) -> Result<RaceCalendar, ValidationError> {
        match self.calendar.as_ref() {
            None => Ok(RaceCalendar::season_2021()),
            Some(races) => RaceCalendar::from_races(races.iter().cloned()).map_err(|source| {
                ValidationError::Calendar {
                    field: "calendar".to_string(),
                    source,
                }
            }),
        }
    }

    pub fn eligibility(&self) -> EligibilityPolicy {
        EligibilityPolicy::new(self.pairs.min_races)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InputConfig {
    pub csv: String,
}

impl InputConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.csv.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "input.csv".to_string(),
                message: "path must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub charts_dir: String,
    #[serde(default)]
    pub format: ChartFormat,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        if self.charts_dir.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "outputs.charts_dir".to_string(),
                message: "path must not be empty".to_string(),
            });
        }

        let resolved = resolve_template(run_id, &self.charts_dir);
        if resolved.components().count() == 0 {
            return Err(ValidationError::InvalidField {
                field: "outputs.charts_dir".to_string(),
                message: "resolved path is invalid".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

impl ChartFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PairsConfig {
    #[serde(default = "default_min_races")]
    pub min_races: usize,
}

impl Default for PairsConfig {
    fn default() -> Self {
        Self {
            min_races: DEFAULT_MIN_RACES,
        }
    }
}

impl PairsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.min_races == 0 {
            return Err(ValidationError::InvalidField {
                field: "pairs.min_races".to_string(),
                message: "minimum race count must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn default_min_races() -> usize {
    DEFAULT_MIN_RACES
}

/// Raster dimensions in pixels (10in x 5in at 300dpi by default).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChartConfig {
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
        }
    }
}

impl ChartConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        for (label, value) in [("chart.width", self.width), ("chart.height", self.height)] {
            if !(MIN_CHART_DIMENSION..=MAX_CHART_DIMENSION).contains(&value) {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: format!(
                        "must be between {MIN_CHART_DIMENSION} and {MAX_CHART_DIMENSION} pixels"
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn default_chart_width() -> u32 {
    DEFAULT_CHART_WIDTH
}

fn default_chart_height() -> u32 {
    DEFAULT_CHART_HEIGHT
}

/// Logging defaults to human-readable output on stderr.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved input and output locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub input_csv: PathBuf,
    pub charts_dir: PathBuf,
    pub format: ChartFormat,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
    #[error("{field}: {source}")]
    Calendar {
        field: String,
        #[source]
        source: CalendarError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "season_2021"
input:
  csv: "query_results/pace_per_race.csv"
outputs:
  charts_dir: "visuals/{run_id}/consistency"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: RenderConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.pairs.min_races, DEFAULT_MIN_RACES);
        assert_eq!(cfg.chart.size(), (DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT));
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));
        assert_eq!(cfg.race_calendar().expect("calendar").len(), 22);

        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.charts_dir,
            PathBuf::from("visuals/season_2021/consistency")
        );
        assert_eq!(outputs.format, ChartFormat::Png);
    }

    #[test]
    fn custom_calendar_and_threshold() {
        let yaml = format!(
            "{BASIC_YAML}pairs:\n  min_races: 2\ncalendar:\n  - \"R1\"\n  - \"R2\"\n"
        );
        let mut cfg: RenderConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg.eligibility().min_races, 2);
        let calendar = cfg.race_calendar().expect("calendar");
        assert_eq!(calendar.position("R2"), Some(2));
    }

    #[test]
    fn rejects_duplicate_calendar_entries() {
        let yaml = format!("{BASIC_YAML}calendar:\n  - \"R1\"\n  - \"R1\"\n");
        let mut cfg: RenderConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("duplicate races should fail");
        assert!(matches!(
            err,
            ValidationError::Calendar {
                source: CalendarError::DuplicateRace(_),
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_threshold() {
        let yaml = format!("{BASIC_YAML}pairs:\n  min_races: 0\n");
        let mut cfg: RenderConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("zero threshold");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "pairs.min_races"
        ));
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("season_2021", "season 2021");
        let mut cfg: RenderConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("invalid run id");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "run_id"
        ));
    }

    #[test]
    fn rejects_tiny_chart() {
        let yaml = format!("{BASIC_YAML}chart:\n  width: 10\n");
        let mut cfg: RenderConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("tiny chart");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "chart.width"
        ));
    }

    #[test]
    fn parses_svg_format() {
        let yaml = BASIC_YAML.replace(
            "charts_dir: \"visuals/{run_id}/consistency\"",
            "charts_dir: \"out\"\n  format: \"svg\"",
        );
        let mut cfg: RenderConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg.resolved_outputs().format.extension(), "svg");
    }
}
