use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::TimeFrame;
use crate::source::binance::MAX_CANDLES_PER_REQUEST;
use crate::swing::detector::{DEFAULT_CLOSE_LOOKBACK, DEFAULT_STRUCTURAL_LOOKBACK};
use crate::swing::grouper::{DEFAULT_MAX_GAP, DEFAULT_RANGE_RATIO};
use crate::trend::DEFAULT_REQUIRED_SETS;
use crate::zone::DEFAULT_BASING_RATIO;

fn default_log_level() -> String {
    "info".into()
}

fn default_format() -> String {
    "text".into()
}

fn default_timeframe() -> String {
    "1d".into()
}

fn default_candle_limit() -> usize {
    150
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_format")]
    pub log_format: String,
    /// Report renderer. Accepted values: `"text"` | `"json"`
    #[serde(default = "default_format")]
    pub output: String,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    /// Accepted values: `"binance"` | `"file"`
    pub kind: String,
    pub symbol: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default = "default_candle_limit")]
    pub limit: usize,
    /// Candle file, required when `kind = "file"`.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub structural_lookback: usize,
    pub trend_lookback: usize,
    pub group_max_gap: usize,
    pub group_range_ratio: f64,
    pub trend_required_sets: usize,
    pub basing_ratio: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            structural_lookback: DEFAULT_STRUCTURAL_LOOKBACK,
            trend_lookback: DEFAULT_CLOSE_LOOKBACK,
            group_max_gap: DEFAULT_MAX_GAP,
            group_range_ratio: DEFAULT_RANGE_RATIO,
            trend_required_sets: DEFAULT_REQUIRED_SETS,
            basing_ratio: DEFAULT_BASING_RATIO,
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_FORMATS: &[&str] = &["text", "json"];
const VALID_SOURCES: &[&str] = &["binance", "file"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(&config.general)?;
    validate_source(&config.source)?;
    validate_analysis(&config.analysis)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(general: &GeneralConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_FORMATS.contains(&general.log_format.as_str()) {
        return Err(invalid(format!(
            "general.log_format \"{}\" is not valid",
            general.log_format
        )));
    }
    if !VALID_FORMATS.contains(&general.output.as_str()) {
        return Err(invalid(format!(
            "general.output \"{}\" is not valid",
            general.output
        )));
    }
    Ok(())
}

fn validate_source(source: &SourceConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_SOURCES.contains(&source.kind.as_str()) {
        return Err(invalid(format!(
            "source.kind \"{}\" is not a known source",
            source.kind
        )));
    }
    if TimeFrame::from_str(&source.timeframe).is_none() {
        return Err(invalid(format!(
            "source.timeframe: unknown timeframe \"{}\"",
            source.timeframe
        )));
    }
    if source.symbol.trim().is_empty() {
        return Err(invalid("source.symbol must not be empty".into()));
    }
    if source.limit == 0 {
        return Err(invalid("source.limit must be > 0".into()));
    }
    if source.kind == "binance" && source.limit > MAX_CANDLES_PER_REQUEST {
        return Err(invalid(format!(
            "source.limit {} exceeds the binance maximum of {MAX_CANDLES_PER_REQUEST}",
            source.limit
        )));
    }
    if source.kind == "file" && source.path.is_none() {
        return Err(invalid(
            "source.path is required for kind \"file\"".into(),
        ));
    }
    Ok(())
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), Report<ConfigError>> {
    let counts = [
        ("analysis.structural_lookback", analysis.structural_lookback),
        ("analysis.trend_lookback", analysis.trend_lookback),
        ("analysis.trend_required_sets", analysis.trend_required_sets),
    ];
    for (name, value) in counts {
        if value == 0 {
            return Err(invalid(format!("{name} must be > 0")));
        }
    }

    let ratios = [
        ("analysis.group_range_ratio", analysis.group_range_ratio),
        ("analysis.basing_ratio", analysis.basing_ratio),
    ];
    for (name, value) in ratios {
        if !(value.is_finite() && value > 0.0) {
            return Err(invalid(format!("{name} must be a positive number")));
        }
    }
    Ok(())
}
