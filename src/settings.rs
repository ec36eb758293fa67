// src/settings.rs
//
// Configuration file loading and validation.
//
// The file holds one or more named modes. `mode` picks the active one and a
// `[modes.DEFAULT]` table supplies any key a mode leaves out:
//
//   mode = "ONLY_XY"
//
//   [modes.DEFAULT]
//   sampling_rate = 20
//   stable_samples = 10
//   x_threshold = 0.9
//   y_threshold = 0.9
//   z_threshold = 0.75
//
//   [modes.ONLY_XY.orientation]
//   x_pos = "PORTRAIT"
//   x_neg = "PORTRAIT_FLIPPED"
//
//   [modes.ONLY_XY.position]
//   x_pos = { x = 100, y = 200 }

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::io::serial::DEFAULT_DEVICE_NAMES;
use crate::io::{pause, RetryLimit};
use crate::orientation::{Axis, ScreenOrientation};

// ============================================================================
// Constants
// ============================================================================

pub const DEFAULT_MODE: &str = "DEFAULT";
pub const DEFAULT_DISPLAY_PROGRAM: &str = "display64.exe";
const CONFIG_FILENAME: &str = "tiltlink.toml";

const ACCEL_THR_MIN: f64 = 0.0;
/// Values above 1 disable detection on that axis; they are rejected here.
const ACCEL_THR_MAX: f64 = 1.0;
const SAMPLING_RATE_MIN: i64 = 1;
const STABLE_SAMPLES_MIN: i64 = 1;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} file not found")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("{mode} is not a valid mode. Valid modes are: {}", valid.join(", "))]
    UnknownMode { mode: String, valid: Vec<String> },

    #[error("Invalid configuration for mode {mode}: {}", problems.join("; "))]
    Invalid { mode: String, problems: Vec<String> },
}

// ============================================================================
// Snapshot
// ============================================================================

/// What the display should do when one axis points down.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AxisSlot {
    pub orientation: Option<ScreenOrientation>,
    pub x: Option<i64>,
    pub y: Option<i64>,
}

/// A validated configuration, immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    pub mode: String,
    /// Explicit serial port, or empty for automatic discovery.
    pub serial_port: String,
    pub monitor: Option<u32>,
    pub sampling_rate: u32,
    pub stable_samples: u32,
    pub x_threshold: f64,
    pub y_threshold: f64,
    pub z_threshold: f64,
    slots: [AxisSlot; 5],
    pub device_names: Vec<String>,
    pub display_program: String,
    pub log_dir: Option<PathBuf>,
    pub retry_limit: Option<u32>,
}

impl ConfigSnapshot {
    pub fn slot(&self, axis: Axis) -> &AxisSlot {
        &self.slots[axis.index()]
    }

    pub fn retry_limit(&self) -> RetryLimit {
        RetryLimit(self.retry_limit)
    }

    /// A snapshot with the firmware's own defaults and no axis mappings.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            mode: DEFAULT_MODE.to_string(),
            serial_port: String::new(),
            monitor: None,
            sampling_rate: 20,
            stable_samples: 10,
            x_threshold: 0.9,
            y_threshold: 0.9,
            z_threshold: 0.75,
            slots: Default::default(),
            device_names: DEFAULT_DEVICE_NAMES.iter().map(|s| s.to_string()).collect(),
            display_program: DEFAULT_DISPLAY_PROGRAM.to_string(),
            log_dir: None,
            retry_limit: None,
        }
    }

    #[cfg(test)]
    pub fn with_slot(mut self, axis: Axis, slot: AxisSlot) -> Self {
        self.slots[axis.index()] = slot;
        self
    }
}

// ============================================================================
// File Layout
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    mode: Option<String>,
    device_names: Option<Vec<String>>,
    display_program: Option<String>,
    log_dir: Option<PathBuf>,
    retry_limit: Option<u32>,
    modes: BTreeMap<String, ModeSection>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct ModeSection {
    serial_port: Option<String>,
    monitor: Option<i64>,
    sampling_rate: Option<i64>,
    stable_samples: Option<i64>,
    x_threshold: Option<f64>,
    y_threshold: Option<f64>,
    z_threshold: Option<f64>,
    orientation: AxisTable<String>,
    position: AxisTable<PositionEntry>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
struct AxisTable<T> {
    x_pos: Option<T>,
    y_pos: Option<T>,
    x_neg: Option<T>,
    y_neg: Option<T>,
    flat: Option<T>,
}

// Manual impl: the derive would require `T: Default`
impl<T> Default for AxisTable<T> {
    fn default() -> Self {
        Self {
            x_pos: None,
            y_pos: None,
            x_neg: None,
            y_neg: None,
            flat: None,
        }
    }
}

impl<T: Clone> AxisTable<T> {
    fn get(&self, axis: Axis) -> Option<&T> {
        match axis {
            Axis::XPos => self.x_pos.as_ref(),
            Axis::YPos => self.y_pos.as_ref(),
            Axis::XNeg => self.x_neg.as_ref(),
            Axis::YNeg => self.y_neg.as_ref(),
            Axis::Flat => self.flat.as_ref(),
        }
    }

    /// Combine with `fallback` one axis at a time.
    fn merge(
        &self,
        fallback: &AxisTable<T>,
        pick: impl Fn(&Option<T>, &Option<T>) -> Option<T>,
    ) -> AxisTable<T> {
        AxisTable {
            x_pos: pick(&self.x_pos, &fallback.x_pos),
            y_pos: pick(&self.y_pos, &fallback.y_pos),
            x_neg: pick(&self.x_neg, &fallback.x_neg),
            y_neg: pick(&self.y_neg, &fallback.y_neg),
            flat: pick(&self.flat, &fallback.flat),
        }
    }

    fn or(&self, fallback: &AxisTable<T>) -> AxisTable<T> {
        self.merge(fallback, |own, other| own.clone().or_else(|| other.clone()))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct PositionEntry {
    x: Option<i64>,
    y: Option<i64>,
}

impl AxisTable<PositionEntry> {
    /// Coordinates are inherited one by one, so `{ x = 1920 }` keeps the default `y`.
    fn or_each_coordinate(&self, fallback: &AxisTable<PositionEntry>) -> AxisTable<PositionEntry> {
        self.merge(fallback, |own, other| match (own, other) {
            (Some(own), Some(other)) => Some(PositionEntry {
                x: own.x.or(other.x),
                y: own.y.or(other.y),
            }),
            _ => own.clone().or_else(|| other.clone()),
        })
    }
}

impl ModeSection {
    /// Fill every key this mode leaves out from `defaults`.
    fn inherit(&self, defaults: &ModeSection) -> ModeSection {
        ModeSection {
            serial_port: self.serial_port.clone().or_else(|| defaults.serial_port.clone()),
            monitor: self.monitor.or(defaults.monitor),
            sampling_rate: self.sampling_rate.or(defaults.sampling_rate),
            stable_samples: self.stable_samples.or(defaults.stable_samples),
            x_threshold: self.x_threshold.or(defaults.x_threshold),
            y_threshold: self.y_threshold.or(defaults.y_threshold),
            z_threshold: self.z_threshold.or(defaults.z_threshold),
            orientation: self.orientation.or(&defaults.orientation),
            position: self.position.or_each_coordinate(&defaults.position),
        }
    }
}

// ============================================================================
// Parsing and Validation
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Parse and validate configuration text.
///
/// `mode_override` replaces the file's `mode` key. `monitor_limit` is the
/// number of attached monitors when it is known.
pub fn parse_config(
    content: &str,
    format: ConfigFormat,
    mode_override: Option<&str>,
    monitor_limit: Option<usize>,
) -> Result<ConfigSnapshot, ConfigError> {
    let file: ConfigFile = match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?,
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?
        }
    };

    let mode = mode_override
        .map(str::to_string)
        .or_else(|| file.mode.clone())
        .unwrap_or_else(|| DEFAULT_MODE.to_string());

    let defaults = file.modes.get(DEFAULT_MODE).cloned().unwrap_or_default();
    let section = if mode == DEFAULT_MODE {
        defaults
    } else {
        match file.modes.get(&mode) {
            Some(section) => section.inherit(&defaults),
            None => {
                let mut valid: Vec<String> = file.modes.keys().cloned().collect();
                if !valid.iter().any(|m| m == DEFAULT_MODE) {
                    valid.push(DEFAULT_MODE.to_string());
                }
                return Err(ConfigError::UnknownMode { mode, valid });
            }
        }
    };

    let mut problems = Vec::new();

    let monitor = match section.monitor {
        None => None,
        Some(m) => {
            let in_range = m > 0 && monitor_limit.map_or(true, |limit| m <= limit as i64);
            if in_range {
                u32::try_from(m).ok()
            } else {
                problems.push(match monitor_limit {
                    Some(limit) => format!(
                        "Monitor number must be a positive integer between 1 and {}",
                        limit
                    ),
                    None => "Monitor number must be a positive integer".to_string(),
                });
                None
            }
        }
    };

    let sampling_rate = require_min(
        section.sampling_rate,
        SAMPLING_RATE_MIN,
        "sampling_rate",
        &mut problems,
    );
    let stable_samples = require_min(
        section.stable_samples,
        STABLE_SAMPLES_MIN,
        "stable_samples",
        &mut problems,
    );

    let x_threshold = require_threshold(section.x_threshold, "x_threshold", &mut problems);
    let y_threshold = require_threshold(section.y_threshold, "y_threshold", &mut problems);
    let z_threshold = require_threshold(section.z_threshold, "z_threshold", &mut problems);

    let mut slots: [AxisSlot; 5] = Default::default();
    for axis in Axis::ALL {
        let label = section.orientation.get(axis).map(String::as_str).unwrap_or("");
        let orientation = match ScreenOrientation::parse_label(label) {
            Ok(o) => o,
            Err(bad) => {
                let valid: Vec<&str> = ScreenOrientation::ALL.iter().map(|o| o.name()).collect();
                problems.push(format!(
                    "Screen orientation '{}' for {} is invalid. Valid orientations: {}, or leave it empty",
                    bad,
                    axis.config_key(),
                    valid.join(", ")
                ));
                None
            }
        };
        let position = section.position.get(axis).cloned().unwrap_or_default();
        slots[axis.index()] = AxisSlot {
            orientation,
            x: position.x,
            y: position.y,
        };
    }

    if !problems.is_empty() {
        return Err(ConfigError::Invalid { mode, problems });
    }

    Ok(ConfigSnapshot {
        mode,
        serial_port: section.serial_port.unwrap_or_default(),
        monitor,
        sampling_rate,
        stable_samples,
        x_threshold,
        y_threshold,
        z_threshold,
        slots,
        device_names: file
            .device_names
            .unwrap_or_else(|| DEFAULT_DEVICE_NAMES.iter().map(|s| s.to_string()).collect()),
        display_program: file
            .display_program
            .unwrap_or_else(|| DEFAULT_DISPLAY_PROGRAM.to_string()),
        log_dir: file.log_dir,
        retry_limit: file.retry_limit,
    })
}

fn require_min(value: Option<i64>, min: i64, key: &str, problems: &mut Vec<String>) -> u32 {
    match value {
        Some(v) if v >= min => u32::try_from(v).unwrap_or(u32::MAX),
        Some(_) => {
            problems.push(format!("{} must be an integer greater than or equal to {}", key, min));
            0
        }
        None => {
            problems.push(format!("{} is missing", key));
            0
        }
    }
}

fn require_threshold(value: Option<f64>, key: &str, problems: &mut Vec<String>) -> f64 {
    match value {
        Some(v) if (ACCEL_THR_MIN..=ACCEL_THR_MAX).contains(&v) => v,
        Some(_) => {
            problems.push(format!(
                "{} must be a decimal value between {} and {}",
                key, ACCEL_THR_MIN, ACCEL_THR_MAX
            ));
            0.0
        }
        None => {
            problems.push(format!("{} is missing", key));
            0.0
        }
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Supplies a fresh snapshot every time it is asked.
pub trait ConfigProvider: Send + Sync {
    fn load(&self) -> Result<ConfigSnapshot, ConfigError>;
}

/// A configuration file on disk.
#[derive(Clone, Debug)]
pub struct ConfigSource {
    path: PathBuf,
    mode_override: Option<String>,
    monitor_limit: Option<usize>,
}

impl ConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode_override: None,
            monitor_limit: None,
        }
    }

    pub fn with_mode(mut self, mode: Option<String>) -> Self {
        self.mode_override = mode;
        self
    }

    pub fn with_monitor_limit(mut self, limit: Option<usize>) -> Self {
        self.monitor_limit = limit;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load, retrying failures until `limit` is exhausted.
    /// The operator may be fixing the file while we wait.
    pub fn load_with_retry(
        &self,
        limit: RetryLimit,
        interval: Duration,
    ) -> Result<ConfigSnapshot, ConfigError> {
        let mut retries: u32 = 0;
        loop {
            match self.load() {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => {
                    tlog!("[settings] {}", e);
                    retries = retries.saturating_add(1);
                    if limit.exceeded(retries) {
                        return Err(e);
                    }
                    pause(interval);
                }
            }
        }
    }
}

impl ConfigProvider for ConfigSource {
    fn load(&self) -> Result<ConfigSnapshot, ConfigError> {
        if !self.path.is_file() {
            return Err(ConfigError::NotFound(self.path.clone()));
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::Read {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        parse_config(
            &content,
            ConfigFormat::from_path(&self.path),
            self.mode_override.as_deref(),
            self.monitor_limit,
        )
    }
}

/// `<config dir>/tiltlink/tiltlink.toml`. Falls back to the working directory
/// when the platform has no config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tiltlink")
        .join(CONFIG_FILENAME)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
mode = "ONLY_XY"

[modes.DEFAULT]
sampling_rate = 20
stable_samples = 10
x_threshold = 0.9
y_threshold = 0.9
z_threshold = 0.75

[modes.ONLY_XY]
monitor = 2

[modes.ONLY_XY.orientation]
x_pos = "PORTRAIT"
x_neg = "PORTRAIT_FLIPPED"
y_pos = "LANDSCAPE"
y_neg = "LANDSCAPE_FLIPPED"

[modes.ONLY_XY.position]
x_pos = { x = 100, y = 200 }
flat = { x = 5 }
"#;

    fn parse(content: &str) -> Result<ConfigSnapshot, ConfigError> {
        parse_config(content, ConfigFormat::Toml, None, None)
    }

    #[test]
    fn test_parse_mode_inherits_defaults() {
        let snap = parse(SAMPLE).unwrap();
        assert_eq!(snap.mode, "ONLY_XY");
        assert_eq!(snap.sampling_rate, 20);
        assert_eq!(snap.stable_samples, 10);
        assert_eq!(snap.z_threshold, 0.75);
        assert_eq!(snap.monitor, Some(2));
        assert_eq!(snap.serial_port, "");
        assert_eq!(
            snap.slot(Axis::XPos),
            &AxisSlot {
                orientation: Some(ScreenOrientation::Portrait),
                x: Some(100),
                y: Some(200)
            }
        );
        assert_eq!(snap.slot(Axis::Flat).orientation, None);
        assert_eq!(snap.slot(Axis::Flat).x, Some(5));
        assert_eq!(snap.slot(Axis::Flat).y, None);
        assert_eq!(snap.display_program, DEFAULT_DISPLAY_PROGRAM);
        assert_eq!(snap.retry_limit(), RetryLimit::UNBOUNDED);
    }

    #[test]
    fn test_position_inherits_each_coordinate() {
        let content = r#"
mode = "WIDE"

[modes.DEFAULT]
sampling_rate = 20
stable_samples = 10
x_threshold = 0.9
y_threshold = 0.9
z_threshold = 0.75

[modes.DEFAULT.position]
x_pos = { x = 0, y = 0 }
y_pos = { x = 10, y = 20 }

[modes.WIDE.position]
x_pos = { x = 1920 }
x_neg = { y = 7 }
"#;
        let snap = parse(content).unwrap();
        assert_eq!((snap.slot(Axis::XPos).x, snap.slot(Axis::XPos).y), (Some(1920), Some(0)));
        assert_eq!((snap.slot(Axis::YPos).x, snap.slot(Axis::YPos).y), (Some(10), Some(20)));
        assert_eq!((snap.slot(Axis::XNeg).x, snap.slot(Axis::XNeg).y), (None, Some(7)));

        let request = crate::session::resolve_event(Axis::XPos, &snap).unwrap();
        assert_eq!(request.position_arg().as_deref(), Some("1920 0"));
    }

    #[test]
    fn test_mode_override() {
        let snap = parse_config(SAMPLE, ConfigFormat::Toml, Some("DEFAULT"), None).unwrap();
        assert_eq!(snap.mode, "DEFAULT");
        assert_eq!(snap.monitor, None);
        assert_eq!(snap.slot(Axis::XPos), &AxisSlot::default());
    }

    #[test]
    fn test_unknown_mode_lists_valid_modes() {
        let err = parse_config(SAMPLE, ConfigFormat::Toml, Some("NOPE"), None).unwrap_err();
        match err {
            ConfigError::UnknownMode { mode, valid } => {
                assert_eq!(mode, "NOPE");
                assert!(valid.contains(&"ONLY_XY".to_string()));
                assert!(valid.contains(&"DEFAULT".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_every_problem_is_reported() {
        let content = r#"
[modes.DEFAULT]
sampling_rate = 0
x_threshold = 1.5
y_threshold = 0.5
z_threshold = -0.1
monitor = 0

[modes.DEFAULT.orientation]
x_pos = "SIDEWAYS"
"#;
        let err = parse(content).unwrap_err();
        let ConfigError::Invalid { mode, problems } = err else {
            panic!("expected Invalid");
        };
        assert_eq!(mode, "DEFAULT");
        assert_eq!(problems.len(), 6, "{:?}", problems);
        assert!(problems.iter().any(|p| p.contains("sampling_rate")));
        assert!(problems.iter().any(|p| p.contains("stable_samples is missing")));
        assert!(problems.iter().any(|p| p.contains("x_threshold")));
        assert!(problems.iter().any(|p| p.contains("z_threshold")));
        assert!(problems.iter().any(|p| p.contains("Monitor")));
        assert!(problems.iter().any(|p| p.contains("SIDEWAYS")));
    }

    #[test]
    fn test_threshold_bounds_are_inclusive() {
        let content = r#"
[modes.DEFAULT]
sampling_rate = 1
stable_samples = 1
x_threshold = 0.0
y_threshold = 1.0
z_threshold = 1
"#;
        let snap = parse(content).unwrap();
        assert_eq!(snap.x_threshold, 0.0);
        assert_eq!(snap.y_threshold, 1.0);
        assert_eq!(snap.z_threshold, 1.0);
    }

    #[test]
    fn test_monitor_limit() {
        assert!(parse_config(SAMPLE, ConfigFormat::Toml, None, Some(2)).is_ok());
        let err = parse_config(SAMPLE, ConfigFormat::Toml, None, Some(1)).unwrap_err();
        assert!(err.to_string().contains("between 1 and 1"));
    }

    #[test]
    fn test_type_errors_are_parse_errors() {
        let err = parse("[modes.DEFAULT]\nsampling_rate = \"fast\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_json_format() {
        let content = r#"{
            "mode": "DESK",
            "retry_limit": 3,
            "device_names": ["Pico"],
            "modes": {
                "DESK": {
                    "serial_port": "COM4",
                    "sampling_rate": 50,
                    "stable_samples": 4,
                    "x_threshold": 0.8,
                    "y_threshold": 0.8,
                    "z_threshold": 0.8,
                    "orientation": { "y_neg": "LANDSCAPE" }
                }
            }
        }"#;
        let snap = parse_config(content, ConfigFormat::Json, None, None).unwrap();
        assert_eq!(snap.serial_port, "COM4");
        assert_eq!(snap.retry_limit(), RetryLimit::bounded(3));
        assert_eq!(snap.device_names, vec!["Pico".to_string()]);
        assert_eq!(
            snap.slot(Axis::YNeg).orientation,
            Some(ScreenOrientation::Landscape)
        );
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/b.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a/b.JSON")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a/b.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), ConfigFormat::Toml);
    }

    #[test]
    fn test_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = ConfigSource::new(dir.path().join("missing.toml"));
        assert!(matches!(source.load(), Err(ConfigError::NotFound(_))));

        let err = source
            .load_with_retry(RetryLimit::bounded(2), Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_source_loads_file_and_applies_mode() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let source = ConfigSource::new(file.path()).with_mode(Some("DEFAULT".to_string()));
        let snap = source
            .load_with_retry(RetryLimit::bounded(0), Duration::ZERO)
            .unwrap();
        assert_eq!(snap.mode, "DEFAULT");
        assert_eq!(source.path(), file.path());
    }

    #[test]
    fn test_default_config_path_file_name() {
        assert!(default_config_path().ends_with("tiltlink/tiltlink.toml"));
    }

    #[test]
    fn test_example_config_is_valid() {
        let content = include_str!("../tiltlink.example.toml");
        let snap = parse_config(content, ConfigFormat::Toml, None, None).unwrap();
        assert_eq!(snap.mode, "ONLY_XY");
        assert_eq!(snap.slot(Axis::XPos).orientation, Some(ScreenOrientation::Portrait));
        assert_eq!(snap.slot(Axis::YPos).orientation, None);
        assert_eq!(snap.retry_limit(), RetryLimit::UNBOUNDED);

        let desk = parse_config(content, ConfigFormat::Toml, Some("DESK"), None).unwrap();
        assert_eq!(desk.slot(Axis::XNeg).x, Some(1920));
        assert_eq!(desk.slot(Axis::YNeg).orientation, Some(ScreenOrientation::Landscape));
    }
}
