//! Settings and color programs: the JSON data model and file persistence.
//!
//! Two files drive the process:
//! - the settings file (`Config`): serial link parameters and loop geometry
//! - the colors file (`ColorConfig`): one frame sequence per loop
//!
//! Missing files load as defaults, and the binary writes both back after
//! loading so the operator always has a complete template to edit.
//!
//! ## Rust concepts
//! - `#[serde(default)]` to fill in missing fields
//! - `#[serde(untagged)]` to accept two array shapes for one type
//! - `LazyLock` for a shared, immutable default value

use crate::Color;
use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

// ── Settings ─────────────────────────────────────────────────────────

/// Serial link parameters. Waits are in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port path; `None` picks the first detected port.
    pub port: Option<String>,
    pub baudrate: u32,
    /// Delay between connection attempts.
    pub reconn_wait: u64,
    /// Animation tick cadence.
    pub update_wait: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baudrate: 115_200,
            reconn_wait: 2000,
            update_wait: 10,
        }
    }
}

/// Geometry of one LED loop.
///
/// Only `count` matters to the animation; `offset` and `spacing` describe
/// the physical layout and are carried through untouched.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub count: u32,
    pub offset: f64,
    pub spacing: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            count: 30,
            offset: 0.0,
            spacing: 16.0,
        }
    }
}

/// Contents of the settings file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub diameter: f64,
    pub inner_loop: LoopConfig,
    pub outer_loop: LoopConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            diameter: 150.0,
            inner_loop: LoopConfig::default(),
            outer_loop: LoopConfig::default(),
        }
    }
}

// ── Color programs ───────────────────────────────────────────────────

/// One band of a frame, positioned by fractions of the loop length.
///
/// Rust concept: ENUMS WITH DATA
/// A literal band carries its color; a dynamic band carries a generator
/// spec such as `"cpu,rev"` that is expanded every time the frame is shown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub enum ColorEntry {
    Literal { begin: f64, end: f64, color: Color },
    Dynamic { begin: f64, end: f64, spec: String },
}

impl ColorEntry {
    pub fn literal(begin: f64, end: f64, r: u8, g: u8, b: u8) -> Self {
        Self::Literal {
            begin,
            end,
            color: Color::new(r, g, b),
        }
    }

    pub fn dynamic(begin: f64, end: f64, spec: impl Into<String>) -> Self {
        Self::Dynamic {
            begin,
            end,
            spec: spec.into(),
        }
    }

    /// The `(begin, end)` fractions of this band.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Self::Literal { begin, end, .. } | Self::Dynamic { begin, end, .. } => (*begin, *end),
        }
    }
}

/// On-disk shape: `[begin, end, r, g, b]` or `[begin, end, "spec"]`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Literal(f64, f64, u8, u8, u8),
    Dynamic(f64, f64, String),
}

impl From<RawEntry> for ColorEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Literal(begin, end, r, g, b) => Self::literal(begin, end, r, g, b),
            RawEntry::Dynamic(begin, end, spec) => Self::Dynamic { begin, end, spec },
        }
    }
}

impl From<ColorEntry> for RawEntry {
    fn from(entry: ColorEntry) -> Self {
        match entry {
            ColorEntry::Literal { begin, end, color } => {
                RawEntry::Literal(begin, end, color.r, color.g, color.b)
            }
            ColorEntry::Dynamic { begin, end, spec } => RawEntry::Dynamic(begin, end, spec),
        }
    }
}

/// One step of an animation: shown for `duration` milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub duration: u64,
    pub colors: Vec<ColorEntry>,
}

impl Frame {
    pub fn new(duration: u64, colors: Vec<ColorEntry>) -> Self {
        Self { duration, colors }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(1000, Vec::new())
    }
}

/// Contents of the colors file: one frame sequence per loop.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub inner: Vec<Frame>,
    pub outer: Vec<Frame>,
}

impl ColorConfig {
    /// Give every loop without frames a copy of the default program, so a
    /// saved file shows the operator what a program looks like.
    pub fn fill_defaults(&mut self) {
        for program in [&mut self.inner, &mut self.outer] {
            if program.is_empty() {
                program.extend_from_slice(default_program());
            }
        }
    }
}

static DEFAULT_PROGRAM: LazyLock<Vec<Frame>> = LazyLock::new(|| {
    vec![
        Frame::new(
            1000,
            vec![
                ColorEntry::literal(0.0, 0.25, 255, 255, 255),
                ColorEntry::literal(0.25, 0.5, 255, 255, 0),
                ColorEntry::literal(0.5, 0.75, 255, 0, 255),
                ColorEntry::literal(0.75, 1.0, 0, 255, 255),
            ],
        ),
        Frame::new(
            1000,
            vec![
                ColorEntry::literal(0.0, 0.25, 255, 255, 0),
                ColorEntry::literal(0.25, 0.5, 255, 0, 255),
                ColorEntry::literal(0.5, 0.75, 0, 255, 255),
                ColorEntry::literal(0.75, 1.0, 255, 255, 255),
            ],
        ),
    ]
});

/// Built-in two-frame animation used for any loop with an empty program.
pub fn default_program() -> &'static [Frame] {
    &DEFAULT_PROGRAM
}

// ── Persistence ──────────────────────────────────────────────────────

/// Load a JSON file, or return `T::default()` if it does not exist.
pub fn load_or_default<T>(path: &Path) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if !path.is_file() {
        tracing::debug!("{} not found, using defaults", path.display());
        return Ok(T::default());
    }

    let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| ConfigError::json(path, e))
}

/// Write `value` as 4-space indented JSON, creating parent directories.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| ConfigError::json(path, e))?;
    buf.push(b'\n');

    fs::write(path, buf).map_err(|e| ConfigError::io(path, e))
}
