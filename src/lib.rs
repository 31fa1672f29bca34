//! Animation engine and serial driver for a two-loop addressable LED ring.
//!
//! The ring has an inner and an outer loop of LEDs. Each loop cycles through
//! its own sequence of timed color frames, and every frame change is sent to
//! the microcontroller as a burst of `COL` lines followed by `SHOW`.
//!
//! This module holds the types shared by everything else:
//! - `Color` and `Ring` (which loop a command addresses)
//! - Signal handling for clean shutdown
//!
//! It also re-exports the engine, configuration and transport modules used
//! by the main binary.

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod scheduler;
pub mod spec;
pub mod transport;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Color ──────────────────────────────────────────────────────────

/// An 8-bit RGB triple, as understood by the LED firmware.
///
/// # Rust concept: derive macros
/// `Clone, Copy` make this cheaply copyable (it's just three bytes).
/// `Serialize, Deserialize` let it appear directly in JSON config files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    /// Formats as the firmware expects: three space-separated decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.r, self.g, self.b)
    }
}

// ── Ring ───────────────────────────────────────────────────────────

/// One of the two concentric LED loops.
///
/// The discriminant is the loop index used on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ring {
    Inner = 0,
    Outer = 1,
}

impl Ring {
    /// Both loops, in the order the engine updates them.
    pub const ALL: [Ring; 2] = [Ring::Inner, Ring::Outer];

    /// Index sent in `COL` commands.
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ring::Inner => f.write_str("inner"),
            Ring::Outer => f.write_str("outer"),
        }
    }
}

// ── Shutdown ───────────────────────────────────────────────────────

/// Set up a Ctrl+C handler that sets `running` to false.
///
/// # Rust concept: Arc and AtomicBool
/// The flag is shared between the driver loop and the signal handler.
/// `Arc` lets both own it, and `AtomicBool` makes the single bool
/// thread-safe without a mutex.
pub fn setup_signal_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone(); // Clone the Arc, not the bool

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    Ok(running)
}

/// Check if the driver loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────
