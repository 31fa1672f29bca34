//! Expanding a frame's color entries into concrete LED ranges.
//!
//! A literal entry is already a range. A dynamic entry names a generator,
//! optionally followed by comma-separated flags (`"cpu,rev"`), and the
//! generator decides the ranges each time the frame is shown:
//!
//! | name     | output                                                   |
//! |----------|----------------------------------------------------------|
//! | `cpu`    | meter filled by CPU load (red) over the rest (cyan)      |
//! | `ram`    | same, driven by memory usage                             |
//! | `random` | one random color per LED, channels in `64..=255`         |
//!
//! Unknown names expand to nothing. Generators live in a
//! [`GeneratorRegistry`], so new ones can be added without touching the
//! resolver.
//!
//! ## Rust concepts
//! - Trait objects (`Box<dyn Generator>`) in a name-keyed table
//! - Splitting borrows of struct fields (`&self.registry` next to
//!   `&mut self.metrics`)

use crate::Color;
use crate::config::ColorEntry;
use crate::metrics::{MetricProvider, RandomSource};
use std::collections::HashMap;
use std::ops::Range;

/// Color of the filled part of a meter.
pub const METER_FILLED: Color = Color::new(255, 0, 0);
/// Color of the remainder of a meter.
pub const METER_EMPTY: Color = Color::new(0, 255, 255);

/// Absolute LEDs `[begin, end)` set to one color.
///
/// Bounds are signed because out-of-range fractions are passed through
/// unchecked; `begin >= end` is simply empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedRange {
    pub begin: i64,
    pub end: i64,
    pub color: Color,
}

impl LedRange {
    pub fn new(begin: i64, end: i64, color: Color) -> Self {
        Self { begin, end, color }
    }

    /// LED indices covered, in ascending order.
    pub fn leds(&self) -> Range<i64> {
        self.begin..self.end
    }

    pub fn len(&self) -> usize {
        usize::try_from(self.end.saturating_sub(self.begin)).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Generators ───────────────────────────────────────────────────────

/// Live inputs a generator may draw on.
pub struct Sources<'a> {
    pub metrics: &'a mut dyn MetricProvider,
    pub rng: &'a mut dyn RandomSource,
}

/// Expands a dynamic entry over `[begin, end)`.
///
/// Called afresh on every frame change; implementations must not cache.
pub trait Generator {
    fn generate(
        &self,
        begin: i64,
        end: i64,
        flags: &[&str],
        sources: &mut Sources<'_>,
    ) -> Vec<LedRange>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Cpu,
    Ram,
}

/// Bar meter showing a system metric as a filled fraction of the range.
///
/// The `rev` flag grows the fill from the end of the range instead of the
/// beginning. Always yields two ranges, filled first; either may be empty.
#[derive(Clone, Copy, Debug)]
pub struct MeterGenerator {
    metric: Metric,
}

impl MeterGenerator {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }
}

impl Generator for MeterGenerator {
    fn generate(
        &self,
        begin: i64,
        end: i64,
        flags: &[&str],
        sources: &mut Sources<'_>,
    ) -> Vec<LedRange> {
        let value = match self.metric {
            Metric::Cpu => sources.metrics.cpu_percent(),
            Metric::Ram => sources.metrics.ram_percent(),
        };
        let value = if value.is_finite() {
            value.clamp(0.0, 100.0)
        } else {
            0.0
        };

        let len = end.saturating_sub(begin).max(0);
        let filled = ((len as f64 * value / 100.0).round() as i64).clamp(0, len);

        if flags.contains(&"rev") {
            let split = end - filled;
            vec![
                LedRange::new(split, end, METER_FILLED),
                LedRange::new(begin, split, METER_EMPTY),
            ]
        } else {
            let split = begin + filled;
            vec![
                LedRange::new(begin, split, METER_FILLED),
                LedRange::new(split, end, METER_EMPTY),
            ]
        }
    }
}

/// One independently random color per LED.
#[derive(Clone, Copy, Debug)]
pub struct RandomGenerator {
    min: u8,
    max: u8,
}

impl RandomGenerator {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    fn channel(&self, rng: &mut dyn RandomSource) -> u8 {
        let v = rng.uniform_int(i64::from(self.min), i64::from(self.max));
        u8::try_from(v.clamp(0, 255)).unwrap_or(self.min)
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new(64, 255)
    }
}

impl Generator for RandomGenerator {
    fn generate(
        &self,
        begin: i64,
        end: i64,
        _flags: &[&str],
        sources: &mut Sources<'_>,
    ) -> Vec<LedRange> {
        (begin..end)
            .map(|led| {
                let r = self.channel(sources.rng);
                let g = self.channel(sources.rng);
                let b = self.channel(sources.rng);
                LedRange::new(led, led + 1, Color::new(r, g, b))
            })
            .collect()
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Name-keyed table of dynamic generators.
#[derive(Default)]
pub struct GeneratorRegistry {
    table: HashMap<String, Box<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `cpu`, `ram` and `random`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("cpu", MeterGenerator::new(Metric::Cpu));
        registry.register("ram", MeterGenerator::new(Metric::Ram));
        registry.register("random", RandomGenerator::default());
        registry
    }

    /// Add a generator, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, generator: impl Generator + 'static) {
        self.table.insert(name.into(), Box::new(generator));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Generator> {
        self.table.get(name).map(|g| g.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ── Resolver ─────────────────────────────────────────────────────────

/// Turns color entries into LED ranges, owning the generator inputs.
pub struct SpecResolver {
    registry: GeneratorRegistry,
    metrics: Box<dyn MetricProvider>,
    rng: Box<dyn RandomSource>,
}

impl SpecResolver {
    pub fn new(metrics: impl MetricProvider + 'static, rng: impl RandomSource + 'static) -> Self {
        Self::with_registry(GeneratorRegistry::with_builtins(), metrics, rng)
    }

    pub fn with_registry(
        registry: GeneratorRegistry,
        metrics: impl MetricProvider + 'static,
        rng: impl RandomSource + 'static,
    ) -> Self {
        Self {
            registry,
            metrics: Box::new(metrics),
            rng: Box::new(rng),
        }
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut GeneratorRegistry {
        &mut self.registry
    }

    /// Expand `entry` over the absolute LED bounds `[begin, end)`.
    ///
    /// The entry's own fractions are ignored; the caller has already scaled
    /// them to the loop.
    pub fn resolve(&mut self, begin: i64, end: i64, entry: &ColorEntry) -> Vec<LedRange> {
        match entry {
            ColorEntry::Literal { color, .. } => vec![LedRange::new(begin, end, *color)],
            ColorEntry::Dynamic { spec, .. } => {
                let mut tokens = spec.split(',').map(str::trim);
                let name = tokens.next().unwrap_or_default();
                let flags: Vec<&str> = tokens.collect();

                let Some(generator) = self.registry.get(name) else {
                    tracing::debug!("Unknown color spec {:?}, skipping", spec);
                    return Vec::new();
                };

                let mut sources = Sources {
                    metrics: self.metrics.as_mut(),
                    rng: self.rng.as_mut(),
                };
                generator.generate(begin, end, &flags, &mut sources)
            }
        }
    }
}
