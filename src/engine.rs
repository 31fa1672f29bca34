//! Animation engine: turns elapsed time into firmware commands.
//!
//! Each tick feeds the elapsed time to both loops' schedulers. For every
//! loop whose frame changed, the frame's entries are scaled to LED indices,
//! expanded by the [`SpecResolver`], and written out one `COL` line per LED.
//! A single `SHOW` closes the tick if anything was written.
//!
//! ## Rust concepts
//! - `impl Display` for the wire format
//! - Disjoint field borrows: a frame borrowed from `self.loops` while
//!   `self.resolver` is mutated

use crate::config::{ColorConfig, Frame, LoopConfig};
use crate::scheduler::FrameScheduler;
use crate::spec::SpecResolver;
use crate::{Color, Ring};
use std::fmt;

// ── Commands ─────────────────────────────────────────────────────────

/// A line of the firmware protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// `COL {loop} {led} {r} {g} {b}`
    SetLed { ring: Ring, led: i64, color: Color },
    /// `SHOW`: latch everything written since the last show.
    Show,
}

impl Command {
    /// The newline-terminated ASCII line sent over the wire.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetLed { ring, led, color } => {
                write!(f, "COL {} {} {}", ring.index(), led, color)
            }
            Command::Show => f.write_str("SHOW"),
        }
    }
}

// ── Engine ───────────────────────────────────────────────────────────

struct LoopSlot {
    ring: Ring,
    layout: LoopConfig,
    scheduler: FrameScheduler,
}

pub struct AnimationEngine {
    loops: [LoopSlot; 2],
    resolver: SpecResolver,
}

impl AnimationEngine {
    pub fn new(
        inner: LoopConfig,
        outer: LoopConfig,
        colors: ColorConfig,
        resolver: SpecResolver,
    ) -> Self {
        let ColorConfig {
            inner: inner_program,
            outer: outer_program,
        } = colors;

        Self {
            loops: [
                LoopSlot {
                    ring: Ring::Inner,
                    layout: inner,
                    scheduler: FrameScheduler::new(inner_program),
                },
                LoopSlot {
                    ring: Ring::Outer,
                    layout: outer,
                    scheduler: FrameScheduler::new(outer_program),
                },
            ],
            resolver,
        }
    }

    pub fn scheduler(&self, ring: Ring) -> &FrameScheduler {
        &self.loops[ring as usize].scheduler
    }

    /// Advance both loops by `elapsed_ms` and return the commands to send,
    /// in order. Empty when neither loop changed frame.
    pub fn tick(&mut self, elapsed_ms: u64) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut updated = false;

        for slot in &mut self.loops {
            let Some(frame) = slot.scheduler.tick(elapsed_ms) else {
                continue;
            };
            tracing::debug!("Update group {}", slot.ring.index());
            updated = true;
            render_frame(
                &mut self.resolver,
                slot.ring,
                slot.layout.count,
                frame,
                &mut commands,
            );
        }

        if updated {
            tracing::debug!("Update LED");
            commands.push(Command::Show);
        }
        commands
    }
}

/// Scale a fraction of the loop to an LED index, truncating toward zero.
///
/// The result is kept within `-count..=2 * count` so a wild fraction yields
/// a bounded burst instead of billions of commands.
fn led_index(fraction: f64, count: u32) -> i64 {
    let count = i64::from(count);
    let scaled = (fraction * count as f64) as i64;
    scaled.clamp(-count, 2 * count)
}

fn render_frame(
    resolver: &mut SpecResolver,
    ring: Ring,
    count: u32,
    frame: &Frame,
    out: &mut Vec<Command>,
) {
    for entry in &frame.colors {
        let (begin, end) = entry.bounds();
        let begin = led_index(begin, count);
        let end = led_index(end, count);

        for range in resolver.resolve(begin, end, entry) {
            tracing::debug!(
                "Set LED {} - {} to ({}, {}, {})",
                range.begin,
                range.end,
                range.color.r,
                range.color.g,
                range.color.b
            );
            out.extend(range.leds().map(|led| Command::SetLed {
                ring,
                led,
                color: range.color,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColorEntry, default_program};
    use crate::metrics::SplitMix64;
    use crate::spec::tests::FixedMetrics;
    use crate::spec::{METER_EMPTY, METER_FILLED};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn layout(count: u32) -> LoopConfig {
        LoopConfig {
            count,
            ..LoopConfig::default()
        }
    }

    fn engine(inner: Vec<Frame>, outer: Vec<Frame>, count: u32) -> AnimationEngine {
        AnimationEngine::new(
            layout(count),
            layout(count),
            ColorConfig { inner, outer },
            SpecResolver::new(FixedMetrics::new(50.0, 25.0), SplitMix64::new(3)),
        )
    }

    fn set(ring: Ring, led: i64, r: u8, g: u8, b: u8) -> Command {
        Command::SetLed {
            ring,
            led,
            color: Color::new(r, g, b),
        }
    }

    #[rstest]
    #[case(set(Ring::Inner, 7, 255, 0, 0), "COL 0 7 255 0 0\n")]
    #[case(set(Ring::Outer, 29, 0, 128, 255), "COL 1 29 0 128 255\n")]
    #[case(Command::Show, "SHOW\n")]
    fn wire_format(#[case] command: Command, #[case] line: &str) {
        assert_eq!(command.to_line(), line);
    }

    #[test]
    fn half_ring_literal_on_sixteen_leds() {
        let frame = Frame::new(1000, vec![ColorEntry::literal(0.0, 0.5, 255, 0, 0)]);
        let other = Frame::new(1000, Vec::new());
        let mut e = engine(vec![frame], vec![other], 16);

        let commands = e.tick(1000);
        let mut expected: Vec<Command> = (0..8).map(|i| set(Ring::Inner, i, 255, 0, 0)).collect();
        expected.push(Command::Show);
        assert_eq!(commands, expected);
    }

    #[test]
    fn nothing_is_sent_between_frame_changes() {
        let frame = Frame::new(100, vec![ColorEntry::literal(0.0, 1.0, 1, 2, 3)]);
        let mut e = engine(vec![frame.clone()], vec![frame], 4);

        assert_eq!(e.tick(10).len(), 4 + 4 + 1);
        for _ in 0..9 {
            assert!(e.tick(10).is_empty());
        }
        assert_eq!(e.tick(10).len(), 9);
    }

    #[test]
    fn both_loops_share_one_show_at_the_end() {
        let inner = Frame::new(100, vec![ColorEntry::literal(0.0, 0.5, 1, 1, 1)]);
        let outer = Frame::new(100, vec![ColorEntry::literal(0.5, 1.0, 2, 2, 2)]);
        let mut e = engine(vec![inner], vec![outer], 4);

        assert_eq!(
            e.tick(10),
            vec![
                set(Ring::Inner, 0, 1, 1, 1),
                set(Ring::Inner, 1, 1, 1, 1),
                set(Ring::Outer, 2, 2, 2, 2),
                set(Ring::Outer, 3, 2, 2, 2),
                Command::Show,
            ]
        );
    }

    #[test]
    fn loops_advance_independently() {
        let fast = Frame::new(20, vec![ColorEntry::literal(0.0, 1.0, 9, 9, 9)]);
        let slow = Frame::new(40, vec![ColorEntry::literal(0.0, 1.0, 7, 7, 7)]);
        let mut e = engine(vec![fast], vec![slow], 1);

        e.tick(10);
        assert!(e.tick(10).is_empty());
        assert_eq!(e.tick(10), vec![set(Ring::Inner, 0, 9, 9, 9), Command::Show]);
        assert!(e.tick(10).is_empty());
        assert_eq!(
            e.tick(10),
            vec![
                set(Ring::Inner, 0, 9, 9, 9),
                set(Ring::Outer, 0, 7, 7, 7),
                Command::Show
            ]
        );
    }

    #[test]
    fn entries_keep_their_order_and_leds_ascend() {
        let frame = Frame::new(
            100,
            vec![
                ColorEntry::literal(0.5, 1.0, 2, 2, 2),
                ColorEntry::literal(0.0, 0.5, 1, 1, 1),
            ],
        );
        let mut e = engine(vec![frame], vec![Frame::default()], 4);

        assert_eq!(
            e.tick(10),
            vec![
                set(Ring::Inner, 2, 2, 2, 2),
                set(Ring::Inner, 3, 2, 2, 2),
                set(Ring::Inner, 0, 1, 1, 1),
                set(Ring::Inner, 1, 1, 1, 1),
                Command::Show,
            ]
        );
    }

    #[test]
    fn fractions_truncate_instead_of_rounding() {
        // 0.3 * 10 = 3, 0.69 * 10 = 6.9 -> 6
        let frame = Frame::new(100, vec![ColorEntry::literal(0.3, 0.69, 5, 5, 5)]);
        let mut e = engine(vec![frame], vec![Frame::default()], 10);

        let leds: Vec<i64> = e
            .tick(10)
            .into_iter()
            .filter_map(|c| match c {
                Command::SetLed { led, .. } => Some(led),
                Command::Show => None,
            })
            .collect();
        assert_eq!(leds, vec![3, 4, 5]);
    }

    #[test]
    fn dynamic_entries_expand_per_led() {
        let frame = Frame::new(100, vec![ColorEntry::dynamic(0.0, 1.0, "cpu,rev")]);
        let mut e = engine(vec![frame], vec![Frame::default()], 4);

        let c = |led, color: Color| Command::SetLed {
            ring: Ring::Inner,
            led,
            color,
        };
        assert_eq!(
            e.tick(10),
            vec![
                c(2, METER_FILLED),
                c(3, METER_FILLED),
                c(0, METER_EMPTY),
                c(1, METER_EMPTY),
                Command::Show,
            ]
        );
    }

    #[test]
    fn unknown_and_degenerate_entries_only_show() {
        let frame = Frame::new(
            100,
            vec![
                ColorEntry::dynamic(0.0, 1.0, "glow"),
                ColorEntry::literal(0.9, 0.1, 1, 1, 1),
                ColorEntry::literal(0.5, 0.52, 1, 1, 1),
                ColorEntry::literal(f64::NAN, f64::NAN, 1, 1, 1),
            ],
        );
        let mut e = engine(vec![frame], vec![Frame::default()], 16);
        assert_eq!(e.tick(10), vec![Command::Show]);
    }

    #[test]
    fn out_of_range_fractions_pass_through() {
        let frame = Frame::new(100, vec![ColorEntry::literal(-0.25, 0.0, 3, 3, 3)]);
        let mut e = engine(vec![frame], vec![Frame::default()], 8);

        assert_eq!(
            e.tick(10),
            vec![
                set(Ring::Inner, -2, 3, 3, 3),
                set(Ring::Inner, -1, 3, 3, 3),
                Command::Show,
            ]
        );
    }

    fn led_indices(commands: &[Command]) -> Vec<i64> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::SetLed { led, .. } => Some(*led),
                Command::Show => None,
            })
            .collect()
    }

    #[rstest]
    #[case(0.0, 1e300, (0..8).collect())]
    #[case(0.0, 1e9, (0..8).collect())]
    #[case(-1e300, 0.0, (-4..0).collect())]
    #[case(f64::INFINITY, f64::INFINITY, Vec::new())]
    fn huge_fractions_stay_near_the_loop(
        #[case] begin: f64,
        #[case] end: f64,
        #[case] expected: Vec<i64>,
    ) {
        let frame = Frame::new(100, vec![ColorEntry::literal(begin, end, 1, 2, 3)]);
        let mut e = engine(vec![frame], vec![Frame::default()], 4);

        let commands = e.tick(10);
        assert_eq!(led_indices(&commands), expected);
        assert_eq!(commands.last(), Some(&Command::Show));
    }

    #[test]
    fn random_over_huge_fraction_is_bounded() {
        let frame = Frame::new(100, vec![ColorEntry::dynamic(0.0, 1e300, "random")]);
        let mut e = engine(vec![frame], vec![Frame::default()], 4);

        let commands = e.tick(10);
        assert_eq!(led_indices(&commands), (0..8).collect::<Vec<i64>>());
    }

    #[test]
    fn empty_program_behaves_like_the_default() {
        let mut defaulted = engine(Vec::new(), Vec::new(), 12);
        let mut explicit = engine(default_program().to_vec(), default_program().to_vec(), 12);

        for _ in 0..350 {
            assert_eq!(defaulted.tick(10), explicit.tick(10));
        }
        assert!(defaulted.scheduler(Ring::Inner).is_default());
        assert!(!explicit.scheduler(Ring::Outer).is_default());
    }

    #[test]
    fn default_program_starts_on_its_second_frame() {
        let mut e = engine(Vec::new(), Vec::new(), 4);
        let commands = e.tick(10);

        // Second default frame, first band: yellow
        assert_eq!(commands[0], set(Ring::Inner, 0, 255, 255, 0));
        assert_eq!(e.scheduler(Ring::Inner).state().frame_index, 1);
        assert_eq!(commands.len(), 4 + 4 + 1);
    }
}
