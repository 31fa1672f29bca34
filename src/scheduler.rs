//! Per-loop frame timing.
//!
//! A scheduler walks its program forever: each frame stays active for its
//! `duration`, then the next one (wrapping) takes over. The state starts at
//! zero remaining time on index 0, so the very first tick advances straight
//! to index 1 and frame 0 is shown only after the sequence wraps.

use crate::config::{Frame, default_program};
use std::borrow::Cow;

/// Where a loop is in its program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationState {
    /// Milliseconds until the next advance; `<= 0` means due.
    pub remaining_ms: i64,
    pub frame_index: usize,
}

pub struct FrameScheduler {
    program: Cow<'static, [Frame]>,
    state: AnimationState,
}

impl FrameScheduler {
    /// An empty program is replaced by the shared default program.
    pub fn new(program: Vec<Frame>) -> Self {
        let program = if program.is_empty() {
            Cow::Borrowed(default_program())
        } else {
            Cow::Owned(program)
        };

        Self {
            program,
            state: AnimationState::default(),
        }
    }

    pub fn program(&self) -> &[Frame] {
        &self.program
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// True when running the built-in default program.
    pub fn is_default(&self) -> bool {
        matches!(self.program, Cow::Borrowed(_))
    }

    /// Let `elapsed_ms` pass. Returns the newly active frame when the
    /// current one has run out, `None` otherwise.
    ///
    /// At most one advance happens per call, however far the remaining
    /// time overshoots.
    pub fn tick(&mut self, elapsed_ms: u64) -> Option<&Frame> {
        let elapsed = i64::try_from(elapsed_ms).unwrap_or(i64::MAX);
        self.state.remaining_ms = self.state.remaining_ms.saturating_sub(elapsed);
        if self.state.remaining_ms > 0 {
            return None;
        }

        let index = (self.state.frame_index + 1) % self.program.len();
        let frame = &self.program[index];
        self.state = AnimationState {
            remaining_ms: i64::try_from(frame.duration).unwrap_or(i64::MAX),
            frame_index: index,
        };
        Some(frame)
    }
}
