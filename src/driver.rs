//! Driver loop: keeps the link up and feeds it animation commands.
//!
//! The loop is a two-state machine. While disconnected, each step makes one
//! connection attempt and waits the slow reconnect interval. While
//! connected, each step ticks the engine by the animation interval and
//! sends whatever it produced. A failed send drops back to disconnected.

use crate::config::SerialConfig;
use crate::engine::AnimationEngine;
use crate::is_running;
use crate::transport::CommandSink;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

pub struct Driver<S> {
    engine: AnimationEngine,
    sink: S,
    state: LinkState,
    update_wait: Duration,
    reconn_wait: Duration,
}

impl<S: CommandSink> Driver<S> {
    pub fn new(engine: AnimationEngine, sink: S, serial: &SerialConfig) -> Self {
        let state = if sink.is_connected() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        };

        Self {
            engine,
            sink,
            state,
            update_wait: Duration::from_millis(serial.update_wait),
            reconn_wait: Duration::from_millis(serial.reconn_wait),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run one step and return how long to wait before the next.
    pub async fn step(&mut self) -> Duration {
        match self.state {
            LinkState::Disconnected => {
                match self.sink.connect().await {
                    Ok(()) => self.state = LinkState::Connected,
                    Err(e) => tracing::error!("{}", e),
                }
                self.reconn_wait
            }
            LinkState::Connected => {
                // Elapsed time is the nominal cadence, not wall-clock time.
                let elapsed = self.update_wait.as_millis() as u64;
                for command in self.engine.tick(elapsed) {
                    if let Err(e) = self.sink.send(&command).await {
                        tracing::error!("Send failed, reconnecting: {}", e);
                        self.sink.disconnect();
                        self.state = LinkState::Disconnected;
                        return self.reconn_wait;
                    }
                }
                self.update_wait
            }
        }
    }

    /// Step until `running` is cleared.
    pub async fn run(&mut self, running: &AtomicBool) {
        tracing::info!("Driver loop started");
        while is_running(running) {
            let wait = self.step().await;
            tokio::time::sleep(wait).await;
        }
        self.sink.disconnect();
        tracing::info!("Driver loop stopped");
    }
}
