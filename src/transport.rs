//! The link to the microcontroller.
//!
//! [`CommandSink`] is what the driver loop talks to. [`SerialLink`] is the
//! real implementation over a serial port (feature `serial`, on by
//! default); tests use an in-memory sink instead.
//!
//! ## Rust concepts
//! - `async fn` in traits for a statically dispatched sink
//! - `Option<T>` to model an open-or-closed resource

use crate::engine::Command;
use crate::error::TransportError;

/// Accepts firmware commands and owns the connection they travel over.
#[allow(async_fn_in_trait)]
pub trait CommandSink {
    fn is_connected(&self) -> bool;

    /// Try to (re)open the connection.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Write one command line. A failure leaves the sink disconnected.
    async fn send(&mut self, command: &Command) -> Result<(), TransportError>;

    /// Close the connection, if any.
    fn disconnect(&mut self);
}

#[cfg(feature = "serial")]
pub use serial::SerialLink;

#[cfg(feature = "serial")]
mod serial {
    use super::CommandSink;
    use crate::config::SerialConfig;
    use crate::engine::Command;
    use crate::error::TransportError;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio_serial::{SerialPortBuilderExt, SerialStream};

    /// Serial connection that can be dropped and reopened.
    pub struct SerialLink {
        config: SerialConfig,
        port: Option<SerialStream>,
    }

    impl SerialLink {
        pub fn new(config: SerialConfig) -> Self {
            Self { config, port: None }
        }

        /// The configured port, or the first one the system reports.
        fn pick_port(&self) -> Option<String> {
            if let Some(port) = &self.config.port {
                return Some(port.clone());
            }

            match tokio_serial::available_ports() {
                Ok(ports) => ports.into_iter().next().map(|p| p.port_name),
                Err(e) => {
                    tracing::warn!("Could not list serial ports: {}", e);
                    None
                }
            }
        }
    }

    impl CommandSink for SerialLink {
        fn is_connected(&self) -> bool {
            self.port.is_some()
        }

        async fn connect(&mut self) -> Result<(), TransportError> {
            let port = self.pick_port().ok_or(TransportError::NoPort)?;

            tracing::info!("Connecting to: {}", port);
            let stream = tokio_serial::new(&port, self.config.baudrate)
                .timeout(Duration::from_secs(1))
                .open_native_async()
                .map_err(|e| TransportError::Open {
                    port: port.clone(),
                    reason: e.to_string(),
                })?;

            tracing::info!("Connected to {} at {} baud", port, self.config.baudrate);
            self.port = Some(stream);
            Ok(())
        }

        async fn send(&mut self, command: &Command) -> Result<(), TransportError> {
            let Some(port) = self.port.as_mut() else {
                return Err(TransportError::NotConnected);
            };

            let line = command.to_line();
            let written = match port.write_all(line.as_bytes()).await {
                Ok(()) => port.flush().await,
                Err(e) => Err(e),
            };

            if let Err(e) = written {
                // Reopen on the next connect attempt
                self.port = None;
                return Err(e.into());
            }
            Ok(())
        }

        fn disconnect(&mut self) {
            if self.port.take().is_some() {
                tracing::info!("Serial port closed");
            }
        }
    }

}
