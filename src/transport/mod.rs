//! Command transport surface and per-device-type registry
//!
//! The pool never drives instruments itself. Once a device is selected, the
//! caller obtains a command-line transport for it (SSH, serial, telnet —
//! implemented elsewhere) through this narrow capability trait. The registry
//! is an explicit table from device `type` tag to transport constructor,
//! owned and populated by the caller; there is no implicit global state.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::topology::Device;

/// Error types for transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Disconnected")]
    Disconnected,

    #[error("Timeout")]
    Timeout,

    #[error("No transport registered for device type {0}")]
    UnknownDeviceType(String),
}

/// A blocking command-line session with one device.
pub trait CommandLine {
    fn connect(&mut self) -> Result<(), TransportError>;

    fn disconnect(&mut self) -> Result<(), TransportError>;

    fn send(&mut self, data: &str) -> Result<(), TransportError>;

    /// Send `data` and block until the output contains `wait_for`, or fail
    /// with `Timeout`.
    fn send_and_wait(
        &mut self,
        data: &str,
        wait_for: &str,
        timeout: Duration,
    ) -> Result<String, TransportError>;

    fn receive(&mut self) -> Result<String, TransportError>;

    fn send_binary(&mut self, data: &[u8]) -> Result<(), TransportError>;

    fn receive_binary(&mut self) -> Result<Vec<u8>, TransportError>;
}

/// Constructor for a transport, given the selected device's record.
pub type TransportBuilder = Box<dyn Fn(&Device) -> Result<Box<dyn CommandLine>, TransportError>>;

/// Explicit registration table mapping device `type` tags to transport
/// constructors.
#[derive(Default)]
pub struct TransportRegistry {
    builders: HashMap<String, TransportBuilder>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for a device type tag, replacing any previous
    /// registration for the same tag.
    pub fn register(
        &mut self,
        device_type: &str,
        builder: impl Fn(&Device) -> Result<Box<dyn CommandLine>, TransportError> + 'static,
    ) {
        self.builders
            .insert(device_type.to_string(), Box::new(builder));
    }

    /// Build a transport for the selected device, keyed by its `type` tag.
    pub fn create(&self, device: &Device) -> Result<Box<dyn CommandLine>, TransportError> {
        let tag = device.device_type.as_deref().unwrap_or("");
        match self.builders.get(tag) {
            Some(builder) => builder(device),
            None => Err(TransportError::UnknownDeviceType(tag.to_string())),
        }
    }
}
