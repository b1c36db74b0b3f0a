//! Equipment topology: devices, ports and their physical connections
//!
//! Devices own named ports; ports reference the ports they are wired to by
//! `{device, port}` name pairs rather than by nested objects, so the cyclic
//! connection graph serializes flat and is resolved by name lookup on
//! traversal.

pub mod attr;
pub mod device;
pub(crate) mod named_map;

pub use attr::AttrValue;
pub use device::{Device, Port, PortRef};

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::ResourceError;

/// The full equipment graph: an insertion-ordered collection of devices,
/// serialized as a name-keyed JSON map.
#[derive(Clone, Debug, Default)]
pub struct Topology {
    devices: Vec<Device>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device. Fails with `DuplicateName` if a device with the same
    /// name already exists.
    pub fn add_device(&mut self, device: Device) -> Result<&mut Device, ResourceError> {
        if self.devices.iter().any(|d| d.name == device.name) {
            return Err(ResourceError::DuplicateName(device.name));
        }
        self.devices.push(device);
        let last = self.devices.len() - 1;
        Ok(&mut self.devices[last])
    }

    /// Devices in insertion order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Look up a device by name.
    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    pub fn device_mut(&mut self, name: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.name == name)
    }

    /// Resolve a remote-port reference to the actual device and port.
    pub fn resolve(&self, reference: &PortRef) -> Option<(&Device, &Port)> {
        let device = self.device(&reference.device)?;
        let port = device.port(&reference.port)?;
        Some((device, port))
    }

    /// Wire two ports together by appending each endpoint to the other's
    /// remote list. Connections are symmetric by convention; this helper
    /// registers both directions. No port-type compatibility check is made —
    /// that is left to constraints.
    pub fn connect(
        &mut self,
        local: (&str, &str),
        remote: (&str, &str),
    ) -> Result<(), ResourceError> {
        for (device, port) in [local, remote] {
            let found = self
                .device(device)
                .map(|d| d.port(port).is_some())
                .unwrap_or(false);
            if !found {
                return Err(ResourceError::KeyNotFound {
                    device: device.to_string(),
                    port: port.to_string(),
                });
            }
        }
        self.append_remote(local, PortRef::new(remote.0, remote.1));
        self.append_remote(remote, PortRef::new(local.0, local.1));
        Ok(())
    }

    fn append_remote(&mut self, endpoint: (&str, &str), reference: PortRef) {
        if let Some(port) = self
            .device_mut(endpoint.0)
            .and_then(|d| d.port_mut(endpoint.1))
        {
            port.remote_ports.push(reference);
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Second resolution pass after deserialization: reject duplicate
    /// device/port names, require every remote-port reference to resolve,
    /// and normalize each port's `parent` back-reference to its owning
    /// device. A dangling reference is a hard error, never a skip.
    pub fn validate_links(&mut self) -> Result<(), ResourceError> {
        for i in 0..self.devices.len() {
            let name = self.devices[i].name.clone();
            if self.devices[i + 1..].iter().any(|d| d.name == name) {
                return Err(ResourceError::DuplicateName(name));
            }
            for j in 0..self.devices[i].ports.len() {
                let port_name = self.devices[i].ports[j].name.clone();
                if self.devices[i].ports[j + 1..]
                    .iter()
                    .any(|p| p.name == port_name)
                {
                    return Err(ResourceError::DuplicateName(port_name));
                }
                self.devices[i].ports[j].parent = name.clone();
            }
        }
        for device in &self.devices {
            for port in &device.ports {
                for reference in &port.remote_ports {
                    if self.resolve(reference).is_none() {
                        return Err(ResourceError::KeyNotFound {
                            device: reference.device.clone(),
                            port: reference.port.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Serialize for Topology {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        named_map::serialize(&self.devices, serializer)
    }
}

impl<'de> Deserialize<'de> for Topology {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Topology {
            devices: named_map::deserialize(deserializer)?,
        })
    }
}
