//! Device and port records
//!
//! Field layout mirrors the persisted document: `name`, `type`, `description`
//! are fixed, everything else rides in the flattened attribute bag. Remote
//! ports and a port's parent are name references, never nested objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::attr::AttrValue;
use super::named_map::{self, Named};
use crate::error::ResourceError;

/// A remote-port reference: the name pair identifying a port on another
/// device. The in-memory edge representation and the wire form are the same.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PortRef {
    pub device: String,
    pub port: String,
}

impl PortRef {
    pub fn new(device: &str, port: &str) -> Self {
        Self {
            device: device.to_string(),
            port: port.to_string(),
        }
    }
}

/// A named connection point on a device.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Port {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: Option<String>,
    pub description: Option<String>,
    /// Owning device, by name. Normalized on load.
    #[serde(default)]
    pub parent: String,
    #[serde(flatten)]
    pub attrs: BTreeMap<String, AttrValue>,
    /// Ports this port is physically wired to, in insertion order.
    #[serde(default)]
    pub remote_ports: Vec<PortRef>,
}

impl Port {
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(key.to_string(), value.into());
    }
}

impl Named for Port {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A piece of test equipment: AP, STA, traffic generator, switch, phone...
///
/// The `type` tag is an open string; constraints match on it dynamically.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Device {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub attrs: BTreeMap<String, AttrValue>,
    /// Ports in insertion order, serialized as a name-keyed map.
    #[serde(with = "named_map", default)]
    pub ports: Vec<Port>,
}

impl Device {
    pub fn new(name: &str, device_type: &str) -> Self {
        Self {
            name: name.to_string(),
            device_type: Some(device_type.to_string()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Add a port with an empty remote list. Fails with `DuplicateName` if
    /// the port name already exists on this device.
    pub fn add_port(&mut self, name: &str, port_type: &str) -> Result<&mut Port, ResourceError> {
        if self.ports.iter().any(|p| p.name == name) {
            return Err(ResourceError::DuplicateName(name.to_string()));
        }
        self.ports.push(Port {
            name: name.to_string(),
            port_type: Some(port_type.to_string()),
            parent: self.name.clone(),
            ..Port::default()
        });
        let last = self.ports.len() - 1;
        Ok(&mut self.ports[last])
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn port_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.name == name)
    }

    /// Ports carrying the given `type` tag, in insertion order.
    pub fn ports_of_type<'a>(&'a self, port_type: &'a str) -> impl Iterator<Item = &'a Port> {
        self.ports
            .iter()
            .filter(move |p| p.port_type.as_deref() == Some(port_type))
    }

    pub fn is_type(&self, device_type: &str) -> bool {
        self.device_type.as_deref() == Some(device_type)
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(key.to_string(), value.into());
    }
}

impl Named for Device {
    fn name(&self) -> &str {
        &self.name
    }
}
