//! Device type/version matching
//!
//! "The phone must be Android, version >= 10" style checks: a fixed device
//! type tag, optionally combined with a comparison against the device's
//! `version` attribute.

use std::cmp::Ordering;

use super::{Constraint, Resource};
use crate::topology::{AttrValue, Topology};

/// Satisfied by devices of a fixed `type` tag, optionally carrying a
/// `version` attribute that compares against a target value.
///
/// A device without the attribute fails regardless of operator; so does a
/// comparison across attribute kinds or an unrecognized operator string.
pub struct DeviceVersionConstraint {
    device_type: String,
    version_op: Option<String>,
    version: Option<AttrValue>,
}

impl DeviceVersionConstraint {
    pub fn new(device_type: &str) -> Self {
        Self {
            device_type: device_type.to_string(),
            version_op: None,
            version: None,
        }
    }

    /// Require `version <op> target` in addition to the type tag.
    /// Operators: `=`, `>`, `<`, `>=`, `<=`, `!=`.
    pub fn with_version(device_type: &str, op: &str, version: impl Into<AttrValue>) -> Self {
        Self {
            device_type: device_type.to_string(),
            version_op: Some(op.to_string()),
            version: Some(version.into()),
        }
    }

    fn version_met(&self, device_version: &AttrValue) -> bool {
        let (op, target) = match (&self.version_op, &self.version) {
            (Some(op), Some(target)) => (op.as_str(), target),
            _ => return true,
        };
        match op {
            "=" => device_version == target,
            "!=" => device_version != target,
            ">" => device_version.compare(target) == Some(Ordering::Greater),
            "<" => device_version.compare(target) == Some(Ordering::Less),
            ">=" => matches!(
                device_version.compare(target),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            "<=" => matches!(
                device_version.compare(target),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            _ => false,
        }
    }
}

impl Constraint for DeviceVersionConstraint {
    fn description(&self) -> String {
        match (&self.version_op, &self.version) {
            (Some(op), Some(version)) => format!(
                "Device type must be {} and version {}{}",
                self.device_type, op, version
            ),
            _ => format!("Device type must be {}", self.device_type),
        }
    }

    fn is_met(&self, resource: Resource<'_>, _topology: &Topology) -> bool {
        let device = match resource.as_device() {
            Some(device) if device.is_type(&self.device_type) => device,
            _ => return false,
        };
        if self.version_op.is_none() {
            return true;
        }
        match device.attr("version") {
            Some(version) => self.version_met(version),
            None => false,
        }
    }
}
