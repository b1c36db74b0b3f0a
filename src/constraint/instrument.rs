//! Traffic-generator attachment constraints
//!
//! Instrument ports are assumed to hang off ETH ports. `TrafficGenConstraint`
//! finds them; `PortSpeedConstraint` qualifies individual instrument ports by
//! line rate.

use super::{ConnectionConstraint, ConnectionMatch, Constraint, Resource};
use crate::topology::Topology;

/// Satisfied by ports of a TrafficGen-typed device whose numeric `speed`
/// attribute is at least the configured threshold (Mbit/s).
pub struct PortSpeedConstraint {
    min_speed: f64,
}

impl PortSpeedConstraint {
    pub fn new(min_speed: f64) -> Self {
        Self { min_speed }
    }
}

impl Constraint for PortSpeedConstraint {
    fn description(&self) -> String {
        format!(
            "Traffic generator port speed must be at least {}M",
            self.min_speed
        )
    }

    fn is_met(&self, resource: Resource<'_>, _topology: &Topology) -> bool {
        let (owner, port) = match resource {
            Resource::Port(owner, port) => (owner, port),
            Resource::Device(_) => return false,
        };
        if !owner.is_type("TrafficGen") {
            return false;
        }
        match port.attr("speed").and_then(|v| v.as_f64()) {
            Some(speed) => speed >= self.min_speed,
            None => false,
        }
    }
}

/// "The device must have a traffic generator connected."
///
/// Scans the device's ETH ports for remote ports owned by TrafficGen-typed
/// devices, optionally filtered by a port-level constraint (speed). With a
/// `port_count` the semantics are "at least N": the first N qualifying ports
/// are returned, or nothing. Without one, at most the first match.
pub struct TrafficGenConstraint {
    speed_constraint: Option<Box<dyn Constraint>>,
    port_count: Option<usize>,
}

impl TrafficGenConstraint {
    pub fn new() -> Self {
        Self {
            speed_constraint: None,
            port_count: None,
        }
    }

    pub fn with_speed(mut self, constraint: impl Constraint + 'static) -> Self {
        self.speed_constraint = Some(Box::new(constraint));
        self
    }

    pub fn with_port_count(mut self, count: usize) -> Self {
        self.port_count = Some(count);
        self
    }
}

impl Default for TrafficGenConstraint {
    fn default() -> Self {
        Self::new()
    }
}

impl Constraint for TrafficGenConstraint {
    fn description(&self) -> String {
        let mut description = String::from("Device must have traffic generator connected");
        if let Some(speed) = &self.speed_constraint {
            description.push_str(&format!(", {}", speed.description()));
        }
        if let Some(count) = self.port_count {
            description.push_str(&format!(", port count at least {}", count));
        }
        description
    }

    fn is_met(&self, resource: Resource<'_>, topology: &Topology) -> bool {
        !self.connections(resource, topology).is_empty()
    }
}

impl ConnectionConstraint for TrafficGenConstraint {
    fn connections<'t>(
        &self,
        resource: Resource<'t>,
        topology: &'t Topology,
    ) -> Vec<ConnectionMatch<'t>> {
        let device = match resource.as_device() {
            Some(device) => device,
            None => return Vec::new(),
        };
        let mut matched = Vec::new();
        for port in device.ports_of_type("ETH") {
            for reference in &port.remote_ports {
                let (remote_device, remote_port) = match topology.resolve(reference) {
                    Some(endpoint) => endpoint,
                    None => continue,
                };
                if !remote_device.is_type("TrafficGen") {
                    continue;
                }
                if let Some(speed) = &self.speed_constraint {
                    if !speed.is_met(Resource::Port(remote_device, remote_port), topology) {
                        continue;
                    }
                }
                matched.push(ConnectionMatch {
                    device: remote_device,
                    port: remote_port,
                    downstream: Vec::new(),
                });
            }
        }
        match self.port_count {
            Some(count) if matched.len() >= count => {
                matched.truncate(count);
                matched
            }
            Some(_) => Vec::new(),
            None => {
                matched.truncate(1);
                matched
            }
        }
    }
}
