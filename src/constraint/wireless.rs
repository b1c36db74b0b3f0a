//! AP / station fan-out constraint
//!
//! "The AP must have N stations connected, each satisfying ..." — the
//! workhorse query for wireless testbeds. Stations are found by walking the
//! AP's WIFI ports; each candidate station is vetted by plain sub-constraints
//! first, then by sub-connection-constraints whose matches are captured as
//! the downstream endpoints of the result.

use super::{AnyConstraint, ConnectionConstraint, ConnectionMatch, Constraint, Resource};
use crate::topology::Topology;

/// Satisfied by an AP-typed device with at least `sta_count` qualifying
/// STA-typed devices on a single WIFI port.
///
/// Matches are accumulated per WIFI port and never pooled across ports: the
/// first port whose match count reaches `sta_count` supplies exactly the
/// first `sta_count` matches, and the scan stops there.
pub struct StationCountConstraint {
    sta_constraints: Vec<Box<dyn Constraint>>,
    sta_conn_constraints: Vec<Box<dyn ConnectionConstraint>>,
    sta_count: usize,
}

impl StationCountConstraint {
    pub fn new(sta_count: usize) -> Self {
        Self {
            sta_constraints: Vec::new(),
            sta_conn_constraints: Vec::new(),
            sta_count,
        }
    }

    /// Build from a mixed list of station constraints, classified by
    /// capability: plain constraints vet the station device itself,
    /// connection constraints must also resolve matches through it.
    pub fn with_constraints(constraints: Vec<AnyConstraint>, sta_count: usize) -> Self {
        let mut sta_constraints = Vec::new();
        let mut sta_conn_constraints = Vec::new();
        for constraint in constraints {
            match constraint {
                AnyConstraint::Plain(c) => sta_constraints.push(c),
                AnyConstraint::Connection(c) => sta_conn_constraints.push(c),
            }
        }
        Self {
            sta_constraints,
            sta_conn_constraints,
            sta_count,
        }
    }
}

impl Constraint for StationCountConstraint {
    fn description(&self) -> String {
        let mut description = format!("AP must have {} STA connected", self.sta_count);
        for constraint in &self.sta_constraints {
            description.push('\n');
            description.push_str(&constraint.description());
        }
        for constraint in &self.sta_conn_constraints {
            description.push('\n');
            description.push_str(&constraint.description());
        }
        description
    }

    fn is_met(&self, resource: Resource<'_>, topology: &Topology) -> bool {
        !self.connections(resource, topology).is_empty()
    }
}

impl ConnectionConstraint for StationCountConstraint {
    fn connections<'t>(
        &self,
        resource: Resource<'t>,
        topology: &'t Topology,
    ) -> Vec<ConnectionMatch<'t>> {
        let ap = match resource.as_device() {
            Some(device) if device.is_type("AP") => device,
            _ => return Vec::new(),
        };
        for port in ap.ports_of_type("WIFI") {
            let mut matched = Vec::new();
            for reference in &port.remote_ports {
                let (sta, sta_port) = match topology.resolve(reference) {
                    Some(endpoint) => endpoint,
                    None => continue,
                };
                if !sta.is_type("STA") {
                    continue;
                }
                let sta_resource = Resource::Device(sta);
                if !self
                    .sta_constraints
                    .iter()
                    .all(|c| c.is_met(sta_resource, topology))
                {
                    continue;
                }
                // Every connection constraint must resolve at least one match
                // through this station; their matches become the downstream
                // endpoints of the result.
                let mut downstream = Vec::new();
                let mut met_connection = true;
                for constraint in &self.sta_conn_constraints {
                    let connections = constraint.connections(sta_resource, topology);
                    if connections.is_empty() {
                        met_connection = false;
                        break;
                    }
                    downstream.extend(connections);
                }
                if !met_connection {
                    continue;
                }
                matched.push(ConnectionMatch {
                    device: sta,
                    port: sta_port,
                    downstream,
                });
            }
            if matched.len() >= self.sta_count {
                matched.truncate(self.sta_count);
                return matched;
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::instrument::{PortSpeedConstraint, TrafficGenConstraint};
    use crate::topology::Device;

    /// AP with one WIFI port connected to `sta_count` stations; each station
    /// additionally gets an ETH link to its own 1000M traffic-generator port.
    fn make_testbed(sta_count: usize) -> Topology {
        let mut topology = Topology::new();

        let mut ap = Device::new("ap1", "AP");
        ap.add_port("WIFI", "WIFI").unwrap();
        ap.add_port("ETH1/1", "ETH").unwrap();
        topology.add_device(ap).unwrap();

        let mut gen = Device::new("trafficGen", "TrafficGen");
        for i in 0..sta_count {
            gen.add_port(&format!("PORT1/1/{}", i + 1), "ETH")
                .unwrap()
                .set_attr("speed", 1000);
        }
        topology.add_device(gen).unwrap();

        for i in 0..sta_count {
            let name = format!("sta{}", i + 1);
            let mut sta = Device::new(&name, "STA");
            sta.add_port("WIFI", "WIFI").unwrap();
            sta.add_port("ETH1/1", "ETH").unwrap();
            topology.add_device(sta).unwrap();

            topology.connect(("ap1", "WIFI"), (&name, "WIFI")).unwrap();
            topology
                .connect(
                    (&name, "ETH1/1"),
                    ("trafficGen", &format!("PORT1/1/{}", i + 1)),
                )
                .unwrap();
        }
        topology
    }

    #[test]
    fn test_station_count_boundary() {
        let topology = make_testbed(3);
        let ap = topology.device("ap1").unwrap();

        assert!(StationCountConstraint::new(1).is_met(Resource::Device(ap), &topology));
        assert!(StationCountConstraint::new(3).is_met(Resource::Device(ap), &topology));
        assert!(!StationCountConstraint::new(4).is_met(Resource::Device(ap), &topology));
    }

    #[test]
    fn test_returns_first_count_matches() {
        let topology = make_testbed(3);
        let ap = topology.device("ap1").unwrap();

        let matches =
            StationCountConstraint::new(2).connections(Resource::Device(ap), &topology);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].device.name, "sta1");
        assert_eq!(matches[1].device.name, "sta2");
    }

    #[test]
    fn test_non_ap_resource_never_matches() {
        let topology = make_testbed(1);
        let sta = topology.device("sta1").unwrap();
        assert!(!StationCountConstraint::new(1).is_met(Resource::Device(sta), &topology));
    }

    #[test]
    fn test_nested_traffic_gen_constraint() {
        let topology = make_testbed(3);
        let ap = topology.device("ap1").unwrap();

        let met = StationCountConstraint::with_constraints(
            vec![AnyConstraint::connection(
                TrafficGenConstraint::new().with_speed(PortSpeedConstraint::new(1000.0)),
            )],
            3,
        );
        let matches = met.connections(Resource::Device(ap), &topology);
        assert_eq!(matches.len(), 3);
        // Each station carries its matched instrument port downstream
        assert_eq!(matches[0].downstream.len(), 1);
        assert_eq!(matches[0].downstream[0].device.name, "trafficGen");

        let unmet = StationCountConstraint::with_constraints(
            vec![AnyConstraint::connection(
                TrafficGenConstraint::new().with_speed(PortSpeedConstraint::new(10000.0)),
            )],
            3,
        );
        assert!(!unmet.is_met(Resource::Device(ap), &topology));
    }

    #[test]
    fn test_plain_sub_constraint_filters_stations() {
        let mut topology = make_testbed(3);
        topology
            .device_mut("sta2")
            .unwrap()
            .set_attr("version", 9);
        let constraint = StationCountConstraint::with_constraints(
            vec![AnyConstraint::plain(
                super::super::version::DeviceVersionConstraint::with_version("STA", ">=", 10),
            )],
            1,
        );
        // No station passes: sta1/sta3 have no version attribute, sta2 is 9
        let ap = topology.device("ap1").unwrap();
        assert!(!constraint.is_met(Resource::Device(ap), &topology));

        topology
            .device_mut("sta3")
            .unwrap()
            .set_attr("version", 11);
        let ap = topology.device("ap1").unwrap();
        let matches = constraint.connections(Resource::Device(ap), &topology);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].device.name, "sta3");
    }

    #[test]
    fn test_matches_not_pooled_across_ports() {
        // Two WIFI ports with one station each: a count of 2 must not be
        // satisfied by combining ports.
        let mut topology = Topology::new();
        let mut ap = Device::new("ap1", "AP");
        ap.add_port("WIFI0", "WIFI").unwrap();
        ap.add_port("WIFI1", "WIFI").unwrap();
        topology.add_device(ap).unwrap();
        for (i, ap_port) in ["WIFI0", "WIFI1"].iter().enumerate() {
            let name = format!("sta{}", i + 1);
            let mut sta = Device::new(&name, "STA");
            sta.add_port("WIFI", "WIFI").unwrap();
            topology.add_device(sta).unwrap();
            topology.connect(("ap1", ap_port), (&name, "WIFI")).unwrap();
        }

        let ap = topology.device("ap1").unwrap();
        assert!(!StationCountConstraint::new(2).is_met(Resource::Device(ap), &topology));
        assert!(StationCountConstraint::new(1).is_met(Resource::Device(ap), &topology));
    }

    #[test]
    fn test_description_concatenates_sub_constraints() {
        let constraint = StationCountConstraint::with_constraints(
            vec![AnyConstraint::connection(
                TrafficGenConstraint::new().with_speed(PortSpeedConstraint::new(1000.0)),
            )],
            3,
        );
        let description = constraint.description();
        let lines: Vec<&str> = description.lines().collect();
        assert_eq!(lines[0], "AP must have 3 STA connected");
        assert!(lines[1].starts_with("Device must have traffic generator connected"));
    }
}
