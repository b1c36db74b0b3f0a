//! Constraint engine: composable predicates over the equipment graph
//!
//! A constraint is a capability, not a concrete type: anything with a
//! description and an `is_met` check. Connection constraints additionally
//! resolve the actual matching remote endpoints, which callers use both to
//! test satisfaction and to retrieve the matched hardware.

pub mod instrument;
pub mod version;
pub mod wireless;

pub use instrument::{PortSpeedConstraint, TrafficGenConstraint};
pub use version::DeviceVersionConstraint;
pub use wireless::StationCountConstraint;

use crate::topology::{Device, Port, Topology};

/// A graph node a constraint is evaluated against. Ports carry their owning
/// device so port-level constraints can check the owner's type without a
/// topology lookup.
#[derive(Clone, Copy)]
pub enum Resource<'a> {
    Device(&'a Device),
    Port(&'a Device, &'a Port),
}

impl<'a> Resource<'a> {
    pub fn as_device(&self) -> Option<&'a Device> {
        match *self {
            Resource::Device(device) => Some(device),
            Resource::Port(..) => None,
        }
    }
}

/// A matched remote endpoint, plus the nested matches its
/// sub-connection-constraints resolved to.
#[derive(Clone)]
pub struct ConnectionMatch<'a> {
    pub device: &'a Device,
    pub port: &'a Port,
    pub downstream: Vec<ConnectionMatch<'a>>,
}

/// A named predicate over a device or port.
pub trait Constraint {
    /// Human-readable description for diagnostics.
    fn description(&self) -> String;

    fn is_met(&self, resource: Resource<'_>, topology: &Topology) -> bool;
}

/// A constraint that also resolves the remote connections it matched.
/// `is_met` holds exactly when the match list is non-empty.
pub trait ConnectionConstraint: Constraint {
    fn connections<'t>(
        &self,
        resource: Resource<'t>,
        topology: &'t Topology,
    ) -> Vec<ConnectionMatch<'t>>;
}

/// A constraint of either capability. Composite constructors and the pool use
/// this to classify sub-constraints without downcasting.
pub enum AnyConstraint {
    Plain(Box<dyn Constraint>),
    Connection(Box<dyn ConnectionConstraint>),
}

impl AnyConstraint {
    pub fn plain(constraint: impl Constraint + 'static) -> Self {
        AnyConstraint::Plain(Box::new(constraint))
    }

    pub fn connection(constraint: impl ConnectionConstraint + 'static) -> Self {
        AnyConstraint::Connection(Box::new(constraint))
    }

    pub fn description(&self) -> String {
        match self {
            AnyConstraint::Plain(c) => c.description(),
            AnyConstraint::Connection(c) => c.description(),
        }
    }

    pub fn is_met(&self, resource: Resource<'_>, topology: &Topology) -> bool {
        match self {
            AnyConstraint::Plain(c) => c.is_met(resource, topology),
            AnyConstraint::Connection(c) => c.is_met(resource, topology),
        }
    }

    /// The connection capability, if this constraint has it.
    pub fn as_connection(&self) -> Option<&dyn ConnectionConstraint> {
        match self {
            AnyConstraint::Plain(_) => None,
            AnyConstraint::Connection(c) => Some(c.as_ref()),
        }
    }
}
