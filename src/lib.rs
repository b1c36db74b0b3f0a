// labpool - Test-Lab Equipment Resource Pool

pub mod constraint;
pub mod error;
pub mod pool;
pub mod topology;
pub mod transport;

pub use constraint::{
    AnyConstraint, ConnectionConstraint, ConnectionMatch, Constraint, DeviceVersionConstraint,
    PortSpeedConstraint, Resource, StationCountConstraint, TrafficGenConstraint,
};
pub use error::ResourceError;
pub use pool::{Pool, Reservation};
pub use topology::{AttrValue, Device, Port, PortRef, Topology};
pub use transport::{CommandLine, TransportError, TransportRegistry};
