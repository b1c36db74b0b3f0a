//! The resource pool: topology ownership, device selection and reservation
//!
//! A pool owns the equipment topology and an information bag, persists both
//! to a single JSON file, and arbitrates exclusive use of the hardware
//! through a reservation record inside that file. Selection queries filter
//! devices through the constraint engine.

mod store;

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constraint::{AnyConstraint, ConnectionMatch, Resource};
use crate::error::ResourceError;
use crate::topology::{Device, Topology};

/// Exclusive-use marker stored in the pool file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub owner: String,
    /// `YYYY/MM/DD HH:MM:SS`, local time.
    pub date: String,
}

impl Reservation {
    fn now(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            date: Local::now().format(store::RESERVED_DATE_FORMAT).to_string(),
        }
    }
}

/// A pool of test-lab equipment backed by a persisted file.
///
/// Reservation is an optimistic check-then-act protocol over the file: the
/// reload inside [`Pool::reserve`] rejects a pool held by another owner, but
/// nothing locks the file between that check and the save. Two processes
/// racing through `reserve` can both believe they succeeded; callers that
/// need a stronger guarantee must serialize access themselves.
#[derive(Default)]
pub struct Pool {
    topology: Topology,
    information: Map<String, Value>,
    reserved: Option<Reservation>,
    file_name: Option<PathBuf>,
    owner: Option<String>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    pub fn information(&self) -> &Map<String, Value> {
        &self.information
    }

    pub fn information_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.information
    }

    pub fn reserved(&self) -> Option<&Reservation> {
        self.reserved.as_ref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Add a device to the topology. Fails with `DuplicateName` if the name
    /// is taken.
    pub fn add_device(
        &mut self,
        name: &str,
        device_type: &str,
    ) -> Result<&mut Device, ResourceError> {
        self.topology.add_device(Device::new(name, device_type))
    }

    /// Select up to `count` devices of the given type meeting every
    /// constraint, scanning in insertion order.
    ///
    /// Returns early with the collected devices the moment `count` is
    /// reached; a scan that completes without reaching `count` yields an
    /// empty result. Constraints are tested in order and short-circuit on
    /// the first failure.
    pub fn collect_device(
        &self,
        device_type: &str,
        count: usize,
        constraints: &[AnyConstraint],
    ) -> Vec<&Device> {
        let mut collected = Vec::new();
        for device in self.topology.devices() {
            if device.is_type(device_type)
                && constraints
                    .iter()
                    .all(|c| c.is_met(Resource::Device(device), &self.topology))
            {
                collected.push(device);
            }
            if collected.len() >= count {
                return collected;
            }
        }
        Vec::new()
    }

    /// Select every device of the given type meeting every constraint.
    pub fn collect_all_device(
        &self,
        device_type: &str,
        constraints: &[AnyConstraint],
    ) -> Vec<&Device> {
        self.topology
            .devices()
            .iter()
            .filter(|device| {
                device.is_type(device_type)
                    && constraints
                        .iter()
                        .all(|c| c.is_met(Resource::Device(device), &self.topology))
            })
            .collect()
    }

    /// Resolve the concrete connection endpoints a set of connection
    /// constraints matches against `resource`, concatenated in constraint
    /// order.
    ///
    /// Every constraint must carry the connection capability
    /// (`TypeMismatch` otherwise) and must yield at least one match
    /// (`ConstraintUnmet` naming the failing constraint otherwise).
    pub fn collect_connection_route<'a>(
        &'a self,
        resource: Resource<'a>,
        constraints: &[AnyConstraint],
    ) -> Result<Vec<ConnectionMatch<'a>>, ResourceError> {
        let mut route = Vec::new();
        for constraint in constraints {
            let connection = constraint
                .as_connection()
                .ok_or_else(|| ResourceError::TypeMismatch(constraint.description()))?;
            let matches = connection.connections(resource, &self.topology);
            if matches.is_empty() {
                return Err(ResourceError::ConstraintUnmet(connection.description()));
            }
            route.extend(matches);
        }
        Ok(route)
    }

    /// Persist the pool to `path`. Does not change which file the pool is
    /// considered loaded from.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ResourceError> {
        store::write(
            path.as_ref(),
            &self.topology,
            &self.information,
            &self.reserved,
        )
    }

    /// Load the pool from `path` on behalf of `owner`.
    ///
    /// Fails with `FileNotFound` if the path is missing, and with
    /// `ResourceReserved` if the file carries a reservation held by someone
    /// else. Parsing, the owner check and link resolution all complete
    /// before any in-memory state is replaced.
    pub fn load(&mut self, path: impl AsRef<Path>, owner: &str) -> Result<(), ResourceError> {
        self.reload(path.as_ref(), Some(owner))?;
        self.owner = Some(owner.to_string());
        Ok(())
    }

    fn reload(&mut self, path: &Path, owner_check: Option<&str>) -> Result<(), ResourceError> {
        let mut document = store::read(path)?;
        if let (Some(reservation), Some(owner)) = (&document.reserved, owner_check) {
            if reservation.owner != owner {
                return Err(ResourceError::ResourceReserved(reservation.owner.clone()));
            }
        }
        document.devices.validate_links()?;

        log::debug!(
            "loaded {} devices from {}",
            document.devices.len(),
            path.display()
        );
        self.topology = document.devices;
        self.information = document.info;
        self.reserved = document.reserved;
        self.file_name = Some(path.to_path_buf());
        Ok(())
    }

    /// Mark the pool as exclusively reserved by the current owner and save.
    ///
    /// The backing file is reloaded first, so a reservation held by a
    /// different owner fails with `ResourceReserved`; re-reserving under the
    /// same owner refreshes the timestamp. Fails with `NotLoaded` if the
    /// pool has never been loaded from a file.
    pub fn reserve(&mut self) -> Result<(), ResourceError> {
        let path = self.file_name.clone().ok_or(ResourceError::NotLoaded)?;
        let owner = self.owner.clone().ok_or(ResourceError::NotLoaded)?;
        self.reload(&path, Some(&owner))?;
        self.reserved = Some(Reservation::now(&owner));
        self.save(&path)?;
        log::debug!("pool {} reserved by {}", path.display(), owner);
        Ok(())
    }

    /// Clear the reservation and save.
    ///
    /// The reload here skips the owner check: any caller may clear a
    /// reservation, including one left behind by a vanished test run.
    pub fn release(&mut self) -> Result<(), ResourceError> {
        let path = self.file_name.clone().ok_or(ResourceError::NotLoaded)?;
        self.reload(&path, None)?;
        if let Some(reservation) = self.reserved.take() {
            log::debug!(
                "pool {} released (was reserved by {})",
                path.display(),
                reservation.owner
            );
        }
        self.save(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_switch_pool() -> Pool {
        let mut pool = Pool::new();
        for name in ["switch1", "switch2", "switch3"] {
            let device = pool.add_device(name, "Switch").unwrap();
            device.add_port("ETH1/1", "ETH").unwrap();
            device.add_port("ETH1/2", "ETH").unwrap();
        }
        pool.topology_mut()
            .connect(("switch1", "ETH1/1"), ("switch2", "ETH1/1"))
            .unwrap();
        pool
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");

        let mut pool = make_switch_pool();
        pool.information_mut()
            .insert("site".to_string(), Value::String("lab-3".to_string()));
        pool.save(&path).unwrap();

        let mut restored = Pool::new();
        restored.load(&path, "runner-a").unwrap();

        assert_eq!(restored.topology().len(), 3);
        assert_eq!(restored.owner(), Some("runner-a"));
        assert_eq!(restored.information()["site"], Value::String("lab-3".to_string()));

        // Connection adjacency survives, both directions
        let forward = restored
            .topology()
            .device("switch1")
            .unwrap()
            .port("ETH1/1")
            .unwrap();
        assert_eq!(forward.remote_ports[0].device, "switch2");
        let back = restored
            .topology()
            .device("switch2")
            .unwrap()
            .port("ETH1/1")
            .unwrap();
        assert_eq!(back.remote_ports[0].device, "switch1");
    }

    #[test]
    fn test_load_missing_file() {
        let mut pool = Pool::new();
        let result = pool.load("/nonexistent/pool.json", "runner-a");
        assert!(matches!(result, Err(ResourceError::FileNotFound(_))));
    }

    #[test]
    fn test_load_dangling_reference_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");

        let json = serde_json::json!({
            "devices": {
                "switch1": {
                    "name": "switch1", "type": "Switch", "description": null,
                    "ports": {
                        "ETH1/1": {
                            "name": "ETH1/1", "type": "ETH", "description": null,
                            "remote_ports": [ { "device": "ghost", "port": "ETH1/1" } ]
                        }
                    }
                }
            },
            "info": {},
            "reserved": null
        });
        std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();

        let mut pool = Pool::new();
        let result = pool.load(&path, "runner-a");
        assert!(matches!(result, Err(ResourceError::KeyNotFound { .. })));
    }

    #[test]
    fn test_load_reserved_by_other_owner_fails_before_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");

        let mut pool = make_switch_pool();
        pool.save(&path).unwrap();
        pool.load(&path, "runner-a").unwrap();
        pool.reserve().unwrap();

        let mut other = Pool::new();
        other.add_device("local-only", "Switch").unwrap();
        let result = other.load(&path, "runner-b");
        assert!(matches!(
            result,
            Err(ResourceError::ResourceReserved(ref owner)) if owner == "runner-a"
        ));
        // Prior in-memory topology untouched by the failed load
        assert!(other.topology().device("local-only").is_some());
        assert_eq!(other.topology().len(), 1);
    }

    #[test]
    fn test_reserve_requires_load() {
        let mut pool = make_switch_pool();
        assert!(matches!(pool.reserve(), Err(ResourceError::NotLoaded)));
        assert!(matches!(pool.release(), Err(ResourceError::NotLoaded)));
    }

    #[test]
    fn test_reserve_same_owner_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");

        let mut pool = make_switch_pool();
        pool.save(&path).unwrap();
        pool.load(&path, "runner-a").unwrap();

        pool.reserve().unwrap();
        let first = pool.reserved().unwrap().clone();
        assert_eq!(first.owner, "runner-a");

        // Same owner may reserve again
        pool.reserve().unwrap();
        assert_eq!(pool.reserved().unwrap().owner, "runner-a");
    }

    #[test]
    fn test_reserve_conflict_between_owners() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");

        let mut pool_a = make_switch_pool();
        pool_a.save(&path).unwrap();
        pool_a.load(&path, "runner-a").unwrap();

        let mut pool_b = Pool::new();
        pool_b.load(&path, "runner-b").unwrap();

        pool_a.reserve().unwrap();
        let result = pool_b.reserve();
        assert!(matches!(
            result,
            Err(ResourceError::ResourceReserved(ref owner)) if owner == "runner-a"
        ));
    }

    #[test]
    fn test_release_clears_reservation_for_anyone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");

        let mut pool = make_switch_pool();
        pool.save(&path).unwrap();
        pool.load(&path, "runner-a").unwrap();
        pool.reserve().unwrap();

        // A different owner cannot load, but can force a release
        let mut other = Pool::new();
        assert!(other.load(&path, "runner-b").is_err());
        other.file_name = Some(path.clone());
        other.release().unwrap();

        let mut third = Pool::new();
        third.load(&path, "runner-b").unwrap();
        assert!(third.reserved().is_none());
    }

    #[test]
    fn test_collect_device_count_contract() {
        let pool = make_switch_pool();

        let two = pool.collect_device("Switch", 2, &[]);
        assert_eq!(two.len(), 2);
        assert_eq!(two[0].name, "switch1");
        assert_eq!(two[1].name, "switch2");

        // Not enough matches: empty, never partial
        assert!(pool.collect_device("Switch", 4, &[]).is_empty());
        assert!(pool.collect_device("AP", 1, &[]).is_empty());
    }

    #[test]
    fn test_collect_all_device() {
        let pool = make_switch_pool();
        assert_eq!(pool.collect_all_device("Switch", &[]).len(), 3);
        assert!(pool.collect_all_device("AP", &[]).is_empty());
    }

    #[test]
    fn test_collect_connection_route_type_mismatch() {
        let pool = make_switch_pool();
        let device = pool.topology().device("switch1").unwrap();
        let constraints = vec![AnyConstraint::plain(
            crate::constraint::DeviceVersionConstraint::new("Switch"),
        )];
        let result = pool.collect_connection_route(Resource::Device(device), &constraints);
        assert!(matches!(result, Err(ResourceError::TypeMismatch(_))));
    }
}
