//! On-disk document for a resource pool
//!
//! A pool persists as one pretty-printed JSON document with three top-level
//! fields: `devices` (name-keyed map), `info` (free-form bag) and `reserved`
//! (null, or the current reservation record). Saves go through a temp file in
//! the destination directory and rename into place, so a crash mid-write
//! never leaves a truncated pool file.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Reservation;
use crate::error::ResourceError;
use crate::topology::Topology;

/// Timestamp layout of the reservation `date` field.
pub(crate) const RESERVED_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// The parsed pool file.
#[derive(Deserialize, Default)]
pub(crate) struct PoolDocument {
    #[serde(default)]
    pub devices: Topology,
    #[serde(default)]
    pub info: Map<String, Value>,
    #[serde(default)]
    pub reserved: Option<Reservation>,
}

/// Borrowed view for saving without cloning the topology.
#[derive(Serialize)]
struct PoolDocumentRef<'a> {
    devices: &'a Topology,
    info: &'a Map<String, Value>,
    reserved: &'a Option<Reservation>,
}

pub(crate) fn read(path: &Path) -> Result<PoolDocument, ResourceError> {
    if !path.exists() {
        return Err(ResourceError::FileNotFound(path.display().to_string()));
    }
    let data =
        std::fs::read_to_string(path).map_err(|e| ResourceError::Io(e.to_string()))?;
    serde_json::from_str(&data).map_err(|e| ResourceError::Deserialization(e.to_string()))
}

pub(crate) fn write(
    path: &Path,
    devices: &Topology,
    info: &Map<String, Value>,
    reserved: &Option<Reservation>,
) -> Result<(), ResourceError> {
    let document = PoolDocumentRef {
        devices,
        info,
        reserved,
    };
    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| ResourceError::Serialization(e.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| ResourceError::Io(e.to_string()))?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| ResourceError::Io(e.to_string()))?;
    tmp.persist(path).map_err(|e| ResourceError::Io(e.to_string()))?;

    log::debug!("wrote pool file {}", path.display());
    Ok(())
}
