//! Serde codec for insertion-ordered collections keyed by record name
//!
//! The persisted document stores devices and ports as JSON objects keyed by
//! name, while the in-memory model keeps them in insertion-ordered `Vec`s.
//! Serialization emits `name → record` entries in vector order;
//! deserialization collects records in document order (JSON objects stream
//! their entries in textual order), so insertion order survives a round trip.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Records that carry their own map key.
pub(crate) trait Named {
    fn name(&self) -> &str;
}

pub(crate) fn serialize<T, S>(items: &[T], serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize + Named,
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(items.len()))?;
    for item in items {
        map.serialize_entry(item.name(), item)?;
    }
    map.end()
}

pub(crate) fn deserialize<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    T: Deserialize<'de> + Named,
    D: Deserializer<'de>,
{
    struct MapVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de> + Named> Visitor<'de> for MapVisitor<T> {
        type Value = Vec<T>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of named records")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Vec<T>, A::Error> {
            let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
            // The key repeats the record's own name; the record wins.
            while let Some((IgnoredAny, value)) = access.next_entry::<IgnoredAny, T>()? {
                items.push(value);
            }
            Ok(items)
        }
    }

    deserializer.deserialize_map(MapVisitor(PhantomData))
}
