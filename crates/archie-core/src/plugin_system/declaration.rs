//! Raw service declarations as authored in a module manifest.
//!
//! A declaration is either a single location string (a leaf) or an ordered
//! mapping of keys to further declarations (a namespace). Entry order is the
//! order the author wrote them in and is preserved through (de)serialization,
//! because discovery order drives the instantiation order later on.
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A leaf location or a nested, ordered mapping of declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceDeclaration {
    /// A loadable location, relative to the module's package directory unless absolute.
    Leaf(String),
    /// A namespace node; keys are unique and kept in declaration order.
    Namespace(Vec<(String, ServiceDeclaration)>),
}

impl ServiceDeclaration {
    pub fn leaf(location: impl Into<String>) -> Self {
        ServiceDeclaration::Leaf(location.into())
    }

    /// Build a namespace from `(key, declaration)` pairs.
    ///
    /// A repeated key replaces the earlier declaration in place, which keeps
    /// keys unique the same way a mapping literal would.
    pub fn namespace<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ServiceDeclaration)>,
        K: Into<String>,
    {
        let mut ordered: Vec<(String, ServiceDeclaration)> = Vec::new();
        for (key, value) in entries {
            let key = key.into();
            match ordered.iter_mut().find(|(existing, _)| *existing == key) {
                Some(slot) => slot.1 = value,
                None => ordered.push((key, value)),
            }
        }
        ServiceDeclaration::Namespace(ordered)
    }

    /// An empty namespace, e.g. a module that provides nothing yet.
    pub fn empty() -> Self {
        ServiceDeclaration::Namespace(Vec::new())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ServiceDeclaration::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            ServiceDeclaration::Leaf(location) => Some(location),
            ServiceDeclaration::Namespace(_) => None,
        }
    }

    /// Entries of a namespace in declaration order; empty for a leaf.
    pub fn entries(&self) -> &[(String, ServiceDeclaration)] {
        match self {
            ServiceDeclaration::Leaf(_) => &[],
            ServiceDeclaration::Namespace(entries) => entries,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ServiceDeclaration> {
        self.entries()
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Number of nodes below this one (leaves and namespaces), not counting itself.
    pub fn descendant_count(&self) -> usize {
        self.entries()
            .iter()
            .map(|(_, value)| 1 + value.descendant_count())
            .sum()
    }
}

impl Serialize for ServiceDeclaration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ServiceDeclaration::Leaf(location) => serializer.serialize_str(location),
            ServiceDeclaration::Namespace(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

struct DeclarationVisitor;

impl<'de> Visitor<'de> for DeclarationVisitor {
    type Value = ServiceDeclaration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a service location string or a mapping of service declarations")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(ServiceDeclaration::Leaf(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(ServiceDeclaration::Leaf(value))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, ServiceDeclaration)> =
            Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, ServiceDeclaration>()? {
            if entries.iter().any(|(existing, _)| *existing == key) {
                return Err(de::Error::custom(format!("duplicate service key '{}'", key)));
            }
            entries.push((key, value));
        }
        Ok(ServiceDeclaration::Namespace(entries))
    }
}

impl<'de> Deserialize<'de> for ServiceDeclaration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DeclarationVisitor)
    }
}
