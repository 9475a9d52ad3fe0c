//! Desired-resources sink
//!
//! The sink is the only state shared between nodegroups. Names are unique per
//! cluster and nodegroup, so a second write under the same name is a bug and
//! is rejected instead of silently replacing the first object.

use std::collections::BTreeMap;

use eksimport_common::{Error, Result};

/// Receiver of the objects generated for each nodegroup
pub trait DesiredResources: Send {
    /// Whether an object is already stored under `name`
    fn contains(&self, name: &str) -> bool;

    /// Add an object under a unique name
    fn add_desired(&mut self, name: &str, object: serde_json::Value) -> Result<()>;
}

/// In-memory sink keyed by resource name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DesiredComposed {
    resources: BTreeMap<String, serde_json::Value>,
}

impl DesiredComposed {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether nothing has been added
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Look up an object by name
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.resources.get(name)
    }

    /// Names of the stored objects, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Consume the sink, yielding objects ordered by name
    pub fn into_resources(self) -> BTreeMap<String, serde_json::Value> {
        self.resources
    }
}

impl DesiredResources for DesiredComposed {
    fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    fn add_desired(&mut self, name: &str, object: serde_json::Value) -> Result<()> {
        if self.resources.contains_key(name) {
            return Err(Error::DuplicateResource {
                name: name.to_string(),
            });
        }
        self.resources.insert(name.to_string(), object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_objects_by_name() {
        let mut sink = DesiredComposed::new();
        sink.add_desired("b", serde_json::json!({ "kind": "MachinePool" }))
            .unwrap();
        sink.add_desired("a", serde_json::json!({ "kind": "AWSManagedMachinePool" }))
            .unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(sink.get("b").unwrap()["kind"], "MachinePool");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut sink = DesiredComposed::new();
        sink.add_desired("pool", serde_json::json!({ "v": 1 })).unwrap();
        let err = sink
            .add_desired("pool", serde_json::json!({ "v": 2 }))
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateResource { ref name } if name == "pool"));
        assert_eq!(sink.get("pool").unwrap()["v"], 1);
        assert!(sink.contains("pool"));
        assert!(!sink.contains("other"));
    }

    #[test]
    fn new_sink_is_empty() {
        let sink = DesiredComposed::new();
        assert!(sink.is_empty());
        assert!(sink.into_resources().is_empty());
    }
}
