//! Rendering of the desired resources

use eksimport_capi::DesiredComposed;
use eksimport_common::{Error, Result};

/// Output document format
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One YAML document per object
    #[default]
    Yaml,
    /// A JSON object keyed by resource name
    Json,
}

/// Render the desired resources, ordered by name
pub fn render(desired: &DesiredComposed, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => {
            let mut out = String::new();
            for name in desired.names() {
                let Some(object) = desired.get(name) else {
                    continue;
                };
                let doc = serde_yaml::to_string(object)
                    .map_err(|e| Error::serialization(format!("{}: {}", name, e)))?;
                out.push_str("---\n");
                out.push_str(&doc);
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let objects: serde_json::Map<String, serde_json::Value> = desired
                .names()
                .filter_map(|name| desired.get(name).map(|object| (name.to_string(), object.clone())))
                .collect();
            Ok(serde_json::to_string_pretty(&objects)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eksimport_capi::DesiredResources;
    use serde_json::json;

    fn desired() -> DesiredComposed {
        let mut desired = DesiredComposed::new();
        desired
            .add_desired("b-pool", json!({ "kind": "MachinePool" }))
            .unwrap();
        desired
            .add_desired("a-pool", json!({ "kind": "AWSManagedMachinePool" }))
            .unwrap();
        desired
    }

    #[test]
    fn yaml_has_one_document_per_object_in_name_order() {
        let yaml = render(&desired(), OutputFormat::Yaml).unwrap();
        assert_eq!(yaml, "---\nkind: AWSManagedMachinePool\n---\nkind: MachinePool\n");
    }

    #[test]
    fn json_is_keyed_by_name() {
        let rendered = render(&desired(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["a-pool"]["kind"], "AWSManagedMachinePool");
        assert_eq!(value["b-pool"]["kind"], "MachinePool");
    }

    #[test]
    fn nothing_renders_empty() {
        assert_eq!(render(&DesiredComposed::new(), OutputFormat::Yaml).unwrap(), "");
    }
}
