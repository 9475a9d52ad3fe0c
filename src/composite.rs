//! Crossplane composite resource input
//!
//! A composition request carries the composite resource (XR) describing
//! which cluster to import, the name of the composed cluster resource the
//! import waits for, and the names of the composed resources observed so far.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ImportConfig;
use eksimport_capi::Packaging;
use eksimport_common::{Error, Result};

/// A composition request
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositionRequest {
    /// The composite resource
    pub composite: CompositeResource,
    /// Composed resource that must be observed before importing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_ref: Option<String>,
    /// Names of the composed resources observed so far
    #[serde(default)]
    pub observed: Vec<String>,
}

impl CompositionRequest {
    /// Parse a request from YAML or JSON
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::validation(format!("invalid composition request: {}", e)))
    }

    /// Read a request file
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Error::validation(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml(&yaml)
    }

    /// Whether the referenced cluster resource has been observed
    pub fn cluster_observed(&self) -> bool {
        match &self.cluster_ref {
            Some(name) => self.observed.iter().any(|observed| observed == name),
            None => true,
        }
    }
}

/// Metadata of the composite resource
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CompositeMetadata {
    /// Resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Labels, copied onto every generated object
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// The composite resource
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResource {
    /// Standard metadata
    #[serde(default)]
    pub metadata: CompositeMetadata,
    /// Import parameters
    #[serde(default)]
    pub spec: CompositeSpec,
}

/// Reference to the claim of the composite
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ClaimRef {
    /// Claim namespace; generated objects go here
    #[serde(default)]
    pub namespace: String,
}

/// Labels selecting the composition
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MatchLabels {
    /// Cloud provider
    #[serde(default)]
    pub provider: String,
}

/// Selector of the composition
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSelector {
    /// Selecting labels
    #[serde(default)]
    pub match_labels: MatchLabels,
}

/// Spec of the composite resource
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositeSpec {
    /// Cluster to import
    pub cluster_name: String,
    /// Region or location of the cluster
    #[serde(rename = "regionOrLocation")]
    pub region: String,
    /// Cloud `ProviderConfig`
    pub cloud_provider_config_ref: String,
    /// provider-kubernetes `ProviderConfig` used to apply the objects
    pub cluster_provider_config_ref: String,
    /// Deletion policy of the wrapping `Object`s
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_deletion_policy: Option<String>,
    /// Labels added to every generated object
    pub kubernetes_additional_labels: BTreeMap<String, String>,
    /// Deletion policy of the composite itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    /// Claim reference
    pub claim_ref: ClaimRef,
    /// Composition selector
    pub composition_selector: CompositionSelector,
}

impl From<&CompositeResource> for ImportConfig {
    fn from(composite: &CompositeResource) -> Self {
        let spec = &composite.spec;
        let cloud_provider_config_ref = Some(spec.cloud_provider_config_ref.clone())
            .filter(|name| !name.is_empty());

        Self {
            cluster_name: spec.cluster_name.clone(),
            namespace: spec.claim_ref.namespace.clone(),
            region: spec.region.clone(),
            provider: spec.composition_selector.match_labels.provider.clone(),
            cloud_provider_config_ref,
            packaging: Packaging::KubernetesObject {
                provider_config_ref: spec.cluster_provider_config_ref.clone(),
                deletion_policy: spec.object_deletion_policy.clone(),
            },
            labels: composite.metadata.labels.clone(),
            additional_labels: spec.kubernetes_additional_labels.clone(),
            ..Default::default()
        }
    }
}
