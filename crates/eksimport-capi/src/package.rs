//! Packaging of manifests for the desired-resources sink
//!
//! Manifests are either handed over as-is or wrapped in a
//! provider-kubernetes `Object` so they can be applied to a remote cluster.

use serde::{Deserialize, Serialize};

use crate::manifest::CAPIManifest;
use eksimport_common::{Error, Result};

/// API version of the provider-kubernetes `Object` wrapper
pub const KUBERNETES_OBJECT_API_VERSION: &str = "kubernetes.crossplane.io/v1alpha1";

/// Kind of the provider-kubernetes wrapper
pub const KUBERNETES_OBJECT_KIND: &str = "Object";

/// How manifests are handed to the sink
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum Packaging {
    /// The manifest itself
    #[default]
    Raw,
    /// A provider-kubernetes `Object` with the manifest under `forProvider`
    #[serde(rename_all = "camelCase")]
    KubernetesObject {
        /// Name of the provider-kubernetes `ProviderConfig`
        provider_config_ref: String,
        /// Deletion policy of the wrapper (`Delete` or `Orphan`)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deletion_policy: Option<String>,
    },
}

impl Packaging {
    /// Package a manifest into the object stored in the sink
    pub fn package(&self, manifest: &CAPIManifest) -> Result<serde_json::Value> {
        if manifest.metadata.name.is_empty() {
            return Err(Error::packaging(
                &manifest.kind,
                "manifest has no metadata name",
            ));
        }

        let value = manifest.to_value()?;
        match self {
            Packaging::Raw => Ok(value),
            Packaging::KubernetesObject {
                provider_config_ref,
                deletion_policy,
            } => Ok(wrap_kubernetes_object(
                manifest,
                value,
                provider_config_ref,
                deletion_policy.as_deref(),
            )),
        }
    }
}

fn wrap_kubernetes_object(
    manifest: &CAPIManifest,
    value: serde_json::Value,
    provider_config_ref: &str,
    deletion_policy: Option<&str>,
) -> serde_json::Value {
    let name = &manifest.metadata.name;
    let labels = manifest.metadata.labels.clone().unwrap_or_default();

    let mut spec = serde_json::json!({
        "forProvider": {
            "manifest": value
        },
        "providerConfigRef": {
            "name": provider_config_ref
        },
        "writeConnectionSecretToRef": {
            "name": name,
            "namespace": manifest.metadata.namespace.clone().unwrap_or_default()
        }
    });
    if let Some(policy) = deletion_policy {
        spec["deletionPolicy"] = serde_json::json!(policy);
    }

    serde_json::json!({
        "apiVersion": KUBERNETES_OBJECT_API_VERSION,
        "kind": KUBERNETES_OBJECT_KIND,
        "metadata": {
            "name": name,
            "labels": labels
        },
        "spec": spec
    })
}
