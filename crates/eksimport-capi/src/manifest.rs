//! Cluster API manifests generated for an imported nodegroup
//!
//! Every resolved nodegroup yields an `AWSManagedMachinePool` carrying the
//! merged spec and a `MachinePool` that points at it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{AwsManagedMachinePoolSpec, AwsManagedMachinePoolStatus};
use eksimport_common::descriptor::LaunchTemplateReference;
use eksimport_common::{
    Error, Result, AWS_MANAGED_MACHINE_POOL_KIND, CLUSTER_API_VERSION,
    INFRASTRUCTURE_API_VERSION, MACHINE_POOL_KIND, MACHINE_POOL_LABEL,
};

/// Metadata for Kubernetes resources
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ManifestMetadata {
    /// Resource name
    pub name: String,
    /// Resource namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    /// Annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// A CAPI manifest with untyped spec and status
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CAPIManifest {
    /// API version (e.g., "cluster.x-k8s.io/v1beta1")
    pub api_version: String,
    /// Kind of resource (e.g., "MachinePool")
    pub kind: String,
    /// Resource metadata
    pub metadata: ManifestMetadata,
    /// Resource spec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
    /// Resource status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
}

impl CAPIManifest {
    /// Create a new CAPI manifest
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata: ManifestMetadata {
                name: name.into(),
                namespace: Some(namespace.into()),
                labels: None,
                annotations: None,
            },
            spec: None,
            status: None,
        }
    }

    /// Set the spec for this manifest
    pub fn with_spec(mut self, spec: serde_json::Value) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Set the status for this manifest
    pub fn with_status(mut self, status: serde_json::Value) -> Self {
        self.status = Some(status);
        self
    }

    /// Add labels to the manifest
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.metadata.labels = Some(labels);
        self
    }

    /// Add annotations to the manifest
    pub fn with_annotations(mut self, annotations: BTreeMap<String, String>) -> Self {
        self.metadata.annotations = Some(annotations);
        self
    }

    /// Name of the resource
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Convert the manifest into a JSON value
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| Error::serialization_for(&self.kind, e.to_string()))
    }
}

/// Where and how generated pool objects are labelled
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolMetadata {
    /// Cluster name, as known to EKS
    pub cluster: String,
    /// Namespace the objects are created in
    pub namespace: String,
    /// Labels common to every generated object
    pub labels: BTreeMap<String, String>,
    /// Annotations common to every generated object
    pub annotations: BTreeMap<String, String>,
}

impl PoolMetadata {
    /// Labels for the objects of one nodegroup
    ///
    /// The machine-pool label is added to a copy so it never leaks into the
    /// objects of another nodegroup.
    pub fn labels_for(&self, nodegroup: &str) -> BTreeMap<String, String> {
        let mut labels = self.labels.clone();
        labels.insert(MACHINE_POOL_LABEL.to_string(), nodegroup.to_string());
        labels
    }
}

/// Name of the `AWSManagedMachinePool` for a nodegroup
pub fn managed_machine_pool_name(cluster: &str, nodegroup: &str) -> String {
    format!("{}-awsmanagedmachinepool-{}", cluster, nodegroup)
}

/// Name of the `MachinePool` for a nodegroup
pub fn machine_pool_name(cluster: &str, nodegroup: &str) -> String {
    format!("{}-machinepool-{}", cluster, nodegroup)
}

/// Generate the `AWSManagedMachinePool` for a resolved nodegroup
///
/// The status echoes the nodegroup's own launch template reference, not the
/// effective template, so CAPA can tell the two apart.
pub fn generate_managed_machine_pool(
    meta: &PoolMetadata,
    spec: &AwsManagedMachinePoolSpec,
    nodegroup_template: Option<&LaunchTemplateReference>,
) -> Result<CAPIManifest> {
    let nodegroup = &spec.eks_nodegroup_name;
    let status = AwsManagedMachinePoolStatus {
        ready: true,
        replicas: spec.replicas(),
        launch_template_id: nodegroup_template.and_then(|lt| lt.id.clone()),
        launch_template_version: nodegroup_template.and_then(|lt| lt.version.clone()),
    };

    let spec = serde_json::to_value(spec)
        .map_err(|e| Error::serialization_for(AWS_MANAGED_MACHINE_POOL_KIND, e.to_string()))?;
    let status = serde_json::to_value(status)
        .map_err(|e| Error::serialization_for(AWS_MANAGED_MACHINE_POOL_KIND, e.to_string()))?;

    Ok(CAPIManifest::new(
        INFRASTRUCTURE_API_VERSION,
        AWS_MANAGED_MACHINE_POOL_KIND,
        managed_machine_pool_name(&meta.cluster, nodegroup),
        &meta.namespace,
    )
    .with_spec(spec)
    .with_status(status)
    .with_labels(meta.labels_for(nodegroup))
    .with_annotations(meta.annotations.clone()))
}

/// Generate the `MachinePool` that wraps an `AWSManagedMachinePool`
///
/// Replicas mirror the infrastructure pool. Bootstrap data is left to EKS,
/// so the data secret name is empty.
pub fn generate_machine_pool(
    meta: &PoolMetadata,
    nodegroup: &str,
    replicas: i32,
) -> CAPIManifest {
    let spec = serde_json::json!({
        "clusterName": meta.cluster,
        "replicas": replicas,
        "template": {
            "spec": {
                "clusterName": meta.cluster,
                "bootstrap": {
                    "dataSecretName": ""
                },
                "infrastructureRef": {
                    "apiVersion": INFRASTRUCTURE_API_VERSION,
                    "kind": AWS_MANAGED_MACHINE_POOL_KIND,
                    "name": managed_machine_pool_name(&meta.cluster, nodegroup),
                    "namespace": meta.namespace
                }
            }
        }
    });

    CAPIManifest::new(
        CLUSTER_API_VERSION,
        MACHINE_POOL_KIND,
        machine_pool_name(&meta.cluster, nodegroup),
        &meta.namespace,
    )
    .with_spec(spec)
    .with_labels(meta.labels_for(nodegroup))
    .with_annotations(meta.annotations.clone())
}
