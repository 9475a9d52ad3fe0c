//! Offline AWS inventory
//!
//! A snapshot holds pre-recorded nodegroups, autoscaling groups and launch
//! template versions in one YAML document and answers the capability calls
//! from them. It backs offline imports and integration tests.
//!
//! ```yaml
//! nodegroups:
//!   - nodegroupName: ng-1
//!     clusterName: example
//!     autoScalingGroups: [asg-1]
//! autoScalingGroups:
//!   - name: asg-1
//!     availabilityZones: [eu-west-1a]
//! launchTemplateVersions:
//!   - launchTemplateId: lt-1
//!     versionNumber: 1
//!     defaultVersion: true
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{AutoscalingApi, LaunchTemplateApi, NodegroupApi};
use eksimport_common::descriptor::{
    AutoScalingGroupDescriptor, LaunchTemplateReference, LaunchTemplateVersionDescriptor,
    NodegroupDescriptor,
};
use eksimport_common::{Error, Result};

/// Recorded AWS state
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Nodegroups of any number of clusters
    #[serde(default)]
    pub nodegroups: Vec<NodegroupDescriptor>,
    /// Autoscaling groups
    #[serde(default)]
    pub auto_scaling_groups: Vec<AutoScalingGroupDescriptor>,
    /// Launch template versions
    #[serde(default)]
    pub launch_template_versions: Vec<LaunchTemplateVersionDescriptor>,
}

impl Snapshot {
    /// Parse a snapshot from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::serialization_for("Snapshot", e.to_string()))
    }

    /// Read a snapshot file
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            Error::validation(format!("cannot read snapshot {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&yaml)
    }

    fn in_cluster<'a>(&'a self, cluster: &'a str) -> impl Iterator<Item = &'a NodegroupDescriptor> {
        self.nodegroups
            .iter()
            .filter(move |ng| ng.cluster_name.as_deref().map_or(true, |c| c == cluster))
    }

    fn template_versions<'a>(
        &'a self,
        template: &'a LaunchTemplateReference,
    ) -> impl Iterator<Item = &'a LaunchTemplateVersionDescriptor> {
        self.launch_template_versions.iter().filter(move |v| match &template.id {
            Some(id) => v.launch_template_id.as_ref() == Some(id),
            None => template.name.is_some() && v.launch_template_name == template.name,
        })
    }
}

/// Whether a recorded version matches a requested version string
///
/// `$Latest` selects the highest number of the template.
fn version_matches(
    requested: &str,
    version: &LaunchTemplateVersionDescriptor,
    latest: Option<i64>,
) -> bool {
    match requested {
        "$Latest" => version.version_number.is_some() && version.version_number == latest,
        "$Default" => version.default_version == Some(true),
        number => number
            .parse::<i64>()
            .map_or(false, |n| version.version_number == Some(n)),
    }
}

#[async_trait]
impl NodegroupApi for Snapshot {
    async fn list_nodegroups(&self, cluster: &str) -> Result<Vec<String>> {
        Ok(self
            .in_cluster(cluster)
            .map(|ng| ng.nodegroup_name.clone())
            .collect())
    }

    async fn describe_nodegroup(&self, cluster: &str, nodegroup: &str) -> Result<NodegroupDescriptor> {
        self.in_cluster(cluster)
            .find(|ng| ng.nodegroup_name == nodegroup)
            .cloned()
            .ok_or_else(|| Error::not_found("nodegroup", nodegroup))
    }
}

#[async_trait]
impl AutoscalingApi for Snapshot {
    async fn describe_auto_scaling_groups(
        &self,
        names: &[String],
    ) -> Result<Vec<AutoScalingGroupDescriptor>> {
        Ok(self
            .auto_scaling_groups
            .iter()
            .filter(|group| group.name.as_ref().map_or(false, |n| names.contains(n)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LaunchTemplateApi for Snapshot {
    async fn describe_launch_template_versions(
        &self,
        template: &LaunchTemplateReference,
        versions: &[String],
    ) -> Result<Vec<LaunchTemplateVersionDescriptor>> {
        if template.id.is_none() && template.name.is_none() {
            return Err(Error::validation(
                "launch template reference has neither id nor name",
            ));
        }

        let latest = self
            .template_versions(template)
            .filter_map(|v| v.version_number)
            .max();

        Ok(self
            .template_versions(template)
            .filter(|v| {
                versions.is_empty()
                    || versions
                        .iter()
                        .any(|requested| version_matches(requested, v, latest))
            })
            .cloned()
            .collect())
    }
}
