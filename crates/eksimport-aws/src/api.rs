//! Read-only AWS capabilities used by the resolvers
//!
//! Each trait covers the calls of one AWS service. Production code
//! implements them on the SDK clients (see [`crate::sdk`]); tests use the
//! generated mocks or a [`crate::snapshot::Snapshot`].

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use eksimport_common::descriptor::{
    AutoScalingGroupDescriptor, LaunchTemplateReference, LaunchTemplateVersionDescriptor,
    NodegroupDescriptor,
};
use eksimport_common::Error;

/// EKS nodegroup listing and description
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodegroupApi: Send + Sync {
    /// Names of all nodegroups of a cluster
    async fn list_nodegroups(&self, cluster: &str) -> Result<Vec<String>, Error>;

    /// Describe a single nodegroup
    async fn describe_nodegroup(
        &self,
        cluster: &str,
        nodegroup: &str,
    ) -> Result<NodegroupDescriptor, Error>;
}

/// Auto Scaling group description
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AutoscalingApi: Send + Sync {
    /// Describe the named groups; unknown names are simply absent
    async fn describe_auto_scaling_groups(
        &self,
        names: &[String],
    ) -> Result<Vec<AutoScalingGroupDescriptor>, Error>;
}

/// EC2 launch template version description
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LaunchTemplateApi: Send + Sync {
    /// Describe the given versions of a template
    ///
    /// The template is selected by id, or by name when it has no id.
    async fn describe_launch_template_versions(
        &self,
        template: &LaunchTemplateReference,
        versions: &[String],
    ) -> Result<Vec<LaunchTemplateVersionDescriptor>, Error>;
}
