//! Nodegroup resolution
//!
//! Combines a nodegroup description with its first autoscaling group and
//! both launch templates into one `AWSManagedMachinePool` spec.
//!
//! Template precedence:
//! 1. The nodegroup's own launch template, with the AMI id and IAM instance
//!    profile taken from the group template when it leaves them blank
//! 2. The group's mixed-instances template when the nodegroup has none
//! 3. No template, with the instance type set on the spec itself

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{AutoscalingApi, LaunchTemplateApi};
use crate::autoscaling::{AutoscalingResolver, ResolvedAutoscaling};
use crate::launch_template::LaunchTemplateResolver;
use crate::options::ResolverOptions;
use eksimport_capi::{
    provider_id, AwsLaunchTemplate, AwsManagedMachinePoolSpec, ManagedMachinePoolCapacityType,
    ManagedMachinePoolScaling, ManagedRemoteAccess, Taint, TaintEffect, UpdateConfig,
};
use eksimport_common::descriptor::{
    AutoScalingGroupDescriptor, CapacityType, NodegroupDescriptor, NodegroupTaint,
};
use eksimport_common::{Error, Result};

/// Resolves nodegroups into managed machine pool specs
#[derive(Clone)]
pub struct NodegroupResolver {
    autoscaling: AutoscalingResolver,
    templates: LaunchTemplateResolver,
    options: ResolverOptions,
}

impl NodegroupResolver {
    /// Create a resolver from the Auto Scaling and EC2 capabilities
    pub fn new(
        autoscaling: Arc<dyn AutoscalingApi>,
        ec2: Arc<dyn LaunchTemplateApi>,
        options: ResolverOptions,
    ) -> Self {
        let templates = LaunchTemplateResolver::new(ec2);
        let autoscaling = AutoscalingResolver::new(
            autoscaling,
            templates.clone(),
            options.default_template_version.clone(),
        );
        Self {
            autoscaling,
            templates,
            options,
        }
    }

    /// Build the spec for one nodegroup
    ///
    /// Fails when the first autoscaling group cannot be described. Launch
    /// template failures are logged and the next source in the precedence
    /// order is used instead.
    pub async fn resolve(&self, nodegroup: &NodegroupDescriptor) -> Result<AwsManagedMachinePoolSpec> {
        let name = nodegroup.nodegroup_name.as_str();

        let group_name = nodegroup
            .auto_scaling_groups
            .first()
            .ok_or_else(|| Error::not_found("autoscaling group", format!("of nodegroup {}", name)))?;
        let ResolvedAutoscaling {
            group,
            launch_template: group_template,
            launch_template_error,
        } = self.autoscaling.resolve(group_name).await?;
        if let Some(e) = launch_template_error {
            debug!(nodegroup = %name, error = %e, "Continuing without autoscaling group launch template");
        }

        let nodegroup_template = match self.templates.resolve(nodegroup.launch_template.as_ref()).await {
            Ok(template) => template,
            Err(e) => {
                warn!(nodegroup = %name, error = %e, "Failed to resolve nodegroup launch template");
                None
            }
        };

        let aws_launch_template =
            effective_launch_template(nodegroup_template, group_template, &nodegroup.instance_types);
        let instance_type = match &aws_launch_template {
            Some(_) => None,
            None => Some(
                nodegroup
                    .instance_types
                    .first()
                    .cloned()
                    .ok_or_else(|| Error::MissingInstanceType {
                        nodegroup: name.to_string(),
                    })?,
            ),
        };

        let role_name = nodegroup
            .node_role
            .as_deref()
            .map(role_name_from_arn)
            .transpose()?;

        let spec = AwsManagedMachinePoolSpec {
            eks_nodegroup_name: name.to_string(),
            availability_zones: group.availability_zones.clone(),
            subnet_ids: nodegroup.subnets.clone(),
            role_name,
            ami_version: nodegroup.release_version.clone(),
            ami_type: nodegroup.ami_type.clone(),
            labels: nodegroup.labels.clone(),
            taints: taints(name, &nodegroup.taints),
            disk_size: nodegroup.disk_size,
            instance_type,
            scaling: nodegroup.scaling_config.as_ref().map(|scaling| ManagedMachinePoolScaling {
                min_size: scaling.min_size,
                max_size: scaling.max_size,
            }),
            remote_access: nodegroup.remote_access.as_ref().map(|access| ManagedRemoteAccess {
                ssh_key_name: access.ec2_ssh_key.clone(),
                source_security_groups: access.source_security_groups.clone(),
            }),
            provider_id_list: provider_ids(name, &group),
            capacity_type: self.capacity_type(name, nodegroup.capacity_type),
            update_config: Some(
                nodegroup
                    .update_config
                    .as_ref()
                    .map(|update| UpdateConfig {
                        max_unavailable: update.max_unavailable,
                        max_unavailable_percentage: update.max_unavailable_percentage,
                    })
                    .unwrap_or_default(),
            ),
            aws_launch_template,
        };

        info!(
            nodegroup = %name,
            replicas = spec.replicas(),
            launch_template = spec.aws_launch_template.as_ref().map(|lt| lt.name.as_str()).unwrap_or("-"),
            "Resolved nodegroup"
        );
        Ok(spec)
    }

    fn capacity_type(
        &self,
        nodegroup: &str,
        capacity: Option<CapacityType>,
    ) -> Option<ManagedMachinePoolCapacityType> {
        match capacity? {
            CapacityType::OnDemand => Some(ManagedMachinePoolCapacityType::OnDemand),
            CapacityType::Spot if self.options.collapse_spot_capacity => {
                warn!(nodegroup = %nodegroup, "Reporting spot nodegroup as onDemand");
                Some(ManagedMachinePoolCapacityType::OnDemand)
            }
            CapacityType::Spot => Some(ManagedMachinePoolCapacityType::Spot),
            CapacityType::CapacityBlock => {
                debug!(nodegroup = %nodegroup, "Capacity blocks have no managed machine pool equivalent");
                None
            }
        }
    }
}

/// Pick the effective launch template
///
/// A template without an instance type gets the nodegroup's first one.
pub fn effective_launch_template(
    nodegroup_template: Option<AwsLaunchTemplate>,
    group_template: Option<AwsLaunchTemplate>,
    instance_types: &[String],
) -> Option<AwsLaunchTemplate> {
    let mut template = match (nodegroup_template, group_template) {
        (Some(mut template), Some(group)) => {
            if template.ami.id.as_deref().map_or(true, str::is_empty) {
                template.ami = group.ami;
            }
            if template.iam_instance_profile.is_empty() {
                template.iam_instance_profile = group.iam_instance_profile;
            }
            template
        }
        (Some(template), None) | (None, Some(template)) => template,
        (None, None) => return None,
    };

    if template.instance_type.is_empty() {
        if let Some(instance_type) = instance_types.first() {
            template.instance_type = instance_type.clone();
        }
    }
    Some(template)
}

/// The IAM role name is the last path segment of the role ARN
pub fn role_name_from_arn(arn: &str) -> Result<String> {
    match arn.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(Error::MalformedRoleArn {
            arn: arn.to_string(),
        }),
    }
}

fn taints(nodegroup: &str, taints: &[NodegroupTaint]) -> Vec<Taint> {
    taints
        .iter()
        .filter_map(|taint| {
            let effect = taint.effect.as_deref().unwrap_or_default();
            let Some(effect) = TaintEffect::from_eks(effect) else {
                warn!(nodegroup = %nodegroup, effect = %effect, "Skipping taint with unknown effect");
                return None;
            };
            Some(Taint {
                effect,
                key: taint.key.clone().unwrap_or_default(),
                value: taint.value.clone().unwrap_or_default(),
            })
        })
        .collect()
}

/// Provider ids of the group members, in group order
fn provider_ids(nodegroup: &str, group: &AutoScalingGroupDescriptor) -> Vec<String> {
    group
        .instances
        .iter()
        .filter_map(|instance| {
            match (&instance.availability_zone, &instance.instance_id) {
                (Some(zone), Some(id)) => Some(provider_id(zone, id)),
                _ => {
                    warn!(nodegroup = %nodegroup, instance = ?instance.instance_id, "Skipping instance without zone or id");
                    None
                }
            }
        })
        .collect()
}
