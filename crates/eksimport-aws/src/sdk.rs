//! AWS SDK backed capabilities
//!
//! Implements the capability traits on the SDK clients and converts the SDK
//! response shapes into descriptors.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::SdkConfig;
use tracing::debug;

use crate::api::{AutoscalingApi, LaunchTemplateApi, NodegroupApi};
use eksimport_common::descriptor::{
    AsgInstance, AutoScalingGroupDescriptor, BlockDeviceMapping, CapacityType, EbsBlockDevice,
    IamInstanceProfile, LaunchTemplateData, LaunchTemplateReference,
    LaunchTemplateVersionDescriptor, NodegroupDescriptor, NodegroupTaint, NodegroupUpdateConfig,
    RemoteAccessConfig, ScalingConfig, SpotOptions,
};
use eksimport_common::{Error, Result};

/// SDK clients for the three services an import reads from
#[derive(Clone)]
pub struct AwsClients {
    /// EKS
    pub eks: Arc<aws_sdk_eks::Client>,
    /// Auto Scaling
    pub autoscaling: Arc<aws_sdk_autoscaling::Client>,
    /// EC2
    pub ec2: Arc<aws_sdk_ec2::Client>,
}

impl AwsClients {
    /// Build clients from a loaded SDK configuration
    pub fn new(config: &SdkConfig, max_attempts: u32) -> Self {
        let eks = aws_sdk_eks::Client::from_conf(
            aws_sdk_eks::config::Builder::from(config)
                .retry_config(aws_sdk_eks::config::retry::RetryConfig::standard().with_max_attempts(max_attempts))
                .build(),
        );
        let autoscaling = aws_sdk_autoscaling::Client::from_conf(
            aws_sdk_autoscaling::config::Builder::from(config)
                .retry_config(
                    aws_sdk_autoscaling::config::retry::RetryConfig::standard()
                        .with_max_attempts(max_attempts),
                )
                .build(),
        );
        let ec2 = aws_sdk_ec2::Client::from_conf(
            aws_sdk_ec2::config::Builder::from(config)
                .retry_config(aws_sdk_ec2::config::retry::RetryConfig::standard().with_max_attempts(max_attempts))
                .build(),
        );

        Self {
            eks: Arc::new(eks),
            autoscaling: Arc::new(autoscaling),
            ec2: Arc::new(ec2),
        }
    }
}

#[async_trait]
impl NodegroupApi for aws_sdk_eks::Client {
    async fn list_nodegroups(&self, cluster: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .list_nodegroups()
                .cluster_name(cluster)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    Error::aws(
                        "eks",
                        "ListNodegroups",
                        aws_sdk_eks::error::DisplayErrorContext(&e).to_string(),
                    )
                })?;

            names.extend(output.nodegroups().iter().cloned());
            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(cluster = %cluster, count = names.len(), "Listed nodegroups");
        Ok(names)
    }

    async fn describe_nodegroup(&self, cluster: &str, nodegroup: &str) -> Result<NodegroupDescriptor> {
        let output = self
            .describe_nodegroup()
            .cluster_name(cluster)
            .nodegroup_name(nodegroup)
            .send()
            .await
            .map_err(|e| {
                Error::aws(
                    "eks",
                    "DescribeNodegroup",
                    aws_sdk_eks::error::DisplayErrorContext(&e).to_string(),
                )
            })?;

        output
            .nodegroup()
            .map(nodegroup_descriptor)
            .ok_or_else(|| Error::not_found("nodegroup", nodegroup))
    }
}

#[async_trait]
impl AutoscalingApi for aws_sdk_autoscaling::Client {
    async fn describe_auto_scaling_groups(
        &self,
        names: &[String],
    ) -> Result<Vec<AutoScalingGroupDescriptor>> {
        let output = self
            .describe_auto_scaling_groups()
            .set_auto_scaling_group_names(Some(names.to_vec()))
            .send()
            .await
            .map_err(|e| {
                Error::aws(
                    "autoscaling",
                    "DescribeAutoScalingGroups",
                    aws_sdk_autoscaling::error::DisplayErrorContext(&e).to_string(),
                )
            })?;

        Ok(output
            .auto_scaling_groups()
            .iter()
            .map(auto_scaling_group_descriptor)
            .collect())
    }
}

#[async_trait]
impl LaunchTemplateApi for aws_sdk_ec2::Client {
    async fn describe_launch_template_versions(
        &self,
        template: &LaunchTemplateReference,
        versions: &[String],
    ) -> Result<Vec<LaunchTemplateVersionDescriptor>> {
        let mut request = self.describe_launch_template_versions();
        request = match (&template.id, &template.name) {
            (Some(id), _) => request.launch_template_id(id),
            (None, Some(name)) => request.launch_template_name(name),
            (None, None) => {
                return Err(Error::validation(
                    "launch template reference has neither id nor name",
                ))
            }
        };
        if !versions.is_empty() {
            request = request.set_versions(Some(versions.to_vec()));
        }

        let output = request.send().await.map_err(|e| {
            Error::aws(
                "ec2",
                "DescribeLaunchTemplateVersions",
                aws_sdk_ec2::error::DisplayErrorContext(&e).to_string(),
            )
        })?;

        Ok(output
            .launch_template_versions()
            .iter()
            .map(launch_template_version_descriptor)
            .collect())
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

/// Convert an EKS nodegroup
pub fn nodegroup_descriptor(nodegroup: &aws_sdk_eks::types::Nodegroup) -> NodegroupDescriptor {
    NodegroupDescriptor {
        nodegroup_name: nodegroup.nodegroup_name().unwrap_or_default().to_string(),
        cluster_name: owned(nodegroup.cluster_name()),
        ami_type: nodegroup.ami_type().map(|t| t.as_str().to_string()),
        version: owned(nodegroup.version()),
        release_version: owned(nodegroup.release_version()),
        capacity_type: nodegroup
            .capacity_type()
            .and_then(|c| CapacityType::from_aws(c.as_str())),
        disk_size: nodegroup.disk_size(),
        instance_types: nodegroup.instance_types().to_vec(),
        launch_template: nodegroup
            .launch_template()
            .map(|lt| LaunchTemplateReference {
                id: owned(lt.id()),
                name: owned(lt.name()),
                version: owned(lt.version()),
            }),
        labels: nodegroup
            .labels()
            .map(|labels| {
                labels
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default(),
        node_role: owned(nodegroup.node_role()),
        remote_access: nodegroup.remote_access().map(|access| RemoteAccessConfig {
            ec2_ssh_key: owned(access.ec2_ssh_key()),
            source_security_groups: access.source_security_groups().to_vec(),
        }),
        scaling_config: nodegroup.scaling_config().map(|scaling| ScalingConfig {
            min_size: scaling.min_size(),
            max_size: scaling.max_size(),
            desired_size: scaling.desired_size(),
        }),
        subnets: nodegroup.subnets().to_vec(),
        taints: nodegroup
            .taints()
            .iter()
            .map(|taint| NodegroupTaint {
                key: owned(taint.key()),
                value: owned(taint.value()),
                effect: taint.effect().map(|e| e.as_str().to_string()),
            })
            .collect(),
        update_config: nodegroup.update_config().map(|update| NodegroupUpdateConfig {
            max_unavailable: update.max_unavailable(),
            max_unavailable_percentage: update.max_unavailable_percentage(),
        }),
        auto_scaling_groups: nodegroup
            .resources()
            .map(|resources| {
                resources
                    .auto_scaling_groups()
                    .iter()
                    .filter_map(|group| owned(group.name()))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Convert an autoscaling group
pub fn auto_scaling_group_descriptor(
    group: &aws_sdk_autoscaling::types::AutoScalingGroup,
) -> AutoScalingGroupDescriptor {
    AutoScalingGroupDescriptor {
        name: Some(group.auto_scaling_group_name().to_string()),
        availability_zones: group.availability_zones().to_vec(),
        instances: group
            .instances()
            .iter()
            .map(|instance| AsgInstance {
                instance_id: Some(instance.instance_id().to_string()),
                availability_zone: Some(instance.availability_zone().to_string()),
            })
            .collect(),
        mixed_instances_launch_template: group
            .mixed_instances_policy()
            .and_then(|policy| policy.launch_template())
            .and_then(|lt| lt.launch_template_specification())
            .map(|spec| LaunchTemplateReference {
                id: owned(spec.launch_template_id()),
                name: owned(spec.launch_template_name()),
                version: owned(spec.version()),
            }),
    }
}

/// Convert an EC2 launch template version
pub fn launch_template_version_descriptor(
    version: &aws_sdk_ec2::types::LaunchTemplateVersion,
) -> LaunchTemplateVersionDescriptor {
    LaunchTemplateVersionDescriptor {
        launch_template_id: owned(version.launch_template_id()),
        launch_template_name: owned(version.launch_template_name()),
        version_number: version.version_number(),
        default_version: version.default_version(),
        data: version.launch_template_data().map(|data| LaunchTemplateData {
            instance_type: data.instance_type().map(|t| t.as_str().to_string()),
            key_name: owned(data.key_name()),
            image_id: owned(data.image_id()),
            iam_instance_profile: data.iam_instance_profile().map(|profile| IamInstanceProfile {
                arn: owned(profile.arn()),
                name: owned(profile.name()),
            }),
            spot_options: data
                .instance_market_options()
                .and_then(|market| market.spot_options())
                .map(|spot| SpotOptions {
                    max_price: owned(spot.max_price()),
                }),
            block_device_mappings: data
                .block_device_mappings()
                .iter()
                .map(|mapping| BlockDeviceMapping {
                    device_name: owned(mapping.device_name()),
                    ebs: mapping.ebs().map(|ebs| EbsBlockDevice {
                        encrypted: ebs.encrypted(),
                        iops: ebs.iops(),
                        volume_size: ebs.volume_size(),
                        throughput: ebs.throughput(),
                        volume_type: ebs.volume_type().map(|t| t.as_str().to_string()),
                    }),
                })
                .collect(),
            security_group_ids: data.security_group_ids().to_vec(),
        }),
    }
}
