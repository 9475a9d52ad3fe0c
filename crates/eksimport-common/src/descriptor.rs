//! Read-only AWS facts consumed by the resolvers
//!
//! These mirror the parts of the EKS, Auto Scaling and EC2 responses that
//! matter for import. They are SDK-independent so the resolvers can be driven
//! from mocks or snapshot files, and every field AWS may omit is an `Option`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Purchase option of an EKS nodegroup
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapacityType {
    /// On-demand instances
    OnDemand,
    /// Spot instances
    Spot,
    /// Capacity blocks for ML
    CapacityBlock,
}

impl CapacityType {
    /// Parse the EKS wire value (`ON_DEMAND`, `SPOT`, `CAPACITY_BLOCK`)
    pub fn from_aws(value: &str) -> Option<Self> {
        match value {
            "ON_DEMAND" => Some(Self::OnDemand),
            "SPOT" => Some(Self::Spot),
            "CAPACITY_BLOCK" => Some(Self::CapacityBlock),
            _ => None,
        }
    }
}

/// Reference to a launch template and one of its versions
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTemplateReference {
    /// Launch template id (`lt-...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Launch template name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Version number or a `$Latest`/`$Default` marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl LaunchTemplateReference {
    /// Human readable identifier: the name, else the id
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unnamed>")
    }
}

/// SSH access configuration of a nodegroup
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAccessConfig {
    /// EC2 key pair name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ec2_ssh_key: Option<String>,
    /// Security groups allowed to reach the nodes
    #[serde(default)]
    pub source_security_groups: Vec<String>,
}

/// Scaling bounds of a nodegroup
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScalingConfig {
    /// Minimum node count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<i32>,
    /// Maximum node count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i32>,
    /// Desired node count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_size: Option<i32>,
}

/// Kubernetes taint applied to every node of a nodegroup
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodegroupTaint {
    /// Taint key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Taint value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// EKS effect (`NO_SCHEDULE`, `NO_EXECUTE`, `PREFER_NO_SCHEDULE`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
}

/// Rolling update configuration of a nodegroup
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodegroupUpdateConfig {
    /// Absolute number of nodes that may be unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<i32>,
    /// Percentage of nodes that may be unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable_percentage: Option<i32>,
}

/// An EKS managed nodegroup as returned by `DescribeNodegroup`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodegroupDescriptor {
    /// Nodegroup name
    pub nodegroup_name: String,
    /// Owning cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    /// AMI type (`AL2_x86_64`, `BOTTLEROCKET_ARM_64`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ami_type: Option<String>,
    /// Kubernetes version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// AMI release version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_version: Option<String>,
    /// Purchase option
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_type: Option<CapacityType>,
    /// Root disk size in GiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<i32>,
    /// Instance types, in the order EKS reports them
    #[serde(default)]
    pub instance_types: Vec<String>,
    /// Nodegroup-level launch template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template: Option<LaunchTemplateReference>,
    /// Kubernetes labels applied to the nodes
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// IAM role ARN of the nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_role: Option<String>,
    /// SSH access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_access: Option<RemoteAccessConfig>,
    /// Scaling bounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling_config: Option<ScalingConfig>,
    /// Subnets the nodes are launched into
    #[serde(default)]
    pub subnets: Vec<String>,
    /// Node taints
    #[serde(default)]
    pub taints: Vec<NodegroupTaint>,
    /// Rolling update configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_config: Option<NodegroupUpdateConfig>,
    /// Names of the backing autoscaling groups
    #[serde(default)]
    pub auto_scaling_groups: Vec<String>,
}

/// An instance that belongs to an autoscaling group
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AsgInstance {
    /// EC2 instance id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    /// Availability zone of the instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
}

/// An autoscaling group as returned by `DescribeAutoScalingGroups`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutoScalingGroupDescriptor {
    /// Group name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Availability zones the group spans
    #[serde(default)]
    pub availability_zones: Vec<String>,
    /// Current members, in API order
    #[serde(default)]
    pub instances: Vec<AsgInstance>,
    /// Launch template of the mixed-instances policy, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixed_instances_launch_template: Option<LaunchTemplateReference>,
}

/// IAM instance profile attached by a launch template
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IamInstanceProfile {
    /// Profile ARN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Profile name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Spot market options of a launch template
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpotOptions {
    /// Maximum hourly price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
}

/// EBS settings of a block device mapping
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EbsBlockDevice {
    /// Whether the volume is encrypted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    /// Provisioned IOPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iops: Option<i32>,
    /// Size in GiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_size: Option<i32>,
    /// Throughput in MiB/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<i32>,
    /// Volume type (`gp3`, `io2`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
}

/// A block device mapping of a launch template
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockDeviceMapping {
    /// Device name (`/dev/xvda`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// EBS settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebs: Option<EbsBlockDevice>,
}

/// The instance configuration stored in a launch template version
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTemplateData {
    /// Instance type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    /// SSH key pair name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// AMI id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// IAM instance profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_instance_profile: Option<IamInstanceProfile>,
    /// Spot options; present only for spot market templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_options: Option<SpotOptions>,
    /// Block device mappings, in template order
    #[serde(default)]
    pub block_device_mappings: Vec<BlockDeviceMapping>,
    /// Security group ids; AWS does not deduplicate these
    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

/// A launch template version as returned by `DescribeLaunchTemplateVersions`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTemplateVersionDescriptor {
    /// Template id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template_id: Option<String>,
    /// Template name as stored by EC2
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template_name: Option<String>,
    /// Version number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_number: Option<i64>,
    /// Whether this is the template's default version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version: Option<bool>,
    /// Template contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LaunchTemplateData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_type_parses_eks_values() {
        assert_eq!(CapacityType::from_aws("ON_DEMAND"), Some(CapacityType::OnDemand));
        assert_eq!(CapacityType::from_aws("SPOT"), Some(CapacityType::Spot));
        assert_eq!(
            CapacityType::from_aws("CAPACITY_BLOCK"),
            Some(CapacityType::CapacityBlock)
        );
        assert_eq!(CapacityType::from_aws("onDemand"), None);
    }

    #[test]
    fn template_display_name_prefers_name() {
        let both = LaunchTemplateReference {
            id: Some("lt-123".to_string()),
            name: Some("workers".to_string()),
            version: None,
        };
        assert_eq!(both.display_name(), "workers");

        let id_only = LaunchTemplateReference {
            id: Some("lt-123".to_string()),
            ..Default::default()
        };
        assert_eq!(id_only.display_name(), "lt-123");
        assert_eq!(LaunchTemplateReference::default().display_name(), "<unnamed>");
    }

    #[test]
    fn nodegroup_yaml_with_only_a_name_uses_defaults() {
        let ng: NodegroupDescriptor = serde_yaml::from_str("nodegroupName: ng-1").unwrap();
        assert_eq!(ng.nodegroup_name, "ng-1");
        assert!(ng.instance_types.is_empty());
        assert!(ng.launch_template.is_none());
        assert!(ng.auto_scaling_groups.is_empty());
    }

    #[test]
    fn nodegroup_yaml_reads_capacity_and_template() {
        let yaml = r#"
nodegroupName: ng-2
capacityType: SPOT
instanceTypes: [m5.large, m5a.large]
launchTemplate:
  id: lt-234567
  name: eksctl-test-nodegroup-ng-1
  version: "2"
autoScalingGroups: [asg-2]
"#;
        let ng: NodegroupDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ng.capacity_type, Some(CapacityType::Spot));
        assert_eq!(ng.instance_types, vec!["m5.large", "m5a.large"]);
        let lt = ng.launch_template.unwrap();
        assert_eq!(lt.id.as_deref(), Some("lt-234567"));
        assert_eq!(lt.version.as_deref(), Some("2"));
        assert_eq!(ng.auto_scaling_groups, vec!["asg-2"]);
    }
}
