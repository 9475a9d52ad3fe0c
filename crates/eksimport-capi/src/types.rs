//! CAPA managed machine pool types
//!
//! Serialized field names follow `infrastructure.cluster.x-k8s.io/v1beta2`
//! so the output can be applied without further mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Capacity type of a managed machine pool
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ManagedMachinePoolCapacityType {
    /// On-demand instances
    OnDemand,
    /// Spot instances
    Spot,
}

/// Taint effect as CAPA spells it
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaintEffect {
    /// `NoSchedule`
    NoSchedule,
    /// `NoExecute`
    NoExecute,
    /// `PreferNoSchedule`
    PreferNoSchedule,
}

impl TaintEffect {
    /// Map an EKS taint effect (`NO_SCHEDULE`, ...) to the CAPA value
    pub fn from_eks(effect: &str) -> Option<Self> {
        match effect {
            "NO_SCHEDULE" => Some(Self::NoSchedule),
            "NO_EXECUTE" => Some(Self::NoExecute),
            "PREFER_NO_SCHEDULE" => Some(Self::PreferNoSchedule),
            _ => None,
        }
    }
}

/// Node taint
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Taint {
    /// Effect
    pub effect: TaintEffect,
    /// Key
    pub key: String,
    /// Value
    pub value: String,
}

/// Scaling bounds
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedMachinePoolScaling {
    /// Minimum size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<i32>,
    /// Maximum size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i32>,
}

/// SSH access to pool nodes
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedRemoteAccess {
    /// Key pair name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_name: Option<String>,
    /// Security groups allowed to connect
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_security_groups: Vec<String>,
}

/// Rolling update limits; at most one is normally set
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfig {
    /// Absolute count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<i32>,
    /// Percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable_percentage: Option<i32>,
}

/// AMI selector
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AmiReference {
    /// AMI id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Reference to an AWS resource by id
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AwsResourceReference {
    /// Resource id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Spot pricing
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpotMarketOptions {
    /// Maximum hourly price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
}

/// Root volume of the pool instances
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Device name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device_name: String,
    /// Size in GiB
    pub size: i64,
    /// Volume type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    /// Provisioned IOPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,
    /// Throughput in MiB/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<i64>,
    /// Encryption flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
}

/// Effective launch template of a pool
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AwsLaunchTemplate {
    /// Template name as referenced by the nodegroup or group
    pub name: String,
    /// Resolved version number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_number: Option<i64>,
    /// Instance type; empty until filled from the nodegroup
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance_type: String,
    /// SSH key pair name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_name: Option<String>,
    /// AMI
    #[serde(default)]
    pub ami: AmiReference,
    /// IAM instance profile name or ARN
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iam_instance_profile: String,
    /// Spot pricing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_market_options: Option<SpotMarketOptions>,
    /// Root volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_volume: Option<Volume>,
    /// Additional security groups, unique by id
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_security_groups: Vec<AwsResourceReference>,
}

/// Spec of an `AWSManagedMachinePool`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AwsManagedMachinePoolSpec {
    /// EKS nodegroup name
    pub eks_nodegroup_name: String,
    /// Availability zones, taken from the autoscaling group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zones: Vec<String>,
    /// Subnets
    #[serde(rename = "subnetIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub subnet_ids: Vec<String>,
    /// Node IAM role name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    /// AMI release version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ami_version: Option<String>,
    /// AMI type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ami_type: Option<String>,
    /// Node labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Node taints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
    /// Root disk size in GiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<i32>,
    /// Bare instance type, set only when no launch template exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    /// Scaling bounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ManagedMachinePoolScaling>,
    /// SSH access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_access: Option<ManagedRemoteAccess>,
    /// `aws:///<az>/<instance-id>` for every group member
    #[serde(rename = "providerIDList", default, skip_serializing_if = "Vec::is_empty")]
    pub provider_id_list: Vec<String>,
    /// Capacity type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_type: Option<ManagedMachinePoolCapacityType>,
    /// Rolling update limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_config: Option<UpdateConfig>,
    /// Effective launch template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_launch_template: Option<AwsLaunchTemplate>,
}

impl AwsManagedMachinePoolSpec {
    /// Replica count implied by the current group members
    pub fn replicas(&self) -> i32 {
        i32::try_from(self.provider_id_list.len()).unwrap_or(i32::MAX)
    }
}

/// Status of an `AWSManagedMachinePool`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AwsManagedMachinePoolStatus {
    /// Imported pools are always ready
    pub ready: bool,
    /// Current member count
    pub replicas: i32,
    /// Nodegroup-level launch template id
    #[serde(rename = "launchTemplateID", default, skip_serializing_if = "Option::is_none")]
    pub launch_template_id: Option<String>,
    /// Nodegroup-level launch template version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template_version: Option<String>,
}

/// Build the provider id CAPI uses to bind a node to an EC2 instance
pub fn provider_id(availability_zone: &str, instance_id: &str) -> String {
    format!("aws:///{}/{}", availability_zone, instance_id)
}
