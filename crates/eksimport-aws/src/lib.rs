//! EKS nodegroup import
//!
//! Reads nodegroups, their autoscaling groups and launch templates from AWS
//! and turns each nodegroup into a CAPA `AWSManagedMachinePool` plus a
//! `MachinePool`.
//!
//! The AWS reads go through the capability traits in [`api`]. They are
//! implemented on the SDK clients in [`sdk`] and on the offline
//! [`snapshot::Snapshot`].

pub mod api;
pub mod autoscaling;
pub mod credentials;
pub mod import;
pub mod launch_template;
pub mod nodegroup;
pub mod options;
pub mod sdk;
pub mod snapshot;

pub use api::{AutoscalingApi, LaunchTemplateApi, NodegroupApi};
pub use autoscaling::{AutoscalingResolver, ResolvedAutoscaling};
pub use credentials::{load_sdk_config, provider_config_role_arn, KubeProviderConfigSource, ProviderConfigSource};
pub use import::{ClusterImporter, ImportOptions, ImportReport, ImportedPool, NodegroupFailure};
pub use launch_template::LaunchTemplateResolver;
pub use nodegroup::NodegroupResolver;
pub use options::ResolverOptions;
pub use sdk::AwsClients;
pub use snapshot::Snapshot;
