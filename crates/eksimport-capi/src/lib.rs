//! Cluster API output for imported nodegroups
//!
//! This crate provides:
//! - CAPA managed machine pool types with their wire field names
//! - Manifest builders for `AWSManagedMachinePool` and `MachinePool`
//! - Packaging of manifests as raw objects or provider-kubernetes `Object`s
//! - The desired-resources sink the import writes to

pub mod manifest;
pub mod package;
pub mod sink;
pub mod types;

pub use manifest::{
    generate_machine_pool, generate_managed_machine_pool, machine_pool_name,
    managed_machine_pool_name, CAPIManifest, ManifestMetadata, PoolMetadata,
};
pub use package::Packaging;
pub use sink::{DesiredComposed, DesiredResources};
pub use types::{
    provider_id, AmiReference, AwsLaunchTemplate, AwsManagedMachinePoolSpec,
    AwsManagedMachinePoolStatus, AwsResourceReference, ManagedMachinePoolCapacityType,
    ManagedMachinePoolScaling, ManagedRemoteAccess, SpotMarketOptions, Taint, TaintEffect,
    UpdateConfig, Volume,
};

#[cfg(test)]
pub use sink::MockDesiredResources;
