//! Common types for eksimport: errors, constants and AWS descriptors

#![deny(missing_docs)]

pub mod descriptor;
pub mod error;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API version of CAPA infrastructure resources
pub const INFRASTRUCTURE_API_VERSION: &str = "infrastructure.cluster.x-k8s.io/v1beta2";

/// API version of core CAPI resources
pub const CLUSTER_API_VERSION: &str = "cluster.x-k8s.io/v1beta1";

/// Kind of the imported infrastructure pool
pub const AWS_MANAGED_MACHINE_POOL_KIND: &str = "AWSManagedMachinePool";

/// Kind of the companion scaling object
pub const MACHINE_POOL_KIND: &str = "MachinePool";

/// Label identifying which nodegroup a generated object belongs to
pub const MACHINE_POOL_LABEL: &str = "giantswarm.io/machine-pool";

/// Annotation marking generated objects as externally managed
pub const MANAGED_BY_ANNOTATION: &str = "cluster.x-k8s.io/managed-by";

/// Launch template version used when an autoscaling group omits one
pub const LATEST_TEMPLATE_VERSION: &str = "$Latest";

/// Instance profile name prefix reserved for EKS-managed profiles
pub const EKS_MANAGED_PROFILE_PREFIX: &str = "eks-";
