//! eksimport - map EKS managed nodegroups onto Cluster API machine pools
//!
//! The binary reads an import configuration (or a Crossplane composition
//! request), resolves every nodegroup of the cluster through
//! [`eksimport_aws`] and renders the resulting `AWSManagedMachinePool` and
//! `MachinePool` objects.

pub mod composite;
pub mod config;
pub mod output;
pub mod run;
pub mod telemetry;

pub use composite::CompositionRequest;
pub use config::{ConfigOverrides, ImportConfig};
pub use output::{render, OutputFormat};
pub use run::{run, CloudProvider, Inventory, RunOutcome};
