//! Provider dispatch
//!
//! Picks the import for the configured cloud provider and wires it to either
//! the live AWS APIs or a recorded snapshot.

use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::config::ImportConfig;
use eksimport_aws::{
    load_sdk_config, provider_config_role_arn, AutoscalingApi, AwsClients, ClusterImporter,
    KubeProviderConfigSource, LaunchTemplateApi, NodegroupApi, NodegroupFailure, Snapshot,
};
use eksimport_capi::DesiredComposed;
use eksimport_common::{Error, Result};

/// Cloud providers a composite can select
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloudProvider {
    /// Amazon Web Services
    Aws,
    /// Microsoft Azure
    Azure,
    /// Google Cloud
    Gcp,
}

impl FromStr for CloudProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "azure" => Ok(Self::Azure),
            "gcp" => Ok(Self::Gcp),
            other => Err(Error::validation(format!("unknown provider {:?}", other))),
        }
    }
}

/// Where AWS state is read from
pub enum Inventory {
    /// The AWS APIs
    Live,
    /// A recorded snapshot
    Snapshot(Snapshot),
}

/// Result of a run
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Objects to apply, by name
    pub desired: DesiredComposed,
    /// Nodegroups that were skipped
    pub failures: Vec<NodegroupFailure>,
}

/// Run the import for the configured provider
pub async fn run(config: &ImportConfig, inventory: Inventory) -> Result<RunOutcome> {
    let provider = CloudProvider::from_str(&config.provider)?;
    config.validate()?;

    match provider {
        CloudProvider::Aws => {
            info!(cluster = %config.cluster_name, region = %config.region, "Discovered aws provider");
            run_aws(config, inventory).await
        }
        CloudProvider::Azure => {
            info!("Azure provider is not yet implemented");
            Ok(RunOutcome::default())
        }
        CloudProvider::Gcp => {
            info!("GCP provider is not yet implemented");
            Ok(RunOutcome::default())
        }
    }
}

async fn run_aws(config: &ImportConfig, inventory: Inventory) -> Result<RunOutcome> {
    let (eks, autoscaling, ec2): (
        Arc<dyn NodegroupApi>,
        Arc<dyn AutoscalingApi>,
        Arc<dyn LaunchTemplateApi>,
    ) = match inventory {
        Inventory::Snapshot(snapshot) => {
            let snapshot = Arc::new(snapshot);
            let eks: Arc<dyn NodegroupApi> = snapshot.clone();
            let autoscaling: Arc<dyn AutoscalingApi> = snapshot.clone();
            let ec2: Arc<dyn LaunchTemplateApi> = snapshot;
            (eks, autoscaling, ec2)
        }
        Inventory::Live => {
            let cluster = config.cluster_name.as_str();
            let role_arn = role_arn(config)
                .await
                .map_err(|e| Error::for_cluster(cluster, e))?;
            let sdk_config = load_sdk_config(&config.region, role_arn.as_deref())
                .await
                .map_err(|e| Error::for_cluster(cluster, e))?;
            let clients = AwsClients::new(&sdk_config, config.max_attempts);
            let eks: Arc<dyn NodegroupApi> = clients.eks;
            let autoscaling: Arc<dyn AutoscalingApi> = clients.autoscaling;
            let ec2: Arc<dyn LaunchTemplateApi> = clients.ec2;
            (eks, autoscaling, ec2)
        }
    };

    let importer = ClusterImporter::new(
        eks,
        autoscaling,
        ec2,
        config.resolver.clone(),
        config.import_options(),
    );

    let mut desired = DesiredComposed::new();
    let report = importer.import(&mut desired).await?;
    Ok(RunOutcome {
        desired,
        failures: report.failures,
    })
}

/// The configured role, else the one named by the AWS `ProviderConfig`
async fn role_arn(config: &ImportConfig) -> Result<Option<String>> {
    if let Some(arn) = &config.role_arn {
        return Ok(Some(arn.clone()));
    }
    let Some(name) = &config.cloud_provider_config_ref else {
        return Ok(None);
    };

    let client = kube::Client::try_default()
        .await
        .map_err(|e| Error::credentials(format!("cannot reach Kubernetes to read ProviderConfig {}: {}", name, e)))?;
    let source = KubeProviderConfigSource::new(client);
    provider_config_role_arn(&source, name).await.map(Some)
}
