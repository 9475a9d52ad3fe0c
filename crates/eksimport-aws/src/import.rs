//! Cluster-wide import of EKS nodegroups
//!
//! Lists every nodegroup of a cluster, resolves each one independently and
//! writes the resulting `AWSManagedMachinePool`/`MachinePool` pairs to the
//! desired-resources sink. One failing nodegroup never aborts the batch;
//! only a failed listing does.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::api::{AutoscalingApi, LaunchTemplateApi, NodegroupApi};
use crate::nodegroup::NodegroupResolver;
use crate::options::ResolverOptions;
use eksimport_capi::{
    generate_machine_pool, generate_managed_machine_pool, CAPIManifest, DesiredResources,
    Packaging, PoolMetadata,
};
use eksimport_common::{Error, Result};

/// Settings of one cluster import
#[derive(Clone, Debug, Default)]
pub struct ImportOptions {
    /// Cluster, namespace and common labels of the generated objects
    pub metadata: PoolMetadata,
    /// How objects are handed to the sink
    pub packaging: Packaging,
    /// Nodegroups resolved at the same time; `0` is treated as `1`
    pub concurrency: usize,
}

/// The two objects generated for one nodegroup
#[derive(Clone, Debug, PartialEq)]
pub struct ImportedPool {
    /// Nodegroup name
    pub nodegroup: String,
    /// The infrastructure pool
    pub managed_machine_pool: CAPIManifest,
    /// The `MachinePool` pointing at it
    pub machine_pool: CAPIManifest,
}

/// A nodegroup that was skipped
#[derive(Debug)]
pub struct NodegroupFailure {
    /// Nodegroup name
    pub nodegroup: String,
    /// Why it was skipped
    pub error: Error,
}

/// Outcome of a cluster import
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Pools written to the sink, in listing order
    pub imported: Vec<ImportedPool>,
    /// Nodegroups that were skipped
    pub failures: Vec<NodegroupFailure>,
}

impl ImportReport {
    /// Whether every listed nodegroup was imported
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Imports all nodegroups of one cluster
pub struct ClusterImporter {
    eks: Arc<dyn NodegroupApi>,
    resolver: NodegroupResolver,
    options: ImportOptions,
}

impl ClusterImporter {
    /// Create an importer from the three AWS capabilities
    pub fn new(
        eks: Arc<dyn NodegroupApi>,
        autoscaling: Arc<dyn AutoscalingApi>,
        ec2: Arc<dyn LaunchTemplateApi>,
        resolver_options: ResolverOptions,
        options: ImportOptions,
    ) -> Self {
        Self {
            eks,
            resolver: NodegroupResolver::new(autoscaling, ec2, resolver_options),
            options,
        }
    }

    /// Import every nodegroup of the cluster into `sink`
    ///
    /// Returns an error only when the nodegroups cannot be listed. Per
    /// nodegroup failures are logged and reported in the returned
    /// [`ImportReport`]; nothing is written to the sink for them.
    pub async fn import(&self, sink: &mut dyn DesiredResources) -> Result<ImportReport> {
        let cluster = self.options.metadata.cluster.as_str();

        let nodegroups = self
            .eks
            .list_nodegroups(cluster)
            .await
            .map_err(|e| Error::for_cluster(cluster, e))?;
        info!(cluster = %cluster, count = nodegroups.len(), "Importing nodegroups");

        let outcomes: Vec<(String, Result<ImportedPool>)> = stream::iter(nodegroups)
            .map(|nodegroup| async move {
                let outcome = self.build_pool(&nodegroup).await;
                (nodegroup, outcome)
            })
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut report = ImportReport::default();
        for (nodegroup, outcome) in outcomes {
            let outcome = match outcome {
                Ok(pool) => self.publish(&pool, sink).map(|()| pool),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(pool) => report.imported.push(pool),
                Err(e) => {
                    error!(cluster = %cluster, nodegroup = %nodegroup, error = %e, "Skipping nodegroup");
                    report.failures.push(NodegroupFailure {
                        nodegroup,
                        error: e,
                    });
                }
            }
        }

        if report.is_complete() {
            info!(cluster = %cluster, imported = report.imported.len(), "Import complete");
        } else {
            warn!(
                cluster = %cluster,
                imported = report.imported.len(),
                failed = report.failures.len(),
                "Import finished with skipped nodegroups"
            );
        }
        Ok(report)
    }

    async fn build_pool(&self, nodegroup: &str) -> Result<ImportedPool> {
        let meta = &self.options.metadata;
        debug!(cluster = %meta.cluster, nodegroup = %nodegroup, "Describing nodegroup");

        let mut descriptor = self.eks.describe_nodegroup(&meta.cluster, nodegroup).await?;
        if descriptor.nodegroup_name.is_empty() {
            descriptor.nodegroup_name = nodegroup.to_string();
        }

        let spec = self.resolver.resolve(&descriptor).await?;
        let managed_machine_pool =
            generate_managed_machine_pool(meta, &spec, descriptor.launch_template.as_ref())?;
        let machine_pool = generate_machine_pool(meta, &spec.eks_nodegroup_name, spec.replicas());

        Ok(ImportedPool {
            nodegroup: nodegroup.to_string(),
            managed_machine_pool,
            machine_pool,
        })
    }

    /// Both objects are packaged and both names checked before either is written
    fn publish(&self, pool: &ImportedPool, sink: &mut dyn DesiredResources) -> Result<()> {
        let infrastructure = self.options.packaging.package(&pool.managed_machine_pool)?;
        let machine_pool = self.options.packaging.package(&pool.machine_pool)?;

        let names = [pool.managed_machine_pool.name(), pool.machine_pool.name()];
        if let Some(taken) = names.iter().find(|name| sink.contains(name)) {
            return Err(Error::DuplicateResource {
                name: taken.to_string(),
            });
        }

        sink.add_desired(names[0], infrastructure)?;
        sink.add_desired(names[1], machine_pool)?;
        Ok(())
    }
}
