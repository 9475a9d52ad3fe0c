//! Import configuration
//!
//! Settings are read from a YAML file or derived from a composite resource,
//! then command line flags (or their environment variables) override single
//! fields. Resolution order, highest priority first:
//! 1. Command line flag / environment variable
//! 2. Configuration file or composite resource
//! 3. Built-in defaults

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use eksimport_aws::{ImportOptions, ResolverOptions};
use eksimport_capi::{Packaging, PoolMetadata};
use eksimport_common::{Error, Result, MANAGED_BY_ANNOTATION};

/// Value of the managed-by annotation put on every generated object
pub const MANAGED_BY: &str = "crossplane";

const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Everything needed to import the nodegroups of one cluster
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportConfig {
    /// EKS cluster name
    pub cluster_name: String,
    /// Namespace of the generated objects
    pub namespace: String,
    /// AWS region of the cluster
    pub region: String,
    /// Cloud provider (`aws`, `azure` or `gcp`)
    pub provider: String,
    /// Upbound AWS `ProviderConfig` to read the role ARN from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_provider_config_ref: Option<String>,
    /// Role to assume; takes precedence over the `ProviderConfig` lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    /// How generated objects are emitted
    pub packaging: Packaging,
    /// Labels of every generated object
    pub labels: BTreeMap<String, String>,
    /// Labels merged over `labels`
    pub additional_labels: BTreeMap<String, String>,
    /// Annotations of every generated object
    pub annotations: BTreeMap<String, String>,
    /// Resolution rules
    pub resolver: ResolverOptions,
    /// Nodegroups resolved at the same time
    pub concurrency: usize,
    /// Attempts per AWS call, including the first
    pub max_attempts: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            cluster_name: String::new(),
            namespace: "default".to_string(),
            region: String::new(),
            provider: "aws".to_string(),
            cloud_provider_config_ref: None,
            role_arn: None,
            packaging: Packaging::default(),
            labels: BTreeMap::new(),
            additional_labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            resolver: ResolverOptions::default(),
            concurrency: 1,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Command line overrides for single configuration fields
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// EKS cluster name
    #[arg(long, env = "EKSIMPORT_CLUSTER")]
    pub cluster: Option<String>,

    /// Namespace of the generated objects
    #[arg(short = 'n', long, env = "EKSIMPORT_NAMESPACE")]
    pub namespace: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Cloud provider (aws, azure, gcp)
    #[arg(long, env = "EKSIMPORT_PROVIDER")]
    pub provider: Option<String>,

    /// IAM role to assume for AWS reads
    #[arg(long, env = "EKSIMPORT_ROLE_ARN")]
    pub role_arn: Option<String>,

    /// Upbound AWS ProviderConfig to read the role from
    #[arg(long)]
    pub provider_config: Option<String>,

    /// Nodegroups resolved at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Report spot nodegroups with their real capacity type
    #[arg(long)]
    pub keep_spot_capacity: bool,

    /// Launch template version used when an autoscaling group names none
    #[arg(long)]
    pub default_template_version: Option<String>,
}

impl ImportConfig {
    /// Parse a configuration document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::validation(format!("invalid import configuration: {}", e)))
    }

    /// Read a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Error::validation(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml(&yaml)
    }

    /// Apply command line overrides
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(cluster) = overrides.cluster {
            self.cluster_name = cluster;
        }
        if let Some(namespace) = overrides.namespace {
            self.namespace = namespace;
        }
        if let Some(region) = overrides.region {
            self.region = region;
        }
        if let Some(provider) = overrides.provider {
            self.provider = provider;
        }
        if overrides.role_arn.is_some() {
            self.role_arn = overrides.role_arn;
        }
        if overrides.provider_config.is_some() {
            self.cloud_provider_config_ref = overrides.provider_config;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if overrides.keep_spot_capacity {
            self.resolver.collapse_spot_capacity = false;
        }
        if let Some(version) = overrides.default_template_version {
            self.resolver.default_template_version = version;
        }
    }

    /// Check that an import can run with this configuration
    pub fn validate(&self) -> Result<()> {
        if self.cluster_name.is_empty() {
            return Err(Error::validation("cluster name is required"));
        }
        if self.namespace.is_empty() {
            return Err(Error::validation("namespace is required"));
        }
        if self.resolver.default_template_version.is_empty() {
            return Err(Error::validation("default template version must not be empty"));
        }
        if let Packaging::KubernetesObject {
            provider_config_ref,
            ..
        } = &self.packaging
        {
            if provider_config_ref.is_empty() {
                return Err(Error::validation(
                    "kubernetes object packaging needs a provider config ref",
                ));
            }
        }
        Ok(())
    }

    /// Metadata of the generated objects
    ///
    /// Additional labels win over labels with the same key, and the
    /// managed-by annotation is always present.
    pub fn pool_metadata(&self) -> PoolMetadata {
        let mut labels = self.labels.clone();
        labels.extend(self.additional_labels.clone());

        let mut annotations = self.annotations.clone();
        annotations
            .entry(MANAGED_BY_ANNOTATION.to_string())
            .or_insert_with(|| MANAGED_BY.to_string());

        PoolMetadata {
            cluster: self.cluster_name.clone(),
            namespace: self.namespace.clone(),
            labels,
            annotations,
        }
    }

    /// Options of the cluster import
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            metadata: self.pool_metadata(),
            packaging: self.packaging.clone(),
            concurrency: self.concurrency.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_aws_in_default_namespace() {
        let config = ImportConfig::default();
        assert_eq!(config.provider, "aws");
        assert_eq!(config.namespace, "default");
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.packaging, Packaging::Raw);
    }

    #[test]
    fn parses_yaml_with_packaging_and_resolver_options() {
        let yaml = r#"
clusterName: example
namespace: org-example
region: eu-west-1
packaging:
  mode: kubernetesObject
  providerConfigRef: example-kubeconfig
  deletionPolicy: Orphan
resolver:
  collapseSpotCapacity: false
concurrency: 4
"#;
        let config = ImportConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.cluster_name, "example");
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(
            config.packaging,
            Packaging::KubernetesObject {
                provider_config_ref: "example-kubeconfig".to_string(),
                deletion_policy: Some("Orphan".to_string()),
            }
        );
        assert!(!config.resolver.collapse_spot_capacity);
        assert_eq!(config.resolver.default_template_version, "$Latest");
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn invalid_yaml_is_a_validation_error() {
        assert!(matches!(
            ImportConfig::from_yaml("concurrency: many"),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut config = ImportConfig {
            cluster_name: "from-file".to_string(),
            region: "eu-west-1".to_string(),
            ..Default::default()
        };
        config.apply(ConfigOverrides {
            cluster: Some("from-flag".to_string()),
            keep_spot_capacity: true,
            default_template_version: Some("$Default".to_string()),
            ..Default::default()
        });

        assert_eq!(config.cluster_name, "from-flag");
        assert_eq!(config.region, "eu-west-1");
        assert!(!config.resolver.collapse_spot_capacity);
        assert_eq!(config.resolver.default_template_version, "$Default");
    }

    #[test]
    fn validation_requires_cluster_name() {
        let err = ImportConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("cluster name"));
    }

    #[test]
    fn validation_requires_provider_config_for_object_packaging() {
        let config = ImportConfig {
            cluster_name: "example".to_string(),
            packaging: Packaging::KubernetesObject {
                provider_config_ref: String::new(),
                deletion_policy: None,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn additional_labels_win_and_managed_by_is_added() {
        let config = ImportConfig {
            cluster_name: "example".to_string(),
            labels: BTreeMap::from([
                ("test".to_string(), "label".to_string()),
                ("foo".to_string(), "old".to_string()),
            ]),
            additional_labels: BTreeMap::from([("foo".to_string(), "bar".to_string())]),
            ..Default::default()
        };

        let meta = config.pool_metadata();
        assert_eq!(meta.labels.get("foo").map(String::as_str), Some("bar"));
        assert_eq!(meta.labels.get("test").map(String::as_str), Some("label"));
        assert_eq!(
            meta.annotations.get("cluster.x-k8s.io/managed-by").map(String::as_str),
            Some("crossplane")
        );
    }

    #[test]
    fn explicit_managed_by_annotation_is_kept() {
        let config = ImportConfig {
            annotations: BTreeMap::from([(
                "cluster.x-k8s.io/managed-by".to_string(),
                "someone-else".to_string(),
            )]),
            ..Default::default()
        };
        assert_eq!(
            config.pool_metadata().annotations["cluster.x-k8s.io/managed-by"],
            "someone-else"
        );
    }

    #[test]
    fn zero_concurrency_becomes_one() {
        let config = ImportConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert_eq!(config.import_options().concurrency, 1);
    }
}
