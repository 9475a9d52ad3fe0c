//! AWS credentials for an import
//!
//! Credentials come from the default provider chain, optionally assuming a
//! role. The role can be given directly or looked up from an Upbound AWS
//! `ProviderConfig`, whose first `assumeRoleChain` entry is used.

use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind};
use serde::Deserialize;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use eksimport_common::{Error, Result};

/// Session name used when assuming a role
pub const SESSION_NAME: &str = "eksimport";

/// API group of the Upbound AWS provider
pub const PROVIDER_CONFIG_GROUP: &str = "aws.upbound.io";

/// API version of the Upbound AWS `ProviderConfig`
pub const PROVIDER_CONFIG_VERSION: &str = "v1beta1";

/// Load an SDK configuration for `region`
///
/// With a role ARN the returned configuration assumes that role on top of
/// the default credential chain.
pub async fn load_sdk_config(region: &str, role_arn: Option<&str>) -> Result<SdkConfig> {
    if region.is_empty() {
        return Err(Error::credentials("no AWS region configured"));
    }
    let region = Region::new(region.to_string());

    let base = aws_config::defaults(BehaviorVersion::latest())
        .region(region.clone())
        .load()
        .await;

    let Some(role_arn) = role_arn else {
        debug!(region = %region, "Using default credential chain");
        return Ok(base);
    };

    info!(region = %region, role = %role_arn, "Assuming role");
    let provider = AssumeRoleProvider::builder(role_arn)
        .session_name(SESSION_NAME)
        .region(region.clone())
        .configure(&base)
        .build()
        .await;

    Ok(aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .credentials_provider(provider)
        .load()
        .await)
}

/// Source of `ProviderConfig` specs
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProviderConfigSource: Send + Sync {
    /// The `spec` of the named `ProviderConfig`
    async fn provider_config_spec(&self, name: &str) -> Result<serde_json::Value, Error>;
}

/// Reads `ProviderConfig`s from the Kubernetes API
pub struct KubeProviderConfigSource {
    client: kube::Client,
}

impl KubeProviderConfigSource {
    /// Create a source using the given client
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderConfigSource for KubeProviderConfigSource {
    async fn provider_config_spec(&self, name: &str) -> Result<serde_json::Value> {
        let gvk = GroupVersionKind::gvk(PROVIDER_CONFIG_GROUP, PROVIDER_CONFIG_VERSION, "ProviderConfig");
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &ApiResource::from_gvk(&gvk));

        let config = api.get(name).await?;
        config
            .data
            .get("spec")
            .cloned()
            .ok_or_else(|| Error::credentials(format!("ProviderConfig {} has no spec", name)))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderConfigSpec {
    #[serde(default)]
    assume_role_chain: Vec<AssumeRoleLink>,
}

#[derive(Deserialize)]
struct AssumeRoleLink {
    #[serde(rename = "roleARN", default)]
    role_arn: String,
}

/// Role ARN of the first link in a `ProviderConfig`'s assume-role chain
pub async fn provider_config_role_arn(
    source: &dyn ProviderConfigSource,
    name: &str,
) -> Result<String> {
    let spec = source.provider_config_spec(name).await?;
    let spec: ProviderConfigSpec = serde_json::from_value(spec)
        .map_err(|e| Error::credentials(format!("ProviderConfig {}: {}", name, e)))?;

    match spec.assume_role_chain.into_iter().next() {
        Some(link) if !link.role_arn.is_empty() => {
            debug!(provider_config = %name, role = %link.role_arn, "Found role in ProviderConfig");
            Ok(link.role_arn)
        }
        _ => Err(Error::credentials(format!(
            "ProviderConfig {} has no role in its assume role chain",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use serde_json::json;

    fn source_returning(spec: serde_json::Value) -> MockProviderConfigSource {
        let mut source = MockProviderConfigSource::new();
        source
            .expect_provider_config_spec()
            .with(eq("example"))
            .times(1)
            .returning(move |_| Ok(spec.clone()));
        source
    }

    #[tokio::test]
    async fn first_role_of_the_chain_is_used() {
        let source = source_returning(json!({
            "assumeRoleChain": [
                { "roleARN": "arn:aws:iam::123:role/first" },
                { "roleARN": "arn:aws:iam::456:role/second" }
            ],
            "credentials": { "source": "IRSA" }
        }));

        let arn = provider_config_role_arn(&source, "example").await.unwrap();
        assert_eq!(arn, "arn:aws:iam::123:role/first");
    }

    #[tokio::test]
    async fn empty_chain_is_a_credentials_error() {
        let source = source_returning(json!({ "assumeRoleChain": [] }));

        let err = provider_config_role_arn(&source, "example").await.unwrap_err();
        assert!(matches!(err, Error::Credentials { .. }));
        assert!(err.is_batch_fatal());
    }

    #[tokio::test]
    async fn missing_chain_is_a_credentials_error() {
        let source = source_returning(json!({ "credentials": { "source": "IRSA" } }));

        assert!(matches!(
            provider_config_role_arn(&source, "example").await,
            Err(Error::Credentials { .. })
        ));
    }

    #[tokio::test]
    async fn lookup_failures_propagate() {
        let mut source = MockProviderConfigSource::new();
        source
            .expect_provider_config_spec()
            .returning(|name| Err(Error::not_found("ProviderConfig", name)));

        assert!(matches!(
            provider_config_role_arn(&source, "missing").await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn empty_region_is_rejected_before_loading() {
        assert!(matches!(
            load_sdk_config("", None).await,
            Err(Error::Credentials { .. })
        ));
    }
}
