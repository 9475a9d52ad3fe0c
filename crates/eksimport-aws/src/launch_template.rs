//! Launch template resolution
//!
//! Turns a launch template reference into the effective instance
//! configuration of exactly one template version.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::api::LaunchTemplateApi;
use eksimport_capi::{AmiReference, AwsLaunchTemplate, AwsResourceReference, SpotMarketOptions, Volume};
use eksimport_common::descriptor::{
    LaunchTemplateData, LaunchTemplateReference, LaunchTemplateVersionDescriptor,
};
use eksimport_common::{Error, Result, EKS_MANAGED_PROFILE_PREFIX};

/// Resolves launch template references through EC2
#[derive(Clone)]
pub struct LaunchTemplateResolver {
    api: Arc<dyn LaunchTemplateApi>,
}

impl LaunchTemplateResolver {
    /// Create a resolver backed by the given EC2 capability
    pub fn new(api: Arc<dyn LaunchTemplateApi>) -> Self {
        Self { api }
    }

    /// Resolve a template reference
    ///
    /// `None` means no template is configured and resolves to `None`. The
    /// query must match exactly one version; anything else is an error.
    pub async fn resolve(
        &self,
        reference: Option<&LaunchTemplateReference>,
    ) -> Result<Option<AwsLaunchTemplate>> {
        let Some(reference) = reference else {
            return Ok(None);
        };

        let versions: Vec<String> = reference.version.iter().cloned().collect();
        debug!(
            template = reference.display_name(),
            versions = ?versions,
            "Describing launch template versions"
        );
        let mut found = self
            .api
            .describe_launch_template_versions(reference, &versions)
            .await?;

        if found.len() != 1 {
            return Err(Error::resolution(
                reference.display_name(),
                format!(
                    "wrong count for launch templates for template {}",
                    reference.display_name()
                ),
            ));
        }

        let version = found.remove(0);
        Ok(Some(template_from_version(reference, &version)))
    }
}

/// Normalize one launch template version
///
/// The name comes from the caller's reference; EC2's own copy is only used
/// when the reference carries none.
pub fn template_from_version(
    reference: &LaunchTemplateReference,
    version: &LaunchTemplateVersionDescriptor,
) -> AwsLaunchTemplate {
    let name = reference
        .name
        .clone()
        .or_else(|| version.launch_template_name.clone())
        .unwrap_or_default();

    let mut template = AwsLaunchTemplate {
        name,
        version_number: version.version_number,
        ..Default::default()
    };

    let Some(data) = &version.data else {
        return template;
    };

    template.instance_type = data.instance_type.clone().unwrap_or_default();
    template.ssh_key_name = data.key_name.clone();
    template.ami = AmiReference {
        id: data.image_id.clone(),
    };
    template.iam_instance_profile = instance_profile(data);
    template.spot_market_options = data.spot_options.as_ref().map(|spot| SpotMarketOptions {
        max_price: spot.max_price.clone(),
    });
    template.root_volume = root_volume(data);
    template.additional_security_groups = unique_security_groups(&data.security_group_ids)
        .into_iter()
        .map(|id| AwsResourceReference { id: Some(id) })
        .collect();

    template
}

/// A user-configured profile name wins, then the ARN.
///
/// Names starting with `eks-` belong to profiles EKS created itself.
fn instance_profile(data: &LaunchTemplateData) -> String {
    let Some(profile) = &data.iam_instance_profile else {
        return String::new();
    };

    match (&profile.name, &profile.arn) {
        (Some(name), _) if !name.starts_with(EKS_MANAGED_PROFILE_PREFIX) => name.clone(),
        (_, Some(arn)) => arn.clone(),
        _ => String::new(),
    }
}

/// Only the first block device mapping describes the root volume
fn root_volume(data: &LaunchTemplateData) -> Option<Volume> {
    let device = data.block_device_mappings.first()?;
    let mut volume = Volume {
        device_name: device.device_name.clone().unwrap_or_default(),
        ..Default::default()
    };

    if let Some(ebs) = &device.ebs {
        volume.encrypted = ebs.encrypted;
        volume.iops = ebs.iops.map(i64::from);
        volume.size = ebs.volume_size.map(i64::from).unwrap_or_default();
        volume.throughput = ebs.throughput.map(i64::from);
        volume.volume_type = ebs.volume_type.clone();
    }

    Some(volume)
}

/// Deduplicate security group ids, keeping first-seen order
pub fn unique_security_groups(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
