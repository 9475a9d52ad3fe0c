//! Autoscaling group resolution

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::AutoscalingApi;
use crate::launch_template::LaunchTemplateResolver;
use eksimport_capi::AwsLaunchTemplate;
use eksimport_common::descriptor::{AutoScalingGroupDescriptor, LaunchTemplateReference};
use eksimport_common::{Error, Result};

/// A described group together with its mixed-instances launch template
#[derive(Debug)]
pub struct ResolvedAutoscaling {
    /// The group as AWS reported it
    pub group: AutoScalingGroupDescriptor,
    /// Resolved mixed-instances template, if the group has one
    pub launch_template: Option<AwsLaunchTemplate>,
    /// Why the template could not be resolved
    ///
    /// Kept apart from the group so callers can still use the group facts.
    pub launch_template_error: Option<Error>,
}

/// Resolves an autoscaling group and its launch template
#[derive(Clone)]
pub struct AutoscalingResolver {
    api: Arc<dyn AutoscalingApi>,
    templates: LaunchTemplateResolver,
    default_version: String,
}

impl AutoscalingResolver {
    /// Create a resolver; `default_version` is used for template
    /// references that carry no version
    pub fn new(
        api: Arc<dyn AutoscalingApi>,
        templates: LaunchTemplateResolver,
        default_version: impl Into<String>,
    ) -> Self {
        Self {
            api,
            templates,
            default_version: default_version.into(),
        }
    }

    /// Describe one group by name
    ///
    /// Returns an error only when the group itself cannot be described.
    /// Template failures are reported through
    /// [`ResolvedAutoscaling::launch_template_error`].
    pub async fn resolve(&self, name: &str) -> Result<ResolvedAutoscaling> {
        let mut groups = self
            .api
            .describe_auto_scaling_groups(&[name.to_string()])
            .await?;

        if groups.is_empty() {
            return Err(Error::not_found("autoscaling group", name));
        }
        if groups.len() > 1 {
            debug!(group = %name, count = groups.len(), "Using first of several described groups");
        }
        let group = groups.remove(0);

        let reference = group
            .mixed_instances_launch_template
            .as_ref()
            .map(|reference| self.with_version(reference));

        let (launch_template, launch_template_error) =
            match self.templates.resolve(reference.as_ref()).await {
                Ok(template) => (template, None),
                Err(e) => {
                    warn!(group = %name, error = %e, "Failed to resolve autoscaling group launch template");
                    (None, Some(e))
                }
            };

        Ok(ResolvedAutoscaling {
            group,
            launch_template,
            launch_template_error,
        })
    }

    fn with_version(&self, reference: &LaunchTemplateReference) -> LaunchTemplateReference {
        let mut reference = reference.clone();
        if reference.version.as_deref().map_or(true, str::is_empty) {
            reference.version = Some(self.default_version.clone());
        }
        reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockAutoscalingApi, MockLaunchTemplateApi};
    use eksimport_common::descriptor::{
        AsgInstance, LaunchTemplateData, LaunchTemplateVersionDescriptor,
    };
    use mockall::predicate::eq;

    fn group(template: Option<LaunchTemplateReference>) -> AutoScalingGroupDescriptor {
        AutoScalingGroupDescriptor {
            name: Some("asg-1".to_string()),
            availability_zones: vec!["eu-central-1a".to_string()],
            instances: vec![AsgInstance {
                instance_id: Some("i-1".to_string()),
                availability_zone: Some("eu-central-1a".to_string()),
            }],
            mixed_instances_launch_template: template,
        }
    }

    fn asg_returning(groups: Vec<AutoScalingGroupDescriptor>) -> Arc<MockAutoscalingApi> {
        let mut api = MockAutoscalingApi::new();
        api.expect_describe_auto_scaling_groups()
            .returning(move |_| Ok(groups.clone()));
        Arc::new(api)
    }

    fn unused_templates() -> LaunchTemplateResolver {
        let mut api = MockLaunchTemplateApi::new();
        api.expect_describe_launch_template_versions().never();
        LaunchTemplateResolver::new(Arc::new(api))
    }

    #[tokio::test]
    async fn describes_the_named_group() {
        let mut api = MockAutoscalingApi::new();
        api.expect_describe_auto_scaling_groups()
            .with(eq(vec!["asg-1".to_string()]))
            .times(1)
            .returning(|_| Ok(vec![group(None)]));
        let resolver = AutoscalingResolver::new(Arc::new(api), unused_templates(), "$Latest");

        let resolved = resolver.resolve("asg-1").await.unwrap();
        assert_eq!(resolved.group.availability_zones, vec!["eu-central-1a"]);
        assert!(resolved.launch_template.is_none());
        assert!(resolved.launch_template_error.is_none());
    }

    #[tokio::test]
    async fn empty_result_is_not_found() {
        let resolver = AutoscalingResolver::new(asg_returning(vec![]), unused_templates(), "$Latest");

        let err = resolver.resolve("asg-missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { ref name, .. } if name == "asg-missing"));
    }

    #[tokio::test]
    async fn describe_failure_is_an_error() {
        let mut api = MockAutoscalingApi::new();
        api.expect_describe_auto_scaling_groups()
            .returning(|_| Err(Error::aws("autoscaling", "DescribeAutoScalingGroups", "denied")));
        let resolver = AutoscalingResolver::new(Arc::new(api), unused_templates(), "$Latest");

        assert!(matches!(
            resolver.resolve("asg-1").await.unwrap_err(),
            Error::Aws { .. }
        ));
    }

    #[tokio::test]
    async fn versionless_template_uses_default_version() {
        let mut ec2 = MockLaunchTemplateApi::new();
        ec2.expect_describe_launch_template_versions()
            .withf(|_, versions| versions.len() == 1 && versions[0] == "$Default")
            .times(1)
            .returning(|_, _| {
                Ok(vec![LaunchTemplateVersionDescriptor {
                    version_number: Some(3),
                    data: Some(LaunchTemplateData {
                        image_id: Some("ami-abc".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }])
            });
        let template = LaunchTemplateReference {
            id: Some("lt-1".to_string()),
            name: Some("workers".to_string()),
            version: None,
        };
        let resolver = AutoscalingResolver::new(
            asg_returning(vec![group(Some(template))]),
            LaunchTemplateResolver::new(Arc::new(ec2)),
            "$Default",
        );

        let resolved = resolver.resolve("asg-1").await.unwrap();
        let lt = resolved.launch_template.unwrap();
        assert_eq!(lt.name, "workers");
        assert_eq!(lt.version_number, Some(3));
        assert_eq!(lt.ami.id.as_deref(), Some("ami-abc"));
    }

    #[tokio::test]
    async fn explicit_template_version_is_kept() {
        let mut ec2 = MockLaunchTemplateApi::new();
        ec2.expect_describe_launch_template_versions()
            .withf(|_, versions| versions.len() == 1 && versions[0] == "5")
            .times(1)
            .returning(|_, _| Ok(vec![LaunchTemplateVersionDescriptor::default()]));
        let template = LaunchTemplateReference {
            id: Some("lt-1".to_string()),
            name: None,
            version: Some("5".to_string()),
        };
        let resolver = AutoscalingResolver::new(
            asg_returning(vec![group(Some(template))]),
            LaunchTemplateResolver::new(Arc::new(ec2)),
            "$Latest",
        );

        assert!(resolver.resolve("asg-1").await.unwrap().launch_template.is_some());
    }

    #[tokio::test]
    async fn template_failure_keeps_group_facts() {
        let mut ec2 = MockLaunchTemplateApi::new();
        ec2.expect_describe_launch_template_versions()
            .returning(|_, _| Ok(vec![]));
        let template = LaunchTemplateReference {
            id: Some("lt-1".to_string()),
            ..Default::default()
        };
        let resolver = AutoscalingResolver::new(
            asg_returning(vec![group(Some(template))]),
            LaunchTemplateResolver::new(Arc::new(ec2)),
            "$Latest",
        );

        let resolved = resolver.resolve("asg-1").await.unwrap();
        assert!(resolved.launch_template.is_none());
        assert!(matches!(
            resolved.launch_template_error,
            Some(Error::Resolution { .. })
        ));
        assert_eq!(resolved.group.instances.len(), 1);
    }

    #[tokio::test]
    async fn first_group_wins_when_several_are_returned() {
        let mut second = group(None);
        second.name = Some("asg-2".to_string());
        let resolver = AutoscalingResolver::new(
            asg_returning(vec![group(None), second]),
            unused_templates(),
            "$Latest",
        );

        let resolved = resolver.resolve("asg-1").await.unwrap();
        assert_eq!(resolved.group.name.as_deref(), Some("asg-1"));
    }
}
