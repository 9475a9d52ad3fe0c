//! Error types for nodegroup import
//!
//! Errors carry the AWS resource they concern so that a log line for a
//! skipped nodegroup is enough to find the broken object.

use thiserror::Error;

/// Main error type for eksimport operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// An AWS API call failed
    #[error("aws {service} {operation} failed: {message}")]
    Aws {
        /// Service the call was made to (eks, autoscaling, ec2)
        service: String,
        /// API operation name
        operation: String,
        /// Rendered SDK error
        message: String,
    },

    /// AWS returned data that cannot be resolved into a single answer
    #[error("resolution error for {resource}: {message}")]
    Resolution {
        /// The resource being resolved (template, group, nodegroup)
        resource: String,
        /// Description of what is inconsistent
        message: String,
    },

    /// A named AWS resource does not exist
    #[error("{kind} {name:?} not found")]
    NotFound {
        /// Kind of resource
        kind: String,
        /// Name that was looked up
        name: String,
    },

    /// The node role ARN does not contain a role name
    #[error("malformed node role arn {arn:?}: expected role/<name>")]
    MalformedRoleArn {
        /// The offending ARN
        arn: String,
    },

    /// Neither a launch template nor an instance type could be determined
    #[error("nodegroup {nodegroup} has no launch template and no instance types")]
    MissingInstanceType {
        /// Name of the nodegroup
        nodegroup: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// A resource could not be packaged for the sink
    #[error("packaging error for {name}: {message}")]
    Packaging {
        /// Name of the resource
        name: String,
        /// Description of what failed
        message: String,
    },

    /// The sink already holds a resource under this name
    #[error("desired resource {name} already exists")]
    DuplicateResource {
        /// Colliding resource name
        name: String,
    },

    /// Invalid configuration or input document
    #[error("validation error: {message}")]
    Validation {
        /// Description of what's invalid
        message: String,
    },

    /// Cloud credentials could not be obtained
    #[error("credentials error: {message}")]
    Credentials {
        /// Description of what failed
        message: String,
    },

    /// A batch-level failure for a cluster
    #[error("cluster {cluster}: {source}")]
    Cluster {
        /// Name of the cluster being imported
        cluster: String,
        /// The underlying failure
        source: Box<Error>,
    },
}

impl Error {
    /// Create an AWS API error
    pub fn aws(
        service: impl Into<String>,
        operation: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Aws {
            service: service.into(),
            operation: operation.into(),
            message: msg.into(),
        }
    }

    /// Create a resolution error for the given resource
    pub fn resolution(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Resolution {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error for a known resource kind
    pub fn serialization_for(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a packaging error
    pub fn packaging(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Packaging {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a credentials error
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials {
            message: msg.into(),
        }
    }

    /// Wrap an error with the cluster it aborted
    pub fn for_cluster(cluster: impl Into<String>, source: Error) -> Self {
        Self::Cluster {
            cluster: cluster.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error aborts a whole batch rather than a single nodegroup
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, Self::Cluster { .. } | Self::Credentials { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aws_error_names_service_and_operation() {
        let err = Error::aws("eks", "ListNodegroups", "access denied");
        assert_eq!(
            err.to_string(),
            "aws eks ListNodegroups failed: access denied"
        );
    }

    #[test]
    fn resolution_error_keeps_template_name() {
        let err = Error::resolution(
            "eksctl-test-nodegroup-ng-1",
            "wrong count for launch templates for template eksctl-test-nodegroup-ng-1",
        );
        assert!(err.to_string().contains("eksctl-test-nodegroup-ng-1"));
        assert!(err.to_string().contains("wrong count"));
    }

    #[test]
    fn cluster_wrapper_reports_cluster_and_cause() {
        let err = Error::for_cluster("example", Error::aws("eks", "ListNodegroups", "boom"));
        let msg = err.to_string();
        assert!(msg.starts_with("cluster example:"));
        assert!(msg.contains("boom"));
        assert!(err.is_batch_fatal());
    }

    #[test]
    fn item_errors_are_not_batch_fatal() {
        assert!(!Error::MalformedRoleArn {
            arn: "nope".to_string()
        }
        .is_batch_fatal());
        assert!(!Error::not_found("autoscaling group", "asg-1").is_batch_fatal());
    }

    #[test]
    fn json_errors_convert_to_serialization() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization { kind: None, .. }));
    }
}
