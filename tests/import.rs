//! End-to-end import runs against a recorded AWS snapshot

use std::io::Write;
use std::path::PathBuf;

use eksimport::{render, run, CompositionRequest, ImportConfig, Inventory, OutputFormat};
use eksimport_aws::Snapshot;
use eksimport_capi::Packaging;
use eksimport_common::Error;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn snapshot() -> Inventory {
    Inventory::Snapshot(Snapshot::load(&fixture("snapshot.yaml")).unwrap())
}

fn config() -> ImportConfig {
    ImportConfig {
        cluster_name: "example".to_string(),
        namespace: "org-example".to_string(),
        region: "eu-central-1".to_string(),
        ..Default::default()
    }
}

// =============================================================================
// Story: Importing a cluster
// =============================================================================

#[tokio::test]
async fn broken_nodegroup_is_skipped_and_the_rest_imported() {
    let outcome = run(&config(), snapshot()).await.unwrap();

    assert_eq!(outcome.desired.len(), 4);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].nodegroup, "ng-3");
    assert!(matches!(outcome.failures[0].error, Error::NotFound { .. }));
    assert!(outcome.desired.get("example-awsmanagedmachinepool-elsewhere").is_none());
}

#[tokio::test]
async fn group_template_becomes_the_pool_template() {
    let outcome = run(&config(), snapshot()).await.unwrap();
    let pool = outcome
        .desired
        .get("example-awsmanagedmachinepool-ng-1")
        .unwrap();
    let spec = &pool["spec"];

    assert_eq!(spec["awsLaunchTemplate"]["name"], "asg-1-template");
    assert_eq!(spec["awsLaunchTemplate"]["versionNumber"], 2);
    assert_eq!(spec["awsLaunchTemplate"]["instanceType"], "m5.large");
    assert_eq!(spec["awsLaunchTemplate"]["ami"]["id"], "ami-abc");
    assert_eq!(
        spec["awsLaunchTemplate"]["iamInstanceProfile"],
        "arn:aws:iam::123456789012:instance-profile/eks-1234"
    );
    assert_eq!(spec["capacityType"], "onDemand");
    assert_eq!(spec["roleName"], "eksctl-test-nodegroup-NodeInstanceRole-123");
    assert_eq!(
        spec["providerIDList"],
        serde_json::json!(["aws:///eu-central-1a/i-0123", "aws:///eu-central-1b/i-0456"])
    );
    assert_eq!(spec["availabilityZones"], serde_json::json!(["eu-central-1a", "eu-central-1b"]));
    assert!(spec.get("instanceType").is_none());

    assert_eq!(pool["status"]["ready"], true);
    assert_eq!(pool["status"]["replicas"], 2);
    assert!(pool["status"].get("launchTemplateID").is_none());

    let machine_pool = outcome.desired.get("example-machinepool-ng-1").unwrap();
    assert_eq!(machine_pool["spec"]["replicas"], 2);
    assert_eq!(machine_pool["spec"]["template"]["spec"]["bootstrap"]["dataSecretName"], "");
}

#[tokio::test]
async fn nodegroup_template_takes_precedence() {
    let outcome = run(&config(), snapshot()).await.unwrap();
    let pool = outcome
        .desired
        .get("example-awsmanagedmachinepool-ng-2")
        .unwrap();
    let lt = &pool["spec"]["awsLaunchTemplate"];

    assert_eq!(lt["name"], "eksctl-example-nodegroup-ng-2");
    assert_eq!(lt["instanceType"], "m5a.large");
    assert_eq!(lt["ami"]["id"], "ami-old");
    assert_eq!(lt["sshKeyName"], "ops");
    assert_eq!(lt["rootVolume"]["size"], 100);
    assert_eq!(lt["rootVolume"]["type"], "gp3");
    assert_eq!(
        lt["additionalSecurityGroups"],
        serde_json::json!([{ "id": "sg-1" }, { "id": "sg-2" }])
    );
    assert_eq!(pool["spec"]["capacityType"], "onDemand");
    assert_eq!(pool["spec"]["taints"][0]["effect"], "no-schedule");
    assert_eq!(pool["status"]["launchTemplateID"], "lt-2");
    assert_eq!(pool["status"]["launchTemplateVersion"], "1");
}

#[tokio::test]
async fn spot_is_reported_when_collapsing_is_off() {
    let mut config = config();
    config.resolver.collapse_spot_capacity = false;

    let outcome = run(&config, snapshot()).await.unwrap();
    let pool = outcome
        .desired
        .get("example-awsmanagedmachinepool-ng-2")
        .unwrap();
    assert_eq!(pool["spec"]["capacityType"], "spot");
}

#[tokio::test]
async fn repeated_runs_render_identically() {
    let first = run(&config(), snapshot()).await.unwrap();
    let second = run(&config(), snapshot()).await.unwrap();

    assert_eq!(
        render(&first.desired, OutputFormat::Yaml).unwrap(),
        render(&second.desired, OutputFormat::Yaml).unwrap()
    );
}

#[tokio::test]
async fn unknown_cluster_imports_nothing() {
    let mut config = config();
    config.cluster_name = "nobody".to_string();

    let outcome = run(&config, snapshot()).await.unwrap();
    assert!(outcome.desired.is_empty());
    assert!(outcome.failures.is_empty());
}

// =============================================================================
// Story: Composite input
// =============================================================================

#[tokio::test]
async fn composite_request_wraps_objects_for_provider_kubernetes() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
composite:
  metadata:
    labels:
      crossplane.io/claim-name: example
  spec:
    clusterName: example
    regionOrLocation: eu-central-1
    clusterProviderConfigRef: example-kubeconfig
    objectDeletionPolicy: Orphan
    claimRef:
      namespace: org-example
    kubernetesAdditionalLabels:
      team: infra
    compositionSelector:
      matchLabels:
        provider: aws
clusterRef: eks-cluster
observed: [eks-cluster]
"#
    )
    .unwrap();

    let request = CompositionRequest::load(file.path()).unwrap();
    assert!(request.cluster_observed());
    let config = ImportConfig::from(&request.composite);

    let outcome = run(&config, snapshot()).await.unwrap();
    let object = outcome
        .desired
        .get("example-machinepool-ng-1")
        .unwrap();

    assert_eq!(object["apiVersion"], "kubernetes.crossplane.io/v1alpha1");
    assert_eq!(object["kind"], "Object");
    assert_eq!(object["spec"]["deletionPolicy"], "Orphan");
    assert_eq!(object["spec"]["providerConfigRef"]["name"], "example-kubeconfig");

    let manifest = &object["spec"]["forProvider"]["manifest"];
    assert_eq!(manifest["kind"], "MachinePool");
    assert_eq!(manifest["metadata"]["namespace"], "org-example");
    assert_eq!(manifest["metadata"]["labels"]["team"], "infra");
    assert_eq!(manifest["metadata"]["labels"]["giantswarm.io/machine-pool"], "ng-1");
    assert_eq!(
        manifest["metadata"]["annotations"]["cluster.x-k8s.io/managed-by"],
        "crossplane"
    );
}

#[tokio::test]
async fn config_file_drives_packaging() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "clusterName: example\nnamespace: org-example\nregion: eu-central-1\npackaging:\n  mode: raw\n"
    )
    .unwrap();

    let config = ImportConfig::load(file.path()).unwrap();
    assert_eq!(config.packaging, Packaging::Raw);

    let outcome = run(&config, snapshot()).await.unwrap();
    let pool = outcome
        .desired
        .get("example-awsmanagedmachinepool-ng-1")
        .unwrap();
    assert_eq!(pool["apiVersion"], "infrastructure.cluster.x-k8s.io/v1beta2");
    assert_eq!(pool["kind"], "AWSManagedMachinePool");
}
