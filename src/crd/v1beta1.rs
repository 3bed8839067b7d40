//! v1beta1 CRD types
//!
//! Evolution of v1alpha1 with the deprecated fields removed:
//! - generation, build and revisionTemplate are gone from ConfigurationSpec
//! - concurrencyModel and container are gone from RevisionSpec

use k8s_openapi::api::core::v1::{Container, Volume};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Status is unchanged between versions
pub use super::configuration::ConfigurationStatus;

/// Configuration v1beta1
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "serving.knative.dev",
    version = "v1beta1",
    kind = "Configuration",
    namespaced,
    status = "ConfigurationStatus",
    shortname = "config",
    derive = "PartialEq",
    printcolumn = r#"{"name":"LatestCreated", "type":"string", "jsonPath":".status.latestCreatedRevisionName"}"#,
    printcolumn = r#"{"name":"LatestReady", "type":"string", "jsonPath":".status.latestReadyRevisionName"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct ConfigurationSpec {
    /// Template for the Revisions this Configuration creates
    #[serde(default)]
    pub template: RevisionTemplateSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RevisionTemplateSpec {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: RevisionSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RevisionSpec {
    #[serde(rename = "serviceAccountName", skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    /// Maximum in-flight requests per container, 0 means unlimited
    #[serde(rename = "containerConcurrency", skip_serializing_if = "Option::is_none")]
    pub container_concurrency: Option<i64>,

    /// Maximum duration in seconds a request may take
    #[serde(rename = "timeoutSeconds", skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,
}
