use k8s_openapi::api::core::v1::{Container, Volume};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Configuration is a Custom Resource describing the desired revision template
///
/// Every change to the template stamps out a new Revision.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "serving.knative.dev",
    version = "v1alpha1",
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
    /// Deprecated: superseded by metadata.generation
    #[serde(rename = "generation", skip_serializing_if = "Option::is_none")]
    pub deprecated_generation: Option<i64>,

    /// Deprecated: opaque build definition, has no v1beta1 counterpart
    #[serde(rename = "build", skip_serializing_if = "Option::is_none")]
    pub deprecated_build: Option<RawExtension>,

    /// Deprecated: alias of `template`
    #[serde(rename = "revisionTemplate", skip_serializing_if = "Option::is_none")]
    pub deprecated_revision_template: Option<RevisionTemplateSpec>,

    /// Template for the Revisions this Configuration creates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<RevisionTemplateSpec>,
}

impl ConfigurationSpec {
    /// The effective template, preferring the deprecated field when set
    pub fn template(&self) -> Option<&RevisionTemplateSpec> {
        self.deprecated_revision_template
            .as_ref()
            .or(self.template.as_ref())
    }

    pub fn template_mut(&mut self) -> Option<&mut RevisionTemplateSpec> {
        match self.deprecated_revision_template {
            Some(ref mut template) => Some(template),
            None => self.template.as_mut(),
        }
    }
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
    /// Deprecated: superseded by containerConcurrency
    #[serde(rename = "concurrencyModel", skip_serializing_if = "Option::is_none")]
    pub deprecated_concurrency_model: Option<ConcurrencyModel>,

    /// Deprecated: single-container form of `containers`
    #[serde(rename = "container", skip_serializing_if = "Option::is_none")]
    pub deprecated_container: Option<Container>,

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

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum ConcurrencyModel {
    /// One request at a time per container
    Single,
    /// Unbounded concurrent requests
    Multi,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct ConfigurationStatus {
    #[serde(rename = "observedGeneration", skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(
        rename = "latestCreatedRevisionName",
        skip_serializing_if = "Option::is_none"
    )]
    pub latest_created_revision_name: Option<String>,

    #[serde(
        rename = "latestReadyRevisionName",
        skip_serializing_if = "Option::is_none"
    )]
    pub latest_ready_revision_name: Option<String>,
}

#[cfg(test)]
#[path = "configuration_test.rs"]
mod tests;
