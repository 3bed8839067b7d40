//! Defaulting for untyped objects
//!
//! Routes a JSON object to the typed defaulting of its API version:
//! - `serving.knative.dev/v1alpha1` Configuration
//! - `serving.knative.dev/v1beta1` Configuration

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::DefaultingContext;
use crate::crd::defaulting::SetDefaults;
use crate::crd::{v1alpha1, v1beta1, GROUP, KIND};

#[derive(Debug, Error)]
pub enum DefaultingError {
    #[error("missing apiVersion{0}")]
    MissingApiVersion(String),

    #[error("unsupported apiVersion '{api_version}'{context}")]
    UnsupportedVersion { api_version: String, context: String },

    #[error("unsupported kind '{kind}'{context}")]
    UnsupportedKind { kind: String, context: String },

    #[error("failed to decode Configuration{context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode Configuration: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Split "group/version" into its parts, core types have no group
fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.rsplit_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

/// Build a short context string (namespace/name) for error messages
fn object_context(obj: &Value) -> String {
    let metadata = obj.get("metadata");
    let name = metadata
        .and_then(|m| m.get("name"))
        .and_then(|n| n.as_str());
    let namespace = metadata
        .and_then(|m| m.get("namespace"))
        .and_then(|n| n.as_str());
    match (namespace, name) {
        (Some(ns), Some(n)) => format!(" (namespace: {}, name: {})", ns, n),
        (None, Some(n)) => format!(" (name: {})", n),
        (Some(ns), None) => format!(" (namespace: {})", ns),
        _ => String::new(),
    }
}

/// Apply defaulting to a single Configuration object
pub fn default_object(obj: Value, ctx: &DefaultingContext) -> Result<Value, DefaultingError> {
    let context = object_context(&obj);

    let kind = obj.get("kind").and_then(|v| v.as_str()).unwrap_or_default();
    if kind != KIND {
        return Err(DefaultingError::UnsupportedKind {
            kind: kind.to_string(),
            context,
        });
    }

    let api_version = obj
        .get("apiVersion")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DefaultingError::MissingApiVersion(context.clone()))?
        .to_string();

    let (group, version) = split_api_version(&api_version);
    if group != GROUP {
        return Err(DefaultingError::UnsupportedVersion {
            api_version,
            context,
        });
    }

    debug!(api_version = %api_version, object = %context, "Defaulting object");

    match version {
        "v1alpha1" => default_typed::<v1alpha1::Configuration>(obj, ctx, context),
        "v1beta1" => default_typed::<v1beta1::Configuration>(obj, ctx, context),
        _ => Err(DefaultingError::UnsupportedVersion {
            api_version,
            context,
        }),
    }
}

fn default_typed<K>(
    obj: Value,
    ctx: &DefaultingContext,
    context: String,
) -> Result<Value, DefaultingError>
where
    K: DeserializeOwned + Serialize + SetDefaults,
{
    let mut typed: K =
        serde_json::from_value(obj).map_err(|source| DefaultingError::Decode { context, source })?;
    typed.set_defaults(ctx);
    Ok(serde_json::to_value(&typed)?)
}

#[cfg(test)]
#[path = "object_test.rs"]
mod tests;
