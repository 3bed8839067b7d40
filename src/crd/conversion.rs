//! CRD version conversion between v1alpha1 and v1beta1
//!
//! Provides bidirectional conversion for the Configuration CRD.
//!
//! ## Conversion rules:
//! - v1alpha1 -> v1beta1: fold deprecated aliases into their replacements
//!   (revisionTemplate -> template, container -> containers, concurrencyModel
//!   Single -> containerConcurrency 1); fail on fields v1beta1 cannot hold
//!   (build) and on ambiguous one-of pairs.
//! - v1beta1 -> v1alpha1: populate the current fields, leave deprecated ones unset.

use thiserror::Error;
use tracing::debug;

use super::v1alpha1;
use super::v1beta1;
use crate::apis::DefaultingContext;

#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("{field} cannot be converted to {version}")]
    UnsupportedField {
        field: &'static str,
        version: &'static str,
    },

    #[error("expected exactly one, got both: {0}")]
    MultipleOneOf(&'static str),

    #[error("expected exactly one, got neither: {0}")]
    MissingOneOf(&'static str),
}

/// Convert `self` into a newer schema version
pub trait ConvertUp<T> {
    fn convert_up(&self, ctx: &DefaultingContext, sink: &mut T) -> Result<(), ConversionError>;
}

/// Populate `self` from a newer schema version
pub trait ConvertDown<T> {
    fn convert_down(&mut self, ctx: &DefaultingContext, source: &T)
        -> Result<(), ConversionError>;
}

/// Normalize `spec` through a round trip to version `T`
///
/// Only runs when the context requests an upgrade via defaulting. The spec is
/// replaced only if both directions succeed; any conversion error leaves it
/// untouched.
pub fn upgrade_via_defaulting<S, T>(spec: &mut S, ctx: &DefaultingContext)
where
    S: Default + ConvertUp<T> + ConvertDown<T>,
    T: Default,
{
    if !ctx.is_upgrade_via_defaulting() {
        return;
    }

    match round_trip::<S, T>(spec, ctx) {
        Ok(normalized) => *spec = normalized,
        Err(err) => {
            // Defaulting never fails: keep the pre-upgrade shape
            debug!(error = %err, "Upgrade via defaulting abandoned");
        }
    }
}

fn round_trip<S, T>(spec: &S, ctx: &DefaultingContext) -> Result<S, ConversionError>
where
    S: Default + ConvertUp<T> + ConvertDown<T>,
    T: Default,
{
    let mut up = T::default();
    spec.convert_up(ctx, &mut up)?;

    let mut down = S::default();
    down.convert_down(ctx, &up)?;
    Ok(down)
}

impl ConvertUp<v1beta1::ConfigurationSpec> for v1alpha1::ConfigurationSpec {
    fn convert_up(
        &self,
        ctx: &DefaultingContext,
        sink: &mut v1beta1::ConfigurationSpec,
    ) -> Result<(), ConversionError> {
        if self.deprecated_build.is_some() {
            return Err(ConversionError::UnsupportedField {
                field: "build",
                version: "v1beta1",
            });
        }

        match (&self.deprecated_revision_template, &self.template) {
            (Some(_), Some(_)) => Err(ConversionError::MultipleOneOf("revisionTemplate, template")),
            (Some(template), None) | (None, Some(template)) => {
                template.convert_up(ctx, &mut sink.template)
            }
            (None, None) => Err(ConversionError::MissingOneOf("revisionTemplate, template")),
        }
    }
}

impl ConvertDown<v1beta1::ConfigurationSpec> for v1alpha1::ConfigurationSpec {
    fn convert_down(
        &mut self,
        ctx: &DefaultingContext,
        source: &v1beta1::ConfigurationSpec,
    ) -> Result<(), ConversionError> {
        let mut template = v1alpha1::RevisionTemplateSpec::default();
        template.convert_down(ctx, &source.template)?;

        *self = v1alpha1::ConfigurationSpec {
            template: Some(template),
            ..Default::default()
        };
        Ok(())
    }
}

impl ConvertUp<v1beta1::RevisionTemplateSpec> for v1alpha1::RevisionTemplateSpec {
    fn convert_up(
        &self,
        ctx: &DefaultingContext,
        sink: &mut v1beta1::RevisionTemplateSpec,
    ) -> Result<(), ConversionError> {
        sink.metadata = self.metadata.clone();
        self.spec.convert_up(ctx, &mut sink.spec)
    }
}

impl ConvertDown<v1beta1::RevisionTemplateSpec> for v1alpha1::RevisionTemplateSpec {
    fn convert_down(
        &mut self,
        ctx: &DefaultingContext,
        source: &v1beta1::RevisionTemplateSpec,
    ) -> Result<(), ConversionError> {
        self.metadata = source.metadata.clone();
        self.spec.convert_down(ctx, &source.spec)
    }
}

impl ConvertUp<v1beta1::RevisionSpec> for v1alpha1::RevisionSpec {
    fn convert_up(
        &self,
        _ctx: &DefaultingContext,
        sink: &mut v1beta1::RevisionSpec,
    ) -> Result<(), ConversionError> {
        sink.containers = match (&self.deprecated_container, self.containers.as_slice()) {
            (Some(_), [_, ..]) => return Err(ConversionError::MultipleOneOf("container, containers")),
            (Some(container), []) => vec![container.clone()],
            (None, [container]) => vec![container.clone()],
            (None, []) => return Err(ConversionError::MissingOneOf("container, containers")),
            (None, _) => return Err(ConversionError::MultipleOneOf("containers")),
        };

        sink.service_account_name = self.service_account_name.clone();
        sink.volumes = self.volumes.clone();
        sink.timeout_seconds = self.timeout_seconds;
        sink.container_concurrency = match (self.container_concurrency, self.deprecated_concurrency_model) {
            (None, Some(v1alpha1::ConcurrencyModel::Single)) => Some(1),
            (concurrency, _) => concurrency,
        };
        Ok(())
    }
}

impl ConvertDown<v1beta1::RevisionSpec> for v1alpha1::RevisionSpec {
    fn convert_down(
        &mut self,
        _ctx: &DefaultingContext,
        source: &v1beta1::RevisionSpec,
    ) -> Result<(), ConversionError> {
        *self = v1alpha1::RevisionSpec {
            deprecated_concurrency_model: None,
            deprecated_container: None,
            service_account_name: source.service_account_name.clone(),
            containers: source.containers.clone(),
            volumes: source.volumes.clone(),
            container_concurrency: source.container_concurrency,
            timeout_seconds: source.timeout_seconds,
        };
        Ok(())
    }
}

#[cfg(test)]
#[path = "conversion_test.rs"]
mod tests;
