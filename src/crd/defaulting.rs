//! Defaulting for Configuration resources
//!
//! Fills unset fields before validation and persistence. Defaulting never
//! fails and is idempotent: the API server may run it several times for the
//! same request.
//!
//! ## Call chain (v1alpha1)
//! - Configuration: derive `within_parent(metadata)` + `within_spec`
//! - ConfigurationSpec: optional upgrade round trip, then the template
//! - RevisionTemplateSpec: `within_spec` for the revision
//! - RevisionSpec: optional upgrade round trip, then revision defaults

use k8s_openapi::api::core::v1::{Container, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

use super::conversion::upgrade_via_defaulting;
use super::v1alpha1;
use super::v1beta1;
use crate::apis::DefaultingContext;

const RESOURCE_CPU: &str = "cpu";
const RESOURCE_MEMORY: &str = "memory";

/// Types that fill their own unset fields
pub trait SetDefaults {
    fn set_defaults(&mut self, ctx: &DefaultingContext);
}

impl v1alpha1::Configuration {
    /// Context handed to spec defaulting: parent is this object, inside spec
    pub fn spec_context(&self, ctx: &DefaultingContext) -> DefaultingContext {
        ctx.within_parent(&self.metadata).within_spec()
    }
}

impl SetDefaults for v1alpha1::Configuration {
    fn set_defaults(&mut self, ctx: &DefaultingContext) {
        let ctx = self.spec_context(ctx);
        self.spec.set_defaults(&ctx);
    }
}

impl SetDefaults for v1alpha1::ConfigurationSpec {
    fn set_defaults(&mut self, ctx: &DefaultingContext) {
        upgrade_via_defaulting::<_, v1beta1::ConfigurationSpec>(self, ctx);

        if let Some(template) = self.template_mut() {
            template.set_defaults(ctx);
        }
    }
}

impl SetDefaults for v1alpha1::RevisionTemplateSpec {
    fn set_defaults(&mut self, ctx: &DefaultingContext) {
        self.spec.set_defaults(&ctx.within_spec());
    }
}

impl SetDefaults for v1alpha1::RevisionSpec {
    fn set_defaults(&mut self, ctx: &DefaultingContext) {
        upgrade_via_defaulting::<_, v1beta1::RevisionSpec>(self, ctx);

        if self.container_concurrency.is_none()
            && self.deprecated_concurrency_model == Some(v1alpha1::ConcurrencyModel::Single)
        {
            self.container_concurrency = Some(1);
        }
        default_revision_fields(&mut self.container_concurrency, &mut self.timeout_seconds, ctx);

        if let Some(container) = self.deprecated_container.as_mut() {
            default_container(container, ctx);
        }
        for container in &mut self.containers {
            default_container(container, ctx);
        }
    }
}

impl v1beta1::Configuration {
    pub fn spec_context(&self, ctx: &DefaultingContext) -> DefaultingContext {
        ctx.within_parent(&self.metadata).within_spec()
    }
}

impl SetDefaults for v1beta1::Configuration {
    fn set_defaults(&mut self, ctx: &DefaultingContext) {
        let ctx = self.spec_context(ctx);
        self.spec.set_defaults(&ctx);
    }
}

impl SetDefaults for v1beta1::ConfigurationSpec {
    fn set_defaults(&mut self, ctx: &DefaultingContext) {
        self.template.set_defaults(ctx);
    }
}

impl SetDefaults for v1beta1::RevisionTemplateSpec {
    fn set_defaults(&mut self, ctx: &DefaultingContext) {
        self.spec.set_defaults(&ctx.within_spec());
    }
}

impl SetDefaults for v1beta1::RevisionSpec {
    fn set_defaults(&mut self, ctx: &DefaultingContext) {
        default_revision_fields(&mut self.container_concurrency, &mut self.timeout_seconds, ctx);

        for container in &mut self.containers {
            default_container(container, ctx);
        }
    }
}

fn default_revision_fields(
    container_concurrency: &mut Option<i64>,
    timeout_seconds: &mut Option<i64>,
    ctx: &DefaultingContext,
) {
    let defaults = ctx.defaults();
    if container_concurrency.is_none() {
        *container_concurrency = Some(defaults.container_concurrency);
    }
    if timeout_seconds.is_none() {
        *timeout_seconds = Some(defaults.revision_timeout_seconds);
    }
}

/// Apply per-container defaults
///
/// - empty name -> rendered container name template
/// - missing cpu/memory requests and limits -> configured quantities
/// - volume mounts -> read-only
pub fn default_container(container: &mut Container, ctx: &DefaultingContext) {
    let defaults = ctx.defaults();

    if container.name.is_empty() {
        container.name = defaults.user_container_name(ctx.parent_meta());
    }

    let requested = [
        (RESOURCE_CPU, defaults.revision_cpu_request.as_ref()),
        (RESOURCE_MEMORY, defaults.revision_memory_request.as_ref()),
    ];
    let limited = [
        (RESOURCE_CPU, defaults.revision_cpu_limit.as_ref()),
        (RESOURCE_MEMORY, defaults.revision_memory_limit.as_ref()),
    ];
    for (resource, quantity) in requested {
        if let Some(quantity) = quantity {
            let resources = container.resources.get_or_insert_with(ResourceRequirements::default);
            default_quantity(&mut resources.requests, resource, quantity);
        }
    }
    for (resource, quantity) in limited {
        if let Some(quantity) = quantity {
            let resources = container.resources.get_or_insert_with(ResourceRequirements::default);
            default_quantity(&mut resources.limits, resource, quantity);
        }
    }

    for mount in container.volume_mounts.iter_mut().flatten() {
        mount.read_only = Some(true);
    }
}

fn default_quantity(
    list: &mut Option<BTreeMap<String, Quantity>>,
    resource: &str,
    quantity: &Quantity,
) {
    list.get_or_insert_with(BTreeMap::new)
        .entry(resource.to_string())
        .or_insert_with(|| quantity.clone());
}

#[cfg(test)]
#[path = "defaulting_test.rs"]
mod tests;
