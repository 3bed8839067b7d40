//! Defaulting context
//!
//! Explicit carrier for the annotations threaded through a defaulting call:
//! - the parent object's metadata (`within_parent`)
//! - whether the call is inside a `spec` subtree (`within_spec`)
//! - whether defaulting should also upgrade the stored schema
//! - the active revision defaults
//!
//! Derivation methods return a new context; the receiver is never mutated.

use crate::config::Defaults;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct DefaultingContext {
    parent: Option<ObjectMeta>,
    in_spec: bool,
    upgrade_via_defaulting: bool,
    defaults: Arc<Defaults>,
}

impl DefaultingContext {
    pub fn new(defaults: Defaults) -> Self {
        Self {
            defaults: Arc::new(defaults),
            ..Self::default()
        }
    }

    /// Mark this request as an upgrade via defaulting
    pub fn with_upgrade_via_defaulting(mut self) -> Self {
        self.upgrade_via_defaulting = true;
        self
    }

    /// Derive a context whose parent is the given object metadata
    pub fn within_parent(&self, meta: &ObjectMeta) -> Self {
        Self {
            parent: Some(meta.clone()),
            ..self.clone()
        }
    }

    /// Derive a context annotated as being inside a spec subtree
    pub fn within_spec(&self) -> Self {
        Self {
            in_spec: true,
            ..self.clone()
        }
    }

    pub fn parent_meta(&self) -> Option<&ObjectMeta> {
        self.parent.as_ref()
    }

    /// Annotation only: nothing in revision defaulting branches on it, it is
    /// carried for consumers that walk the same tree (e.g. validation)
    pub fn is_in_spec(&self) -> bool {
        self.in_spec
    }

    pub fn is_upgrade_via_defaulting(&self) -> bool {
        self.upgrade_via_defaulting
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
