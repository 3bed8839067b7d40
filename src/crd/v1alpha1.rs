//! v1alpha1 CRD types
//!
//! Re-exports from configuration.rs for versioned access.
//! This is the original API version and still the storage version.

pub use super::configuration::{
    ConcurrencyModel, Configuration, ConfigurationSpec, ConfigurationStatus, RevisionSpec,
    RevisionTemplateSpec,
};
