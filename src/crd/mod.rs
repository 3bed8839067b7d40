pub mod configuration;
pub mod conversion;
pub mod defaulting;
pub mod v1alpha1;
pub mod v1beta1;

pub use conversion::{upgrade_via_defaulting, ConversionError, ConvertDown, ConvertUp};
pub use defaulting::SetDefaults;

/// API group shared by both Configuration versions
pub const GROUP: &str = "serving.knative.dev";

pub const KIND: &str = "Configuration";
