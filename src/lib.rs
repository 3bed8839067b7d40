pub mod apis;
pub mod config;
pub mod crd;
