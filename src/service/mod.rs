//! Host-side service identity and configuration
//!
//! The worker itself is host-agnostic; this module carries what an
//! embedding host needs: the service identity strings and the on-disk
//! configuration format.

pub mod config;

pub use config::{ConfigError, ServiceConfig};

/// Service name used for registration and config lookup
pub const SERVICE_NAME: &str = "svcrun";

/// Service display name shown by host tooling
pub const SERVICE_DISPLAY_NAME: &str = "Svcrun Worker";

/// Service description
pub const SERVICE_DESCRIPTION: &str =
    "Runs a long-lived worker loop that stops promptly and cleanly when the host signals it";
