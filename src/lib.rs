//! svcrun - host-managed service worker lifecycle
//!
//! A long-running worker that a host starts on one thread and stops from
//! another: `ServiceWorker::run` drives the work loop, a cloneable
//! [`worker::StopHandle`] delivers the asynchronous stop signal, and the
//! worker observes it within a bounded interval.

pub mod config;
pub mod error;
pub mod service;
pub mod worker;

pub use error::{Result, SvcrunError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
