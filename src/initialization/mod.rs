//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources of a run:
//! - Logger
//! - rustls crypto provider
//! - System trust store snapshot
//! - Per-batch concurrency limit
//!
//! All initialization functions return proper error types for error handling.

mod logger;
mod trust_store;

use std::sync::Arc;

use rustls::crypto::{ring::default_provider, CryptoProvider};
use tokio::sync::Semaphore;

// Re-export public API
pub use logger::init_logger_with;
pub use trust_store::{load_trust_anchors, trust_anchors_from_result};

/// Initializes a semaphore for controlling concurrency.
///
/// The scheduler creates one per batch, sized to the batch, so that at most
/// that many TLS connections are open at once.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count))
}

/// Initializes the crypto provider for TLS operations.
///
/// Configures the global crypto provider for `rustls`. This must be called before
/// any TLS connections are established.
pub fn init_crypto_provider() {
    // The return value is ignored because reinstalling the provider is harmless
    let _ = CryptoProvider::install_default(default_provider());
}
