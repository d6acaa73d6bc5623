//! Core components for the envelope layer.
//!
//! This module contains the provider capability, the DER key codec, the
//! symmetric and asymmetric envelope engines and the streaming machinery.

// Primitive provider capability and the bundled providers
pub mod provider;

// DER key envelope codec
pub mod der;

// Symmetric envelope engine
pub mod symmetric;

// Asymmetric envelope engine
pub mod asymmetric;

// Incremental symmetric envelopes, cancellation and progress
pub mod streaming;

// Configuration and supported sizes
pub mod config;

// Envelope constants
pub mod constants;

// Error handling
pub mod error;

// Re-exports for convenience
pub use self::config::{AsymmetricKeySize, EnvelopeConfig, SymmetricKeySize};
pub use self::error::{Error, ErrorKind, ProviderError, Result};
