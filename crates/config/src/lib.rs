//! Configuration value resolution.
//!
//! Every configuration key is resolved through [`ValueResolver`], which
//! dispatches per key to the environment, a parameter store, or a secret
//! store based on a `{NAME}_SOURCE` override.

pub mod error;
pub mod resolver;

pub use {error::ConfigError, resolver::ValueResolver};
