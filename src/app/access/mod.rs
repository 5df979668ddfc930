//! Retrying access verification
//!
//! Combines the stats cache with a read-permission check and a constant
//! backoff retry loop. Used by the static responder before serving a file and
//! by the health prober for every entry it walks.

pub mod config;
pub mod state;
pub mod verifier;

pub use config::AccessConfig;
pub use state::AccessState;
pub use verifier::AccessVerifier;
