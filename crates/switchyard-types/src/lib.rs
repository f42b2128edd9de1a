//! Shared types, traits, and errors for switchyard.
//!
//! This crate is the foundation the other switchyard crates depend on:
//! - **Trait contracts** (`traits`) for the external collaborators
//! - **Request/response types** (`rpc`) threaded through the handler pipeline
//! - **Network identity** (`network`) and **approval descriptors** (`approval`)
//! - **Error types** (`errors`) for unified error handling
//! - **Config types** (`config`, `config_loader`) for configuration file parsing

pub mod approval;
pub mod config;
pub mod config_loader;
pub mod errors;
pub mod network;
pub mod rpc;
pub mod traits;

// Re-export commonly used types at the crate root for convenience.
pub use approval::*;
pub use errors::SwitchyardError;
pub use network::*;
pub use rpc::*;
pub use traits::*;
