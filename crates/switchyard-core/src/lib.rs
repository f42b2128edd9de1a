//! Request admission for switchyard.
//!
//! Serializes confirmation-requiring JSON-RPC requests so each one runs
//! against the network it was issued for:
//! - **Classifier**: maps a method to bypass, confirmation, or network-switch
//! - **Queue**: global FIFO with a single active slot
//! - **Middleware**: gates queued requests behind an approved network switch
//! - **Pipeline**: the ordered handler chain the middleware is installed in
pub mod classifier;
pub mod middleware;
pub mod pipeline;
pub mod queue;

pub use classifier::MethodClassifier;
pub use middleware::{NetworkSwitchDeps, NetworkSwitchMiddleware};
pub use pipeline::{Next, Pipeline, RpcHandler};
pub use queue::RequestQueue;
