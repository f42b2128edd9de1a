//! In-process collaborators for the switchyard middleware.
//!
//! - **Approval**: parks network-switch approvals until a UI decides on them
//! - **Network**: in-memory network directory and switch actuator
pub mod approval;
pub mod network;

pub use approval::ApprovalController;
pub use network::NetworkController;
