//! Business logic layer

pub mod access_policy;
pub mod authorization;
pub mod porting;

pub use access_policy::{AccessPolicyService, ValidatedBatch};
pub use authorization::{AccessDecision, AuthorizationService};
pub use porting::PortingService;
