//! Domain models

pub mod access_policy;
pub mod common;
pub mod organization;
pub mod porting;
pub mod project;
pub mod secret;

pub use access_policy::*;
pub use common::*;
pub use organization::*;
pub use porting::*;
pub use project::*;
pub use secret::*;
