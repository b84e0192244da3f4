//! Common types and utilities shared across the air-quality forecast workspace.

pub mod bbox;
pub mod credentials;
pub mod error;
pub mod species;
pub mod time;

pub use bbox::BoundingBox;
pub use credentials::Credentials;
pub use error::{CommonError, CommonResult};
pub use time::DateRange;
