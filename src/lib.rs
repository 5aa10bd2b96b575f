pub mod clairchen;
pub mod device;
pub mod downlink;
pub mod ers;
pub mod error;
pub mod mcs;
pub mod measurement;
pub mod oy1012;
pub mod uplink;

pub use error::{PayloadError, Result};
