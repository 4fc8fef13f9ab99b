pub use crate::errors::{ConveneError, Failure};

pub mod behavior;
pub mod convention;
pub mod dispatch;
pub mod errors;
pub mod metadata;
pub mod params;
pub mod report;
pub mod runner;
