//! HeaderCrawl Core
//!
//! Core types shared by the header harvesting pipeline: the header table,
//! run configuration and the error type.

pub mod config;
pub mod error;
pub mod table;

pub use config::HarvestConfig;
pub use error::{Error, Result};
pub use table::{HeaderLocation, HeaderTable};
