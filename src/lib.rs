// Declare modules at the root level
pub mod cache;
pub mod config;
pub mod cultivation;
pub mod daily;
pub mod domain;
pub mod error;
pub mod profiles;
pub mod reconcile;
pub mod scoring;
pub mod service;
pub mod source;
pub mod time;
pub mod weekly;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export at root for convenience
pub use cache::*;
pub use config::*;
pub use cultivation::*;
pub use daily::*;
pub use domain::*;
pub use error::*;
pub use profiles::*;
pub use reconcile::*;
pub use scoring::*;
pub use service::*;
pub use source::*;
pub use time::*;
pub use weekly::*;
