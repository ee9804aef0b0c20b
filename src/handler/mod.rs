//! Request handler module
//!
//! Routing dispatch, upstream forwarding, response normalization and static
//! file serving.

pub mod normalize;
pub mod proxy;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, Router};
