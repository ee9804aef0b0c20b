//! HTTP protocol layer module
//!
//! Header policy, response builders and file metadata helpers shared by the
//! proxy and static file handlers.

pub mod cache;
pub mod headers;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_400_response, build_404_response, build_413_response,
    build_501_response, build_502_response, build_content_response, build_error_response,
    build_file_not_found_response, build_options_response, build_redirect_response,
};
