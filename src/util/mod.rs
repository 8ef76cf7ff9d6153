//! Helpers shared by the feed client and the terminal renderer.
//!
//! - **URL validation**: endpoint, feed and link checks before any request or
//!   browser hand-off
//! - **Text processing**: column-aware truncation and wrapping, plus
//!   sanitising of upstream HTML and control sequences

mod text;
mod url_validator;

pub use text::{display_width, strip_control_chars, strip_html, truncate_to_width, wrap_to_width};
pub use url_validator::{validate_endpoint, validate_url, UrlValidationError};
