//! Leaf utilities shared by the parser and the client.
//!
//! - [`url`]: query-string building and image URL resolution
//! - [`time`]: the provider's relative and absolute time strings
//! - [`validate`]: field presence and type checks on JSON responses

pub mod time;
pub mod url;
pub mod validate;

pub use self::time::{parse_time, parse_time_at};
pub use self::url::{build_url, resolve_image_url};
pub use self::validate::{FieldType, ValidationReport, ValidationRule, validate_response};
