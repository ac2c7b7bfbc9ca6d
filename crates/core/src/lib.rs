//! Shared building blocks for the JobSet model layer: the error kinds, field
//! paths, and the typed field reader used to construct resources from decoded
//! input.

pub mod error;
pub mod fields;
pub mod path;

pub use error::{ValidationError, Violations};
pub use fields::{ClosedSet, Fields, FromValue};
pub use path::FieldPath;
