//! Sample Validation
//!
//! Range checking for sensor samples at the fusion engine boundary. A
//! rejected sample names the field that violated its constraint.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{Validator, ValidationConfig};
