pub mod engine;

pub use engine::{ValidationError, Validator, Violation, ViolationRule};
