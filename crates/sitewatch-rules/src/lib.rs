//! Rule engine: condition parameter schema, draft validation, canonical
//! condition formatting, and the alert status state machine.
//!
//! Everything here is pure. Persistence lives in `sitewatch-storage` and
//! HTTP concerns in `sitewatch-server`; both call into this crate so the
//! manual API path and the AI translation path share one validation gate.

pub mod format;
pub mod lifecycle;
pub mod schema;

pub use format::{format_condition, format_condition_value};
pub use lifecycle::{check_transition, allowed_targets, TransitionError};
pub use schema::{
    parameter_specs, validate_condition, validate_rule, FieldError, ParamKind, ParamSpec,
    ValidationError,
};
