//! Criteria: named, typed constraints a filter pass evaluates per record.

mod eval;
mod types;

pub use types::{ControlValue, CriterionKind, CriterionSpec, Span};

pub(crate) use eval::{field_matches, resolve, search_matches, FieldTest};
