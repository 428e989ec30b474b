//! Criterion definitions and control values.

use crate::error::{EngineError, Result};

/// What kind of comparison a criterion performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CriterionKind {
    /// Field equals the control value, string-compared.
    Exact,
    /// Numeric field within an inclusive span parsed from `"lo-hi"`.
    Range,
    /// Field value (any element, for list fields) among the checked
    /// options.
    MultiSelect,
}

/// Current value reported by a control.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlValue {
    /// Nothing selected / empty text: the kind's empty value.
    Empty,
    /// A single value (text box, dropdown, range control).
    Single(String),
    /// Multiple checked options.
    Many(Vec<String>),
}

impl ControlValue {
    pub fn single(value: impl Into<String>) -> Self {
        ControlValue::Single(value.into())
    }

    pub fn many<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ControlValue::Many(values.into_iter().map(Into::into).collect())
    }

    /// A range control's `"lo-hi"` value.
    pub fn span(lo: f64, hi: f64) -> Self {
        ControlValue::Single(format!("{}-{}", number_repr(lo), number_repr(hi)))
    }

    /// Whether this is the kind's empty value: `Empty`, blank text, or
    /// no checked options.
    pub fn is_empty(&self) -> bool {
        match self {
            ControlValue::Empty => true,
            ControlValue::Single(s) => s.trim().is_empty(),
            ControlValue::Many(values) => values.is_empty(),
        }
    }
}

impl Default for ControlValue {
    fn default() -> Self {
        ControlValue::Empty
    }
}

/// An inclusive numeric span parsed from a `"lo-hi"` control string.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub lo: f64,
    pub hi: f64,
}

impl Span {
    /// Parse `"lo-hi"`. Both bounds must be numeric; whitespace around
    /// the dash is tolerated.
    pub fn parse(s: &str) -> Result<Self> {
        let (lo, hi) = s
            .split_once('-')
            .ok_or_else(|| EngineError::InvalidRange(s.to_string()))?;

        let lo = lo
            .trim()
            .parse::<f64>()
            .map_err(|_| EngineError::InvalidRange(s.to_string()))?;
        let hi = hi
            .trim()
            .parse::<f64>()
            .map_err(|_| EngineError::InvalidRange(s.to_string()))?;

        Ok(Span { lo, hi })
    }

    /// Inclusive at both bounds.
    pub fn contains(&self, n: f64) -> bool {
        self.lo <= n && n <= self.hi
    }
}

/// Declarative description of one criterion.
///
/// `field` binds the criterion to a record field; `all` declares the
/// sentinel control value meaning "no restriction"; `initial` seeds the
/// control the engine creates for it.
#[derive(Clone, Debug)]
pub struct CriterionSpec {
    pub field: String,
    pub kind: CriterionKind,
    pub all: Option<String>,
    pub initial: ControlValue,
}

impl CriterionSpec {
    /// An exact-match criterion (dropdowns, radio groups).
    pub fn exact(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: CriterionKind::Exact,
            all: None,
            initial: ControlValue::Empty,
        }
    }

    /// A range criterion fed `"lo-hi"` values (sliders).
    pub fn range(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: CriterionKind::Range,
            all: None,
            initial: ControlValue::Empty,
        }
    }

    /// A multi-select criterion (checkbox groups).
    pub fn multi_select(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: CriterionKind::MultiSelect,
            all: None,
            initial: ControlValue::Empty,
        }
    }

    /// Declare the sentinel value meaning "unrestricted".
    pub fn with_all(mut self, sentinel: impl Into<String>) -> Self {
        self.all = Some(sentinel.into());
        self
    }

    /// Seed the control with a starting value.
    pub fn with_initial(mut self, value: ControlValue) -> Self {
        self.initial = value;
        self
    }
}

/// Format a number the way record text does: integral values without a
/// fractional part (`2010`, not `2010.0`).
pub(crate) fn number_repr(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
