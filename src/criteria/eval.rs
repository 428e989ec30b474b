//! Criterion evaluation against records.
//!
//! A criterion is resolved once per filter pass into a [`FieldTest`]
//! (or into "inactive"), then the test runs per record. A record with
//! the bound field missing or of an unusable shape simply fails the
//! test; evaluation never aborts a pass.

use crate::criteria::types::{number_repr, ControlValue, CriterionKind, Span};
use crate::error::Result;
use crate::types::{FieldValue, Record};

/// A criterion resolved against its control's current value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldTest {
    /// Field equals this value, string-compared.
    Exact(String),
    /// Field value (any element, for list fields) is among these.
    OneOf(Vec<String>),
    /// Numeric field value lies within this inclusive span.
    Within(Span),
}

/// Resolve a criterion's current control value into a test.
///
/// `Ok(None)` means the criterion is inactive this pass: the value is
/// the kind's empty value, or it equals the declared "all" sentinel
/// (for multi-select, the sentinel being among the checked options).
/// `Err` means a range control reported an unparsable value.
///
/// Kind and value shape interact the way the duck-typed original did:
/// an exact criterion fed multiple checked options degrades to
/// membership, and a multi-select fed a single value tests just it.
pub(crate) fn resolve(
    kind: CriterionKind,
    value: &ControlValue,
    all: Option<&str>,
) -> Result<Option<FieldTest>> {
    if value.is_empty() {
        return Ok(None);
    }

    if let Some(sentinel) = all {
        let unrestricted = match value {
            ControlValue::Single(s) => s == sentinel,
            ControlValue::Many(values) => values.iter().any(|v| v == sentinel),
            ControlValue::Empty => true,
        };
        if unrestricted {
            return Ok(None);
        }
    }

    let test = match (kind, value) {
        (CriterionKind::Range, ControlValue::Single(s)) => FieldTest::Within(Span::parse(s)?),
        // A two-ended control reporting its bounds separately joins
        // back into the "lo-hi" form.
        (CriterionKind::Range, ControlValue::Many(values)) => {
            FieldTest::Within(Span::parse(&values.join("-"))?)
        }
        (_, ControlValue::Single(s)) => FieldTest::Exact(s.clone()),
        (_, ControlValue::Many(values)) => FieldTest::OneOf(values.clone()),
        (_, ControlValue::Empty) => return Ok(None),
    };

    Ok(Some(test))
}

/// Run a resolved test against one record field.
pub(crate) fn field_matches(record: &Record, field: &str, test: &FieldTest) -> bool {
    let value = match record.field(field) {
        Some(value) => value,
        None => return false,
    };

    match test {
        FieldTest::Exact(want) => value_matches_text(value, want),
        FieldTest::OneOf(options) => options.iter().any(|opt| value_matches_text(value, opt)),
        FieldTest::Within(span) => match numeric_value(value) {
            Some(n) => span.contains(n),
            None => false,
        },
    }
}

/// Case-insensitive substring search over a record's text.
///
/// With an explicit field list, every listed field participates whatever
/// its shape (a numeric runtime is searchable as its text form). Without
/// one, only string-valued fields are searched: text directly, lists on
/// any element.
pub(crate) fn search_matches(record: &Record, needle: &str, fields: Option<&[String]>) -> bool {
    let needle = needle.to_lowercase();

    match fields {
        Some(fields) => fields.iter().any(|field| {
            record
                .field(field)
                .map(|value| value_contains(value, &needle))
                .unwrap_or(false)
        }),
        None => record.fields().any(|(_, value)| match value {
            FieldValue::Text(s) => s.to_lowercase().contains(&needle),
            FieldValue::List(items) => {
                items.iter().any(|item| item.to_lowercase().contains(&needle))
            }
            _ => false,
        }),
    }
}

/// String comparison between a field value and a control value, with
/// list fields matching on any element.
fn value_matches_text(value: &FieldValue, want: &str) -> bool {
    match value {
        FieldValue::Text(s) => s == want,
        FieldValue::Number(n) => number_repr(*n) == want,
        FieldValue::List(items) => items.iter().any(|item| item == want),
        FieldValue::Nested(_) => false,
    }
}

/// Substring test over a field's text form(s); `needle` is lowercase.
fn value_contains(value: &FieldValue, needle: &str) -> bool {
    match value {
        FieldValue::Text(s) => s.to_lowercase().contains(needle),
        FieldValue::Number(n) => number_repr(*n).contains(needle),
        FieldValue::List(items) => items.iter().any(|item| item.to_lowercase().contains(needle)),
        FieldValue::Nested(_) => false,
    }
}

/// Numeric view of a field value: numbers directly, text via parsing.
fn numeric_value(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}
