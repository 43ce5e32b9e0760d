use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl From<&'static str> for FieldKey {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

/// Current value of a single field.
///
/// Text is what input events carry; the other shapes exist so typed models
/// (numeric inputs, checkboxes, multi-selects) survive a round trip through
/// [`Values`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    Bool(bool),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// Empty text and empty lists count as blank; numbers and booleans never do.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(value) => value.trim().is_empty(),
            Self::List(values) => values.is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }

    /// Length in characters for text, element count for lists.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Text(value) => Some(value.chars().count()),
            Self::List(values) => Some(values.len()),
            Self::Number(_) | Self::Bool(_) => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Number(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::List(values) => f.write_str(&values.join(", ")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// Partial field values; an absent key means the field is unset.
pub type Values = BTreeMap<FieldKey, FieldValue>;

pub type TouchedState = BTreeMap<FieldKey, bool>;

/// Field key to human readable message. A missing key means no error.
pub type FormErrors = BTreeMap<FieldKey, String>;

/// Conversion between a typed model field and a [`FieldValue`].
pub trait FieldType: Sized {
    fn from_field_value(value: &FieldValue) -> Option<Self>;
    fn to_field_value(&self) -> Option<FieldValue>;
}

impl FieldType for String {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::Number(number) => Some(number.to_string()),
            FieldValue::Bool(_) | FieldValue::List(_) => None,
        }
    }

    fn to_field_value(&self) -> Option<FieldValue> {
        Some(FieldValue::Text(self.clone()))
    }
}

impl FieldType for bool {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(flag) => Some(*flag),
            FieldValue::Text(text) => match text.as_str() {
                "true" | "on" => Some(true),
                "false" | "off" | "" => Some(false),
                _ => None,
            },
            FieldValue::Number(_) | FieldValue::List(_) => None,
        }
    }

    fn to_field_value(&self) -> Option<FieldValue> {
        Some(FieldValue::Bool(*self))
    }
}

impl FieldType for Decimal {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Number(number) => Some(*number),
            FieldValue::Text(text) => Decimal::from_str(text.trim()).ok(),
            FieldValue::Bool(_) | FieldValue::List(_) => None,
        }
    }

    fn to_field_value(&self) -> Option<FieldValue> {
        Some(FieldValue::Number(*self))
    }
}

impl FieldType for Vec<String> {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::List(values) => Some(values.clone()),
            FieldValue::Text(text) if text.is_empty() => Some(Vec::new()),
            FieldValue::Text(text) => Some(vec![text.clone()]),
            FieldValue::Number(_) | FieldValue::Bool(_) => None,
        }
    }

    fn to_field_value(&self) -> Option<FieldValue> {
        Some(FieldValue::List(self.clone()))
    }
}

impl<T> FieldType for Option<T>
where
    T: FieldType,
{
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        T::from_field_value(value).map(Some)
    }

    fn to_field_value(&self) -> Option<FieldValue> {
        self.as_ref().and_then(T::to_field_value)
    }
}

/// Converts a widget's `f64` into a [`FieldValue::Number`], rejecting NaN and infinities.
pub fn decimal_from_f64(value: f64) -> Option<FieldValue> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&format!("{value:.18}"))
        .ok()
        .map(|number| FieldValue::Number(number.normalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection_depends_on_shape() {
        assert!(FieldValue::text("   ").is_blank());
        assert!(FieldValue::List(Vec::new()).is_blank());
        assert!(!FieldValue::Bool(false).is_blank());
        assert!(!FieldValue::Number(Decimal::ZERO).is_blank());
    }

    #[test]
    fn accessors_only_match_their_own_shape() {
        let number = FieldValue::from(Decimal::new(42, 0));
        assert_eq!(number.as_number(), Some(Decimal::new(42, 0)));
        assert_eq!(number.as_text(), None);

        let flag = FieldValue::from(true);
        assert_eq!(flag.as_bool(), Some(true));
        assert_eq!(flag.as_number(), None);

        let tags = FieldValue::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(tags.as_list(), Some(&["a".to_string(), "b".to_string()][..]));
        assert_eq!(tags.as_bool(), None);
        assert_eq!(FieldValue::text("x").as_list(), None);
    }

    #[test]
    fn optional_fields_skip_none_when_exporting() {
        let missing: Option<String> = None;
        assert_eq!(missing.to_field_value(), None);
        assert_eq!(
            Some("x".to_string()).to_field_value(),
            Some(FieldValue::text("x"))
        );
    }

    #[test]
    fn numeric_text_parses_into_decimal() {
        let parsed = Decimal::from_field_value(&FieldValue::text(" 12.50 "));
        assert_eq!(parsed, Some(Decimal::new(1250, 2)));
        assert_eq!(Decimal::from_field_value(&FieldValue::text("abc")), None);
    }

    #[test]
    fn decimal_from_f64_rejects_non_finite() {
        assert_eq!(decimal_from_f64(f64::NAN), None);
        assert_eq!(
            decimal_from_f64(2.5),
            Some(FieldValue::Number(Decimal::new(25, 1)))
        );
    }
}
