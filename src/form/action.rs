use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

use super::value::{FieldKey, FieldValue, Values};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ActionKind {
    OnChange,
    OnBlur,
    OnSubmit,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [Self::OnSubmit, Self::OnChange, Self::OnBlur];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnChange => "onChange",
            Self::OnBlur => "onBlur",
            Self::OnSubmit => "onSubmit",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unknown form action kind `{0}`")]
pub struct UnknownActionKind(pub String);

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "onChange" => Ok(Self::OnChange),
            "onBlur" => Ok(Self::OnBlur),
            "onSubmit" => Ok(Self::OnSubmit),
            other => Err(UnknownActionKind(other.to_string())),
        }
    }
}

/// Event-shaped data carried by an action. Units ignore shapes they do not understand.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionPayload {
    /// `{ name, value }` from a single input.
    Field { name: FieldKey, value: FieldValue },
    /// Shallow multi-field patch.
    Patch(Values),
    /// `{ name }` from a blur event.
    Name(FieldKey),
    /// Opaque submit trigger.
    Trigger,
}

impl ActionPayload {
    pub fn field(name: impl Into<FieldKey>, value: impl Into<FieldValue>) -> Self {
        Self::Field {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> Option<FieldKey> {
        match self {
            Self::Field { name, .. } | Self::Name(name) => Some(*name),
            Self::Patch(_) | Self::Trigger => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FormAction {
    pub kind: ActionKind,
    pub payload: ActionPayload,
}

impl FormAction {
    pub fn new(kind: ActionKind, payload: ActionPayload) -> Self {
        Self { kind, payload }
    }

    pub fn change(name: impl Into<FieldKey>, value: impl Into<FieldValue>) -> Self {
        Self::new(ActionKind::OnChange, ActionPayload::field(name, value))
    }

    pub fn patch(values: Values) -> Self {
        Self::new(ActionKind::OnChange, ActionPayload::Patch(values))
    }

    pub fn blur(name: impl Into<FieldKey>) -> Self {
        Self::new(ActionKind::OnBlur, ActionPayload::Name(name.into()))
    }

    pub fn submit() -> Self {
        Self::new(ActionKind::OnSubmit, ActionPayload::Trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>(), Ok(kind));
        }
        assert_eq!(
            "onFocus".parse::<ActionKind>(),
            Err(UnknownActionKind("onFocus".to_string()))
        );
    }

    #[test]
    fn payload_name_is_available_for_field_and_blur_shapes() {
        assert_eq!(
            ActionPayload::field("email", "a@b.com").name(),
            Some(FieldKey::new("email"))
        );
        assert_eq!(
            ActionPayload::Name(FieldKey::new("email")).name(),
            Some(FieldKey::new("email"))
        );
        assert_eq!(ActionPayload::Trigger.name(), None);
    }
}
