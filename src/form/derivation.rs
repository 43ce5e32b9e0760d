use super::controller::FormOptions;
use super::pipeline::{Contribution, Enhancer, FormState};
use super::validation::Validator;
use super::value::{FieldKey, FormErrors, TouchedState, Values};

/// Derives `errors` from the accumulated values on every read.
pub struct ErrorDerivation<V> {
    validator: V,
    options: FormOptions,
}

impl<V> ErrorDerivation<V>
where
    V: Validator,
{
    pub fn new(validator: V, options: FormOptions) -> Self {
        Self { validator, options }
    }

    pub fn derive(&self, values: &Values) -> FormErrors {
        let mut errors = FormErrors::new();
        for violation in self.validator.validate(values) {
            let messages = violation
                .constraints
                .iter()
                .map(|constraint| constraint.message.as_str())
                .filter(|message| !message.is_empty());
            let joined = if self.options.validate_first_error_only {
                messages.take(1).collect::<Vec<_>>().join("")
            } else {
                messages.collect::<Vec<_>>().join(self.options.message_separator)
            };
            if joined.is_empty() {
                continue;
            }
            match errors.get_mut(&violation.property) {
                Some(existing) if !self.options.validate_first_error_only => {
                    existing.push_str(self.options.message_separator);
                    existing.push_str(&joined);
                }
                Some(_) => {}
                None => {
                    errors.insert(violation.property, joined);
                }
            }
        }
        errors
    }
}

impl<V> Enhancer for ErrorDerivation<V>
where
    V: Validator,
{
    fn name(&self) -> &'static str {
        "errors"
    }

    fn read(&self, last: &FormState) -> Contribution {
        Contribution::new().errors(self.derive(&last.values))
    }
}

/// Restricts `errors` to the fields the user has blurred.
#[derive(Clone, Copy, Debug, Default)]
pub struct TouchedErrors;

impl Enhancer for TouchedErrors {
    fn name(&self) -> &'static str {
        "errors_touched"
    }

    fn read(&self, last: &FormState) -> Contribution {
        Contribution::new().errors_touched(filter_touched(&last.errors, &last.touched))
    }
}

pub fn filter_touched(errors: &FormErrors, touched: &TouchedState) -> FormErrors {
    errors
        .iter()
        .filter(|(key, message)| !message.is_empty() && is_touched(touched, **key))
        .map(|(key, message)| (*key, message.clone()))
        .collect()
}

fn is_touched(touched: &TouchedState, key: FieldKey) -> bool {
    touched.get(&key).copied().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::pipeline::Pipeline;
    use crate::form::slices::{TouchedSlice, ValueSlice};
    use crate::form::validation::{Rule, RuleSet};
    use crate::form::value::{FieldValue, Values};

    const NAME: FieldKey = FieldKey::new("name");
    const EMAIL: FieldKey = FieldKey::new("email");
    const CITY: FieldKey = FieldKey::new("city");

    fn rules() -> RuleSet {
        RuleSet::new()
            .rules(
                NAME,
                [
                    Rule::required("must not be empty"),
                    Rule::min_length(2, "too short"),
                ],
            )
            .field(EMAIL, Rule::new("contains_at", "must contain @", |value| {
                value.as_text().is_some_and(|text| text.contains('@'))
            }))
    }

    #[test]
    fn messages_for_one_field_are_joined() {
        let derivation = ErrorDerivation::new(rules(), FormOptions::default());
        let errors = derivation.derive(&Values::from([(NAME, FieldValue::text(""))]));
        assert_eq!(
            errors,
            FormErrors::from([(NAME, "must not be empty, too short".to_string())])
        );
    }

    #[test]
    fn first_error_only_keeps_the_first_message() {
        let derivation = ErrorDerivation::new(
            rules(),
            FormOptions {
                validate_first_error_only: true,
                ..FormOptions::default()
            },
        );
        let errors = derivation.derive(&Values::from([(NAME, FieldValue::text(""))]));
        assert_eq!(errors.get(&NAME).map(String::as_str), Some("must not be empty"));
    }

    #[test]
    fn derivation_is_deterministic() {
        let derivation = ErrorDerivation::new(rules(), FormOptions::default());
        let values = Values::from([
            (NAME, FieldValue::text("J")),
            (EMAIL, FieldValue::text("nope")),
        ]);
        assert_eq!(derivation.derive(&values), derivation.derive(&values));
    }

    #[test]
    fn touched_filter_keeps_exactly_the_touched_error_keys() {
        let errors = FormErrors::from([
            (NAME, "a".to_string()),
            (EMAIL, "b".to_string()),
            (CITY, "c".to_string()),
        ]);
        let touched = TouchedState::from([(NAME, true), (EMAIL, false)]);

        assert_eq!(
            filter_touched(&errors, &touched),
            FormErrors::from([(NAME, "a".to_string())])
        );
    }

    #[test]
    fn stages_chain_off_values_and_touched() {
        let mut pipeline = Pipeline::new()
            .pipe(ValueSlice::new(Values::from([(EMAIL, FieldValue::text("x"))])))
            .pipe(TouchedSlice::default())
            .pipe(ErrorDerivation::new(rules(), FormOptions::default()))
            .pipe(TouchedErrors);

        let state = pipeline.resolve();
        assert_eq!(state.errors.len(), 2);
        assert!(state.errors_touched.is_empty());

        let state = pipeline.dispatch(&crate::form::action::FormAction::blur(EMAIL)).state;
        assert_eq!(
            state.errors_touched,
            FormErrors::from([(EMAIL, "must contain @".to_string())])
        );
        for key in state.errors_touched.keys() {
            assert!(state.errors.contains_key(key));
            assert!(state.is_touched(*key));
        }
    }
}
