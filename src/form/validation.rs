use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

use super::value::{FieldKey, FieldValue, Values};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Constraint {
    pub rule: &'static str,
    pub message: String,
}

impl Constraint {
    pub fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

/// All failed constraints of one field, in rule declaration order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Violation {
    pub property: FieldKey,
    pub constraints: Vec<Constraint>,
}

impl Violation {
    pub fn new(property: FieldKey, constraints: Vec<Constraint>) -> Self {
        Self {
            property,
            constraints,
        }
    }

    pub fn single(property: FieldKey, rule: &'static str, message: impl Into<String>) -> Self {
        Self::new(property, vec![Constraint::new(rule, message)])
    }
}

/// Synchronous validation collaborator used by the error derivation stage.
///
/// Implementations must be deterministic: the same values always yield the
/// same violations.
pub trait Validator: Send + Sync + 'static {
    fn validate(&self, values: &Values) -> Vec<Violation>;
}

impl<F> Validator for F
where
    F: Fn(&Values) -> Vec<Violation> + Send + Sync + 'static,
{
    fn validate(&self, values: &Values) -> Vec<Violation> {
        (self)(values)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoValidation;

impl Validator for NoValidation {
    fn validate(&self, _values: &Values) -> Vec<Violation> {
        Vec::new()
    }
}

type RulePredicate = Arc<dyn Fn(Option<&FieldValue>, &Values) -> bool + Send + Sync>;
type FormRuleFn = Arc<dyn Fn(&Values) -> Vec<(FieldKey, String)> + Send + Sync>;

/// A named predicate with the message reported when it fails.
#[derive(Clone)]
pub struct Rule {
    name: &'static str,
    message: String,
    checks_absent: bool,
    predicate: RulePredicate,
}

impl Debug for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("checks_absent", &self.checks_absent)
            .finish_non_exhaustive()
    }
}

impl Rule {
    /// Rule over the field's own value. Skipped while the field is absent.
    pub fn new(
        name: &'static str,
        message: impl Into<String>,
        predicate: impl Fn(&FieldValue) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::with_values(name, message, move |value, _values| predicate(value))
    }

    /// Rule that can look at the other values, e.g. a confirmation field.
    pub fn with_values(
        name: &'static str,
        message: impl Into<String>,
        predicate: impl Fn(&FieldValue, &Values) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            message: message.into(),
            checks_absent: false,
            predicate: Arc::new(move |value: Option<&FieldValue>, values: &Values| {
                value.is_none_or(|value| predicate(value, values))
            }),
        }
    }

    /// Fails for absent and blank values. This is the one rule evaluated for absent fields.
    pub fn required(message: impl Into<String>) -> Self {
        Self {
            name: "required",
            message: message.into(),
            checks_absent: true,
            predicate: Arc::new(|value: Option<&FieldValue>, _values: &Values| {
                value.is_some_and(|value| !value.is_blank())
            }),
        }
    }

    pub fn min_length(min: usize, message: impl Into<String>) -> Self {
        Self::new("min_length", message, move |value| {
            value.len().is_none_or(|len| len >= min)
        })
    }

    pub fn max_length(max: usize, message: impl Into<String>) -> Self {
        Self::new("max_length", message, move |value| {
            value.len().is_none_or(|len| len <= max)
        })
    }

    pub fn equals_field(other: FieldKey, message: impl Into<String>) -> Self {
        Self::with_values("equals_field", message, move |value, values| {
            values.get(&other) == Some(value)
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn check(&self, value: Option<&FieldValue>, values: &Values) -> bool {
        (self.predicate)(value, values)
    }
}

/// Declarative rule table: field key to ordered rules, plus whole-form rules.
#[derive(Clone, Default)]
pub struct RuleSet {
    fields: BTreeMap<FieldKey, Vec<Rule>>,
    form_rules: Vec<FormRuleFn>,
}

impl Debug for RuleSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("fields", &self.fields)
            .field("form_rules", &self.form_rules.len())
            .finish()
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<FieldKey>, rule: Rule) -> Self {
        self.fields.entry(key.into()).or_default().push(rule);
        self
    }

    pub fn rules(mut self, key: impl Into<FieldKey>, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.fields.entry(key.into()).or_default().extend(rules);
        self
    }

    /// Registers a rule over the whole value set. Each returned pair is
    /// reported as a `form` constraint on that field.
    pub fn form_rule(
        mut self,
        rule: impl Fn(&Values) -> Vec<(FieldKey, String)> + Send + Sync + 'static,
    ) -> Self {
        self.form_rules.push(Arc::new(rule));
        self
    }

    pub fn field_keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields.keys().copied()
    }
}

impl Validator for RuleSet {
    fn validate(&self, values: &Values) -> Vec<Violation> {
        let mut failed = BTreeMap::<FieldKey, Vec<Constraint>>::new();
        for (key, rules) in &self.fields {
            let value = values.get(key);
            for rule in rules {
                if value.is_none() && !rule.checks_absent {
                    continue;
                }
                if !rule.check(value, values) {
                    failed
                        .entry(*key)
                        .or_default()
                        .push(Constraint::new(rule.name, rule.message.clone()));
                }
            }
        }

        for rule in &self.form_rules {
            for (key, message) in rule(values) {
                failed
                    .entry(key)
                    .or_default()
                    .push(Constraint::new("form", message));
            }
        }

        failed
            .into_iter()
            .map(|(property, constraints)| Violation::new(property, constraints))
            .collect()
    }
}

/// Typed form model. Usually derived with `#[derive(FormModel)]`.
pub trait FormModel: Sized + 'static {
    type Fields;

    fn fields() -> Self::Fields;

    fn field_keys() -> &'static [FieldKey];

    /// Builds a blank (`Default`) model and overlays every value that converts
    /// into the field's type.
    fn from_values(values: &Values) -> Self;

    fn to_values(&self) -> Values;
}

/// Validates by overlaying the values onto a blank typed model.
///
/// Violations reported for fields that are absent from the value set are
/// dropped, matching the skip-missing policy of [`RuleSet`].
pub struct ModelValidator<M, F> {
    validate: F,
    model: PhantomData<fn() -> M>,
}

impl<M, F> ModelValidator<M, F>
where
    M: FormModel,
    F: Fn(&M) -> Vec<Violation> + Send + Sync + 'static,
{
    pub fn new(validate: F) -> Self {
        Self {
            validate,
            model: PhantomData,
        }
    }
}

impl<M, F> Validator for ModelValidator<M, F>
where
    M: FormModel,
    F: Fn(&M) -> Vec<Violation> + Send + Sync + 'static,
{
    fn validate(&self, values: &Values) -> Vec<Violation> {
        let target = M::from_values(values);
        (self.validate)(&target)
            .into_iter()
            .filter(|violation| values.contains_key(&violation.property))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: FieldKey = FieldKey::new("name");
    const PASSWORD: FieldKey = FieldKey::new("password");
    const CONFIRM: FieldKey = FieldKey::new("confirm_password");

    fn values(entries: &[(FieldKey, &str)]) -> Values {
        entries
            .iter()
            .map(|(key, value)| (*key, FieldValue::text(*value)))
            .collect()
    }

    #[test]
    fn rules_are_skipped_for_absent_fields_except_required() {
        let rules = RuleSet::new()
            .field(NAME, Rule::min_length(3, "too short"))
            .field(PASSWORD, Rule::required("must not be empty"));

        let violations = rules.validate(&Values::new());
        assert_eq!(
            violations,
            vec![Violation::single(PASSWORD, "required", "must not be empty")]
        );
    }

    #[test]
    fn every_failed_rule_is_reported_in_declaration_order() {
        let rules = RuleSet::new().rules(
            NAME,
            [
                Rule::required("must not be empty"),
                Rule::min_length(2, "too short"),
            ],
        );

        let violations = rules.validate(&values(&[(NAME, "")]));
        assert_eq!(violations.len(), 1);
        let messages = violations[0]
            .constraints
            .iter()
            .map(|constraint| constraint.message.as_str())
            .collect::<Vec<_>>();
        assert_eq!(messages, vec!["must not be empty", "too short"]);
    }

    #[test]
    fn rule_set_lists_declared_fields_and_rule_metadata() {
        let length = Rule::min_length(8, "at least 8 characters");
        assert_eq!(length.name(), "min_length");
        assert_eq!(length.message(), "at least 8 characters");

        let rules = RuleSet::new()
            .field(PASSWORD, length)
            .field(NAME, Rule::required("must not be empty"));
        assert_eq!(rules.field_keys().collect::<Vec<_>>(), vec![NAME, PASSWORD]);
    }

    #[test]
    fn cross_field_rules_see_the_whole_value_set() {
        let rules = RuleSet::new().field(CONFIRM, Rule::equals_field(PASSWORD, "password mismatch"));

        assert!(
            rules
                .validate(&values(&[(PASSWORD, "pass"), (CONFIRM, "pass")]))
                .is_empty()
        );
        assert_eq!(
            rules.validate(&values(&[(PASSWORD, "new-pass"), (CONFIRM, "pass")])),
            vec![Violation::single(CONFIRM, "equals_field", "password mismatch")]
        );
    }

    #[test]
    fn form_rules_merge_with_field_rules() {
        let rules = RuleSet::new()
            .field(NAME, Rule::max_length(2, "too long"))
            .form_rule(|values: &Values| {
                if values.contains_key(&NAME) {
                    vec![(NAME, "taken".to_string())]
                } else {
                    Vec::new()
                }
            });

        let violations = rules.validate(&values(&[(NAME, "Joanna")]));
        assert_eq!(
            violations,
            vec![Violation::new(
                NAME,
                vec![
                    Constraint::new("max_length", "too long"),
                    Constraint::new("form", "taken"),
                ],
            )]
        );
    }

    #[test]
    fn closures_act_as_validators() {
        let validator = |values: &Values| {
            values
                .keys()
                .map(|key| Violation::single(*key, "never", "always fails"))
                .collect::<Vec<_>>()
        };
        assert_eq!(validator.validate(&values(&[(NAME, "x")])).len(), 1);
        assert!(NoValidation.validate(&values(&[(NAME, "x")])).is_empty());
    }
}
