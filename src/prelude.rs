pub use crate::form::{
    ActionKind, ActionPayload, Contribution, Enhancer, FieldBinding, FieldKey, FieldType,
    FieldValue, FormAction, FormBuilder, FormController, FormError, FormErrors, FormModel,
    FormOptions, FormResult, FormState, Rule, RuleSet, SubmitError, TouchedState, Validator,
    Values, Violation, enhancer,
};
