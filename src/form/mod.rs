mod action;
mod binding;
mod controller;
mod derivation;
mod pipeline;
mod router;
mod slices;
mod submission;
mod validation;
mod value;


pub use action::{ActionKind, ActionPayload, FormAction, UnknownActionKind};
pub use binding::{BlurHandler, FieldBinding, ValueHandler};
pub use calmform_derive::FormModel;
pub use controller::{FormBuilder, FormController, FormError, FormId, FormOptions, FormResult, Spawner};
pub use derivation::{ErrorDerivation, TouchedErrors, filter_touched};
pub use pipeline::{
    Contribution, Dispatched, Enhancer, FnEnhancer, FormState, Pipeline, WriteContext, WriteFn,
    WriteOutcome, enhancer,
};
pub use router::{ActionHandler, dispatch_to_handlers};
pub use slices::{TouchedSlice, ValueSlice};
pub use submission::{
    ArmedSubmission, FailureHook, SubmissionController, SubmissionState, SubmissionTask,
    SubmissionTicket, SubmitError, SubmitFn, SubmitFuture, submit_fn,
};
pub use validation::{
    Constraint, FormModel, ModelValidator, NoValidation, Rule, RuleSet, Validator, Violation,
};
pub use value::{
    FieldKey, FieldType, FieldValue, FormErrors, TouchedState, Values, decimal_from_f64,
};
