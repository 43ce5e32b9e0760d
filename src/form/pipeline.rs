//! Enhancer composition.
//!
//! A [`Pipeline`] is an ordered list of [`Enhancer`] units. Every read starts
//! from an empty [`FormState`] and lets each unit contribute to it in
//! declaration order, so a unit can depend on anything the units before it
//! produced. A dispatch runs the write handlers first, all against the same
//! snapshot, and then resolves a single fresh snapshot.

use super::action::FormAction;
use super::submission::{ArmedSubmission, SubmitError};
use super::value::{FieldKey, FormErrors, TouchedState, Values};

/// The merged snapshot handed to the UI layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormState {
    pub values: Values,
    pub touched: TouchedState,
    pub errors: FormErrors,
    pub errors_touched: FormErrors,
    /// Touched-only errors as they were before the reveal-all policy kicked in.
    /// Only populated after a submit attempt.
    pub errors_touched_backup: Option<FormErrors>,
    pub is_submitting: bool,
    pub has_submitted: bool,
    pub submit_error: Option<SubmitError>,
}

impl FormState {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_touched(&self, key: FieldKey) -> bool {
        self.touched.get(&key).copied().unwrap_or(false)
    }
}

/// Partial output of one unit's read phase. Fields left unset keep whatever
/// earlier units produced; fields that are set overwrite it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contribution {
    values: Option<Values>,
    touched: Option<TouchedState>,
    errors: Option<FormErrors>,
    errors_touched: Option<FormErrors>,
    errors_touched_backup: Option<Option<FormErrors>>,
    is_submitting: Option<bool>,
    has_submitted: Option<bool>,
    submit_error: Option<Option<SubmitError>>,
}

impl Contribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(mut self, values: Values) -> Self {
        self.values = Some(values);
        self
    }

    pub fn touched(mut self, touched: TouchedState) -> Self {
        self.touched = Some(touched);
        self
    }

    pub fn errors(mut self, errors: FormErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn errors_touched(mut self, errors: FormErrors) -> Self {
        self.errors_touched = Some(errors);
        self
    }

    pub fn errors_touched_backup(mut self, backup: Option<FormErrors>) -> Self {
        self.errors_touched_backup = Some(backup);
        self
    }

    pub fn is_submitting(mut self, value: bool) -> Self {
        self.is_submitting = Some(value);
        self
    }

    pub fn has_submitted(mut self, value: bool) -> Self {
        self.has_submitted = Some(value);
        self
    }

    pub fn submit_error(mut self, error: Option<SubmitError>) -> Self {
        self.submit_error = Some(error);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn merge_into(self, state: &mut FormState) {
        if let Some(values) = self.values {
            state.values = values;
        }
        if let Some(touched) = self.touched {
            state.touched = touched;
        }
        if let Some(errors) = self.errors {
            state.errors = errors;
        }
        if let Some(errors_touched) = self.errors_touched {
            state.errors_touched = errors_touched;
        }
        if let Some(backup) = self.errors_touched_backup {
            state.errors_touched_backup = backup;
        }
        if let Some(is_submitting) = self.is_submitting {
            state.is_submitting = is_submitting;
        }
        if let Some(has_submitted) = self.has_submitted {
            state.has_submitted = has_submitted;
        }
        if let Some(submit_error) = self.submit_error {
            state.submit_error = submit_error;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WriteOutcome {
    pub should_abort_next_setter: bool,
}

impl WriteOutcome {
    pub const PROCEED: Self = Self {
        should_abort_next_setter: false,
    };
    pub const ABORT: Self = Self {
        should_abort_next_setter: true,
    };
}

/// Side channel for write handlers. Submissions armed by a unit are parked
/// here and started by the form once the dispatch has released the pipeline.
#[derive(Default)]
pub struct WriteContext {
    submissions: Vec<ArmedSubmission>,
}

impl WriteContext {
    pub fn track(&mut self, submission: ArmedSubmission) {
        self.submissions.push(submission);
    }

    pub(super) fn into_submissions(self) -> Vec<ArmedSubmission> {
        self.submissions
    }
}

pub trait Enhancer: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Must depend only on the unit's own state and `last`.
    fn read(&self, last: &FormState) -> Contribution;

    fn write(
        &mut self,
        _ctx: &mut WriteContext,
        _action: &FormAction,
        _last: &FormState,
    ) -> WriteOutcome {
        WriteOutcome::PROCEED
    }

    /// Restores the unit's private state to what it was built with.
    fn reset(&mut self) {}
}

pub type WriteFn = fn(&mut WriteContext, &FormAction, &FormState) -> WriteOutcome;

fn proceed(_ctx: &mut WriteContext, _action: &FormAction, _last: &FormState) -> WriteOutcome {
    WriteOutcome::PROCEED
}

/// Unit assembled from a read closure and an optional write closure.
pub struct FnEnhancer<R, W> {
    name: &'static str,
    read: R,
    write: W,
}

pub fn enhancer<R>(name: &'static str, read: R) -> FnEnhancer<R, WriteFn>
where
    R: Fn(&FormState) -> Contribution + Send + Sync + 'static,
{
    FnEnhancer {
        name,
        read,
        write: proceed,
    }
}

impl<R, W> FnEnhancer<R, W> {
    pub fn with_write<W2>(self, write: W2) -> FnEnhancer<R, W2>
    where
        W2: FnMut(&mut WriteContext, &FormAction, &FormState) -> WriteOutcome
            + Send
            + Sync
            + 'static,
    {
        FnEnhancer {
            name: self.name,
            read: self.read,
            write,
        }
    }
}

impl<R, W> Enhancer for FnEnhancer<R, W>
where
    R: Fn(&FormState) -> Contribution + Send + Sync + 'static,
    W: FnMut(&mut WriteContext, &FormAction, &FormState) -> WriteOutcome + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn read(&self, last: &FormState) -> Contribution {
        (self.read)(last)
    }

    fn write(
        &mut self,
        ctx: &mut WriteContext,
        action: &FormAction,
        last: &FormState,
    ) -> WriteOutcome {
        (self.write)(ctx, action, last)
    }
}

/// Result of one dispatch cycle.
pub struct Dispatched {
    pub state: FormState,
    pub submissions: Vec<ArmedSubmission>,
}

#[derive(Default)]
pub struct Pipeline {
    units: Vec<Box<dyn Enhancer>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipe(mut self, unit: impl Enhancer) -> Self {
        self.units.push(Box::new(unit));
        self
    }

    pub fn push(&mut self, unit: Box<dyn Enhancer>) {
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit_names(&self) -> Vec<&'static str> {
        self.units.iter().map(|unit| unit.name()).collect()
    }

    pub fn resolve(&self) -> FormState {
        self.units
            .iter()
            .fold(FormState::default(), |mut accumulated, unit| {
                unit.read(&accumulated).merge_into(&mut accumulated);
                accumulated
            })
    }

    pub fn dispatch(&mut self, action: &FormAction) -> Dispatched {
        let last = self.resolve();
        let mut ctx = WriteContext::default();
        for unit in &mut self.units {
            if unit.write(&mut ctx, action, &last).should_abort_next_setter {
                tracing::trace!(
                    unit = unit.name(),
                    kind = %action.kind,
                    "enhancer aborted remaining write handlers"
                );
                break;
            }
        }
        Dispatched {
            state: self.resolve(),
            submissions: ctx.into_submissions(),
        }
    }

    pub fn reset(&mut self) {
        for unit in &mut self.units {
            unit.reset();
        }
    }
}
