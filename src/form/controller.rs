use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::join_all;
use thiserror::Error;

use super::action::{ActionKind, ActionPayload, FormAction};
use super::derivation::{ErrorDerivation, TouchedErrors};
use super::pipeline::{Enhancer, FormState, Pipeline};
use super::slices::{TouchedSlice, ValueSlice};
use super::submission::{
    ArmedSubmission, FailureHook, SubmissionController, SubmissionTask, SubmitError, submit_fn,
};
use super::validation::{NoValidation, Validator, Violation};
use super::value::{FieldKey, FieldValue, TouchedState, Values};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    /// Keep only the first failed rule message per field.
    pub validate_first_error_only: bool,
    /// Joins several messages reported for one field.
    pub message_separator: &'static str,
    /// After the first submit attempt, show every error instead of only the touched ones.
    pub reveal_all_errors_after_submit: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_first_error_only: false,
            message_separator: ", ",
            reveal_all_errors_after_submit: true,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("form submission failed: {0}")]
    SubmitFailed(#[from] SubmitError),
}

pub type FormResult<T> = Result<T, FormError>;

pub type Spawner = Arc<dyn Fn(SubmissionTask) + Send + Sync>;

struct SharedValidator(Arc<dyn Validator>);

impl Validator for SharedValidator {
    fn validate(&self, values: &Values) -> Vec<Violation> {
        self.0.validate(values)
    }
}

/// Handle to one form instance.
///
/// Clones share the same pipeline. Every dispatch runs its write and read
/// phases under a single write lock, so dispatch cycles never interleave.
/// Submissions armed by a dispatch are started after that lock is released,
/// which lets a submit function call back into the form. The resulting tasks
/// go to the configured spawner, or are queued until
/// [`FormController::take_submissions`] or [`FormController::settle`] picks
/// them up.
#[derive(Clone)]
pub struct FormController {
    pub(super) id: FormId,
    pub(super) pipeline: Arc<RwLock<Pipeline>>,
    pub(super) pending: Arc<Mutex<Vec<SubmissionTask>>>,
    pub(super) spawner: Option<Spawner>,
}

impl FormController {
    pub fn new(pipeline: Pipeline) -> Self {
        Self::with_id(FormId::next(), pipeline)
    }

    fn with_id(id: FormId, pipeline: Pipeline) -> Self {
        Self {
            id,
            pipeline: Arc::new(RwLock::new(pipeline)),
            pending: Arc::new(Mutex::new(Vec::new())),
            spawner: None,
        }
    }

    pub fn builder() -> FormBuilder {
        FormBuilder::default()
    }

    pub fn form_id(&self) -> FormId {
        self.id
    }

    pub fn unit_names(&self) -> FormResult<Vec<&'static str>> {
        Ok(read_lock(&self.pipeline, "reading pipeline units")?.unit_names())
    }

    pub fn state(&self) -> FormResult<FormState> {
        Ok(read_lock(&self.pipeline, "resolving form state")?.resolve())
    }

    pub fn dispatch(&self, action: FormAction) -> FormResult<FormState> {
        tracing::debug!(form = self.id.0, kind = %action.kind, "dispatching form action");
        let dispatched = {
            let mut pipeline = write_lock(&self.pipeline, "dispatching form action")?;
            pipeline.dispatch(&action)
        };
        self.track(dispatched.submissions)?;
        Ok(dispatched.state)
    }

    /// Dispatches by wire name. Unknown names leave the form untouched.
    pub fn dispatch_named(&self, kind: &str, payload: ActionPayload) -> FormResult<FormState> {
        match kind.parse::<ActionKind>() {
            Ok(kind) => self.dispatch(FormAction::new(kind, payload)),
            Err(error) => {
                tracing::warn!(form = self.id.0, %error, "ignoring form action");
                self.state()
            }
        }
    }

    pub fn set_value(
        &self,
        name: impl Into<FieldKey>,
        value: impl Into<FieldValue>,
    ) -> FormResult<FormState> {
        self.dispatch(FormAction::change(name, value))
    }

    pub fn patch(&self, values: Values) -> FormResult<FormState> {
        self.dispatch(FormAction::patch(values))
    }

    pub fn touch(&self, name: impl Into<FieldKey>) -> FormResult<FormState> {
        self.dispatch(FormAction::blur(name))
    }

    pub fn submit(&self) -> FormResult<FormState> {
        self.dispatch(FormAction::submit())
    }

    /// Re-initializes every unit: values and touched flags go back to their
    /// initial state and the submitted flag is cleared.
    pub fn reset(&self) -> FormResult<FormState> {
        let mut pipeline = write_lock(&self.pipeline, "resetting form")?;
        pipeline.reset();
        tracing::debug!(form = self.id.0, "form reset");
        Ok(pipeline.resolve())
    }

    pub fn take_submissions(&self) -> FormResult<Vec<SubmissionTask>> {
        Ok(std::mem::take(&mut *lock_pending(
            &self.pending,
            "taking pending submissions",
        )?))
    }

    /// Drives every queued submission to completion. The first rejection is
    /// returned after all of them settled.
    pub async fn settle(&self) -> FormResult<()> {
        let tasks = self.take_submissions()?;
        if tasks.is_empty() {
            return Ok(());
        }
        let results = join_all(tasks).await;
        match results.into_iter().find_map(Result::err) {
            Some(error) => Err(FormError::SubmitFailed(error)),
            None => Ok(()),
        }
    }

    fn track(&self, armed: Vec<ArmedSubmission>) -> FormResult<()> {
        if armed.is_empty() {
            return Ok(());
        }
        let tasks: Vec<SubmissionTask> = armed.into_iter().map(ArmedSubmission::start).collect();
        match &self.spawner {
            Some(spawner) => {
                for task in tasks {
                    spawner(task);
                }
            }
            None => {
                lock_pending(&self.pending, "queueing submissions")?.extend(tasks);
            }
        }
        Ok(())
    }
}

/// Assembles the standard pipeline:
/// values → touched → errors → errors_touched → submission, followed by any
/// extra enhancers.
#[derive(Default)]
pub struct FormBuilder {
    initial_values: Values,
    initial_touched: TouchedState,
    validator: Option<Arc<dyn Validator>>,
    options: FormOptions,
    spawner: Option<Spawner>,
    on_submit_error: Option<FailureHook>,
    extra: Vec<Box<dyn Enhancer>>,
}

impl FormBuilder {
    pub fn initial_values(mut self, values: Values) -> Self {
        self.initial_values = values;
        self
    }

    pub fn initial_value(mut self, name: impl Into<FieldKey>, value: impl Into<FieldValue>) -> Self {
        self.initial_values.insert(name.into(), value.into());
        self
    }

    pub fn initial_touched(mut self, touched: TouchedState) -> Self {
        self.initial_touched = touched;
        self
    }

    pub fn validator(mut self, validator: impl Validator) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn spawner(mut self, spawner: impl Fn(SubmissionTask) + Send + Sync + 'static) -> Self {
        self.spawner = Some(Arc::new(spawner));
        self
    }

    pub fn on_submit_error(mut self, hook: impl Fn(&SubmitError) + Send + Sync + 'static) -> Self {
        self.on_submit_error = Some(Arc::new(hook));
        self
    }

    pub fn enhancer(mut self, unit: impl Enhancer) -> Self {
        self.extra.push(Box::new(unit));
        self
    }

    pub fn build<F, Fut>(self, submit: F) -> FormController
    where
        F: Fn(Values) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), SubmitError>> + Send + 'static,
    {
        let id = FormId::next();
        let validator = self
            .validator
            .unwrap_or_else(|| Arc::new(NoValidation) as Arc<dyn Validator>);
        let mut submission = SubmissionController::new(id, submit_fn(submit), self.options);
        if let Some(hook) = self.on_submit_error {
            submission = submission.on_error(hook);
        }

        let mut pipeline = Pipeline::new()
            .pipe(ValueSlice::new(self.initial_values))
            .pipe(TouchedSlice::new(self.initial_touched))
            .pipe(ErrorDerivation::new(SharedValidator(validator), self.options))
            .pipe(TouchedErrors)
            .pipe(submission);
        for unit in self.extra {
            pipeline.push(unit);
        }

        let mut controller = FormController::with_id(id, pipeline);
        controller.spawner = self.spawner;
        controller
    }
}

pub(super) fn report_dispatch(context: &'static str, result: FormResult<FormState>) {
    if let Err(error) = result {
        tracing::warn!(%error, context, "form dispatch failed");
    }
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}

fn lock_pending<'a>(
    pending: &'a Mutex<Vec<SubmissionTask>>,
    context: &'static str,
) -> FormResult<MutexGuard<'a, Vec<SubmissionTask>>> {
    pending.lock().map_err(|_| FormError::StatePoisoned(context))
}
