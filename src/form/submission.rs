//! Submission lifecycle.
//!
//! `onSubmit` always marks the form as submitted. When the derived errors are
//! empty the write phase arms an [`ArmedSubmission`] carrying the current
//! values. The form starts it once the pipeline lock is released, so a submit
//! function may read or dispatch to its own form. Starting invokes the submit
//! function and wraps the future in a [`SubmissionTask`]. The busy flag is
//! cleared from a drop guard, so resolution, rejection, a panic inside the
//! future and dropping the armed submission or the task all end with
//! `is_submitting == false`.
//!
//! Every armed submission gets a fresh [`SubmissionTicket`]. A task only
//! touches the shared state while its ticket is still the latest one, so a
//! slow earlier submission cannot clear the busy flag of a newer one. Reset
//! retires the current ticket as well.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use thiserror::Error;

use super::action::{ActionKind, FormAction};
use super::controller::{FormId, FormOptions};
use super::pipeline::{Contribution, Enhancer, FormState, WriteContext, WriteOutcome};
use super::value::Values;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct SubmitError {
    message: String,
}

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for SubmitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for SubmitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

pub type SubmitFuture = BoxFuture<'static, Result<(), SubmitError>>;
pub type SubmitFn = Arc<dyn Fn(Values) -> SubmitFuture + Send + Sync>;
pub type FailureHook = Arc<dyn Fn(&SubmitError) + Send + Sync>;

pub fn submit_fn<F, Fut>(submit: F) -> SubmitFn
where
    F: Fn(Values) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SubmitError>> + Send + 'static,
{
    Arc::new(move |values| submit(values).boxed())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubmissionTicket(pub u64);

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubmissionState {
    pub has_submitted: bool,
    pub generation: u64,
    pub in_flight: Option<SubmissionTicket>,
    pub last_error: Option<SubmitError>,
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }
}

type SharedSubmission = Arc<RwLock<SubmissionState>>;

fn read_cell(cell: &RwLock<SubmissionState>) -> RwLockReadGuard<'_, SubmissionState> {
    match cell.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_cell(cell: &RwLock<SubmissionState>) -> RwLockWriteGuard<'_, SubmissionState> {
    match cell.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub struct SubmissionController {
    form_id: FormId,
    submit: SubmitFn,
    on_error: Option<FailureHook>,
    options: FormOptions,
    cell: SharedSubmission,
}

impl SubmissionController {
    pub fn new(form_id: FormId, submit: SubmitFn, options: FormOptions) -> Self {
        Self {
            form_id,
            submit,
            on_error: None,
            options,
            cell: Arc::new(RwLock::new(SubmissionState::default())),
        }
    }

    pub fn on_error(mut self, hook: FailureHook) -> Self {
        self.on_error = Some(hook);
        self
    }
}

impl Enhancer for SubmissionController {
    fn name(&self) -> &'static str {
        "submission"
    }

    fn read(&self, last: &FormState) -> Contribution {
        let state = read_cell(&self.cell);
        let contribution = Contribution::new()
            .is_submitting(state.is_submitting())
            .has_submitted(state.has_submitted)
            .submit_error(state.last_error.clone());
        if state.has_submitted && self.options.reveal_all_errors_after_submit {
            contribution
                .errors_touched(last.errors.clone())
                .errors_touched_backup(Some(last.errors_touched.clone()))
        } else {
            contribution
        }
    }

    fn write(
        &mut self,
        ctx: &mut WriteContext,
        action: &FormAction,
        last: &FormState,
    ) -> WriteOutcome {
        if action.kind != ActionKind::OnSubmit {
            return WriteOutcome::PROCEED;
        }

        let ticket = {
            let mut state = write_cell(&self.cell);
            state.has_submitted = true;
            if !last.is_valid() {
                tracing::debug!(
                    form = self.form_id.0,
                    errors = last.errors.len(),
                    "submit blocked by validation errors"
                );
                return WriteOutcome::PROCEED;
            }
            state.generation = state.generation.saturating_add(1);
            let ticket = SubmissionTicket(state.generation);
            state.in_flight = Some(ticket);
            state.last_error = None;
            ticket
        };

        ctx.track(ArmedSubmission {
            guard: SettleGuard {
                form_id: self.form_id,
                ticket,
                cell: self.cell.clone(),
                settled: false,
            },
            values: last.values.clone(),
            submit: self.submit.clone(),
            on_error: self.on_error.clone(),
        });
        WriteOutcome::PROCEED
    }

    fn reset(&mut self) {
        let mut state = write_cell(&self.cell);
        state.has_submitted = false;
        state.last_error = None;
        state.generation = state.generation.saturating_add(1);
    }
}

/// Clears the in-flight marker when the submission ends, however it ends.
struct SettleGuard {
    form_id: FormId,
    ticket: SubmissionTicket,
    cell: SharedSubmission,
    settled: bool,
}

impl SettleGuard {
    fn record(&mut self, error: Option<&SubmitError>) {
        self.settled = true;
        let mut state = write_cell(&self.cell);
        if state.generation != self.ticket.0 {
            tracing::debug!(
                form = self.form_id.0,
                ticket = self.ticket.0,
                latest = state.generation,
                "stale submission settled"
            );
            return;
        }
        state.last_error = error.cloned();
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(
                form = self.form_id.0,
                ticket = self.ticket.0,
                "submission dropped before settling"
            );
        }
        let mut state = write_cell(&self.cell);
        if state.in_flight == Some(self.ticket) {
            state.in_flight = None;
        }
    }
}

/// A submission whose ticket is armed but whose submit function has not run
/// yet. Dropping it without starting releases the busy flag.
#[must_use = "an armed submission keeps the form busy until it is started and polled"]
pub struct ArmedSubmission {
    guard: SettleGuard,
    values: Values,
    submit: SubmitFn,
    on_error: Option<FailureHook>,
}

impl ArmedSubmission {
    pub fn ticket(&self) -> SubmissionTicket {
        self.guard.ticket
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Invokes the submit function. Must not be called while the form's
    /// pipeline is locked.
    pub fn start(self) -> SubmissionTask {
        let Self {
            mut guard,
            values,
            submit,
            on_error,
        } = self;
        let form_id = guard.form_id;
        let ticket = guard.ticket;

        tracing::info!(
            form = form_id.0,
            ticket = ticket.0,
            fields = values.len(),
            "submission started"
        );
        let future = submit(values);
        let inner = async move {
            let result = future.await;
            guard.record(result.as_ref().err());
            drop(guard);
            match &result {
                Ok(()) => tracing::debug!(form = form_id.0, ticket = ticket.0, "submission settled"),
                Err(error) => {
                    tracing::warn!(form = form_id.0, ticket = ticket.0, %error, "submission failed");
                    if let Some(hook) = on_error {
                        hook(error);
                    }
                }
            }
            result
        }
        .boxed();
        SubmissionTask { ticket, inner }
    }
}

/// The tracked submission future. Poll it (or hand it to an executor) to drive
/// the submit function to completion.
#[must_use = "a submission only settles while its task is polled"]
pub struct SubmissionTask {
    ticket: SubmissionTicket,
    inner: SubmitFuture,
}

impl SubmissionTask {
    pub fn ticket(&self) -> SubmissionTicket {
        self.ticket
    }
}

impl Future for SubmissionTask {
    type Output = Result<(), SubmitError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}
