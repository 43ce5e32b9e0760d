use std::collections::BTreeMap;
use std::sync::Arc;

use super::action::{ActionKind, ActionPayload, FormAction};
use super::controller::{FormController, report_dispatch};

pub type ActionHandler = Arc<dyn Fn(ActionPayload) + Send + Sync>;

/// One callback per action kind, each wrapping its payload into a
/// [`FormAction`] of that kind before handing it to `dispatch`.
pub fn dispatch_to_handlers<D>(
    kinds: impl IntoIterator<Item = ActionKind>,
    dispatch: D,
) -> BTreeMap<ActionKind, ActionHandler>
where
    D: Fn(FormAction) + Send + Sync + 'static,
{
    let dispatch = Arc::new(dispatch);
    kinds
        .into_iter()
        .map(|kind| {
            let dispatch = dispatch.clone();
            let handler: ActionHandler = Arc::new(move |payload: ActionPayload| {
                dispatch(FormAction::new(kind, payload));
            });
            (kind, handler)
        })
        .collect()
}

impl FormController {
    /// `onSubmit`, `onChange` and `onBlur` callbacks bound to this form.
    pub fn actions(&self) -> BTreeMap<ActionKind, ActionHandler> {
        let controller = self.clone();
        dispatch_to_handlers(ActionKind::ALL, move |action| {
            report_dispatch("routed action", controller.dispatch(action));
        })
    }
}
