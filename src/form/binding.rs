use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use super::action::FormAction;
use super::controller::{FormController, FormResult, report_dispatch};
use super::pipeline::FormState;
use super::value::{FieldKey, FieldValue};

pub type ValueHandler = Arc<dyn Fn(FieldValue) + Send + Sync>;
pub type BlurHandler = Arc<dyn Fn() + Send + Sync>;

/// Everything a widget needs to wire one field to the form.
#[derive(Clone)]
pub struct FieldBinding {
    pub name: FieldKey,
    pub value: FieldValue,
    pub on_change: ValueHandler,
    pub on_blur: BlurHandler,
    pub error: bool,
    pub helper_text: String,
}

impl Debug for FieldBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("error", &self.error)
            .field("helper_text", &self.helper_text)
            .finish_non_exhaustive()
    }
}

impl FormController {
    pub fn register(&self, name: impl Into<FieldKey>) -> FormResult<FieldBinding> {
        let state = self.state()?;
        Ok(self.bind(name.into(), &state))
    }

    /// Message to show under the field, following the touched/submitted policy.
    pub fn field_error_for_display(&self, name: impl Into<FieldKey>) -> FormResult<Option<String>> {
        Ok(self.state()?.errors_touched.get(&name.into()).cloned())
    }

    fn bind(&self, name: FieldKey, state: &FormState) -> FieldBinding {
        let helper_text = state.errors_touched.get(&name).cloned().unwrap_or_default();

        let controller = self.clone();
        let on_change: ValueHandler = Arc::new(move |value: FieldValue| {
            report_dispatch(
                "field change",
                controller.dispatch(FormAction::change(name, value)),
            );
        });
        let controller = self.clone();
        let on_blur: BlurHandler = Arc::new(move || {
            report_dispatch("field blur", controller.dispatch(FormAction::blur(name)));
        });

        FieldBinding {
            name,
            value: state.values.get(&name).cloned().unwrap_or_default(),
            on_change,
            on_blur,
            error: !helper_text.is_empty(),
            helper_text,
        }
    }
}
