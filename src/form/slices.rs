use super::action::{ActionKind, ActionPayload, FormAction};
use super::pipeline::{Contribution, Enhancer, FormState, WriteContext, WriteOutcome};
use super::value::{TouchedState, Values};

/// Owns the field values. Only `onChange` mutates them.
#[derive(Clone, Debug, Default)]
pub struct ValueSlice {
    initial: Values,
    values: Values,
}

impl ValueSlice {
    pub fn new(initial: Values) -> Self {
        Self {
            values: initial.clone(),
            initial,
        }
    }

    pub fn values(&self) -> &Values {
        &self.values
    }
}

impl Enhancer for ValueSlice {
    fn name(&self) -> &'static str {
        "values"
    }

    fn read(&self, _last: &FormState) -> Contribution {
        Contribution::new().values(self.values.clone())
    }

    fn write(
        &mut self,
        _ctx: &mut WriteContext,
        action: &FormAction,
        _last: &FormState,
    ) -> WriteOutcome {
        if action.kind != ActionKind::OnChange {
            return WriteOutcome::PROCEED;
        }
        match &action.payload {
            ActionPayload::Field { name, value } => {
                self.values.insert(*name, value.clone());
            }
            ActionPayload::Patch(patch) => {
                self.values
                    .extend(patch.iter().map(|(key, value)| (*key, value.clone())));
            }
            ActionPayload::Name(_) | ActionPayload::Trigger => {}
        }
        WriteOutcome::PROCEED
    }

    fn reset(&mut self) {
        self.values = self.initial.clone();
    }
}

/// Owns the per-field touched flags. Flags are only ever raised.
#[derive(Clone, Debug, Default)]
pub struct TouchedSlice {
    initial: TouchedState,
    touched: TouchedState,
}

impl TouchedSlice {
    pub fn new(initial: TouchedState) -> Self {
        Self {
            touched: initial.clone(),
            initial,
        }
    }
}

impl Enhancer for TouchedSlice {
    fn name(&self) -> &'static str {
        "touched"
    }

    fn read(&self, _last: &FormState) -> Contribution {
        Contribution::new().touched(self.touched.clone())
    }

    fn write(
        &mut self,
        _ctx: &mut WriteContext,
        action: &FormAction,
        _last: &FormState,
    ) -> WriteOutcome {
        if action.kind == ActionKind::OnBlur {
            if let Some(name) = action.payload.name() {
                self.touched.insert(name, true);
            }
        }
        WriteOutcome::PROCEED
    }

    fn reset(&mut self) {
        self.touched = self.initial.clone();
    }
}
