pub mod form;
pub mod prelude;

pub use form::{FormBuilder, FormController, FormError, FormOptions, FormResult, FormState};
