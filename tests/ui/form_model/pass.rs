use calmform::form::{FieldKey, FieldValue, FormModel, Values};

#[derive(Clone, Default, calmform::form::FormModel)]
struct DemoForm {
    email: String,
    r#type: Option<String>,
}

fn main() {
    let fields = DemoForm::fields();
    assert_eq!(fields.email().as_str(), "email");
    assert_eq!(fields.r#type(), FieldKey::new("type"));
    assert_eq!(DemoForm::field_keys().len(), 2);

    let values = Values::from([(fields.email(), FieldValue::text("a@calm.form"))]);
    let model = DemoForm::from_values(&values);
    assert_eq!(model.email, "a@calm.form");
    assert_eq!(model.r#type, None);
    assert_eq!(model.to_values(), values);
}
