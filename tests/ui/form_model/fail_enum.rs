use calmform::form::FormModel;

#[derive(FormModel)]
enum ChoiceForm {
    Email(String),
    Phone(String),
}

fn main() {}
