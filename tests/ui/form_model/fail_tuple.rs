use calmform::form::FormModel;

#[derive(FormModel)]
struct TupleForm(String);

fn main() {}
