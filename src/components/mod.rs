pub mod deposit_form;
pub mod layout;
