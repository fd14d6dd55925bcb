//! Client-side composition: forms, their messages, and the shell that wires
//! the session context to navigation.

pub mod forms;
pub mod messages;
pub mod shell;

pub use forms::{
    FieldErrors, FormStatus, SignInForm, SignInValues, SignUpForm, SignUpValues, SubmitOutcome,
};
pub use shell::{Shell, Theme};
