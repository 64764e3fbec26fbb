pub use qwc_types::prelude::*;

pub use crate::app::{App, AppState};

// vim: ts=4
