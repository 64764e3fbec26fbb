pub use qwc_types::prelude::*;

// vim: ts=4
