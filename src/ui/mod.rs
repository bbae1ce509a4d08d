//! UI utilities for terminal output
//!
//! Progress feedback for operations that wait on the network.

mod spinner;

pub use spinner::{create_spinner, finish_spinner, finish_spinner_with_message};
