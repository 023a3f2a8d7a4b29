//! Function list rendering for prompts.
//!
//! In filesystem mode the model sees every function name upfront instead of
//! discovering them, so the list is rendered into the system prompt.

use std::fmt::{Error as FmtError, Write as _};

use crate::DomainFunction;

/// Render one `- name` line per function
///
/// # Errors
/// Returns an error if formatting fails
pub fn render_function_list(functions: &[&dyn DomainFunction]) -> Result<String, FmtError> {
    let mut output = String::new();

    for (index, function) in functions.iter().enumerate() {
        if index > 0 {
            writeln!(output)?;
        }
        write!(output, "- {}", function.name())?;
    }

    Ok(output)
}
