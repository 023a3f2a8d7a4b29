//! System prompt assembly.

use conduit_core::prompts::load_prompt;
use conduit_core::{Error, Result, ToolMode};
use conduit_tooling::{Environment, render_function_list};

/// Builds the system prompt for `environment` in `mode`.
///
/// Filesystem mode appends the full function list so the model does not need to
/// discover it.
///
/// # Errors
/// Returns an error if a prompt template is missing or the function list cannot be rendered
pub fn build_system_prompt(environment: &dyn Environment, mode: ToolMode) -> Result<String> {
    let template = load_prompt("agent_system")?;
    let instruction = load_prompt("agent_instruction")?;

    let mut system_prompt = template
        .replace("{agent_instruction}", &instruction)
        .replace("{domain_policy}", environment.policy());

    if mode == ToolMode::Filesystem {
        let functions = environment.functions();
        let function_list = render_function_list(&functions.list()).map_err(|err| {
            Error::Other(format!("Failed to render function list: {err}"))
        })?;
        let addendum = load_prompt("filesystem_addendum")?
            .replace("{namespace}", environment.domain_name())
            .replace("{function_list}", &function_list);

        system_prompt.push_str("\n\n");
        system_prompt.push_str(&addendum);
    }

    Ok(system_prompt)
}
