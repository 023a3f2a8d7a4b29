//! Prompt loading utilities
//!
//! Each prompt file is a markdown document with Usage and Prompt sections.
//! Prompts are embedded at compile time using `include_str!`.

use crate::{Error, Result};

const AGENT_SYSTEM_MD: &str = include_str!("../prompts/agent_system.md");
const AGENT_INSTRUCTION_MD: &str = include_str!("../prompts/agent_instruction.md");
const FILESYSTEM_ADDENDUM_MD: &str = include_str!("../prompts/filesystem_addendum.md");

/// Loads a prompt by name
///
/// # Errors
/// Returns an error if the prompt name is unknown or the prompt section cannot be extracted
pub fn load_prompt(name: &str) -> Result<String> {
    let content = match name {
        "agent_system" => AGENT_SYSTEM_MD,
        "agent_instruction" => AGENT_INSTRUCTION_MD,
        "filesystem_addendum" => FILESYSTEM_ADDENDUM_MD,
        _ => return Err(Error::Config(format!("Unknown prompt: {name}"))),
    };

    extract_prompt_section(content)
}

/// Extracts the Prompt section from a markdown file
///
/// # Errors
/// Returns an error if the Prompt section cannot be found
fn extract_prompt_section(content: &str) -> Result<String> {
    let prompt_start = content
        .find("## Prompt")
        .ok_or_else(|| Error::Config("Prompt section not found".to_owned()))?;

    let prompt_content_start = content[prompt_start..]
        .find('\n')
        .ok_or_else(|| Error::Config("Invalid prompt format".to_owned()))?
        + prompt_start
        + 1;

    // ## Prompt is always the last top-level section
    Ok(content[prompt_content_start..].trim().to_owned())
}
