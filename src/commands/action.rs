//! One-shot register/search from the command line

use anyhow::{bail, Result};
use colored::Colorize;

use sesmatch::form::{run_action, Services};
use sesmatch::{Action, Category, Config, FormState};

/// Field values given on the command line
pub struct EntryInput {
    pub content: String,
    pub id: String,
    pub category: Option<Category>,
    pub json: bool,
}

/// Run one action and print the response.
///
/// Unlike the served form there is no previous response to fall back to,
/// so a failed action exits non-zero.
pub fn execute(config: &Config, action: Action, input: EntryInput) -> Result<()> {
    let revision = config.form.revision;
    if input.category.is_some() && !revision.has_categories() {
        eprintln!(
            "{} --category ignored: the {} revision has no categories",
            "note:".yellow(),
            revision
        );
    }

    let services = Services::from_config(config)?;
    let form = FormState::new(revision).with_fields(input.content, input.id, input.category);
    let submitting = form.begin(action)?;

    match run_action(&services, action, &submitting.entry()) {
        Ok(response) => {
            let done = submitting.finish(Ok(response.clone())).settle();
            if input.json {
                println!("{}", serde_json::to_string_pretty(&done)?);
            } else {
                eprintln!("{} {}", "✓".green(), action.as_str());
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            Ok(())
        }
        Err(error) => {
            let message = error.to_string();
            let failed = submitting.finish(Err(error));
            if input.json {
                println!("{}", serde_json::to_string_pretty(&failed)?);
            }
            bail!("{} failed: {}", action.as_str(), message)
        }
    }
}
