//! Preview the filter a search would send

use anyhow::Result;
use colored::Colorize;

use sesmatch::matching::build_query_filter;
use sesmatch::{Category, Config, FormState};

pub fn execute(config: &Config, id: Option<String>, category: Option<Category>) -> Result<()> {
    let entry = FormState::new(config.form.revision)
        .with_fields(String::new(), id.unwrap_or_default(), category)
        .entry();

    let filter = build_query_filter(Some(entry.id.as_str()), entry.category);
    if filter.is_none() {
        eprintln!("{}", "no filter: every record in the namespace can match".dimmed());
    }
    println!("{}", serde_json::to_string_pretty(&filter)?);
    Ok(())
}
