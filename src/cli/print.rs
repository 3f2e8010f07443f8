use std::io::Write;

use recipeez_api_types::RecipePage;
use serde::Serialize;

use crate::cache::ListKey;

use super::error::CliError;

pub fn print_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    writeln!(out, "{rendered}").map_err(CliError::Output)
}

pub fn print_line(out: &mut dyn Write, line: impl std::fmt::Display) -> Result<(), CliError> {
    writeln!(out, "{line}").map_err(CliError::Output)
}

/// One line per recipe, for the interactive shell.
pub fn print_list_view(
    out: &mut dyn Write,
    key: &ListKey,
    page: &RecipePage,
) -> Result<(), CliError> {
    print_line(
        out,
        format_args!(
            "{key}: {} shown, {} total",
            page.recipes.len(),
            page.meta.total_count
        ),
    )?;
    for recipe in &page.recipes {
        let photo = if recipe.photo_url().is_some() { " [photo]" } else { "" };
        print_line(out, format_args!("  {}  {}{photo}", recipe.id, recipe.title))?;
    }
    Ok(())
}
