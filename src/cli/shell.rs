//! Interactive shell.
//!
//! One process, one cache: after a mutation the last listed page is redrawn
//! straight from the cache, which is where synchronization shows up.

use std::io::Write;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cache::{ListKey, QueryKey};
use crate::config::RecipeCommand;
use crate::session::AuthState;

use super::Ctx;
use super::auth::{sign_out, whoami};
use super::error::CliError;
use super::print::{print_line, print_list_view};
use super::recipes;

const PROMPT: &str = "recipeez> ";
const EXPIRED_NOTICE: &str =
    "Your session has expired. Sign in again with `recipeez sign-in --email <EMAIL>`.";

#[derive(Debug, Parser)]
#[command(name = "recipeez", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    #[command(flatten)]
    Recipe(RecipeCommand),
    /// Show resident cache keys.
    Cache,
    Whoami,
    SignOut,
    #[command(alias = "quit")]
    Exit,
}

pub async fn run<R: AsyncBufRead + Unpin>(
    ctx: &Ctx,
    input: R,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let mut auth = ctx.session.subscribe();
    auth.mark_unchanged();
    let mut last_list: Option<ListKey> = None;
    let mut lines = input.lines();

    prompt(out)?;
    while let Some(line) = lines.next_line().await.map_err(CliError::Stdin)? {
        let tokens = match split_line(&line) {
            Ok(tokens) => tokens,
            Err(err) => {
                print_line(out, format_args!("error: {err}"))?;
                prompt(out)?;
                continue;
            }
        };
        if tokens.is_empty() {
            prompt(out)?;
            continue;
        }

        match ShellLine::try_parse_from(tokens) {
            Err(err) => print_line(out, err.render())?,
            Ok(ShellLine { command }) => match command {
                ShellCommand::Exit => break,
                ShellCommand::Cache => print_cache(ctx, out)?,
                ShellCommand::Whoami => whoami(ctx, out)?,
                ShellCommand::SignOut => {
                    sign_out(ctx, out)?;
                    last_list = None;
                }
                ShellCommand::Recipe(cmd) => {
                    run_recipe_command(ctx, cmd, &mut last_list, out).await?;
                }
            },
        }

        if auth.has_changed().unwrap_or(false) && *auth.borrow_and_update() == AuthState::Expired
        {
            print_line(out, EXPIRED_NOTICE)?;
        }
        prompt(out)?;
    }
    Ok(())
}

async fn run_recipe_command(
    ctx: &Ctx,
    cmd: RecipeCommand,
    last_list: &mut Option<ListKey>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    if let RecipeCommand::List { page, search, .. } = &cmd {
        *last_list = Some(ListKey::from_page_number(
            *page,
            search.as_deref().unwrap_or_default(),
        ));
    }
    let mutates = !matches!(cmd, RecipeCommand::List { .. } | RecipeCommand::Get { .. });
    let before = ctx.cache.epoch();

    if let Err(err) = recipes::handle(ctx, cmd, out).await {
        report(out, &err)?;
        return Ok(());
    }

    if mutates
        && ctx.cache.epoch() != before
        && let Some(key) = last_list.as_ref()
        && let Some(page) = ctx.cache.get_list(key)
    {
        print_list_view(out, key, &page)?;
    }
    Ok(())
}

fn print_cache(ctx: &Ctx, out: &mut dyn Write) -> Result<(), CliError> {
    print_line(out, format_args!("epoch {}", ctx.cache.epoch()))?;
    for key in ctx.cache.resident_keys() {
        match &key {
            QueryKey::List(list_key) => match ctx.cache.get_list(list_key) {
                Some(page) => print_list_view(out, list_key, &page)?,
                None => print_line(out, format_args!("{key}"))?,
            },
            QueryKey::Detail(_) => print_line(out, format_args!("{key}"))?,
        }
    }
    Ok(())
}

fn report(out: &mut dyn Write, err: &CliError) -> Result<(), CliError> {
    print_line(out, format_args!("error: {err}"))?;
    if let Some(hint) = err.hint() {
        print_line(out, format_args!("hint: {hint}"))?;
    }
    Ok(())
}

fn prompt(out: &mut dyn Write) -> Result<(), CliError> {
    write!(out, "{PROMPT}").map_err(CliError::Output)?;
    out.flush().map_err(CliError::Output)
}

/// Split a shell line on whitespace, honouring single quotes, double quotes
/// and backslash escapes outside single quotes.
fn split_line(line: &str) -> Result<Vec<String>, CliError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('\''), _) => current.push(ch),
            (_, '\\') => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| CliError::InvalidInput("trailing backslash".into()))?;
                current.push(escaped);
                in_token = true;
            }
            (Some(_), _) => current.push(ch),
            (None, '\'' | '"') => {
                quote = Some(ch);
                in_token = true;
            }
            (None, _) if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, _) => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(CliError::InvalidInput("unterminated quote".into()));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
