//! Terminal front end: one-shot commands and the interactive shell.

mod auth;
pub mod error;
mod io;
mod print;
mod recipes;
mod shell;

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, BufReader};

use crate::application::{AuthService, RecipeService};
use crate::cache::{CacheConfig, RecipeCache};
use crate::client::ApiClient;
use crate::config::{Command, Settings};
use crate::session::{FileSessionStorage, SessionStore};

pub use error::CliError;

/// Everything a command needs, wired once per process.
#[derive(Clone)]
pub struct Ctx {
    pub auth: AuthService,
    pub recipes: RecipeService,
    pub session: Arc<SessionStore>,
    pub cache: Arc<RecipeCache>,
}

impl Ctx {
    pub fn new(settings: &Settings, session: Arc<SessionStore>) -> Result<Self, CliError> {
        let cache = Arc::new(RecipeCache::new(CacheConfig::from(&settings.cache)));
        let client = ApiClient::new(&settings.api, Arc::clone(&session))?;
        let auth = AuthService::new(client.clone(), Arc::clone(&session), Arc::clone(&cache));
        let recipes = RecipeService::new(
            client,
            Arc::clone(&session),
            Arc::clone(&cache),
            settings.uploads.max_photo_bytes.get(),
        );
        Ok(Self {
            auth,
            recipes,
            session,
            cache,
        })
    }

    /// Context backed by the session file named in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, CliError> {
        let storage = FileSessionStorage::new(&settings.session.file);
        Self::new(settings, Arc::new(SessionStore::restore(storage)))
    }
}

/// Run one command, reading from process stdin where a command needs input.
pub async fn run(ctx: &Ctx, command: Command, out: &mut dyn Write) -> Result<(), CliError> {
    let stdin = BufReader::new(tokio::io::stdin());
    run_with_input(ctx, command, stdin, out).await
}

pub async fn run_with_input<R: AsyncBufRead + Unpin>(
    ctx: &Ctx,
    command: Command,
    mut input: R,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::SignIn(args) => auth::sign_in(ctx, args, &mut input, out).await,
        Command::SignOut => auth::sign_out(ctx, out),
        Command::Whoami => auth::whoami(ctx, out),
        Command::Recipes(args) => recipes::handle(ctx, args.action, out).await,
        Command::Shell => shell::run(ctx, input, out).await,
    }
}
