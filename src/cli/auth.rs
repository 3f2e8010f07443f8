use std::io::Write;

use serde::Serialize;
use tokio::io::AsyncBufRead;

use crate::config::SignInArgs;
use crate::session::AuthState;

use super::Ctx;
use super::error::CliError;
use super::io::read_line;
use super::print::print_json;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Identity<'a> {
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
}

impl<'a> Identity<'a> {
    fn from_state(state: &'a AuthState) -> Self {
        match state {
            AuthState::SignedIn { user } => Self {
                state: "signed_in",
                user: Some(user),
            },
            AuthState::SignedOut => Self {
                state: "signed_out",
                user: None,
            },
            AuthState::Expired => Self {
                state: "expired",
                user: None,
            },
        }
    }
}

/// Password comes from the flag/env first, then one line of `stdin`.
pub async fn sign_in<R: AsyncBufRead + Unpin>(
    ctx: &Ctx,
    args: SignInArgs,
    stdin: &mut R,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let password = match args.password {
        Some(password) => password,
        None => read_line(stdin).await?,
    };
    let session = ctx.auth.sign_in(&args.email, &password).await?;
    let state = AuthState::SignedIn { user: session.user };
    print_json(out, &Identity::from_state(&state))
}

pub fn sign_out(ctx: &Ctx, out: &mut dyn Write) -> Result<(), CliError> {
    ctx.auth.sign_out();
    print_json(out, &Identity::from_state(&AuthState::SignedOut))
}

pub fn whoami(ctx: &Ctx, out: &mut dyn Write) -> Result<(), CliError> {
    let state = ctx.session.state();
    print_json(out, &Identity::from_state(&state))
}
