use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Recipeez binary.
#[derive(Debug, Parser)]
#[command(name = "recipeez", version, about = "Recipeez terminal client")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "RECIPEEZ_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings that may be overridden for a single invocation.
#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the API base URL.
    #[arg(long = "api-url", env = "RECIPEEZ_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Override where the session record is kept.
    #[arg(
        long = "session-file",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub session_file: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Sign in and keep the session for later commands.
    SignIn(SignInArgs),
    /// Forget the session and every cached recipe.
    SignOut,
    /// Show who is signed in.
    Whoami,
    /// Recipe commands.
    Recipes(RecipesArgs),
    /// Interactive shell sharing one cache across commands.
    Shell,
}

#[derive(Debug, Args, Clone)]
pub struct SignInArgs {
    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    /// Password; read from one line of stdin when not supplied.
    #[arg(long, env = "RECIPEEZ_PASSWORD", hide_env_values = true, value_name = "PASSWORD")]
    pub password: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct RecipesArgs {
    #[command(subcommand)]
    pub action: RecipeCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum RecipeCommand {
    /// List one page of recipes.
    List {
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Only recipes whose name matches.
        #[arg(long)]
        search: Option<String>,
        /// Bypass the cache.
        #[arg(long)]
        refresh: bool,
    },
    /// Show one recipe.
    Get {
        id: String,
        /// Bypass the cache.
        #[arg(long)]
        refresh: bool,
    },
    /// Create a recipe, optionally with a photo.
    Create(CreateRecipeArgs),
    /// Edit a recipe; omitted fields keep their current value.
    Update(UpdateRecipeArgs),
    /// Replace a recipe's photo.
    Photo {
        id: String,
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    /// Delete a recipe.
    Delete { id: String },
}

#[derive(Debug, Args, Clone)]
pub struct CreateRecipeArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: String,
    /// Ingredients separated by `;`.
    #[arg(long)]
    pub ingredients: String,
    #[arg(long, required_unless_present = "instructions_file")]
    pub instructions: Option<String>,
    /// Read instructions from a file instead.
    #[arg(long = "instructions-file", value_hint = ValueHint::FilePath)]
    pub instructions_file: Option<PathBuf>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub photo: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateRecipeArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Ingredients separated by `;`.
    #[arg(long)]
    pub ingredients: Option<String>,
    #[arg(long)]
    pub instructions: Option<String>,
    #[arg(long = "instructions-file", value_hint = ValueHint::FilePath)]
    pub instructions_file: Option<PathBuf>,
}
