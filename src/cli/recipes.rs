use std::io::Write;

use serde_json::json;

use crate::application::{FetchPolicy, ServiceError};
use crate::cache::ListKey;
use crate::config::{CreateRecipeArgs, RecipeCommand, UpdateRecipeArgs};
use crate::domain::{RecipeDraft, RecipeFields, parse_ingredients};

use super::Ctx;
use super::error::CliError;
use super::io::{read_opt_value, read_photo, read_value};
use super::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: RecipeCommand, out: &mut dyn Write) -> Result<(), CliError> {
    match cmd {
        RecipeCommand::List {
            page,
            search,
            refresh,
        } => {
            let key = ListKey::from_page_number(page, search.unwrap_or_default());
            let page = ctx.recipes.list_recipes(key, policy(refresh)).await?;
            print_json(out, &page)
        }
        RecipeCommand::Get { id, refresh } => {
            let recipe = ctx.recipes.get_recipe(&id, policy(refresh)).await?;
            print_json(out, &recipe)
        }
        RecipeCommand::Create(args) => create(ctx, args, out).await,
        RecipeCommand::Update(args) => update(ctx, args, out).await,
        RecipeCommand::Photo { id, file } => {
            let photo = read_photo(&file, ctx.recipes.max_photo_bytes()).await?;
            let replaced = ctx.recipes.replace_photo(&id, photo).await?;
            print_json(out, &replaced)
        }
        RecipeCommand::Delete { id } => {
            ctx.recipes.delete_recipe(&id).await?;
            print_json(out, &json!({ "deleted": id }))
        }
    }
}

fn policy(refresh: bool) -> FetchPolicy {
    if refresh {
        FetchPolicy::NetworkOnly
    } else {
        FetchPolicy::CacheFirst
    }
}

async fn create(ctx: &Ctx, args: CreateRecipeArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let instructions = read_value(args.instructions, args.instructions_file).await?;
    let fields = RecipeFields {
        title: args.title,
        description: args.description,
        ingredients: parse_ingredients(&args.ingredients),
        instructions,
    };
    let mut draft = RecipeDraft::new(fields);
    if let Some(path) = args.photo {
        draft = draft.with_photo(read_photo(&path, ctx.recipes.max_photo_bytes()).await?);
    }

    match ctx.recipes.create_recipe(draft).await {
        Ok(recipe) => print_json(out, &recipe),
        Err(err) => {
            // The recipe exists even though the photo step failed; show it.
            if let ServiceError::PhotoUpload { recipe, .. } = &err {
                print_json(out, recipe)?;
            }
            Err(err.into())
        }
    }
}

/// Fields not given on the command line are filled from the current record.
async fn update(ctx: &Ctx, args: UpdateRecipeArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let current = ctx
        .recipes
        .get_recipe(&args.id, FetchPolicy::CacheFirst)
        .await?;
    let instructions = read_opt_value(args.instructions, args.instructions_file).await?;

    let fields = RecipeFields {
        title: args.title.unwrap_or(current.title),
        description: args.description.unwrap_or(current.description),
        ingredients: args
            .ingredients
            .as_deref()
            .map(parse_ingredients)
            .unwrap_or(current.ingredients),
        instructions: instructions.unwrap_or(current.instructions),
    };
    let update = ctx.recipes.update_recipe(&args.id, fields).await?;
    print_json(out, &update)
}
