// ABOUTME: Command-line front end for the local recipe book
// ABOUTME: Lists, searches, shows, deletes, imports, exports, and seeds recipes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Recipe book CLI.
//!
//! Usage:
//! ```bash
//! # List recipes (uses DATABASE_URL from environment)
//! recipe-book list
//! recipe-book list --category Baking
//!
//! # Show a recipe scaled to 4 servings, with the first two steps done
//! recipe-book show 3 --servings 4 --done 1 --done 2
//!
//! # Export, then import as a new recipe
//! recipe-book export 3 > focaccia.json
//! recipe-book import focaccia.json
//!
//! # Create a demo recipe
//! recipe-book seed
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use recipe_book::config::{AppConfig, DatabaseUrl};
use recipe_book::database::repositories::{RecipeStore, SqliteRecipeStore};
use recipe_book::database::Database;
use recipe_book::editor::{
    ChapterField, EditSession, FieldChange, IngredientField, RecipeField, SaveOutcome, StepField,
};
use recipe_book::models::{EditLevel, RecipeSummary};
use recipe_book::services::{export_json, format_ingredient, import_json, CookingProgress};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "recipe-book",
    about = "Local recipe book",
    long_about = "Browse and maintain the recipes stored in the local recipe database"
)]
struct Cli {
    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List recipes ordered by category and name
    List {
        /// Only show recipes of this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Find recipes whose name contains the query
    Search {
        /// Text to look for
        query: String,
    },
    /// List categories
    Categories,
    /// Print a recipe with its chapters, steps, and ingredients
    Show {
        /// Recipe id
        id: i64,
        /// Scale ingredient quantities to this many servings
        #[arg(long)]
        servings: Option<u32>,
        /// Mark a step as done, counted from 1 across all chapters (repeatable)
        #[arg(long = "done")]
        done: Vec<usize>,
    },
    /// Delete a recipe and everything in it
    Delete {
        /// Recipe id
        id: i64,
    },
    /// Print a recipe as JSON
    Export {
        /// Recipe id
        id: i64,
    },
    /// Save a JSON recipe file as a new recipe
    Import {
        /// Path of the JSON file
        path: String,
    },
    /// Create a demo recipe through the editor
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(url) = &cli.database_url {
        config.database.url = DatabaseUrl::parse_url(url);
    }
    config.logging.init()?;
    config.log_summary();

    let database = Database::new(&config.database).await?;
    let store = Arc::new(SqliteRecipeStore::new(database));

    match cli.command {
        Command::List { category } => {
            let recipes = store.list_recipes().await?;
            let recipes = recipes
                .into_iter()
                .filter(|r| category.as_ref().is_none_or(|c| r.category.eq_ignore_ascii_case(c)));
            print_summaries(recipes);
        }
        Command::Search { query } => print_summaries(store.search_recipes(&query).await?),
        Command::Categories => {
            for category in store.list_categories().await? {
                println!("{category}");
            }
        }
        Command::Show { id, servings, done } => show(store.as_ref(), id, servings, &done).await?,
        Command::Delete { id } => {
            if store.delete_recipe(id).await? {
                println!("Deleted recipe {id}");
            } else {
                bail!("Recipe {id} not found");
            }
        }
        Command::Export { id } => println!("{}", export_json(store.as_ref(), id).await?),
        Command::Import { path } => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {path}"))?;
            let recipe = import_json(store, &json, config.save_max_retries).await?;
            println!(
                "Imported recipe {} ({} entities)",
                recipe.id,
                recipe.entity_count()
            );
        }
        Command::Seed => seed(store, config.save_max_retries).await?,
    }

    Ok(())
}

fn print_summaries(recipes: impl IntoIterator<Item = RecipeSummary>) {
    for recipe in recipes {
        let category = if recipe.sub_category.is_empty() {
            recipe.category
        } else {
            format!("{} / {}", recipe.category, recipe.sub_category)
        };
        println!(
            "{:>5}  {:<32} {:<24} {} servings, {} chapters",
            recipe.id, recipe.name, category, recipe.servings, recipe.chapter_count
        );
    }
}

async fn show(
    store: &dyn RecipeStore,
    id: i64,
    servings: Option<u32>,
    done: &[usize],
) -> Result<()> {
    let recipe = store
        .load_full_tree(id)
        .await?
        .with_context(|| format!("Recipe {id} not found"))?;
    let target_servings = servings.unwrap_or(recipe.servings);

    let mut progress = CookingProgress::new(&recipe);
    for position in done {
        let index = position
            .checked_sub(1)
            .filter(|index| *index < progress.total())
            .with_context(|| format!("Recipe {id} has no step {position}"))?;
        if !progress.is_checked(index) {
            progress.toggle(index);
        }
    }

    println!("{} ({})", recipe.name, recipe.category);
    println!("Servings: {target_servings}");
    if !recipe.note.is_empty() {
        println!("{}", recipe.note);
    }

    let mut step_index = 0;
    for chapter in &recipe.chapters {
        println!();
        println!("{}. {}", chapter.order_number, chapter.name);
        for step in &chapter.steps {
            let timer = step
                .timer_minutes
                .map(|m| format!(" [{m} min]"))
                .unwrap_or_default();
            let mark = if progress.is_checked(step_index) { 'x' } else { ' ' };
            step_index += 1;
            println!("  [{mark}] {}. {}{timer}", step.order_number, step.description);
            for ingredient in &step.ingredients {
                println!(
                    "     - {}",
                    format_ingredient(ingredient, recipe.servings, target_servings)
                );
            }
        }
    }

    if !done.is_empty() {
        println!();
        println!(
            "Done {}/{} steps ({:.0}%)",
            progress.checked_count(),
            progress.total(),
            progress.completion_ratio() * 100.0
        );
        if let Some(next) = progress.next_unchecked() {
            println!("Next: step {}", next + 1);
        }
    }

    Ok(())
}

async fn seed(store: Arc<SqliteRecipeStore>, max_retries: u32) -> Result<()> {
    let mut session = EditSession::open(store, None)
        .await?
        .with_max_retries(max_retries);

    for change in [
        RecipeField::Name("Focaccia".into()),
        RecipeField::Category("Baking".into()),
        RecipeField::SubCategory("Bread".into()),
        RecipeField::Servings(4),
    ] {
        session.update_field(FieldChange::Recipe(change))?;
    }

    let chapters: [(&str, &[(&str, Option<u32>, &[(&str, f64, &str)])]); 2] = [
        (
            "Dough",
            &[
                (
                    "Mix flour, water, yeast and salt",
                    None,
                    &[("flour", 500.0, "g"), ("water", 400.0, "ml"), ("yeast", 7.0, "g"), ("salt", 10.0, "g")],
                ),
                ("Let the dough rise", Some(120), &[]),
            ],
        ),
        (
            "Baking",
            &[
                ("Spread into an oiled tray", None, &[("olive oil", 3.0, "tbsp")]),
                ("Bake at 230 degrees", Some(25), &[("flaky salt", 0.0, "")]),
            ],
        ),
    ];

    for (chapter_index, (chapter_name, steps)) in chapters.iter().enumerate() {
        session.open_chapter(chapter_index)?;
        session.update_field(FieldChange::Chapter(ChapterField::Name((*chapter_name).into())))?;

        for (step_index, (description, timer, ingredients)) in steps.iter().enumerate() {
            session.open_step(step_index)?;
            session.update_field(FieldChange::Step(StepField::Description((*description).into())))?;
            session.update_field(FieldChange::Step(StepField::TimerMinutes(*timer)))?;

            for (ingredient_index, (name, quantity, unit)) in ingredients.iter().enumerate() {
                session.open_ingredient(ingredient_index)?;
                session.update_field(FieldChange::Ingredient(IngredientField::Name((*name).into())))?;
                session.update_field(FieldChange::Ingredient(IngredientField::Quantity(*quantity)))?;
                session.update_field(FieldChange::Ingredient(IngredientField::Unit((*unit).into())))?;
                session.save(EditLevel::Ingredient).await?;
            }
            session.save(EditLevel::Step).await?;
        }
        session.save(EditLevel::Chapter).await?;
    }

    if let SaveOutcome::Committed { recipe_id, stats } = session.save(EditLevel::Recipe).await? {
        info!(recipe.id = recipe_id, upserts = stats.upserts, "Demo recipe seeded");
        println!("Seeded recipe {recipe_id}");
    }
    Ok(())
}
