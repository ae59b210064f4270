// ABOUTME: Database operations for recipe trees (recipes, chapters, steps, ingredients)
// ABOUTME: Read queries run on the pool; write helpers run on a transaction's connection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::database::repositories::{ChildRow, ChildUpsert, RecipeRow};
use crate::database::DatabaseError;
use crate::models::{Chapter, EditLevel, EntityId, Ingredient, Recipe, RecipeSummary, Step};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use std::collections::HashMap;

/// Database manager for recipe tree reads and deletes
pub struct RecipeManager {
    pool: SqlitePool,
}

impl RecipeManager {
    /// Create a new recipe manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load a recipe with every descendant, children sorted by order number
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a stored value is out of range
    pub async fn load_full_tree(&self, recipe_id: i64) -> Result<Option<Recipe>, DatabaseError> {
        let row = sqlx::query(
            r"
            SELECT id, name, category, sub_category, servings, note
            FROM recipes
            WHERE id = $1
            ",
        )
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut recipe = row_to_recipe(&row)?;

        let chapter_rows = sqlx::query(
            r"
            SELECT id, name, note, order_number
            FROM chapters
            WHERE recipe_id = $1
            ORDER BY order_number, id
            ",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        let step_rows = sqlx::query(
            r"
            SELECT s.id, s.chapter_id, s.description, s.timer_minutes, s.note, s.order_number
            FROM steps s
            JOIN chapters c ON c.id = s.chapter_id
            WHERE c.recipe_id = $1
            ORDER BY s.order_number, s.id
            ",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        let ingredient_rows = sqlx::query(
            r"
            SELECT i.id, i.step_id, i.name, i.quantity, i.unit, i.order_number
            FROM ingredients i
            JOIN steps s ON s.id = i.step_id
            JOIN chapters c ON c.id = s.chapter_id
            WHERE c.recipe_id = $1
            ORDER BY i.order_number, i.id
            ",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        let mut ingredients_by_step: HashMap<i64, Vec<Ingredient>> = HashMap::new();
        for row in &ingredient_rows {
            let step_id: i64 = row.try_get("step_id")?;
            ingredients_by_step
                .entry(step_id)
                .or_default()
                .push(row_to_ingredient(row)?);
        }

        let mut steps_by_chapter: HashMap<i64, Vec<Step>> = HashMap::new();
        for row in &step_rows {
            let chapter_id: i64 = row.try_get("chapter_id")?;
            let mut step = row_to_step(row)?;
            if let Some(id) = step.id.persisted() {
                step.ingredients = ingredients_by_step.remove(&id).unwrap_or_default();
            }
            steps_by_chapter.entry(chapter_id).or_default().push(step);
        }

        for row in &chapter_rows {
            let mut chapter = row_to_chapter(row)?;
            if let Some(id) = chapter.id.persisted() {
                chapter.steps = steps_by_chapter.remove(&id).unwrap_or_default();
            }
            recipe.chapters.push(chapter);
        }

        Ok(Some(recipe))
    }

    /// List every recipe ordered by category, then name
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_recipes(&self) -> Result<Vec<RecipeSummary>, DatabaseError> {
        let rows = sqlx::query(
            r"
            SELECT r.id, r.name, r.category, r.sub_category, r.servings, r.updated_at,
                   (SELECT COUNT(*) FROM chapters c WHERE c.recipe_id = r.id) AS chapter_count
            FROM recipes r
            ORDER BY r.category COLLATE NOCASE, r.name COLLATE NOCASE, r.id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_summary).collect()
    }

    /// Search recipes by name
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn search_recipes(&self, query: &str) -> Result<Vec<RecipeSummary>, DatabaseError> {
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let search_pattern = format!("%{escaped}%");

        let rows = sqlx::query(
            r"
            SELECT r.id, r.name, r.category, r.sub_category, r.servings, r.updated_at,
                   (SELECT COUNT(*) FROM chapters c WHERE c.recipe_id = r.id) AS chapter_count
            FROM recipes r
            WHERE r.name LIKE $1 ESCAPE '\'
            ORDER BY r.name COLLATE NOCASE, r.id
            ",
        )
        .bind(&search_pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_summary).collect()
    }

    /// Distinct categories in alphabetical order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_categories(&self) -> Result<Vec<String>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT DISTINCT category FROM recipes ORDER BY category COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("category").map_err(DatabaseError::from))
            .collect()
    }

    /// Delete a recipe; chapters, steps, and ingredients follow by cascade
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails
    pub async fn delete_recipe(&self, recipe_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Transactional writes
// ============================================================================

/// Insert or update a recipe row on a transaction connection
///
/// A `New` id inserts and lets `SQLite` assign the key. A persisted id must
/// name an existing recipe.
///
/// # Errors
///
/// Returns `InvalidData` when a persisted id matches no row, or an error if
/// the statement fails or a constraint is violated
pub async fn upsert_recipe(
    conn: &mut SqliteConnection,
    id: EntityId,
    row: &RecipeRow,
    now: DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    let timestamp = now.to_rfc3339();
    let Some(recipe_id) = id.persisted() else {
        let result = sqlx::query(
            r"
            INSERT INTO recipes (name, category, sub_category, servings, note, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ",
        )
        .bind(&row.name)
        .bind(&row.category)
        .bind(&row.sub_category)
        .bind(i64::from(row.servings))
        .bind(&row.note)
        .bind(&timestamp)
        .execute(&mut *conn)
        .await?;
        return Ok(result.last_insert_rowid());
    };

    let result = sqlx::query(
        r"
        UPDATE recipes
        SET name = $1, category = $2, sub_category = $3, servings = $4, note = $5, updated_at = $6
        WHERE id = $7
        ",
    )
    .bind(&row.name)
    .bind(&row.category)
    .bind(&row.sub_category)
    .bind(i64::from(row.servings))
    .bind(&row.note)
    .bind(&timestamp)
    .bind(recipe_id)
    .execute(&mut *conn)
    .await?;

    expect_single_row(result.rows_affected(), EditLevel::Recipe, recipe_id, None)?;
    Ok(recipe_id)
}

/// Delete children of `parent_id` at `level`, returning the number of rows removed
///
/// # Errors
///
/// Returns an error if the level has no parent or the statement fails
pub async fn delete_children(
    conn: &mut SqliteConnection,
    level: EditLevel,
    parent_id: i64,
    ids: &[i64],
) -> Result<u64, DatabaseError> {
    let sql = match level {
        EditLevel::Chapter => "DELETE FROM chapters WHERE id = $1 AND recipe_id = $2",
        EditLevel::Step => "DELETE FROM steps WHERE id = $1 AND chapter_id = $2",
        EditLevel::Ingredient => "DELETE FROM ingredients WHERE id = $1 AND step_id = $2",
        EditLevel::Recipe => {
            return Err(DatabaseError::InvalidData {
                field: "level".to_owned(),
                reason: "recipes are not children".to_owned(),
            })
        }
    };

    let mut removed = 0;
    for id in ids {
        let result = sqlx::query(sql)
            .bind(id)
            .bind(parent_id)
            .execute(&mut *conn)
            .await?;
        removed += result.rows_affected();
    }
    Ok(removed)
}

/// Insert or update one child row, returning its key
///
/// A persisted row is only updated while it belongs to `parent_id`; a row
/// owned by another parent, or one that no longer exists, is an error.
///
/// # Errors
///
/// Returns `InvalidData` when a persisted id is not a child of `parent_id`,
/// or an error if the statement fails or a constraint is violated
#[allow(clippy::too_many_lines)] // Insert and update statements for each child level
pub async fn upsert_child(
    conn: &mut SqliteConnection,
    parent_id: i64,
    upsert: &ChildUpsert,
) -> Result<i64, DatabaseError> {
    let order_number = i64::from(upsert.order_number);
    let (level, query) = match (&upsert.row, upsert.id.persisted()) {
        (ChildRow::Chapter { name, note }, None) => (
            EditLevel::Chapter,
            sqlx::query(
                "INSERT INTO chapters (recipe_id, name, note, order_number) VALUES ($1, $2, $3, $4)",
            )
            .bind(parent_id)
            .bind(name)
            .bind(note)
            .bind(order_number),
        ),
        (ChildRow::Chapter { name, note }, Some(id)) => (
            EditLevel::Chapter,
            sqlx::query(
                r"
                UPDATE chapters SET name = $1, note = $2, order_number = $3
                WHERE id = $4 AND recipe_id = $5
                ",
            )
            .bind(name)
            .bind(note)
            .bind(order_number)
            .bind(id)
            .bind(parent_id),
        ),
        (
            ChildRow::Step {
                description,
                timer_minutes,
                note,
            },
            None,
        ) => (
            EditLevel::Step,
            sqlx::query(
                r"
                INSERT INTO steps (chapter_id, description, timer_minutes, note, order_number)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(parent_id)
            .bind(description)
            .bind(timer_minutes.map(i64::from))
            .bind(note)
            .bind(order_number),
        ),
        (
            ChildRow::Step {
                description,
                timer_minutes,
                note,
            },
            Some(id),
        ) => (
            EditLevel::Step,
            sqlx::query(
                r"
                UPDATE steps SET description = $1, timer_minutes = $2, note = $3, order_number = $4
                WHERE id = $5 AND chapter_id = $6
                ",
            )
            .bind(description)
            .bind(timer_minutes.map(i64::from))
            .bind(note)
            .bind(order_number)
            .bind(id)
            .bind(parent_id),
        ),
        (
            ChildRow::Ingredient {
                name,
                quantity,
                unit,
            },
            None,
        ) => (
            EditLevel::Ingredient,
            sqlx::query(
                r"
                INSERT INTO ingredients (step_id, name, quantity, unit, order_number)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(parent_id)
            .bind(name)
            .bind(*quantity)
            .bind(unit)
            .bind(order_number),
        ),
        (
            ChildRow::Ingredient {
                name,
                quantity,
                unit,
            },
            Some(id),
        ) => (
            EditLevel::Ingredient,
            sqlx::query(
                r"
                UPDATE ingredients SET name = $1, quantity = $2, unit = $3, order_number = $4
                WHERE id = $5 AND step_id = $6
                ",
            )
            .bind(name)
            .bind(*quantity)
            .bind(unit)
            .bind(order_number)
            .bind(id)
            .bind(parent_id),
        ),
    };

    let result = query.execute(&mut *conn).await?;
    match upsert.id.persisted() {
        Some(id) => {
            expect_single_row(result.rows_affected(), level, id, Some(parent_id))?;
            Ok(id)
        }
        None => Ok(result.last_insert_rowid()),
    }
}

/// An update by key must touch exactly one row
fn expect_single_row(
    rows_affected: u64,
    level: EditLevel,
    id: i64,
    parent_id: Option<i64>,
) -> Result<(), DatabaseError> {
    if rows_affected == 1 {
        return Ok(());
    }
    let reason = match parent_id {
        Some(parent_id) => format!("{level} {id} does not exist under parent {parent_id}"),
        None => format!("{level} {id} does not exist"),
    };
    Err(DatabaseError::InvalidData {
        field: "id".to_owned(),
        reason,
    })
}

// ============================================================================
// Row mappers
// ============================================================================

fn to_u32(row: &SqliteRow, column: &str) -> Result<u32, DatabaseError> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| DatabaseError::InvalidData {
        field: column.to_owned(),
        reason: format!("{value} is out of range"),
    })
}

fn row_to_recipe(row: &SqliteRow) -> Result<Recipe, DatabaseError> {
    Ok(Recipe {
        id: EntityId::Persisted(row.try_get("id")?),
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        sub_category: row.try_get("sub_category")?,
        servings: to_u32(row, "servings")?,
        note: row.try_get("note")?,
        chapters: Vec::new(),
    })
}

fn row_to_chapter(row: &SqliteRow) -> Result<Chapter, DatabaseError> {
    Ok(Chapter {
        id: EntityId::Persisted(row.try_get("id")?),
        name: row.try_get("name")?,
        note: row.try_get("note")?,
        order_number: to_u32(row, "order_number")?,
        steps: Vec::new(),
    })
}

fn row_to_step(row: &SqliteRow) -> Result<Step, DatabaseError> {
    let timer: Option<i64> = row.try_get("timer_minutes")?;
    let timer_minutes = timer
        .map(|minutes| {
            u32::try_from(minutes).map_err(|_| DatabaseError::InvalidData {
                field: "timer_minutes".to_owned(),
                reason: format!("{minutes} is out of range"),
            })
        })
        .transpose()?;

    Ok(Step {
        id: EntityId::Persisted(row.try_get("id")?),
        description: row.try_get("description")?,
        timer_minutes,
        note: row.try_get("note")?,
        order_number: to_u32(row, "order_number")?,
        ingredients: Vec::new(),
    })
}

fn row_to_ingredient(row: &SqliteRow) -> Result<Ingredient, DatabaseError> {
    Ok(Ingredient {
        id: EntityId::Persisted(row.try_get("id")?),
        name: row.try_get("name")?,
        quantity: row.try_get("quantity")?,
        unit: row.try_get("unit")?,
        order_number: to_u32(row, "order_number")?,
    })
}

fn row_to_summary(row: &SqliteRow) -> Result<RecipeSummary, DatabaseError> {
    let updated_at: String = row.try_get("updated_at")?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| DatabaseError::InvalidData {
            field: "updated_at".to_owned(),
            reason: e.to_string(),
        })?
        .with_timezone(&Utc);

    Ok(RecipeSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        sub_category: row.try_get("sub_category")?,
        servings: to_u32(row, "servings")?,
        chapter_count: to_u32(row, "chapter_count")?,
        updated_at,
    })
}
