//! SQLite-backed recipe store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

use rsave_models::{
    Ingredient, Instruction, Platform, Recipe, RecipeId, RecipeStatus, RecipeUpdate,
};

use crate::error::{StoreError, StoreResult};
use crate::store::RecipeStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS recipes (
    id                TEXT PRIMARY KEY,
    user_id           TEXT NOT NULL,
    original_url      TEXT NOT NULL,
    platform          TEXT NOT NULL,
    status            TEXT NOT NULL,
    title             TEXT NOT NULL,
    description       TEXT,
    notes             TEXT,
    thumbnail_url     TEXT,
    video_url         TEXT,
    prep_time_minutes INTEGER,
    cook_time_minutes INTEGER,
    servings          REAL,
    cuisine           TEXT,
    is_favorite       INTEGER NOT NULL DEFAULT 0,
    error_message     TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recipes_user ON recipes(user_id);
CREATE INDEX IF NOT EXISTS idx_recipes_status_updated ON recipes(status, updated_at);

CREATE TABLE IF NOT EXISTS ingredients (
    recipe_id   TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    order_index INTEGER NOT NULL,
    quantity    REAL,
    unit        TEXT,
    item        TEXT NOT NULL,
    raw_text    TEXT NOT NULL,
    PRIMARY KEY (recipe_id, order_index)
);

CREATE TABLE IF NOT EXISTS instructions (
    recipe_id   TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    step_number INTEGER NOT NULL,
    text        TEXT NOT NULL,
    PRIMARY KEY (recipe_id, step_number)
);
"#;

const UPDATE_SQL: &str = "UPDATE recipes SET \
    status = COALESCE(?, status), \
    title = COALESCE(?, title), \
    description = COALESCE(?, description), \
    thumbnail_url = COALESCE(?, thumbnail_url), \
    video_url = COALESCE(?, video_url), \
    prep_time_minutes = COALESCE(?, prep_time_minutes), \
    cook_time_minutes = COALESCE(?, cook_time_minutes), \
    servings = COALESCE(?, servings), \
    cuisine = COALESCE(?, cuisine), \
    error_message = COALESCE(?, error_message), \
    updated_at = ? \
    WHERE id = ?";

/// Recipe store on a SQLite database file.
#[derive(Clone)]
pub struct SqliteRecipeStore {
    pool: SqlitePool,
}

impl SqliteRecipeStore {
    /// Open (creating if needed) the database at `url` and apply the
    /// schema. `url` is a SQLite connection string such as
    /// `sqlite://recipes.db`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(StoreError::Database)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        info!(url = %url, "Connected to recipe database");
        Ok(Self { pool })
    }

    /// In-memory database, used by tests.
    pub async fn connect_in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    fn row_to_recipe(row: &SqliteRow) -> StoreResult<Recipe> {
        let id_raw: String = row.try_get("id")?;
        let platform_raw: String = row.try_get("platform")?;
        let status_raw: String = row.try_get("status")?;

        Ok(Recipe {
            id: RecipeId::parse(&id_raw)
                .ok_or_else(|| StoreError::corrupt(format!("bad recipe id: {id_raw}")))?,
            user_id: row.try_get("user_id")?,
            original_url: row.try_get("original_url")?,
            platform: Platform::parse(&platform_raw)
                .ok_or_else(|| StoreError::corrupt(format!("bad platform tag: {platform_raw}")))?,
            status: RecipeStatus::parse(&status_raw)
                .ok_or_else(|| StoreError::corrupt(format!("bad status tag: {status_raw}")))?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            notes: row.try_get("notes")?,
            thumbnail_url: row.try_get("thumbnail_url")?,
            video_url: row.try_get("video_url")?,
            prep_time_minutes: row
                .try_get::<Option<i64>, _>("prep_time_minutes")?
                .map(|v| v as u32),
            cook_time_minutes: row
                .try_get::<Option<i64>, _>("cook_time_minutes")?
                .map(|v| v as u32),
            servings: row.try_get("servings")?,
            cuisine: row.try_get("cuisine")?,
            is_favorite: row.try_get::<i64, _>("is_favorite")? != 0,
            error_message: row.try_get("error_message")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_ingredient(row: &SqliteRow) -> StoreResult<Ingredient> {
        let id_raw: String = row.try_get("recipe_id")?;
        Ok(Ingredient {
            recipe_id: RecipeId::parse(&id_raw)
                .ok_or_else(|| StoreError::corrupt(format!("bad recipe id: {id_raw}")))?,
            order_index: row.try_get::<i64, _>("order_index")? as u32,
            quantity: row.try_get("quantity")?,
            unit: row.try_get("unit")?,
            item: row.try_get("item")?,
            raw_text: row.try_get("raw_text")?,
        })
    }

    fn row_to_instruction(row: &SqliteRow) -> StoreResult<Instruction> {
        let id_raw: String = row.try_get("recipe_id")?;
        Ok(Instruction {
            recipe_id: RecipeId::parse(&id_raw)
                .ok_or_else(|| StoreError::corrupt(format!("bad recipe id: {id_raw}")))?,
            step_number: row.try_get::<i64, _>("step_number")? as u32,
            text: row.try_get("text")?,
        })
    }

    fn bind_update<'q>(
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        update: &'q RecipeUpdate,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        query
            .bind(update.status.map(|s| s.as_str()))
            .bind(&update.title)
            .bind(&update.description)
            .bind(&update.thumbnail_url)
            .bind(&update.video_url)
            .bind(update.prep_time_minutes.map(|v| v as i64))
            .bind(update.cook_time_minutes.map(|v| v as i64))
            .bind(update.servings)
            .bind(&update.cuisine)
            .bind(&update.error_message)
    }
}

#[async_trait]
impl RecipeStore for SqliteRecipeStore {
    async fn insert_recipe(&self, recipe: &Recipe) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO recipes \
             (id, user_id, original_url, platform, status, title, description, notes, \
              thumbnail_url, video_url, prep_time_minutes, cook_time_minutes, servings, \
              cuisine, is_favorite, error_message, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(recipe.id.to_string())
        .bind(&recipe.user_id)
        .bind(&recipe.original_url)
        .bind(recipe.platform.as_str())
        .bind(recipe.status.as_str())
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(&recipe.notes)
        .bind(&recipe.thumbnail_url)
        .bind(&recipe.video_url)
        .bind(recipe.prep_time_minutes.map(|v| v as i64))
        .bind(recipe.cook_time_minutes.map(|v| v as i64))
        .bind(recipe.servings)
        .bind(&recipe.cuisine)
        .bind(recipe.is_favorite as i64)
        .bind(&recipe.error_message)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_recipe(&self, id: RecipeId) -> StoreResult<Option<Recipe>> {
        let row = sqlx::query("SELECT * FROM recipes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_recipe).transpose()
    }

    async fn get_recipe_for_user(
        &self,
        id: RecipeId,
        user_id: &str,
    ) -> StoreResult<Option<Recipe>> {
        let row = sqlx::query("SELECT * FROM recipes WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_recipe).transpose()
    }

    async fn update_recipe(&self, id: RecipeId, update: RecipeUpdate) -> StoreResult<bool> {
        // COALESCE keeps existing values for unset fields; the WHERE
        // clause makes the update a no-op for deleted rows.
        let result = Self::bind_update(sqlx::query(UPDATE_SQL), &update)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn fail_if_not_terminal(&self, id: RecipeId, reason: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE recipes SET status = 'failed', error_message = ?, updated_at = ? \
             WHERE id = ? AND status NOT IN ('completed', 'failed')",
        )
        .bind(reason)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn complete_recipe(
        &self,
        id: RecipeId,
        update: RecipeUpdate,
        ingredients: Vec<Ingredient>,
        instructions: Vec<Instruction>,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let result = Self::bind_update(sqlx::query(UPDATE_SQL), &update)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM ingredients WHERE recipe_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM instructions WHERE recipe_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        for ingredient in &ingredients {
            sqlx::query(
                "INSERT INTO ingredients \
                 (recipe_id, order_index, quantity, unit, item, raw_text) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(id.to_string())
            .bind(ingredient.order_index as i64)
            .bind(ingredient.quantity)
            .bind(&ingredient.unit)
            .bind(&ingredient.item)
            .bind(&ingredient.raw_text)
            .execute(&mut *tx)
            .await?;
        }

        for instruction in &instructions {
            sqlx::query(
                "INSERT INTO instructions (recipe_id, step_number, text) VALUES (?, ?, ?)",
            )
            .bind(id.to_string())
            .bind(instruction.step_number as i64)
            .bind(&instruction.text)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn ingredients(&self, id: RecipeId) -> StoreResult<Vec<Ingredient>> {
        let rows = sqlx::query(
            "SELECT * FROM ingredients WHERE recipe_id = ? ORDER BY order_index",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_ingredient).collect()
    }

    async fn instructions(&self, id: RecipeId) -> StoreResult<Vec<Instruction>> {
        let rows = sqlx::query(
            "SELECT * FROM instructions WHERE recipe_id = ? ORDER BY step_number",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_instruction).collect()
    }

    async fn list_stale(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Recipe>> {
        let rows = sqlx::query(
            "SELECT * FROM recipes \
             WHERE status NOT IN ('completed', 'failed') AND updated_at < ? \
             ORDER BY updated_at",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_recipe).collect()
    }
}
