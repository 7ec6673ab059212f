use crate::models::{Drink, DrinkChanges, Ingredient, NewDrink};
use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool, types::Json};
use std::sync::Arc;
use thiserror::Error;

/// RepositoryError
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The `title` unique constraint rejected the write.
    #[error("a drink with this title already exists")]
    Conflict,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
            _ => RepositoryError::Database(error),
        }
    }
}

/// Repository Trait
///
/// Persistence contract for the drink menu. Handlers only ever see this trait, so the
/// SQLite implementation can be swapped for another store without touching them.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum's
/// task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn list_drinks(&self) -> Result<Vec<Drink>, RepositoryError>;
    async fn get_drink(&self, id: i64) -> Result<Option<Drink>, RepositoryError>;
    async fn insert_drink(&self, drink: NewDrink) -> Result<Drink, RepositoryError>;
    // `None` when no row has this id.
    async fn update_drink(
        &self,
        id: i64,
        changes: DrinkChanges,
    ) -> Result<Option<Drink>, RepositoryError>;
    // `false` when no row has this id.
    async fn delete_drink(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Creates the `drink` table if it does not exist yet. Existing rows are kept.
    async fn ensure_schema(&self) -> Result<(), RepositoryError>;

    /// Drops and recreates the `drink` table, then seeds it with a single drink.
    /// Every existing record is lost.
    async fn reset(&self) -> Result<(), RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const CREATE_DRINK_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS drink (
        id     INTEGER PRIMARY KEY AUTOINCREMENT,
        title  TEXT    NOT NULL UNIQUE,
        recipe TEXT    NOT NULL
    )
"#;

#[derive(FromRow)]
struct DrinkRow {
    id: i64,
    title: String,
    recipe: Json<Vec<Ingredient>>,
}

impl From<DrinkRow> for Drink {
    fn from(row: DrinkRow) -> Self {
        Drink {
            id: row.id,
            title: row.title,
            recipe: row.recipe.0,
        }
    }
}

/// The drink every fresh database starts with.
pub fn seed_drink() -> NewDrink {
    NewDrink {
        title: "water".to_string(),
        recipe: vec![Ingredient {
            name: "water".to_string(),
            color: "blue".to_string(),
            parts: 1,
        }],
    }
}

/// SqliteRepository
///
/// The `Repository` implementation backed by SQLite. The recipe is stored as JSON text
/// in a single column.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn list_drinks(&self) -> Result<Vec<Drink>, RepositoryError> {
        let rows = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drink ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Drink::from).collect())
    }

    async fn get_drink(&self, id: i64) -> Result<Option<Drink>, RepositoryError> {
        let row = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drink WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Drink::from))
    }

    async fn insert_drink(&self, drink: NewDrink) -> Result<Drink, RepositoryError> {
        let row = sqlx::query_as::<_, DrinkRow>(
            "INSERT INTO drink (title, recipe) VALUES (?, ?) RETURNING id, title, recipe",
        )
        .bind(drink.title)
        .bind(Json(drink.recipe))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Partial update: COALESCE keeps the stored value for every `None` field.
    async fn update_drink(
        &self,
        id: i64,
        changes: DrinkChanges,
    ) -> Result<Option<Drink>, RepositoryError> {
        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            UPDATE drink
            SET title = COALESCE(?, title),
                recipe = COALESCE(?, recipe)
            WHERE id = ?
            RETURNING id, title, recipe
            "#,
        )
        .bind(changes.title)
        .bind(changes.recipe.map(Json))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Drink::from))
    }

    async fn delete_drink(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM drink WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_DRINK_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    async fn reset(&self) -> Result<(), RepositoryError> {
        let seed = seed_drink();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DROP TABLE IF EXISTS drink")
            .execute(&mut *tx)
            .await?;
        sqlx::query(CREATE_DRINK_TABLE).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO drink (title, recipe) VALUES (?, ?)")
            .bind(seed.title)
            .bind(Json(seed.recipe))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("drink table reset and seeded");
        Ok(())
    }
}
