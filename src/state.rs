use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DbConfig;
use crate::recipes::{MemoryRecipeStore, PgRecipeStore, RecipeStore};
use crate::signups::{MemorySignupStore, PgSignupStore, SignupStore};

#[derive(Clone)]
pub struct AppState {
    pub recipes: Arc<dyn RecipeStore>,
    pub signups: Arc<dyn SignupStore>,
}

impl AppState {
    pub async fn connect(db: &DbConfig) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(db.max_connections)
            .acquire_timeout(db.acquire_timeout())
            .connect(&db.url)
            .await?;
        Ok(pool)
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self {
            recipes: Arc::new(PgRecipeStore::new(db.clone())),
            signups: Arc::new(PgSignupStore::new(db)),
        }
    }

    pub fn from_parts(recipes: Arc<dyn RecipeStore>, signups: Arc<dyn SignupStore>) -> Self {
        Self { recipes, signups }
    }

    /// In-memory stores only; no database needed.
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(MemoryRecipeStore::new()),
            Arc::new(MemorySignupStore::new()),
        )
    }
}
