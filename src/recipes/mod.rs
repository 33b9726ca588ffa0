pub mod controller;
pub mod draft;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod search;

use crate::state::AppState;
use axum::Router;

pub use memory::MemoryRecipeStore;
pub use repo::{PgRecipeStore, RecipeStore};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
