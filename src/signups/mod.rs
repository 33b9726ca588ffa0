//! Landing-page email signups.

pub mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

use axum::Router;
use thiserror::Error;

use crate::error::StoreError;
use crate::state::AppState;

pub use memory::MemorySignupStore;
pub use repo::{PgSignupStore, SignupStore};

const UNIQUE_VIOLATION: &str = "23505";
const UNDEFINED_TABLE: &str = "42P01";

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("This email is already registered!")]
    AlreadyRegistered,
    #[error("signup table is missing: {0}")]
    TableMissing(#[source] StoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SignupError {
    /// Classifies a failed insert by its SQLSTATE.
    pub fn from_store(e: StoreError) -> Self {
        match e.db_code().as_deref() {
            Some(UNIQUE_VIOLATION) => SignupError::AlreadyRegistered,
            Some(UNDEFINED_TABLE) => SignupError::TableMissing(e),
            _ => SignupError::Store(e),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
