use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument};

use super::repo_types::EmailSignup;
use super::services::NewSignup;
use super::SignupError;
use crate::error::{Operation, StoreError};

#[async_trait]
pub trait SignupStore: Send + Sync {
    async fn create(&self, signup: NewSignup) -> Result<EmailSignup, SignupError>;
    async fn exists(&self, email: &str) -> Result<bool, StoreError>;
    /// Newest first; for admin use.
    async fn list(&self) -> Result<Vec<EmailSignup>, StoreError>;
}

const SIGNUP_COLUMNS: &str = "id, email, source, status, created_at";

#[derive(Clone)]
pub struct PgSignupStore {
    db: PgPool,
}

impl PgSignupStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SignupStore for PgSignupStore {
    #[instrument(skip(self, signup), fields(source = %signup.source()))]
    async fn create(&self, signup: NewSignup) -> Result<EmailSignup, SignupError> {
        let sql = format!(
            "INSERT INTO email_signups (email, source) VALUES ($1, $2) RETURNING {SIGNUP_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EmailSignup>(&sql)
            .bind(signup.email())
            .bind(signup.source())
            .fetch_one(&self.db)
            .await
            .map_err(|e| SignupError::from_store(StoreError::new(Operation::CreateSignup, e)))?;
        info!(id = row.id, "email signup stored");
        Ok(row)
    }

    #[instrument(skip(self, email))]
    async fn exists(&self, email: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM email_signups WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.db)
        .await
        .map_err(|e| StoreError::new(Operation::CheckSignup, e))
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<EmailSignup>, StoreError> {
        let sql = format!(
            "SELECT {SIGNUP_COLUMNS} FROM email_signups ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, EmailSignup>(&sql)
            .fetch_all(&self.db)
            .await
            .map_err(|e| StoreError::new(Operation::ListSignups, e))
    }
}
