use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo::SignupStore;
use super::repo_types::EmailSignup;
use super::services::NewSignup;
use super::SignupError;
use crate::error::StoreError;

/// In-process [`SignupStore`]; enforces the unique email like the table does.
#[derive(Default)]
pub struct MemorySignupStore {
    rows: RwLock<Vec<EmailSignup>>,
}

impl MemorySignupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignupStore for MemorySignupStore {
    async fn create(&self, signup: NewSignup) -> Result<EmailSignup, SignupError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| r.email == signup.email()) {
            return Err(SignupError::AlreadyRegistered);
        }
        let row = EmailSignup {
            id: rows.len() as i64 + 1,
            email: signup.email().to_owned(),
            source: signup.source().to_owned(),
            status: "pending".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.rows.read().await.iter().any(|r| r.email == email))
    }

    async fn list(&self) -> Result<Vec<EmailSignup>, StoreError> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}
