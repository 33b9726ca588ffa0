use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::signups::SignupError;

/// Logical store call an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListRecipes,
    GetRecipe,
    CreateRecipe,
    UpdateRecipe,
    DeleteRecipe,
    SearchRecipes,
    ListCategories,
    CreateSignup,
    CheckSignup,
    ListSignups,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ListRecipes => "list recipes",
            Operation::GetRecipe => "get recipe",
            Operation::CreateRecipe => "create recipe",
            Operation::UpdateRecipe => "update recipe",
            Operation::DeleteRecipe => "delete recipe",
            Operation::SearchRecipes => "search recipes",
            Operation::ListCategories => "list categories",
            Operation::CreateSignup => "create signup",
            Operation::CheckSignup => "check signup",
            Operation::ListSignups => "list signups",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreCause {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("no row matches id {0}")]
    NoMatch(i64),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

/// Any transport failure, malformed response or backend rejection.
#[derive(Debug, Error)]
#[error("{operation} failed: {cause}")]
pub struct StoreError {
    pub operation: Operation,
    #[source]
    pub cause: StoreCause,
}

impl StoreError {
    pub fn new(operation: Operation, cause: impl Into<StoreCause>) -> Self {
        Self {
            operation,
            cause: cause.into(),
        }
    }

    pub fn no_match(operation: Operation, id: i64) -> Self {
        Self::new(operation, StoreCause::NoMatch(id))
    }

    pub fn rejected(operation: Operation, reason: impl Into<String>) -> Self {
        Self::new(operation, StoreCause::Rejected(reason.into()))
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self.cause, StoreCause::NoMatch(_))
    }

    /// SQLSTATE of the underlying database error, if there is one.
    pub fn db_code(&self) -> Option<String> {
        match &self.cause {
            StoreCause::Database(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
            _ => None,
        }
    }
}

/// Client-side checks run before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("servings must be at least 1, got {0}")]
    ServingsBelowOne(i32),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SignupError> for ApiError {
    fn from(e: SignupError) -> Self {
        match e {
            SignupError::InvalidEmail(_) => ApiError::BadRequest(e.to_string()),
            SignupError::AlreadyRegistered => ApiError::Conflict(e.to_string()),
            SignupError::TableMissing(inner) | SignupError::Store(inner) => ApiError::Store(inner),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            ApiError::Store(e) if e.is_no_match() => (StatusCode::NOT_FOUND, e.cause.to_string()),
            ApiError::Store(e) => {
                error!(error = %e, operation = %e.operation, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("failed to {}", e.operation),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_message_names_the_operation() {
        let err = StoreError::no_match(Operation::UpdateRecipe, 42);
        assert_eq!(err.to_string(), "update recipe failed: no row matches id 42");
        assert!(err.is_no_match());
        assert_eq!(err.db_code(), None);
    }

    #[test]
    fn no_match_maps_to_404_and_faults_to_500() {
        let res = ApiError::from(StoreError::no_match(Operation::UpdateRecipe, 1)).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = ApiError::from(StoreError::rejected(Operation::ListRecipes, "boom")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_maps_to_400() {
        let res = ApiError::from(ValidationError::ServingsBelowOne(0)).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn signup_errors_map_to_http_statuses() {
        let res = ApiError::from(SignupError::AlreadyRegistered).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = ApiError::from(SignupError::InvalidEmail("nope".into())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
