use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::repo_types::{NewRecipe, Recipe, RecipePatch};
use super::search::SearchQuery;
use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/categories", get(list_categories))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

/// GET /recipes?q=&category=
#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = if query.is_unfiltered() {
        state.recipes.list().await?
    } else {
        state.recipes.search(&query).await?
    };
    Ok(Json(recipes))
}

/// GET /recipes/categories; an empty list when the lookup fails.
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    match state.recipes.list_categories().await {
        Ok(categories) => Json(categories),
        Err(e) => {
            warn!(error = %e, "category lookup failed; returning none");
            Json(Vec::new())
        }
    }
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Recipe>, ApiError> {
    state
        .recipes
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("recipe {id} not found")))
}

#[instrument(skip(state, body), fields(title = %body.title))]
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(body): Json<NewRecipe>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<Recipe>), ApiError> {
    body.validate()?;
    let recipe = state.recipes.create(body).await?;
    let location = format!("/api/v1/recipes/{}", recipe.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(recipe)))
}

/// PUT /recipes/:id; only the fields present in the body are written.
#[instrument(skip(state, patch))]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut patch): Json<RecipePatch>,
) -> Result<Json<Recipe>, ApiError> {
    patch.id = id;
    patch.validate()?;
    Ok(Json(state.recipes.update(patch).await?))
}

/// DELETE /recipes/:id; 204 whether or not the row existed.
#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.recipes.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
