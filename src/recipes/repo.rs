use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use super::repo_types::{NewRecipe, Recipe, RecipePatch};
use super::search::{distinct_categories, like_pattern, SearchQuery};
use crate::error::{Operation, StoreError};

/// Data-access contract for the `recipes` table.
///
/// `get_by_id` reports a missing row as `Ok(None)`; `update` reports it as an
/// error. `delete` of a missing row succeeds.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Recipe>, StoreError>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Recipe>, StoreError>;
    async fn create(&self, data: NewRecipe) -> Result<Recipe, StoreError>;
    async fn update(&self, patch: RecipePatch) -> Result<Recipe, StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Recipe>, StoreError>;
    async fn list_categories(&self) -> Result<Vec<String>, StoreError>;
}

const RECIPE_COLUMNS: &str = "id, title, description, ingredients, instructions, cook_time, \
                              servings, category, image_url, created_at, updated_at";

const NEWEST_FIRST: &str = " ORDER BY created_at DESC, id DESC";

#[derive(Clone)]
pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes{NEWEST_FIRST}");
        sqlx::query_as::<_, Recipe>(&sql)
            .fetch_all(&self.db)
            .await
            .map_err(|e| StoreError::new(Operation::ListRecipes, e))
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<Option<Recipe>, StoreError> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1");
        sqlx::query_as::<_, Recipe>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| StoreError::new(Operation::GetRecipe, e))
    }

    #[instrument(skip(self, data), fields(title = %data.title))]
    async fn create(&self, data: NewRecipe) -> Result<Recipe, StoreError> {
        data.validate()
            .map_err(|e| StoreError::rejected(Operation::CreateRecipe, e.to_string()))?;
        let data = data.normalized();
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            "INSERT INTO recipes (title, description, ingredients, instructions, cook_time, \
                                  servings, category, image_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
             RETURNING {RECIPE_COLUMNS}"
        );
        let recipe = sqlx::query_as::<_, Recipe>(&sql)
            .bind(data.title)
            .bind(data.description)
            .bind(data.ingredients)
            .bind(data.instructions)
            .bind(data.cook_time)
            .bind(data.servings)
            .bind(data.category)
            .bind(data.image_url)
            .bind(now)
            .fetch_one(&self.db)
            .await
            .map_err(|e| StoreError::new(Operation::CreateRecipe, e))?;
        debug!(id = recipe.id, "recipe created");
        Ok(recipe)
    }

    #[instrument(skip(self, patch), fields(id = patch.id))]
    async fn update(&self, patch: RecipePatch) -> Result<Recipe, StoreError> {
        let id = patch.id;
        patch
            .validate()
            .map_err(|e| StoreError::rejected(Operation::UpdateRecipe, e.to_string()))?;
        let mut qb = update_query(patch.normalized(), OffsetDateTime::now_utc());
        qb.build_query_as::<Recipe>()
            .fetch_optional(&self.db)
            .await
            .map_err(|e| StoreError::new(Operation::UpdateRecipe, e))?
            .ok_or_else(|| StoreError::no_match(Operation::UpdateRecipe, id))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| StoreError::new(Operation::DeleteRecipe, e))?;
        debug!(id, removed = res.rows_affected(), "recipe delete");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Recipe>, StoreError> {
        let mut qb = search_query(query);
        qb.build_query_as::<Recipe>()
            .fetch_all(&self.db)
            .await
            .map_err(|e| StoreError::new(Operation::SearchRecipes, e))
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM recipes WHERE category IS NOT NULL",
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::new(Operation::ListCategories, e))?;
        Ok(distinct_categories(rows.iter().map(|c| Some(c.as_str()))))
    }
}

/// `UPDATE` touching only the supplied columns. `updated_at` is bumped to
/// `now`, or one microsecond past the stored value if the clock has not moved.
fn update_query(patch: RecipePatch, now: OffsetDateTime) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE recipes SET updated_at = GREATEST(");
    qb.push_bind(now)
        .push(", updated_at + interval '1 microsecond')");

    if let Some(v) = patch.title {
        qb.push(", title = ").push_bind(v);
    }
    if let Some(v) = patch.description {
        qb.push(", description = ").push_bind(v);
    }
    if let Some(v) = patch.ingredients {
        qb.push(", ingredients = ").push_bind(v);
    }
    if let Some(v) = patch.instructions {
        qb.push(", instructions = ").push_bind(v);
    }
    if let Some(v) = patch.cook_time {
        qb.push(", cook_time = ").push_bind(v);
    }
    if let Some(v) = patch.servings {
        qb.push(", servings = ").push_bind(v);
    }
    if let Some(v) = patch.category {
        qb.push(", category = ").push_bind(v);
    }
    if let Some(v) = patch.image_url {
        qb.push(", image_url = ").push_bind(v);
    }

    qb.push(" WHERE id = ").push_bind(patch.id);
    qb.push(" RETURNING ").push(RECIPE_COLUMNS);
    qb
}

fn search_query(query: &SearchQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE TRUE"));
    if let Some(term) = query.term() {
        let pattern = like_pattern(term);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = query.category() {
        qb.push(" AND category = ").push_bind(category.to_owned());
    }
    qb.push(NEWEST_FIRST);
    qb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_query_sets_only_supplied_columns() {
        let mut patch = RecipePatch::new(7);
        patch.title = Some("Soup".into());
        patch.category = Some(None);
        let qb = update_query(patch, OffsetDateTime::now_utc());
        let sql = qb.sql();

        assert!(sql.starts_with("UPDATE recipes SET updated_at = GREATEST($1"));
        assert!(sql.contains("title = $2"));
        assert!(sql.contains("category = $3"));
        assert!(sql.contains("WHERE id = $4"));
        assert!(!sql.contains("description ="));
        assert!(!sql.contains("created_at ="));
        assert!(!sql.contains("servings ="));
    }

    #[test]
    fn unfiltered_search_is_the_plain_list_query() {
        let qb = search_query(&SearchQuery::default());
        assert_eq!(
            qb.sql(),
            format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE TRUE{NEWEST_FIRST}")
        );
    }

    #[test]
    fn search_query_adds_term_and_category_filters() {
        let qb = search_query(&SearchQuery::new("pasta", Some("Italian".into())));
        let sql = qb.sql();
        assert!(sql.contains("(title ILIKE $1 OR description ILIKE $2)"));
        assert!(sql.contains("AND category = $3"));
        assert!(sql.ends_with(NEWEST_FIRST));
    }

    #[test]
    fn empty_category_adds_no_filter() {
        let qb = search_query(&SearchQuery::new("", Some(String::new())));
        assert!(!qb.sql().contains("category ="));
    }
}
