//! In-process [`RecipeStore`] with the same semantics as the Postgres one.
//!
//! Backs `AppState::fake()` and the controller tests. Individual operations
//! can be made to fail with [`MemoryRecipeStore::fail_on`] to exercise the
//! degraded paths.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use super::repo::RecipeStore;
use super::repo_types::{NewRecipe, Recipe, RecipePatch};
use super::search::{distinct_categories, SearchQuery};
use crate::error::{Operation, StoreError};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<Recipe>,
}

impl Table {
    fn newest_first(&self) -> Vec<Recipe> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }
}

#[derive(Default)]
pub struct MemoryRecipeStore {
    table: RwLock<Table>,
    failing: Mutex<HashSet<Operation>>,
    calls: Mutex<Vec<Operation>>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `op` fail until [`Self::recover`] is called.
    pub fn fail_on(&self, op: Operation) {
        self.failing.lock().unwrap_or_else(|p| p.into_inner()).insert(op);
    }

    pub fn recover(&self, op: Operation) {
        self.failing.lock().unwrap_or_else(|p| p.into_inner()).remove(&op);
    }

    /// Operations issued so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn enter(&self, op: Operation) -> Result<(), StoreError> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).push(op);
        if self.failing.lock().unwrap_or_else(|p| p.into_inner()).contains(&op) {
            return Err(StoreError::rejected(op, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        self.enter(Operation::ListRecipes)?;
        Ok(self.table.read().await.newest_first())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Recipe>, StoreError> {
        self.enter(Operation::GetRecipe)?;
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, data: NewRecipe) -> Result<Recipe, StoreError> {
        self.enter(Operation::CreateRecipe)?;
        data.validate()
            .map_err(|e| StoreError::rejected(Operation::CreateRecipe, e.to_string()))?;
        let data = data.normalized();
        let now = OffsetDateTime::now_utc();
        let mut table = self.table.write().await;
        table.next_id += 1;
        let recipe = Recipe {
            id: table.next_id,
            title: data.title,
            description: data.description,
            ingredients: data.ingredients,
            instructions: data.instructions,
            cook_time: data.cook_time,
            servings: data.servings,
            category: data.category,
            image_url: data.image_url,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(recipe.clone());
        Ok(recipe)
    }

    async fn update(&self, patch: RecipePatch) -> Result<Recipe, StoreError> {
        self.enter(Operation::UpdateRecipe)?;
        patch
            .validate()
            .map_err(|e| StoreError::rejected(Operation::UpdateRecipe, e.to_string()))?;
        let patch = patch.normalized();
        let mut table = self.table.write().await;
        let row = table
            .rows
            .iter_mut()
            .find(|r| r.id == patch.id)
            .ok_or_else(|| StoreError::no_match(Operation::UpdateRecipe, patch.id))?;
        patch.apply_to(row);
        let bumped = row.updated_at + Duration::microseconds(1);
        row.updated_at = OffsetDateTime::now_utc().max(bumped);
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.enter(Operation::DeleteRecipe)?;
        self.table.write().await.rows.retain(|r| r.id != id);
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Recipe>, StoreError> {
        self.enter(Operation::SearchRecipes)?;
        let table = self.table.read().await;
        Ok(table
            .newest_first()
            .into_iter()
            .filter(|r| query.matches(r))
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<String>, StoreError> {
        self.enter(Operation::ListCategories)?;
        let table = self.table.read().await;
        Ok(distinct_categories(
            table.rows.iter().map(|r| r.category.as_deref()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_recipe(title: &str) -> NewRecipe {
        NewRecipe {
            title: title.into(),
            description: None,
            ingredients: vec![],
            instructions: vec![],
            cook_time: None,
            servings: 1,
            category: None,
            image_url: None,
        }
    }

    fn with_category(title: &str, category: Option<&str>) -> NewRecipe {
        NewRecipe {
            category: category.map(Into::into),
            ..new_recipe(title)
        }
    }

    #[tokio::test]
    async fn create_then_list_contains_exactly_one_new_record() {
        let store = MemoryRecipeStore::new();
        let before = store.create(new_recipe("Toast")).await.unwrap();

        let input = NewRecipe {
            description: Some("fluffy".into()),
            ingredients: vec!["2 cups flour".into(), "".into(), "1 egg".into()],
            instructions: vec!["Mix".into(), "   ".into(), "Fry".into()],
            cook_time: Some("20 mins".into()),
            servings: 3,
            category: Some("Breakfast".into()),
            ..new_recipe("Pancakes")
        };
        let created = store.create(input).await.unwrap();
        assert_ne!(created.id, before.id);

        let all = store.list().await.unwrap();
        let matching: Vec<_> = all.iter().filter(|r| r.id == created.id).collect();
        assert_eq!(matching.len(), 1);
        let stored = matching[0];
        assert_eq!(stored.title, "Pancakes");
        assert_eq!(stored.description.as_deref(), Some("fluffy"));
        assert_eq!(stored.ingredients, vec!["2 cups flour", "1 egg"]);
        assert_eq!(stored.instructions, vec!["Mix", "Fry"]);
        assert_eq!(stored.cook_time.as_deref(), Some("20 mins"));
        assert_eq!(stored.servings, 3);
        assert_eq!(stored.category.as_deref(), Some("Breakfast"));
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryRecipeStore::new();
        let a = store.create(new_recipe("first")).await.unwrap();
        let b = store.create(new_recipe("second")).await.unwrap();
        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn get_by_id_returns_none_for_missing_row() {
        let store = MemoryRecipeStore::new();
        assert!(store.get_by_id(99).await.unwrap().is_none());
        let r = store.create(new_recipe("Soup")).await.unwrap();
        assert_eq!(store.get_by_id(r.id).await.unwrap(), Some(r));
    }

    #[tokio::test]
    async fn update_is_partial_and_bumps_updated_at() {
        let store = MemoryRecipeStore::new();
        let original = store
            .create(NewRecipe {
                description: Some("slow cooked".into()),
                servings: 4,
                ..new_recipe("Stew")
            })
            .await
            .unwrap();

        let mut patch = RecipePatch::new(original.id);
        patch.title = Some("Beef Stew".into());
        let updated = store.update(patch).await.unwrap();

        assert_eq!(updated.title, "Beef Stew");
        assert_eq!(updated.description, original.description);
        assert_eq!(updated.servings, original.servings);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at > original.updated_at);

        let again = store.update(RecipePatch::new(original.id)).await.unwrap();
        assert!(again.updated_at > updated.updated_at);
    }

    #[tokio::test]
    async fn update_of_missing_id_is_an_error() {
        let store = MemoryRecipeStore::new();
        let err = store.update(RecipePatch::new(404)).await.unwrap_err();
        assert_eq!(err.operation, Operation::UpdateRecipe);
        assert!(err.is_no_match());
    }

    #[tokio::test]
    async fn whitespace_only_title_is_rejected_by_the_store() {
        let store = MemoryRecipeStore::new();
        let err = store.create(new_recipe("\t \n")).await.unwrap_err();
        assert_eq!(err.operation, Operation::CreateRecipe);
        assert!(!err.is_no_match());

        let r = store.create(new_recipe("Soup")).await.unwrap();
        let mut patch = RecipePatch::new(r.id);
        patch.title = Some("\t".into());
        assert!(store.update(patch).await.is_err());
        assert!(store.list().await.unwrap().iter().all(|r| r.title == "Soup"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryRecipeStore::new();
        let r = store.create(new_recipe("Gone")).await.unwrap();
        store.delete(r.id).await.unwrap();
        store.delete(r.id).await.unwrap();
        store.delete(12345).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_search_equals_list() {
        let store = MemoryRecipeStore::new();
        for t in ["a", "b", "c"] {
            store.create(new_recipe(t)).await.unwrap();
        }
        let listed = store.list().await.unwrap();
        let searched = store.search(&SearchQuery::default()).await.unwrap();
        assert_eq!(listed, searched);
    }

    #[tokio::test]
    async fn search_by_term() {
        let store = MemoryRecipeStore::new();
        store.create(new_recipe("Pasta Primavera")).await.unwrap();
        store.create(new_recipe("Beef Stew")).await.unwrap();
        let hits = store.search(&SearchQuery::new("pasta", None)).await.unwrap();
        let titles: Vec<&str> = hits.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Pasta Primavera"]);
    }

    #[tokio::test]
    async fn categories_are_distinct_and_case_sensitive() {
        let store = MemoryRecipeStore::new();
        for (t, c) in [
            ("a", Some("Italian")),
            ("b", Some("italian")),
            ("c", None),
            ("d", Some("Dessert")),
        ] {
            store.create(with_category(t, c)).await.unwrap();
        }
        let cats = store.list_categories().await.unwrap();
        assert_eq!(cats, vec!["Dessert", "Italian", "italian"]);
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_store_error() {
        let store = MemoryRecipeStore::new();
        store.fail_on(Operation::ListRecipes);
        let err = store.list().await.unwrap_err();
        assert_eq!(err.operation, Operation::ListRecipes);

        store.recover(Operation::ListRecipes);
        assert!(store.list().await.is_ok());
        assert_eq!(
            store.calls(),
            vec![Operation::ListRecipes, Operation::ListRecipes]
        );
    }
}
