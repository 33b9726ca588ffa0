//! Client-side orchestration over a [`RecipeStore`].
//!
//! The controller keeps the authoritative recipe list and derives the visible
//! subset from the search term and the selected category. Every operation
//! takes `&mut self`, so store calls are issued one at a time and a reload
//! always follows the mutation it reflects. State is written only after the
//! awaited store call returns: dropping an in-flight future leaves the
//! previous state untouched and the loading flag lowered.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::draft::Draft;
use super::repo::RecipeStore;
use super::repo_types::Recipe;
use super::search::SearchQuery;
use crate::error::{StoreError, ValidationError};

const LOAD_FAILED: &str = "Failed to load recipes";
const FILTER_FAILED: &str = "Failed to filter recipes";
const SAVE_FAILED: &str = "Failed to save recipe";
const DELETE_FAILED: &str = "Failed to delete recipe";

/// Out-of-band confirmation asked for before a recipe is deleted.
#[async_trait]
pub trait DeleteConfirmation: Send + Sync {
    async fn confirm_delete(&self, id: i64) -> bool;
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

pub struct RecipeListController {
    store: Arc<dyn RecipeStore>,
    all: Vec<Recipe>,
    categories: Vec<String>,
    query: SearchQuery,
    visible: Vec<Recipe>,
    draft: Draft,
    notice: Option<String>,
    loading: bool,
}

impl RecipeListController {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self {
            store,
            all: Vec::new(),
            categories: Vec::new(),
            query: SearchQuery::default(),
            visible: Vec::new(),
            draft: Draft::default(),
            notice: None,
            loading: false,
        }
    }

    pub fn all_recipes(&self) -> &[Recipe] {
        &self.all
    }

    pub fn visible(&self) -> &[Recipe] {
        &self.visible
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn search_term(&self) -> &str {
        &self.query.term
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.query.category()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Fetches the full list and the category vocabulary, then re-derives
    /// the visible subset. A failed list keeps the previous one.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<(), StoreError> {
        let loading = LoadingFlag::raise(&mut self.loading);
        let all = match self.store.list().await {
            Ok(all) => all,
            Err(e) => {
                warn!(error = %e, "recipe load failed");
                self.notice = Some(LOAD_FAILED.into());
                return Err(e);
            }
        };
        let categories = match self.store.list_categories().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "category load failed; showing none");
                Vec::new()
            }
        };
        let (visible, notice) = derive_visible(self.store.as_ref(), &self.query, &all).await;
        drop(loading);

        self.all = all;
        self.categories = categories;
        self.set_view(visible, notice);
        Ok(())
    }

    pub async fn set_search_term(&mut self, term: impl Into<String>) {
        let query = SearchQuery {
            term: term.into(),
            ..self.query.clone()
        };
        self.apply_query(query).await;
    }

    pub async fn set_category(&mut self, category: Option<String>) {
        let query = SearchQuery {
            category,
            ..self.query.clone()
        };
        self.apply_query(query).await;
    }

    async fn apply_query(&mut self, query: SearchQuery) {
        let (visible, notice) = derive_visible(self.store.as_ref(), &query, &self.all).await;
        self.query = query;
        self.set_view(visible, notice);
    }

    fn set_view(&mut self, visible: Vec<Recipe>, notice: Option<String>) {
        self.visible = visible;
        if notice.is_some() {
            self.notice = notice;
        }
    }

    /// Switches the draft to edit a recipe from the current list.
    pub fn start_edit(&mut self, id: i64) -> bool {
        match self.all.iter().find(|r| r.id == id) {
            Some(recipe) => {
                self.draft = Draft::editing(recipe);
                true
            }
            None => false,
        }
    }

    pub fn cancel_draft(&mut self) {
        self.draft = Draft::default();
    }

    /// Creates or updates from the draft. On failure the draft is kept.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Result<Recipe, SubmitError> {
        if let Err(e) = self.draft.form().validate() {
            self.notice = Some(e.to_string());
            return Err(e.into());
        }

        let saved = match &self.draft {
            Draft::New(form) => self.store.create(form.to_new_recipe()).await,
            Draft::Editing(id, form) => self.store.update(form.to_patch(*id)).await,
        };
        let saved = match saved {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "recipe save failed; keeping draft");
                self.notice = Some(SAVE_FAILED.into());
                return Err(e.into());
            }
        };
        info!(id = saved.id, "recipe saved");

        if let Err(e) = self.load().await {
            warn!(error = %e, id = saved.id, "reload after save failed");
        }
        self.draft = Draft::default();
        Ok(saved)
    }

    #[instrument(skip(self, confirm))]
    pub async fn delete(
        &mut self,
        id: i64,
        confirm: &dyn DeleteConfirmation,
    ) -> Result<DeleteOutcome, StoreError> {
        if !confirm.confirm_delete(id).await {
            return Ok(DeleteOutcome::Declined);
        }
        if let Err(e) = self.store.delete(id).await {
            warn!(error = %e, id, "recipe delete failed");
            self.notice = Some(DELETE_FAILED.into());
            return Err(e);
        }
        info!(id, "recipe deleted");

        if self.draft.editing_id() == Some(id) {
            self.draft = Draft::default();
        }
        if let Err(e) = self.load().await {
            warn!(error = %e, id, "reload after delete failed");
        }
        Ok(DeleteOutcome::Deleted)
    }
}

/// Holds `loading` up for the duration of a load, including one whose
/// future is dropped before it completes.
struct LoadingFlag<'a>(&'a mut bool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

/// Unfiltered views reuse `all` without a store call; filtered views are
/// re-queried and fall back to `all` (with a notice) when the query fails.
async fn derive_visible(
    store: &dyn RecipeStore,
    query: &SearchQuery,
    all: &[Recipe],
) -> (Vec<Recipe>, Option<String>) {
    if query.is_unfiltered() {
        return (all.to_vec(), None);
    }
    match store.search(query).await {
        Ok(found) => (found, None),
        Err(e) => {
            warn!(error = %e, "recipe search failed; showing unfiltered list");
            (all.to_vec(), Some(FILTER_FAILED.into()))
        }
    }
}
