use crate::error::ValidationError;

use super::repo_types::{default_servings, drop_blank_lines, NewRecipe, Recipe, RecipePatch};

/// Editable recipe form. Optional text fields are plain strings here; a
/// blank string means "no value".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeForm {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub cook_time: String,
    pub servings: i32,
    pub category: String,
    pub image_url: String,
}

impl Default for RecipeForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            ingredients: vec![String::new()],
            instructions: vec![String::new()],
            cook_time: String::new(),
            servings: default_servings(),
            category: String::new(),
            image_url: String::new(),
        }
    }
}

impl From<&Recipe> for RecipeForm {
    fn from(r: &Recipe) -> Self {
        Self {
            title: r.title.clone(),
            description: r.description.clone().unwrap_or_default(),
            ingredients: r.ingredients.clone(),
            instructions: r.instructions.clone(),
            cook_time: r.cook_time.clone().unwrap_or_default(),
            servings: r.servings,
            category: r.category.clone().unwrap_or_default(),
            image_url: r.image_url.clone().unwrap_or_default(),
        }
    }
}

/// Which list of lines a line edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineList {
    Ingredients,
    Instructions,
}

impl RecipeForm {
    fn lines_mut(&mut self, list: LineList) -> &mut Vec<String> {
        match list {
            LineList::Ingredients => &mut self.ingredients,
            LineList::Instructions => &mut self.instructions,
        }
    }

    pub fn add_line(&mut self, list: LineList) {
        self.lines_mut(list).push(String::new());
    }

    /// Returns false when `index` is out of range.
    pub fn set_line(&mut self, list: LineList, index: usize, value: impl Into<String>) -> bool {
        match self.lines_mut(list).get_mut(index) {
            Some(line) => {
                *line = value.into();
                true
            }
            None => false,
        }
    }

    /// Removes a line; the last remaining line cannot be removed.
    pub fn remove_line(&mut self, list: LineList, index: usize) -> bool {
        let lines = self.lines_mut(list);
        if lines.len() <= 1 || index >= lines.len() {
            return false;
        }
        lines.remove(index);
        true
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.servings < 1 {
            return Err(ValidationError::ServingsBelowOne(self.servings));
        }
        Ok(())
    }

    pub fn to_new_recipe(&self) -> NewRecipe {
        NewRecipe {
            title: self.title.clone(),
            description: non_blank(&self.description),
            ingredients: drop_blank_lines(self.ingredients.clone()),
            instructions: drop_blank_lines(self.instructions.clone()),
            cook_time: non_blank(&self.cook_time),
            servings: self.servings,
            category: non_blank(&self.category),
            image_url: non_blank(&self.image_url),
        }
    }

    /// Full-form patch: every field is written, blanks clear nullable columns.
    pub fn to_patch(&self, id: i64) -> RecipePatch {
        RecipePatch {
            id,
            title: Some(self.title.clone()),
            description: Some(non_blank(&self.description)),
            ingredients: Some(drop_blank_lines(self.ingredients.clone())),
            instructions: Some(drop_blank_lines(self.instructions.clone())),
            cook_time: Some(non_blank(&self.cook_time)),
            servings: Some(self.servings),
            category: Some(non_blank(&self.category)),
            image_url: Some(non_blank(&self.image_url)),
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_owned())
    }
}

/// In-progress form state: a new recipe or edits to an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    New(RecipeForm),
    Editing(i64, RecipeForm),
}

impl Default for Draft {
    fn default() -> Self {
        Draft::New(RecipeForm::default())
    }
}

impl Draft {
    pub fn editing(recipe: &Recipe) -> Self {
        Draft::Editing(recipe.id, RecipeForm::from(recipe))
    }

    pub fn form(&self) -> &RecipeForm {
        match self {
            Draft::New(form) | Draft::Editing(_, form) => form,
        }
    }

    pub fn form_mut(&mut self) -> &mut RecipeForm {
        match self {
            Draft::New(form) | Draft::Editing(_, form) => form,
        }
    }

    pub fn editing_id(&self) -> Option<i64> {
        match self {
            Draft::New(_) => None,
            Draft::Editing(id, _) => Some(*id),
        }
    }
}
