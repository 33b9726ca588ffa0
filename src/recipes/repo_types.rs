use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::ValidationError;

/// Recipe record as stored in the `recipes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub ingredients: Vec<String>,  // ordered, rendered as a list
    pub instructions: Vec<String>, // ordered, rendered as numbered steps
    pub cook_time: Option<String>,
    pub servings: i32,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Create input: everything but the store-owned `id` and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub cook_time: Option<String>,
    #[serde(default = "default_servings")]
    pub servings: i32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

pub(crate) fn default_servings() -> i32 {
    1
}

impl NewRecipe {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.servings < 1 {
            return Err(ValidationError::ServingsBelowOne(self.servings));
        }
        Ok(())
    }

    /// Drops whitespace-only ingredient and instruction lines.
    pub fn normalized(mut self) -> Self {
        self.ingredients = drop_blank_lines(self.ingredients);
        self.instructions = drop_blank_lines(self.instructions);
        self
    }
}

/// Partial update keyed by `id`. `None` leaves the stored value alone; for
/// nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecipePatch {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub instructions: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cook_time: Option<Option<String>>,
    #[serde(default)]
    pub servings: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

impl RecipePatch {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyTitle);
            }
        }
        if let Some(servings) = self.servings {
            if servings < 1 {
                return Err(ValidationError::ServingsBelowOne(servings));
            }
        }
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.ingredients = self.ingredients.map(drop_blank_lines);
        self.instructions = self.instructions.map(drop_blank_lines);
        self
    }

    /// Writes the supplied fields onto `recipe`. Timestamps are not touched.
    pub fn apply_to(&self, recipe: &mut Recipe) {
        if let Some(v) = &self.title {
            recipe.title = v.clone();
        }
        if let Some(v) = &self.description {
            recipe.description = v.clone();
        }
        if let Some(v) = &self.ingredients {
            recipe.ingredients = v.clone();
        }
        if let Some(v) = &self.instructions {
            recipe.instructions = v.clone();
        }
        if let Some(v) = &self.cook_time {
            recipe.cook_time = v.clone();
        }
        if let Some(v) = self.servings {
            recipe.servings = v;
        }
        if let Some(v) = &self.category {
            recipe.category = v.clone();
        }
        if let Some(v) = &self.image_url {
            recipe.image_url = v.clone();
        }
    }
}

pub fn drop_blank_lines(lines: Vec<String>) -> Vec<String> {
    lines.into_iter().filter(|l| !l.trim().is_empty()).collect()
}

// Present-but-null becomes Some(None); absent stays None via `default`.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_new() -> NewRecipe {
        NewRecipe {
            title: "Pancakes".into(),
            description: None,
            ingredients: vec!["2 cups flour".into(), "".into(), "  ".into(), "1 egg".into()],
            instructions: vec!["\t".into(), "Mix".into()],
            cook_time: Some("20 mins".into()),
            servings: 2,
            category: Some("Breakfast".into()),
            image_url: None,
        }
    }

    #[test]
    fn normalized_drops_blank_lines_and_keeps_order() {
        let r = sample_new().normalized();
        assert_eq!(r.ingredients, vec!["2 cups flour", "1 egg"]);
        assert_eq!(r.instructions, vec!["Mix"]);
    }

    #[test]
    fn validate_rejects_blank_title_and_zero_servings() {
        let mut r = sample_new();
        r.title = "   ".into();
        assert_eq!(r.validate(), Err(ValidationError::EmptyTitle));

        let mut r = sample_new();
        r.servings = 0;
        assert_eq!(r.validate(), Err(ValidationError::ServingsBelowOne(0)));

        assert!(sample_new().validate().is_ok());
    }

    #[test]
    fn new_recipe_servings_default_to_one() {
        let r: NewRecipe = serde_json::from_str(r#"{"title":"Toast"}"#).unwrap();
        assert_eq!(r.servings, 1);
        assert!(r.ingredients.is_empty());
    }

    #[test]
    fn patch_distinguishes_missing_from_null() {
        let p: RecipePatch =
            serde_json::from_str(r#"{"id":3,"description":null,"servings":4}"#).unwrap();
        assert_eq!(p.id, 3);
        assert_eq!(p.description, Some(None));
        assert_eq!(p.category, None);
        assert_eq!(p.servings, Some(4));
    }

    #[test]
    fn patch_apply_only_touches_supplied_fields() {
        let now = OffsetDateTime::now_utc();
        let mut recipe = Recipe {
            id: 1,
            title: "Stew".into(),
            description: Some("hearty".into()),
            ingredients: vec!["beef".into()],
            instructions: vec!["simmer".into()],
            cook_time: None,
            servings: 4,
            category: Some("Dinner".into()),
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        let mut patch = RecipePatch::new(1);
        patch.title = Some("Beef Stew".into());
        patch.category = Some(None);
        patch.apply_to(&mut recipe);

        assert_eq!(recipe.title, "Beef Stew");
        assert_eq!(recipe.category, None);
        assert_eq!(recipe.description.as_deref(), Some("hearty"));
        assert_eq!(recipe.servings, 4);
    }

    #[test]
    fn patch_validate_checks_only_present_fields() {
        assert!(RecipePatch::new(1).validate().is_ok());
        let mut p = RecipePatch::new(1);
        p.servings = Some(-1);
        assert_eq!(p.validate(), Err(ValidationError::ServingsBelowOne(-1)));
    }
}
