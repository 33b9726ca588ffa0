use std::collections::BTreeSet;

use serde::Deserialize;

use super::repo_types::Recipe;

/// Free-text term plus optional category. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchQuery {
    #[serde(default, rename = "q")]
    pub term: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, category: Option<String>) -> Self {
        Self {
            term: term.into(),
            category,
        }
    }

    pub fn term(&self) -> Option<&str> {
        Some(self.term.as_str()).filter(|t| !t.is_empty())
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_unfiltered(&self) -> bool {
        self.term().is_none() && self.category().is_none()
    }

    /// Title or description contains the term (case-insensitive), AND the
    /// category is an exact, case-sensitive match.
    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(term) = self.term() {
            let needle = term.to_lowercase();
            let hit = recipe.title.to_lowercase().contains(&needle)
                || recipe
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        match self.category() {
            Some(cat) => recipe.category.as_deref() == Some(cat),
            None => true,
        }
    }
}

/// `%term%` for ILIKE with `\`, `%` and `_` escaped so the term matches literally.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

/// Distinct non-empty categories in lexical order.
pub fn distinct_categories<'a, I>(categories: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    categories
        .into_iter()
        .flatten()
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
