//! Query matching for autocomplete candidates

use std::fmt;
use std::sync::Arc;

use crate::models::Record;

/// Turns a candidate into the text shown (and matched) for it
pub type Renderer<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Decides which candidates a free-text query selects.
///
/// A candidate matches when any lookup field contains the query as a
/// case-insensitive substring. Lookup fields default to the display field.
/// When a renderer is set it replaces the per-field text for every lookup
/// field, so the rendered label is what gets matched.
pub struct OptionMatcher<T> {
    field: String,
    filter_by: Vec<String>,
    renderer: Option<Renderer<T>>,
}

impl<T> Clone for OptionMatcher<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            filter_by: self.filter_by.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

impl<T> fmt::Debug for OptionMatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionMatcher")
            .field("field", &self.field)
            .field("filter_by", &self.filter_by)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl<T: Record> OptionMatcher<T> {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            filter_by: Vec::new(),
            renderer: None,
        }
    }

    pub fn with_filter_by(mut self, fields: &[&str]) -> Self {
        self.filter_by = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Label shown for a candidate in the input and the dropdown
    pub fn label(&self, item: &T) -> String {
        self.text_for(item, &self.field)
    }

    fn text_for(&self, item: &T, key: &str) -> String {
        match &self.renderer {
            Some(render) => render(item),
            None => item.field(key).unwrap_or_default(),
        }
    }

    fn lookup_fields(&self) -> impl Iterator<Item = &str> {
        let fields: &[String] = if self.filter_by.is_empty() {
            std::slice::from_ref(&self.field)
        } else {
            &self.filter_by
        };
        fields.iter().map(String::as_str)
    }

    pub fn matches(&self, query: &str, item: &T) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.lookup_fields()
            .any(|key| self.text_for(item, key).to_lowercase().contains(&needle))
    }

    /// Indices of the matching candidates, in their original order
    pub fn filter(&self, query: &str, candidates: &[T]) -> Vec<usize> {
        candidates
            .iter()
            .enumerate()
            .filter(|(_, item)| self.matches(query, item))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;
    use proptest::prelude::*;

    fn patient(id: &str, name: &str, cpf: &str) -> Patient {
        Patient {
            id: id.to_string(),
            name: name.to_string(),
            cpf: cpf.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_typing_filters_by_display_field() {
        let options = vec![patient("1", "Ana", "111"), patient("2", "Bia", "222")];
        let matcher = OptionMatcher::new("name");
        assert_eq!(matcher.filter("an", &options), vec![0]);
        assert_eq!(matcher.filter("AN", &options), vec![0]);
        assert_eq!(matcher.filter("zz", &options), Vec::<usize>::new());
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let options = vec![patient("1", "Ana", "111"), patient("2", "Bia", "222")];
        let matcher = OptionMatcher::new("name");
        assert_eq!(matcher.filter("", &options), vec![0, 1]);
    }

    #[test]
    fn test_any_lookup_field_matches() {
        let options = vec![patient("1", "Ana", "123"), patient("2", "Bia", "456")];
        let matcher = OptionMatcher::new("name").with_filter_by(&["name", "cpf"]);
        assert_eq!(matcher.filter("45", &options), vec![1]);
        assert_eq!(matcher.filter("bi", &options), vec![1]);
        assert_eq!(matcher.filter("a", &options), vec![0, 1]);
    }

    #[test]
    fn test_renderer_overrides_field_text() {
        let options = vec![patient("1", "Ana", "123"), patient("2", "Bia", "456")];
        let matcher = OptionMatcher::new("name")
            .with_renderer(|p: &Patient| format!("{} ({})", p.name, p.cpf));
        assert_eq!(matcher.label(&options[0]), "Ana (123)");
        assert_eq!(matcher.filter("(456", &options), vec![1]);
    }

    #[test]
    fn test_missing_field_never_matches_non_empty_query() {
        let options = vec![patient("1", "", "")];
        let matcher = OptionMatcher::new("name");
        assert!(matcher.filter("a", &options).is_empty());
        assert_eq!(matcher.label(&options[0]), "");
    }

    #[test]
    fn test_case_insensitive_for_accented_text() {
        let options = vec![patient("1", "JOÃO", "1")];
        let matcher = OptionMatcher::new("name");
        assert_eq!(matcher.filter("joão", &options), vec![0]);
    }

    fn names() -> impl Strategy<Value = Vec<Patient>> {
        prop::collection::vec("[A-Za-z ]{0,8}", 0..12).prop_map(|names| {
            names
                .into_iter()
                .enumerate()
                .map(|(i, n)| patient(&i.to_string(), &n, &format!("{:03}", i)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_result_is_ordered_subsequence(query in "[a-zA-Z]{0,3}", options in names()) {
            let matcher = OptionMatcher::new("name").with_filter_by(&["name", "cpf"]);
            let picked = matcher.filter(&query, &options);
            prop_assert!(picked.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(picked.iter().all(|&i| i < options.len()));
        }

        #[test]
        fn prop_empty_query_is_identity(options in names()) {
            let matcher = OptionMatcher::new("name");
            let all: Vec<usize> = (0..options.len()).collect();
            prop_assert_eq!(matcher.filter("", &options), all);
        }

        #[test]
        fn prop_match_equals_any_field_contains(query in "[a-zA-Z0-9]{1,3}", options in names()) {
            let matcher = OptionMatcher::new("name").with_filter_by(&["name", "cpf"]);
            let needle = query.to_lowercase();
            let expected: Vec<usize> = options
                .iter()
                .enumerate()
                .filter(|(_, p)| {
                    p.name.to_lowercase().contains(&needle) || p.cpf.to_lowercase().contains(&needle)
                })
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(matcher.filter(&query, &options), expected);
        }
    }
}
