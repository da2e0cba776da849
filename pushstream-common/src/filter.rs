//! Resolution of the user's metric selection against the catalog.

use crate::catalog::{Catalog, CatalogEntry, MetricKind};

/// The subset of catalog entries chosen for export.
///
/// Computed once at startup and never changed afterwards.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    entries: Vec<&'static CatalogEntry>,
    ignored: Vec<String>,
}

impl Selection {
    /// Resolve a comma-separated list of metric keys.
    ///
    /// Keys match exactly and case-sensitively, with no whitespace trimming.
    /// Unknown keys are remembered in [`Selection::ignored`] but are not an
    /// error, and an empty string selects nothing.
    pub fn parse(catalog: &Catalog, selection: &str) -> Self {
        if selection.is_empty() {
            return Self::default();
        }

        let requested: Vec<&str> = selection.split(',').collect();

        let entries = catalog
            .entries()
            .iter()
            .filter(|entry| requested.contains(&entry.key()))
            .collect();

        let mut ignored: Vec<String> = Vec::new();
        for key in requested {
            if key.is_empty() || catalog.get(key).is_some() {
                continue;
            }
            if !ignored.iter().any(|k| k == key) {
                ignored.push(key.to_string());
            }
        }

        Self { entries, ignored }
    }

    /// Every entry of the catalog.
    pub fn all(catalog: &Catalog) -> Self {
        Self {
            entries: catalog.entries().iter().collect(),
            ignored: Vec::new(),
        }
    }

    /// Selected entries, in catalog order.
    pub fn entries(&self) -> &[&'static CatalogEntry] {
        &self.entries
    }

    /// Requested keys that are not in the catalog.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn contains(&self, kind: MetricKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(selection: &Selection) -> Vec<MetricKind> {
        selection.entries().iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_default_selection_selects_everything() {
        let catalog = Catalog::standard();
        let selection = Selection::parse(&catalog, &catalog.default_selection());

        assert_eq!(selection.len(), 5);
        assert!(selection.ignored().is_empty());
        assert_eq!(kinds(&selection), kinds(&Selection::all(&catalog)));
    }

    #[test]
    fn test_empty_selection() {
        let catalog = Catalog::standard();
        let selection = Selection::parse(&catalog, "");

        assert!(selection.is_empty());
        assert!(selection.ignored().is_empty());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let catalog = Catalog::standard();
        let selection = Selection::parse(&catalog, "bogus_metric,subscribers,bogus_metric");

        assert_eq!(kinds(&selection), vec![MetricKind::Subscribers]);
        assert_eq!(selection.ignored(), &["bogus_metric".to_string()]);
    }

    #[test]
    fn test_selection_is_case_sensitive_and_untrimmed() {
        let catalog = Catalog::standard();
        let selection = Selection::parse(&catalog, "Channels, subscribers,stored_messages ");

        assert!(selection.is_empty());
        assert_eq!(selection.ignored().len(), 3);
    }

    #[test]
    fn test_selection_follows_catalog_order() {
        let catalog = Catalog::standard();
        let selection = Selection::parse(&catalog, "stored_messages,,channels");

        assert_eq!(
            kinds(&selection),
            vec![MetricKind::Channels, MetricKind::StoredMessages]
        );
        assert!(selection.contains(MetricKind::Channels));
        assert!(!selection.contains(MetricKind::SubscribersTotal));
        assert!(selection.ignored().is_empty());
    }
}
