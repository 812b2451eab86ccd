//! Catalogue service
//!
//! Builds a page tree from a declarative TOML catalogue. Every page is a
//! [`CataloguePage`] bound to one shared store; a page's `defaults` table is
//! registered in that store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::pages::CataloguePage;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{BlankPage, NodeId, PreferenceManager, PreferenceNode, SharedStore};
use crate::infrastructure::traits::FileSystem;

/// Parsed catalogue document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalogue {
    /// Title of the root page
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "page")]
    pub pages: Vec<PageEntry>,
}

/// One `[[page]]` entry, possibly with nested `[[page.children]]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Scalars only; numbers and booleans are stored in their TOML spelling
    #[serde(default)]
    pub defaults: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub children: Vec<PageEntry>,
}

impl Catalogue {
    /// Parse catalogue text; `path` only labels errors.
    pub fn parse(content: &str, path: &Path) -> ApplicationResult<Self> {
        toml::from_str(content).map_err(|e| ApplicationError::Catalogue {
            path: path.to_path_buf(),
            message: e.to_string().trim_end().to_string(),
        })
    }

    /// Number of pages at every depth.
    pub fn page_count(&self) -> usize {
        fn count(pages: &[PageEntry]) -> usize {
            pages.iter().map(|p| 1 + count(&p.children)).sum()
        }
        count(&self.pages)
    }
}

impl PageEntry {
    fn default_values(&self, path: &Path) -> ApplicationResult<BTreeMap<String, String>> {
        self.defaults
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(_) | toml::Value::Float(_) | toml::Value::Boolean(_) => {
                        value.to_string()
                    }
                    other => {
                        return Err(ApplicationError::Catalogue {
                            path: path.to_path_buf(),
                            message: format!(
                                "page {:?}: default {:?} must be a scalar, found {}",
                                self.id,
                                key,
                                other.type_str()
                            ),
                        })
                    }
                };
                Ok((key.clone(), text))
            })
            .collect()
    }
}

/// Service for turning catalogue files into managers.
pub struct CatalogueService {
    fs: Arc<dyn FileSystem>,
}

impl CatalogueService {
    /// Create a new catalogue service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Read and parse a catalogue file.
    pub fn load(&self, path: &Path) -> ApplicationResult<Catalogue> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read catalogue", path)?;
        Catalogue::parse(&content, path)
    }

    /// Read a catalogue file and build its manager around `store`.
    #[instrument(level = "debug", skip(self, path, store), fields(path = %path.display()))]
    pub fn build(&self, path: &Path, store: SharedStore) -> ApplicationResult<PreferenceManager> {
        let catalogue = self.load(path)?;
        Self::assemble(&catalogue, path, store)
    }

    /// Build a manager from an already parsed catalogue.
    ///
    /// Identifier problems (invalid pattern, duplicate sibling) surface as domain errors.
    pub fn assemble(
        catalogue: &Catalogue,
        path: &Path,
        store: SharedStore,
    ) -> ApplicationResult<PreferenceManager> {
        let root_page = BlankPage::new(catalogue.title.clone().unwrap_or_default()).shared();
        let mut manager = PreferenceManager::with_root_page(root_page).with_store(store.clone());
        let root = manager.root();

        let mut builder = TreeBuilder {
            manager: &mut manager,
            store: &store,
            path: path.to_path_buf(),
        };
        for entry in &catalogue.pages {
            builder.attach(root, entry)?;
        }

        debug!(
            "catalogue built: {} pages under {:?}",
            catalogue.page_count(),
            catalogue.title
        );
        Ok(manager)
    }
}

struct TreeBuilder<'a> {
    manager: &'a mut PreferenceManager,
    store: &'a SharedStore,
    path: PathBuf,
}

impl TreeBuilder<'_> {
    /// Defaults reach the store only once the page is in the tree.
    fn attach(&mut self, parent: NodeId, entry: &PageEntry) -> ApplicationResult<()> {
        let defaults = entry.default_values(&self.path)?;

        let page = CataloguePage::new(entry.title.as_str(), self.store.clone())
            .with_description(entry.description.clone().unwrap_or_default())
            .with_keys(defaults.keys().cloned())
            .shared();
        let mut node = PreferenceNode::new(&entry.id, page)?;
        if let Some(label) = &entry.label {
            node = node.with_label(label.as_str());
        }
        if let Some(icon) = &entry.icon {
            node = node.with_icon(icon.as_str());
        }

        let id = self.manager.add_node_to(parent, node)?;
        {
            let mut store = self.store.borrow_mut();
            for (key, value) in defaults {
                store.set_default(key, value);
            }
        }
        for child in &entry.children {
            self.attach(id, child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{shared, DomainError, PreferenceStore};

    const CATALOGUE: &str = r#"
title = "Preferences"

[[page]]
id = "general"
title = "General"
description = "General settings"
[page.defaults]
"general.width" = 600
"general.name" = "demo"

[[page.children]]
id = "display"
title = "Display"
label = "Screen"
icon = "icons/display.png"
[page.children.defaults]
"display.dark" = true

[[page]]
id = "about"
title = "About"
"#;

    fn build(content: &str) -> ApplicationResult<(PreferenceManager, SharedStore)> {
        let store = shared(PreferenceStore::new());
        let path = Path::new("pages.toml");
        let catalogue = Catalogue::parse(content, path)?;
        let manager = CatalogueService::assemble(&catalogue, path, store.clone())?;
        Ok((manager, store))
    }

    #[test]
    fn given_catalogue_when_assembling_then_tree_matches_document() {
        let (manager, _) = build(CATALOGUE).unwrap();
        let tree = manager.tree();

        let display = tree.find("root/general/display").expect("display page");
        let node = tree.node(display).unwrap();
        assert_eq!(node.label(), "Screen");
        assert_eq!(node.icon(), Some("icons/display.png"));
        assert_eq!(node.page().title(), "Display");
        assert!(tree.find("root/about").is_some());
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.node(tree.root()).unwrap().page().title(), "Preferences");
    }

    #[test]
    fn given_page_defaults_when_assembling_then_registered_in_store() {
        let (_, store) = build(CATALOGUE).unwrap();
        let store = store.borrow();

        assert_eq!(store.read("general.width"), Some("600"));
        assert_eq!(store.read("display.dark"), Some("true"));
        assert_eq!(store.read("general.name"), Some("demo"));
        assert!(!store.is_dirty());
    }

    #[test]
    fn given_duplicate_sibling_when_assembling_then_conflict_propagates() {
        let content = r#"
[[page]]
id = "a"
title = "A"

[[page]]
id = "a"
title = "Again"
"#;
        let err = build(content).unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::ConflictingIdentifier(_))
        ));
    }

    #[test]
    fn given_rejected_page_when_assembling_then_its_defaults_stay_out_of_store() {
        let content = r#"
[[page]]
id = "a"
title = "A"
[page.defaults]
"a.width" = 600

[[page]]
id = "a"
title = "Again"
[page.defaults]
"again.width" = 800
"#;
        let store = shared(PreferenceStore::new());
        let path = Path::new("pages.toml");
        let catalogue = Catalogue::parse(content, path).unwrap();

        assert!(CatalogueService::assemble(&catalogue, path, store.clone()).is_err());

        let store = store.borrow();
        assert_eq!(store.default_value("a.width"), Some("600"));
        assert_eq!(store.default_value("again.width"), None);
    }

    #[test]
    fn given_invalid_identifier_when_assembling_then_domain_error() {
        let err = build("[[page]]\nid = \"a.b\"\ntitle = \"Dotted\"\n").unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn given_table_default_when_assembling_then_catalogue_error() {
        let content = "[[page]]\nid = \"a\"\ntitle = \"A\"\n[page.defaults]\nnested = { x = 1 }\n";
        let err = build(content).unwrap_err();
        assert!(matches!(err, ApplicationError::Catalogue { .. }));
    }

    #[test]
    fn given_unknown_field_when_parsing_then_catalogue_error() {
        let err = Catalogue::parse("[[page]]\nid = \"a\"\nname = \"A\"\n", Path::new("x.toml"))
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Catalogue { .. }));
    }

    #[test]
    fn given_catalogue_when_counting_pages_then_includes_children() {
        let catalogue = Catalogue::parse(CATALOGUE, Path::new("pages.toml")).unwrap();
        assert_eq!(catalogue.page_count(), 3);
    }
}
