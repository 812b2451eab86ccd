//! Page handles: the opaque content behind each tree node

use std::fmt;
use std::rc::Rc;

/// Contract every preference page fulfils.
///
/// The tree and the manager only ever call these methods; whatever a page
/// renders or edits internally is its own business. Outcome methods return
/// `true` when the page accepted the request.
pub trait PreferencePage {
    fn title(&self) -> &str;

    fn description(&self) -> &str;

    /// Commit pending edits.
    fn save_changes(&self) -> bool;

    /// Discard pending edits.
    fn cancel_changes(&self) -> bool;

    /// Restore the page's values to their registered defaults.
    fn reset_to_defaults(&self) -> bool;

    /// Whether navigation away from this page is allowed right now.
    fn can_leave(&self) -> bool;
}

/// Shared handle to a page. Nodes, the manager and listeners all hold clones.
pub type PageRef = Rc<dyn PreferencePage>;

impl fmt::Debug for dyn PreferencePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferencePage")
            .field("title", &self.title())
            .finish_non_exhaustive()
    }
}

/// Page with no content; every outcome succeeds.
///
/// Substituted wherever a node has no meaningful page, e.g. the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlankPage {
    title: String,
    description: String,
}

impl BlankPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn shared(self) -> PageRef {
        Rc::new(self)
    }
}

impl PreferencePage for BlankPage {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn save_changes(&self) -> bool {
        true
    }

    fn cancel_changes(&self) -> bool {
        true
    }

    fn reset_to_defaults(&self) -> bool {
        true
    }

    fn can_leave(&self) -> bool {
        true
    }
}
