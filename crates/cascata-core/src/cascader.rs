//! Cascading-menu selection controller.
//!
//! [`CascaderState`] owns the option forest plus everything a front end
//! needs to drive a cascader: the chain of open menu levels, the set of
//! final selections, and the configuration fixed at construction. It is
//! headless; rendering and event wiring belong to the embedding
//! application.
//!
//! # Example
//!
//! ```
//! use cascata_core::{CascaderConfig, CascaderState, SelectionMode};
//! use serde_json::json;
//!
//! let records = vec![json!({
//!     "id": "fruit", "label": "Fruit", "children": [
//!         {"id": "apple", "label": "Apple"},
//!         {"id": "pear", "label": "Pear"},
//!     ]
//! })];
//! let config = CascaderConfig::new().with_mode(SelectionMode::Multiple);
//! let mut state = CascaderState::new(&records, config).unwrap();
//!
//! let fruit = state.forest().roots()[0];
//! state.expand(fruit);
//! state.toggle(fruit, true);
//! assert_eq!(state.selected_len(), 2);
//! ```

use std::collections::HashMap;

use serde_json::Value;

use crate::config::{CascaderConfig, ConfigError, SelectionMode};
use crate::tree::{Forest, NodeId, TreeNode};

/// Headless state for one cascading menu.
///
/// All mutation goes through the methods below; queries never allocate
/// beyond what they return. Operations touching unknown [`NodeId`]s panic
/// like slice indexing, since handles can only come from this state's own
/// forest.
#[derive(Debug, Clone)]
pub struct CascaderState {
    forest: Forest,
    /// Open levels. Entry 0 is always the root list.
    menu_chain: Vec<Vec<NodeId>>,
    /// External id of each final selection, mapped to its label path.
    selected: HashMap<String, Vec<String>>,
    config: CascaderConfig,
}

impl CascaderState {
    /// Build a controller over raw option records.
    ///
    /// Validates the configuration, builds the forest, opens the root
    /// level, and restores any preselected ids.
    pub fn new(records: &[Value], config: CascaderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let forest = Forest::from_records(records, &config.schema);
        let roots = forest.roots().to_vec();
        let mut state = Self {
            forest,
            menu_chain: vec![roots],
            selected: HashMap::new(),
            config,
        };
        if !state.config.preselected.is_empty() {
            let ids = state.config.preselected.clone();
            state.rehydrate(&ids);
        }
        Ok(state)
    }

    // --- Navigation ---------------------------------------------------------

    /// Open the submenu for `id`.
    ///
    /// Levels deeper than `id` close first; if `id` has children they
    /// become the new deepest level. Activating the same node twice in a
    /// row leaves the chain unchanged.
    pub fn expand(&mut self, id: NodeId) -> &[Vec<NodeId>] {
        let depth = self.forest.node(id).depth();

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("cascader_expand", level = depth).entered();

        self.menu_chain.truncate(depth);
        let node = self.forest.node(id);
        if node.has_children() {
            self.menu_chain.push(node.children().to_vec());
        }
        &self.menu_chain
    }

    // --- Selection ----------------------------------------------------------

    /// Apply a selection event to `id`.
    ///
    /// In single mode only leaves respond: the previous selection is
    /// replaced and `checked` is ignored, and no check flags move. In
    /// multiple mode the flag propagates: ancestors recount first (when
    /// the node sits below the root level), then the whole subtree snaps
    /// to `checked`, then the selected set is rewritten from the affected
    /// leaves.
    pub fn toggle(&mut self, id: NodeId, checked: bool) {
        #[cfg(feature = "tracing")]
        let _span =
            tracing::debug_span!("cascader_toggle", checked, multiple = self.is_multiple())
                .entered();

        match self.config.mode {
            SelectionMode::Single => self.select_single(id),
            SelectionMode::Multiple => self.toggle_multiple(id, checked),
        }
    }

    fn select_single(&mut self, id: NodeId) {
        let node = self.forest.node(id);
        if node.has_children() {
            return;
        }
        self.selected.clear();
        self.selected
            .insert(node.id().to_string(), node.path_labels().to_vec());
    }

    fn toggle_multiple(&mut self, id: NodeId, checked: bool) {
        if self.forest.node(id).depth() > 1 {
            self.forest.check_up(id, checked);
        }
        self.forest.check_down(id, checked);
        self.record_subtree(id, checked);
    }

    /// Rewrite selected entries for every leaf under `id`, itself included
    /// when it is one.
    fn record_subtree(&mut self, id: NodeId, checked: bool) {
        for leaf in self.forest.descendant_leaves(id) {
            let node = self.forest.node(leaf);
            if checked {
                self.selected
                    .insert(node.id().to_string(), node.path_labels().to_vec());
            } else {
                self.selected.remove(node.id());
            }
        }
    }

    /// Remove the selection with the given external id.
    ///
    /// Leaves are searched in preorder; on a hit the node untoggles with
    /// full propagation, whatever the configured mode, and `true` comes
    /// back. Ids that match no leaf are ignored.
    pub fn uncheck_by_id(&mut self, external: &str) -> bool {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("cascader_uncheck", id = external).entered();

        let Some(found) = self.find_leaf(external) else {
            return false;
        };
        self.toggle_multiple(found, false);
        true
    }

    fn find_leaf(&self, external: &str) -> Option<NodeId> {
        self.forest
            .leaf_ids()
            .find(|&id| self.forest.node(id).id() == external)
    }

    /// Restore selections from external ids, as after reloading saved
    /// state.
    ///
    /// Leaves are searched in preorder. In multiple mode every match is
    /// checked with full propagation; in single mode only the first match
    /// applies. The menu chain then reopens along the first match's
    /// ancestry so the restored entry is visible. Ids that match no leaf
    /// restore nothing and raise no error. Returns how many ids matched a
    /// leaf.
    pub fn rehydrate<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("cascader_rehydrate", requested = ids.len()).entered();

        let matched: Vec<NodeId> = self
            .forest
            .leaf_ids()
            .filter(|&leaf| {
                let external = self.forest.node(leaf).id();
                ids.iter().any(|want| want.as_ref() == external)
            })
            .collect();

        let Some(&first) = matched.first() else {
            return 0;
        };

        match self.config.mode {
            SelectionMode::Single => self.select_single(first),
            SelectionMode::Multiple => {
                for &leaf in &matched {
                    self.toggle_multiple(leaf, true);
                }
            }
        }
        self.reveal(first);
        matched.len()
    }

    /// Reopen the menu chain along `id`'s ancestry, roots first.
    fn reveal(&mut self, id: NodeId) {
        let mut levels = Vec::new();
        let mut current = self.forest.node(id).parent();
        while let Some(pid) = current {
            let parent = self.forest.node(pid);
            levels.push(parent.children().to_vec());
            current = parent.parent();
        }
        levels.reverse();
        self.menu_chain.truncate(1);
        self.menu_chain.extend(levels);
    }

    /// Drop every selection and reset every check flag in place.
    ///
    /// The menu chain and tree structure are untouched. Calling this twice
    /// is the same as calling it once.
    pub fn clear_all(&mut self) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("cascader_clear").entered();

        self.selected.clear();
        self.forest.clear_checks();
    }

    // --- Views --------------------------------------------------------------

    /// Ids of all current selections. Order is unspecified.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<&str> {
        self.selected.keys().map(String::as_str).collect()
    }

    /// Full label paths of all current selections, each joined with the
    /// configured separator. Order is unspecified.
    #[must_use]
    pub fn selected_label_paths(&self) -> Vec<String> {
        self.selected
            .values()
            .map(|labels| labels.join(&self.config.separator))
            .collect()
    }

    /// Number of current selections.
    #[must_use]
    pub fn selected_len(&self) -> usize {
        self.selected.len()
    }

    /// Whether anything is selected.
    #[must_use]
    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Open levels, roots first.
    #[must_use]
    pub fn menu_chain(&self) -> &[Vec<NodeId>] {
        &self.menu_chain
    }

    /// Nodes of one open level, in display order.
    ///
    /// # Panics
    /// Panics if `level >= menu_chain().len()`.
    pub fn menu_entries(&self, level: usize) -> impl Iterator<Item = &TreeNode> + '_ {
        self.menu_chain[level].iter().map(|&id| self.forest.node(id))
    }

    /// The underlying option forest.
    #[must_use]
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Whether selections accumulate.
    #[must_use]
    pub fn is_multiple(&self) -> bool {
        self.config.mode == SelectionMode::Multiple
    }

    /// Whether a front end should offer a bulk-clear control.
    #[must_use]
    pub fn clearable(&self) -> bool {
        self.config.clearable
    }

    /// Separator used when joining label paths.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.config.separator
    }
}
