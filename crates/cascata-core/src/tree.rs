//! Option tree storage and three-state check propagation.
//!
//! Nodes live in a flat arena owned by a [`Forest`]; [`NodeId`] handles are
//! indices into it. The arena is built once from raw JSON records and its
//! structure never changes afterwards, so handles stay valid for the life of
//! the forest and only the two check flags ever mutate.
//!
//! # Operations
//!
//! | Operation | Time | Allocations |
//! |-----------|------|-------------|
//! | `from_records(records)` | O(n) | arena + per-node paths |
//! | `node(id)` | O(1) | 0 |
//! | `check_down(id, flag)` | O(subtree) | 1 worklist |
//! | `check_up(id, flag)` | O(depth × fan-out) | 0 |
//! | `clear_checks()` | O(n) | 0 |
//! | `find_by_id(ext)` | O(n) | 0 |
//!
//! # Invariants
//!
//! 1. Arena order is depth-first preorder, so a linear scan visits parents
//!    before their children.
//! 2. `path().len() == path_labels().len() == depth()`, and the last path
//!    entry is the node's own value.
//! 3. Roots have `depth() == 1` and no parent.
//! 4. A node is never both `checked` and `indeterminate`.
//! 5. After any propagation call, every ancestor of the touched node holds
//!    flags derived from its direct children alone.

use crate::config::FieldSchema;
use serde_json::Value;

/// Opaque handle to a node in a [`Forest`] arena.
///
/// Handles are only meaningful for the forest that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0
    }
}

/// A single option in the tree.
///
/// Identity, links, and paths are fixed at construction; only the check
/// flags mutate afterwards, and only through [`Forest`] operations.
#[derive(Debug, Clone)]
pub struct TreeNode {
    id: String,
    value: String,
    label: String,
    disabled: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    path: Vec<String>,
    path_labels: Vec<String>,
    checked: bool,
    indeterminate: bool,
}

impl TreeNode {
    /// External identifier from the raw record.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Submitted value from the raw record.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Display label from the raw record.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the raw record marked this option as disabled.
    ///
    /// The flag is carried for front ends; propagation does not consult it.
    #[must_use]
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Parent handle, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child handles in input order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node has at least one child.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Level in the tree. Roots are at depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Values from the root down to this node, inclusive.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Labels from the root down to this node, inclusive.
    #[must_use]
    pub fn path_labels(&self) -> &[String] {
        &self.path_labels
    }

    /// Whether this node is fully checked.
    #[must_use]
    pub fn checked(&self) -> bool {
        self.checked
    }

    /// Whether only part of this node's subtree is checked.
    #[must_use]
    pub fn indeterminate(&self) -> bool {
        self.indeterminate
    }
}

/// Arena-backed storage for the whole option tree.
///
/// Built once per controller from raw records; never rebuilt. Bulk resets
/// happen in place via [`Forest::clear_checks`].
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
}

impl Forest {
    /// Build a forest from raw JSON records.
    ///
    /// Each record contributes one node. The schema says which keys hold the
    /// id, value, label, child array, and disabled flag. Scalar fields
    /// coerce to strings (numbers and bools via their display form); a
    /// missing or non-scalar field reads as empty. A missing or non-array
    /// children key makes the record a leaf. Construction never fails.
    #[must_use]
    pub fn from_records(records: &[Value], schema: &FieldSchema) -> Self {
        let mut forest = Self::default();
        for record in records {
            let id = forest.insert(record, None, schema);
            forest.roots.push(id);
        }
        forest
    }

    fn insert(&mut self, record: &Value, parent: Option<NodeId>, schema: &FieldSchema) -> NodeId {
        let (depth, mut path, mut path_labels) = match parent {
            Some(pid) => {
                let p = &self.nodes[pid.index()];
                (p.depth + 1, p.path.clone(), p.path_labels.clone())
            }
            None => (1, Vec::new(), Vec::new()),
        };

        let value = scalar_field(record, &schema.value);
        let label = scalar_field(record, &schema.label);
        path.push(value.clone());
        path_labels.push(label.clone());

        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            id: scalar_field(record, &schema.id),
            value,
            label,
            disabled: record
                .get(&schema.disabled)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            parent,
            children: Vec::new(),
            depth,
            path,
            path_labels,
            checked: false,
            indeterminate: false,
        });

        if let Some(Value::Array(children)) = record.get(&schema.children) {
            for child in children {
                let child_id = self.insert(child, Some(id), schema);
                self.nodes[id.index()].children.push(child_id);
            }
        }
        id
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in input order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Borrow a node.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds for this forest's arena.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    /// All node ids in depth-first preorder.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Ids of every leaf, in depth-first preorder.
    pub fn leaf_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_ids().filter(|&id| self.node(id).is_leaf())
    }

    /// First node in preorder whose external id matches, if any.
    #[must_use]
    pub fn find_by_id(&self, external: &str) -> Option<NodeId> {
        self.node_ids().find(|&id| self.node(id).id == external)
    }

    /// Leaves of the subtree rooted at `id`, in preorder. A leaf yields
    /// itself.
    #[must_use]
    pub fn descendant_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(id, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = self.node(id);
        if node.is_leaf() {
            out.push(id);
            return;
        }
        for &child in &node.children {
            self.collect_leaves(child, out);
        }
    }

    // --- Check propagation -------------------------------------------------

    /// Snap an entire subtree to one state.
    ///
    /// `id` and every descendant take `checked`, with any indeterminate
    /// mark cleared along the way.
    pub fn check_down(&mut self, id: NodeId, checked: bool) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.index()];
            node.checked = checked;
            node.indeterminate = false;
            stack.extend(node.children.iter().copied());
        }
    }

    /// Set one node's flag, then rebuild its ancestor chain.
    ///
    /// Ancestors are visited bottom-up, so each recount sees the fresh
    /// state of the level below it.
    pub fn check_up(&mut self, id: NodeId, checked: bool) {
        let node = &mut self.nodes[id.index()];
        node.checked = checked;
        node.indeterminate = false;
        self.refresh_ancestors(id);
    }

    /// Recompute `checked`/`indeterminate` for every ancestor of `id`.
    ///
    /// Each ancestor derives its state from its direct children: all
    /// children checked makes it checked; a weighted tally (a checked child
    /// counts twice an indeterminate one) strictly between zero and full
    /// makes it indeterminate.
    pub fn refresh_ancestors(&mut self, id: NodeId) {
        let mut current = self.nodes[id.index()].parent;
        while let Some(pid) = current {
            let (checked, indeterminate) = self.derive_from_children(pid);
            let parent = &mut self.nodes[pid.index()];
            parent.checked = checked;
            parent.indeterminate = indeterminate;
            current = parent.parent;
        }
    }

    fn derive_from_children(&self, id: NodeId) -> (bool, bool) {
        let children = &self.node(id).children;
        let full = 2 * children.len();
        let mut tally = 0usize;
        for &child in children {
            let node = self.node(child);
            if node.checked {
                tally += 2;
            } else if node.indeterminate {
                tally += 1;
            }
        }
        (full > 0 && tally == full, tally > 0 && tally < full)
    }

    /// Reset every check flag in place. Structure is untouched.
    pub fn clear_checks(&mut self) {
        for node in &mut self.nodes {
            node.checked = false;
            node.indeterminate = false;
        }
    }
}

fn scalar_field(record: &Value, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Two top-level options: A with two branches, B a bare leaf.
    //
    //   A ── a1 ── x1
    //   │    └──── x2
    //   └── a2 ── y1
    //   B
    fn sample_records() -> Vec<Value> {
        vec![
            json!({
                "id": "A", "label": "Alpha", "children": [
                    {"id": "a1", "label": "Alpha One", "children": [
                        {"id": "x1", "label": "Ex One"},
                        {"id": "x2", "label": "Ex Two"},
                    ]},
                    {"id": "a2", "label": "Alpha Two", "children": [
                        {"id": "y1", "label": "Why One"},
                    ]},
                ]
            }),
            json!({"id": "B", "label": "Beta"}),
        ]
    }

    fn sample_forest() -> Forest {
        Forest::from_records(&sample_records(), &FieldSchema::default())
    }

    fn by_id(forest: &Forest, external: &str) -> NodeId {
        forest
            .find_by_id(external)
            .unwrap_or_else(|| panic!("no node with id {external}"))
    }

    // ─── Construction ─────────────────────────────────────────────

    #[test]
    fn builds_all_nodes() {
        let forest = sample_forest();
        assert_eq!(forest.len(), 7);
        assert!(!forest.is_empty());
        assert_eq!(forest.roots().len(), 2);
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        let forest = Forest::from_records(&[], &FieldSchema::default());
        assert!(forest.is_empty());
        assert!(forest.roots().is_empty());
        assert_eq!(forest.node_ids().count(), 0);
    }

    #[test]
    fn arena_order_is_preorder() {
        let forest = sample_forest();
        let ids: Vec<&str> = forest
            .node_ids()
            .map(|id| forest.node(id).id())
            .collect();
        assert_eq!(ids, ["A", "a1", "x1", "x2", "a2", "y1", "B"]);
    }

    #[test]
    fn parent_child_links() {
        let forest = sample_forest();
        let a = by_id(&forest, "A");
        let a1 = by_id(&forest, "a1");
        let x1 = by_id(&forest, "x1");

        assert_eq!(forest.node(a).parent(), None);
        assert_eq!(forest.node(a1).parent(), Some(a));
        assert_eq!(forest.node(x1).parent(), Some(a1));
        assert_eq!(forest.node(a).children(), &[a1, by_id(&forest, "a2")]);
        assert!(forest.node(x1).is_leaf());
        assert!(forest.node(a).has_children());
    }

    #[test]
    fn depths_start_at_one() {
        let forest = sample_forest();
        assert_eq!(forest.node(by_id(&forest, "A")).depth(), 1);
        assert_eq!(forest.node(by_id(&forest, "B")).depth(), 1);
        assert_eq!(forest.node(by_id(&forest, "a1")).depth(), 2);
        assert_eq!(forest.node(by_id(&forest, "x2")).depth(), 3);
    }

    #[test]
    fn paths_follow_ancestry() {
        let forest = sample_forest();
        let x2 = forest.node(by_id(&forest, "x2"));
        assert_eq!(x2.path(), &["A", "a1", "x2"]);
        assert_eq!(x2.path_labels(), &["Alpha", "Alpha One", "Ex Two"]);
        assert_eq!(x2.path().len(), x2.depth());

        let b = forest.node(by_id(&forest, "B"));
        assert_eq!(b.path(), &["B"]);
        assert_eq!(b.path_labels(), &["Beta"]);
    }

    #[test]
    fn leaf_ids_in_preorder() {
        let forest = sample_forest();
        let leaves: Vec<&str> = forest
            .leaf_ids()
            .map(|id| forest.node(id).id())
            .collect();
        assert_eq!(leaves, ["x1", "x2", "y1", "B"]);
    }

    // ─── Schema handling ──────────────────────────────────────────

    #[test]
    fn custom_field_names() {
        let records = vec![json!({
            "key": "root", "name": "Root", "items": [
                {"key": "child", "name": "Child"},
            ]
        })];
        let schema = FieldSchema::new()
            .with_id("key")
            .with_value("key")
            .with_label("name")
            .with_children("items");
        let forest = Forest::from_records(&records, &schema);
        assert_eq!(forest.len(), 2);
        let child = forest.node(by_id(&forest, "child"));
        assert_eq!(child.label(), "Child");
        assert_eq!(child.path(), &["root", "child"]);
    }

    #[test]
    fn value_key_can_differ_from_id_key() {
        let records = vec![json!({"id": "n1", "code": "one", "label": "One"})];
        let schema = FieldSchema::new().with_value("code");
        let forest = Forest::from_records(&records, &schema);
        let node = forest.node(forest.roots()[0]);
        assert_eq!(node.id(), "n1");
        assert_eq!(node.value(), "one");
        assert_eq!(node.path(), &["one"]);
    }

    #[test]
    fn numeric_and_bool_scalars_coerce() {
        let records = vec![json!({"id": 42, "label": true})];
        let forest = Forest::from_records(&records, &FieldSchema::default());
        let node = forest.node(forest.roots()[0]);
        assert_eq!(node.id(), "42");
        assert_eq!(node.label(), "true");
    }

    #[test]
    fn missing_fields_read_as_empty() {
        let records = vec![json!({"id": "only-id"})];
        let forest = Forest::from_records(&records, &FieldSchema::default());
        let node = forest.node(forest.roots()[0]);
        assert_eq!(node.label(), "");
        assert!(!node.disabled());
    }

    #[test]
    fn null_and_object_fields_read_as_empty() {
        let records = vec![json!({"id": null, "label": {"nested": true}})];
        let forest = Forest::from_records(&records, &FieldSchema::default());
        let node = forest.node(forest.roots()[0]);
        assert_eq!(node.id(), "");
        assert_eq!(node.label(), "");
    }

    #[test]
    fn non_array_children_makes_leaf() {
        let records = vec![json!({"id": "n", "label": "N", "children": "oops"})];
        let forest = Forest::from_records(&records, &FieldSchema::default());
        assert!(forest.node(forest.roots()[0]).is_leaf());
    }

    #[test]
    fn disabled_flag_carried() {
        let records = vec![
            json!({"id": "on", "label": "On"}),
            json!({"id": "off", "label": "Off", "disabled": true}),
        ];
        let forest = Forest::from_records(&records, &FieldSchema::default());
        assert!(!forest.node(by_id(&forest, "on")).disabled());
        assert!(forest.node(by_id(&forest, "off")).disabled());
    }

    // ─── Downward propagation ─────────────────────────────────────

    #[test]
    fn check_down_snaps_subtree() {
        let mut forest = sample_forest();
        let a = by_id(&forest, "A");
        forest.check_down(a, true);

        for id in ["A", "a1", "x1", "x2", "a2", "y1"] {
            let node = forest.node(by_id(&forest, id));
            assert!(node.checked(), "{id} should be checked");
            assert!(!node.indeterminate(), "{id} should not be indeterminate");
        }
        assert!(!forest.node(by_id(&forest, "B")).checked());
    }

    #[test]
    fn check_down_clears_indeterminate() {
        let mut forest = sample_forest();
        let x1 = by_id(&forest, "x1");
        let a = by_id(&forest, "A");
        forest.check_up(x1, true);
        assert!(forest.node(a).indeterminate());

        forest.check_down(a, true);
        assert!(forest.node(a).checked());
        assert!(!forest.node(a).indeterminate());
    }

    #[test]
    fn check_down_on_leaf_touches_only_leaf() {
        let mut forest = sample_forest();
        let x1 = by_id(&forest, "x1");
        forest.check_down(x1, true);
        assert!(forest.node(x1).checked());
        assert!(!forest.node(by_id(&forest, "x2")).checked());
        assert!(!forest.node(by_id(&forest, "a1")).checked());
    }

    #[test]
    fn check_down_uncheck_resets_subtree() {
        let mut forest = sample_forest();
        let a = by_id(&forest, "A");
        forest.check_down(a, true);
        forest.check_down(a, false);
        for id in forest.node_ids() {
            assert!(!forest.node(id).checked());
            assert!(!forest.node(id).indeterminate());
        }
    }

    // ─── Upward propagation ───────────────────────────────────────

    #[test]
    fn partial_children_make_parent_indeterminate() {
        let mut forest = sample_forest();
        forest.check_up(by_id(&forest, "x1"), true);

        let a1 = forest.node(by_id(&forest, "a1"));
        assert!(!a1.checked());
        assert!(a1.indeterminate());

        let a = forest.node(by_id(&forest, "A"));
        assert!(!a.checked());
        assert!(a.indeterminate());
    }

    #[test]
    fn full_children_make_parent_checked() {
        let mut forest = sample_forest();
        forest.check_up(by_id(&forest, "x1"), true);
        forest.check_up(by_id(&forest, "x2"), true);

        let a1 = forest.node(by_id(&forest, "a1"));
        assert!(a1.checked());
        assert!(!a1.indeterminate());

        // A still waits on the a2 branch.
        let a = forest.node(by_id(&forest, "A"));
        assert!(!a.checked());
        assert!(a.indeterminate());
    }

    #[test]
    fn whole_tree_checks_when_every_branch_fills() {
        let mut forest = sample_forest();
        for id in ["x1", "x2", "y1"] {
            forest.check_up(by_id(&forest, id), true);
        }
        let a = forest.node(by_id(&forest, "A"));
        assert!(a.checked());
        assert!(!a.indeterminate());
    }

    #[test]
    fn unchecking_last_leaf_clears_ancestors() {
        let mut forest = sample_forest();
        forest.check_up(by_id(&forest, "x1"), true);
        forest.check_up(by_id(&forest, "x1"), false);

        for id in ["a1", "A"] {
            let node = forest.node(by_id(&forest, id));
            assert!(!node.checked());
            assert!(!node.indeterminate());
        }
    }

    #[test]
    fn unchecking_one_of_many_leaves_parent_indeterminate() {
        let mut forest = sample_forest();
        forest.check_up(by_id(&forest, "x1"), true);
        forest.check_up(by_id(&forest, "x2"), true);
        forest.check_up(by_id(&forest, "x1"), false);

        let a1 = forest.node(by_id(&forest, "a1"));
        assert!(!a1.checked());
        assert!(a1.indeterminate());
    }

    #[test]
    fn grandparent_not_checked_while_sibling_branch_partial() {
        // x1 and x2 fill a1 completely, yet A must stay indeterminate
        // because a2's subtree is untouched.
        let mut forest = sample_forest();
        forest.check_up(by_id(&forest, "x1"), true);
        forest.check_up(by_id(&forest, "x2"), true);

        let a = forest.node(by_id(&forest, "A"));
        assert!(!a.checked());
        assert!(a.indeterminate());
        assert!(forest.node(by_id(&forest, "a1")).checked());
    }

    #[test]
    fn indeterminate_child_weighs_half() {
        // a1 indeterminate (one of two leaves) plus a2 checked keeps A
        // indeterminate rather than checked.
        let mut forest = sample_forest();
        forest.check_up(by_id(&forest, "x1"), true);
        forest.check_up(by_id(&forest, "y1"), true);

        assert!(forest.node(by_id(&forest, "a2")).checked());
        assert!(forest.node(by_id(&forest, "a1")).indeterminate());
        let a = forest.node(by_id(&forest, "A"));
        assert!(!a.checked());
        assert!(a.indeterminate());
    }

    #[test]
    fn check_up_on_root_has_no_ancestors() {
        let mut forest = sample_forest();
        let b = by_id(&forest, "B");
        forest.check_up(b, true);
        assert!(forest.node(b).checked());
    }

    #[test]
    fn flags_never_both_set() {
        let mut forest = sample_forest();
        forest.check_up(by_id(&forest, "x1"), true);
        forest.check_up(by_id(&forest, "y1"), true);
        forest.check_up(by_id(&forest, "x2"), true);
        forest.check_up(by_id(&forest, "x1"), false);

        for id in forest.node_ids() {
            let node = forest.node(id);
            assert!(
                !(node.checked() && node.indeterminate()),
                "{} is both checked and indeterminate",
                node.id()
            );
        }
    }

    // ─── Bulk reset ───────────────────────────────────────────────

    #[test]
    fn clear_checks_resets_flags_only() {
        let mut forest = sample_forest();
        forest.check_down(by_id(&forest, "A"), true);
        forest.clear_checks();

        assert_eq!(forest.len(), 7);
        for id in forest.node_ids() {
            assert!(!forest.node(id).checked());
            assert!(!forest.node(id).indeterminate());
        }
    }

    // ─── Queries ──────────────────────────────────────────────────

    #[test]
    fn find_by_id_hits_and_misses() {
        let forest = sample_forest();
        assert!(forest.find_by_id("y1").is_some());
        assert!(forest.find_by_id("nope").is_none());
    }

    #[test]
    fn descendant_leaves_of_branch() {
        let forest = sample_forest();
        let leaves: Vec<&str> = forest
            .descendant_leaves(by_id(&forest, "A"))
            .into_iter()
            .map(|id| forest.node(id).id())
            .collect();
        assert_eq!(leaves, ["x1", "x2", "y1"]);
    }

    #[test]
    fn descendant_leaves_of_leaf_is_itself() {
        let forest = sample_forest();
        let b = by_id(&forest, "B");
        assert_eq!(forest.descendant_leaves(b), vec![b]);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn foreign_handle_panics() {
        let forest = sample_forest();
        let _ = forest.node(NodeId(99));
    }
}
