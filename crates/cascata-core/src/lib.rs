#![forbid(unsafe_code)]

//! Core state engine for cascading option menus.
//!
//! A cascader presents a tree of options as a chain of side-by-side menus:
//! activating an entry opens its children in the next column. This crate
//! holds the headless half of that widget: the option tree, the chain of
//! open levels, three-state check marks (checked, unchecked, indeterminate)
//! kept consistent across levels, and the set of final selections.
//!
//! Rendering, event wiring, and anything visual live in the embedding
//! application; the engine is pure state plus queries.

pub mod cascader;
pub mod config;
pub mod tree;

pub use cascader::CascaderState;
pub use config::{CascaderConfig, ConfigError, FieldSchema, SelectionMode};
pub use tree::{Forest, NodeId, TreeNode};
