#![forbid(unsafe_code)]

//! Cascata public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports the selection engine from `cascata-core` and offers a
//! lightweight prelude for day-to-day usage.

// --- Core re-exports -------------------------------------------------------

pub use cascata_core::cascader::CascaderState;
pub use cascata_core::config::{CascaderConfig, ConfigError, FieldSchema, SelectionMode};
pub use cascata_core::tree::{Forest, NodeId, TreeNode};

// --- Errors ---------------------------------------------------------------

/// Standard result type for cascata APIs.
pub type Result<T> = std::result::Result<T, ConfigError>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CascaderConfig, CascaderState, ConfigError, FieldSchema, Forest, NodeId, Result,
        SelectionMode, TreeNode,
    };

    pub use crate::core;
}

pub use cascata_core as core;
