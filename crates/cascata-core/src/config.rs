//! Construction-time configuration for the cascader engine.
//!
//! Everything here is read once by [`CascaderState::new`] and fixed for the
//! life of the controller: the selection mode, the field names used to read
//! raw records, the separator for joined label paths, and any ids to restore
//! before the first interaction.
//!
//! [`CascaderState::new`]: crate::cascader::CascaderState::new

use std::fmt;

/// How many simultaneous selections the cascader allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// One leaf at a time; choosing another replaces it.
    #[default]
    Single,
    /// Any number of leaves, with check state propagated between levels.
    Multiple,
}

/// Field names used to read raw option records.
///
/// Records are plain JSON objects; the schema says which keys hold the
/// identifier, submitted value, display label, child array, and disabled
/// flag. The defaults match the common shape
/// `{ "id": ..., "label": ..., "children": [...] }`, with the value taken
/// from the id key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Key of the unique identifier.
    pub id: String,
    /// Key of the submitted value.
    pub value: String,
    /// Key of the display label.
    pub label: String,
    /// Key of the child-record array.
    pub children: String,
    /// Key of the disabled flag.
    pub disabled: String,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            value: "id".to_string(),
            label: "label".to_string(),
            children: "children".to_string(),
            disabled: "disabled".to_string(),
        }
    }
}

impl FieldSchema {
    /// Create a schema with the default field names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key of the unique identifier.
    #[must_use]
    pub fn with_id(mut self, key: impl Into<String>) -> Self {
        self.id = key.into();
        self
    }

    /// Set the key of the submitted value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>) -> Self {
        self.value = key.into();
        self
    }

    /// Set the key of the display label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>) -> Self {
        self.label = key.into();
        self
    }

    /// Set the key of the child-record array.
    #[must_use]
    pub fn with_children(mut self, key: impl Into<String>) -> Self {
        self.children = key.into();
        self
    }

    /// Set the key of the disabled flag.
    #[must_use]
    pub fn with_disabled(mut self, key: impl Into<String>) -> Self {
        self.disabled = key.into();
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, key) in [
            ("id", &self.id),
            ("value", &self.value),
            ("label", &self.label),
            ("children", &self.children),
            ("disabled", &self.disabled),
        ] {
            if key.is_empty() {
                return Err(ConfigError::EmptyField(name));
            }
        }
        Ok(())
    }
}

/// Construction-time configuration for [`CascaderState`].
///
/// [`CascaderState`]: crate::cascader::CascaderState
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascaderConfig {
    /// Selection mode. Single replaces, multiple accumulates.
    pub mode: SelectionMode,
    /// Field names for reading raw records.
    pub schema: FieldSchema,
    /// Separator between labels when a full path renders as one string.
    pub separator: String,
    /// Whether a front end should offer a bulk-clear control.
    pub clearable: bool,
    /// Ids to restore as selected before the first interaction.
    pub preselected: Vec<String>,
}

impl Default for CascaderConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::default(),
            schema: FieldSchema::default(),
            separator: "-".to_string(),
            clearable: false,
            preselected: Vec::new(),
        }
    }
}

impl CascaderConfig {
    /// Create a configuration with the defaults: single selection, default
    /// field names, `"-"` separator, not clearable, nothing preselected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selection mode.
    #[must_use]
    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the field-name schema.
    #[must_use]
    pub fn with_schema(mut self, schema: FieldSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the separator used when joining label paths.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set whether a front end should offer a bulk-clear control.
    #[must_use]
    pub fn with_clearable(mut self, clearable: bool) -> Self {
        self.clearable = clearable;
        self
    }

    /// Set the ids to restore as selected at construction.
    #[must_use]
    pub fn with_preselected<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.preselected = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Check the configuration for mistakes that would make every record
    /// unreadable. Called by [`CascaderState::new`] before any tree is built.
    ///
    /// [`CascaderState::new`]: crate::cascader::CascaderState::new
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schema.validate()
    }
}

/// Error raised when a configuration is rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A schema entry maps a record field to an empty key.
    EmptyField(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField(field) => {
                write!(f, "schema maps the `{field}` field to an empty key")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
