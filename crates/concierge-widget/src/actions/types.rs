//! Action protocol types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Values carried between the steps of one flow
pub type FlowContext = BTreeMap<String, String>;

/// Server-declared action the assistant can trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    /// Stable id (`book-spa`, `verify-reservation`, ...)
    pub id: String,
    /// Display name, used as the form title
    pub name: String,
    /// Hint for the assistant on when to trigger the action
    #[serde(default)]
    pub trigger_hint: String,
    /// Whether the guest must be verified first
    #[serde(default)]
    pub requires_verification: bool,
    /// Form fields
    #[serde(default)]
    pub fields: Vec<ActionField>,
}

/// Input type of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Calendar date
    Date,
    /// Number
    Number,
    /// One of `options`
    Select,
    /// Email address
    Email,
    /// Phone number
    Tel,
    /// Free text (also the fallback for unknown types)
    #[default]
    #[serde(other)]
    Text,
}

/// One option of a select field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOption {
    /// Value doubles as label
    Plain(String),
    /// Separate value and label
    Labeled {
        /// Submitted value
        value: String,
        /// Display label
        label: String,
    },
}

impl FieldOption {
    /// Submitted value
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            FieldOption::Plain(v) => v,
            FieldOption::Labeled { value, .. } => value,
        }
    }

    /// Display label
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            FieldOption::Plain(v) => v,
            FieldOption::Labeled { label, .. } => label,
        }
    }
}

/// Visibility condition of a dependent field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowWhen {
    /// Key of the controlling field
    pub field: String,
    /// Values of the controlling field that reveal the dependent one
    pub values: Vec<String>,
}

impl ShowWhen {
    /// Whether `value` of the controlling field reveals the dependent field
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// One form field of an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionField {
    /// Key in the submitted body
    pub key: String,
    /// Display label
    pub label: String,
    /// Input type
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    /// Must be non-empty on submit (when visible)
    #[serde(default)]
    pub required: bool,
    /// Options of a select field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    /// Placeholder text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Visibility condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_when: Option<ShowWhen>,
}

impl ActionField {
    /// Plain text field
    #[must_use]
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type: FieldType::Text,
            required: false,
            options: Vec::new(),
            placeholder: None,
            show_when: None,
        }
    }

    /// Set the input type
    #[must_use]
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set select options
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|o| FieldOption::Plain(o.into()))
            .collect();
        self
    }

    /// Show only when `field` has one of `values`
    #[must_use]
    pub fn shown_when<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.show_when = Some(ShowWhen {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }
}

/// Follow-up step returned by a successful submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStep {
    /// Fields of the next form
    #[serde(default)]
    pub fields: Vec<ActionField>,
    /// Values to carry into the next form
    #[serde(default)]
    pub context: FlowContext,
}

/// Server verdict on a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    /// Whether the action succeeded
    pub success: bool,
    /// Text for the guest
    #[serde(default)]
    pub message: String,
    /// Action-specific payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Machine-readable failure code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Step to chain after a success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<NextStep>,
}

/// Failure codes that end the flow instead of re-showing the form
pub const TERMINAL_ERRORS: [&str; 2] = ["attempts_exceeded", "invalid_session"];

impl ActionResult {
    /// Whether a failure ends the flow
    #[must_use]
    pub fn is_terminal_failure(&self) -> bool {
        !self.success
            && self
                .error
                .as_deref()
                .is_some_and(|code| TERMINAL_ERRORS.contains(&code))
    }
}

/// Response body of the action listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ActionList {
    /// Definitions for the requested locale
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}
