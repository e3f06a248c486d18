//! Form Rendering Engine
//!
//! A headless model of one action form. The view renders [`FormView`]
//! snapshots; the model owns values, conditional visibility, context
//! pre-fill, required-field validation and the submit control's state.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::actions::{ActionField, FieldOption, FieldType, FlowContext};
use crate::ui::WidgetStrings;

/// Native input a field maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// `<input type="text">`
    Text,
    /// `<input type="date">`
    Date,
    /// `<input type="number">`
    Number,
    /// `<input type="email">`
    Email,
    /// `<input type="tel">`
    Tel,
    /// `<select>`
    Select,
}

impl From<FieldType> for InputKind {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => InputKind::Text,
            FieldType::Date => InputKind::Date,
            FieldType::Number => InputKind::Number,
            FieldType::Email => InputKind::Email,
            FieldType::Tel => InputKind::Tel,
            FieldType::Select => InputKind::Select,
        }
    }
}

/// Submit control state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitState {
    /// Enabled with its default label
    #[default]
    Ready,
    /// Disabled, showing the loading label
    Loading,
}

/// One rendered control
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    /// Field key
    pub key: String,
    /// Label
    pub label: String,
    /// Input type
    pub kind: InputKind,
    /// Current value
    pub value: String,
    /// Select options, led by the empty "choose" option
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    /// Placeholder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Required marker
    pub required: bool,
    /// Pre-filled from the flow context
    pub read_only: bool,
    /// Hidden by a `showWhen` condition when false
    pub visible: bool,
    /// Inline validation error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot of a form for the view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    /// Action the form submits to
    pub action_id: String,
    /// Title
    pub title: String,
    /// Controls in declaration order
    pub controls: Vec<Control>,
    /// Submit control state
    pub submit_state: SubmitState,
    /// Submit control label for the current state
    pub submit_label: String,
    /// Cancel control label
    pub cancel_label: String,
}

/// First missing required field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Field key
    pub field: String,
    /// Inline message
    pub message: String,
}

/// Rejected edit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormEditError {
    /// No such field in this form
    #[error("unknown field: {0}")]
    UnknownField(String),
    /// Field was pre-filled from the flow context
    #[error("field is read-only: {0}")]
    ReadOnly(String),
    /// No form is open for editing (none shown, or a submission is in flight)
    #[error("no editable form")]
    NotEditable,
}

/// State of one rendered form
#[derive(Debug, Clone)]
pub struct FormModel {
    action_id: String,
    title: String,
    fields: Vec<ActionField>,
    values: HashMap<String, String>,
    context: FlowContext,
    error: Option<ValidationError>,
    submit_state: SubmitState,
}

impl FormModel {
    /// Build a form; context values pre-fill and lock their fields
    pub fn new(
        action_id: impl Into<String>,
        title: impl Into<String>,
        fields: Vec<ActionField>,
        context: FlowContext,
    ) -> Self {
        let values = fields
            .iter()
            .filter_map(|f| context.get(&f.key).map(|v| (f.key.clone(), v.clone())))
            .collect();

        Self {
            action_id: action_id.into(),
            title: title.into(),
            fields,
            values,
            context,
            error: None,
            submit_state: SubmitState::Ready,
        }
    }

    /// Action the form submits to
    #[must_use]
    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    /// Title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Fields
    #[must_use]
    pub fn fields(&self) -> &[ActionField] {
        &self.fields
    }

    /// Context the form was built with
    #[must_use]
    pub fn context(&self) -> &FlowContext {
        &self.context
    }

    /// Current value of a field (empty when unset)
    #[must_use]
    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Current inline error
    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    /// Submit control state
    #[must_use]
    pub fn submit_state(&self) -> SubmitState {
        self.submit_state
    }

    /// Whether the field was pre-filled from the flow context
    #[must_use]
    pub fn is_read_only(&self, key: &str) -> bool {
        self.context.contains_key(key)
    }

    /// Whether a field is currently shown
    #[must_use]
    pub fn is_visible(&self, field: &ActionField) -> bool {
        field
            .show_when
            .as_ref()
            .map_or(true, |cond| cond.matches(self.value(&cond.field)))
    }

    /// Edit a field; dependents re-evaluate on the next read
    pub fn set_value(
        &mut self,
        key: &str,
        value: impl Into<String>,
    ) -> Result<(), FormEditError> {
        if !self.fields.iter().any(|f| f.key == key) {
            return Err(FormEditError::UnknownField(key.to_string()));
        }
        if self.is_read_only(key) {
            return Err(FormEditError::ReadOnly(key.to_string()));
        }

        self.values.insert(key.to_string(), value.into());
        if self.error.as_ref().is_some_and(|e| e.field == key) {
            self.error = None;
        }
        Ok(())
    }

    /// Values of every visible field, trimmed
    #[must_use]
    pub fn collect(&self) -> FlowContext {
        self.fields
            .iter()
            .filter(|f| self.is_visible(f))
            .map(|f| (f.key.clone(), self.value(&f.key).trim().to_string()))
            .collect()
    }

    /// Validate before submit
    ///
    /// Stops at the first visible required field that is empty, records the
    /// inline error and returns no data.
    pub fn validate(&mut self, strings: &WidgetStrings) -> Result<FlowContext, ValidationError> {
        let data = self.collect();

        let missing = self
            .fields
            .iter()
            .filter(|f| f.required && self.is_visible(f))
            .find(|f| data.get(&f.key).map_or(true, |v| v.is_empty()));

        if let Some(field) = missing {
            let error = ValidationError {
                field: field.key.clone(),
                message: strings.required_field.clone(),
            };
            self.error = Some(error.clone());
            return Err(error);
        }

        self.error = None;
        Ok(data)
    }

    /// Disable the submit control while a submission is in flight
    ///
    /// Returns `false` if one is already in flight.
    pub fn begin_submit(&mut self) -> bool {
        if self.submit_state == SubmitState::Loading {
            return false;
        }
        self.submit_state = SubmitState::Loading;
        true
    }

    /// Re-enable the submit control with its default label
    pub fn finish_submit(&mut self) {
        self.submit_state = SubmitState::Ready;
    }

    /// Snapshot for the view
    #[must_use]
    pub fn view(&self, strings: &WidgetStrings) -> FormView {
        let controls = self
            .fields
            .iter()
            .map(|field| {
                let kind = InputKind::from(field.field_type);
                let options = if kind == InputKind::Select {
                    std::iter::once(FieldOption::Labeled {
                        value: String::new(),
                        label: strings.choose.clone(),
                    })
                    .chain(field.options.iter().cloned())
                    .collect()
                } else {
                    Vec::new()
                };

                Control {
                    key: field.key.clone(),
                    label: field.label.clone(),
                    kind,
                    value: self.value(&field.key).to_string(),
                    options,
                    placeholder: field.placeholder.clone(),
                    required: field.required,
                    read_only: self.is_read_only(&field.key),
                    visible: self.is_visible(field),
                    error: self
                        .error
                        .as_ref()
                        .filter(|e| e.field == field.key)
                        .map(|e| e.message.clone()),
                }
            })
            .collect();

        FormView {
            action_id: self.action_id.clone(),
            title: self.title.clone(),
            controls,
            submit_state: self.submit_state,
            submit_label: match self.submit_state {
                SubmitState::Ready => strings.submit.clone(),
                SubmitState::Loading => strings.submitting.clone(),
            },
            cancel_label: strings.cancel.clone(),
        }
    }
}
