//! Response model store: the flat tag → value mapping behind the form.
//!
//! All mutation funnels through [`FormInstance::set_model_value`]. Clearing
//! (`None`) removes the entry and resets the dirty flag; setting writes the
//! envelope and may cascade clears into dependent sub-trees: deselecting an
//! option retracts every answer nested under it, and emptying a composite
//! field retracts its children's answers.

use crate::error::FormError;
use crate::field::Field;
use crate::instance::FormInstance;
use form_schema::{stringify_id, FieldTag, FieldType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored value envelope. Provenance fields are populated only for fields
/// carrying a domain-object definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    /// The current value.
    pub value: Value,
    /// Domain-object type of the originating definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    /// Identifier of the originating definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,
}

impl FormInstance {
    /// Set or clear the value for a tag.
    ///
    /// `None` clears: the model entry is removed and the field's dirty flag
    /// reset. Any other value sets the entry and marks the field dirty, then
    /// applies the option-deselection and composite-emptiness clears.
    pub fn set_model_value(
        &mut self,
        tag: &FieldTag,
        value: Option<Value>,
    ) -> Result<(), FormError> {
        let field = self
            .fields
            .get_mut(tag)
            .ok_or_else(|| FormError::UnknownTag(tag.clone()))?;

        let Some(value) = value else {
            field.dirty = false;
            self.model.shift_remove(tag);
            log::trace!("cleared model value for '{tag}'");
            return Ok(());
        };

        field.dirty = true;
        let field_type = field.field_type;
        let entry = ModelEntry {
            value: value.clone(),
            field_type: field
                .definition
                .as_ref()
                .map(|def| def.definition_type.clone()),
            definition_id: field
                .definition
                .as_ref()
                .map(|def| def.definition_id.clone()),
        };
        let option_children: Vec<(String, Vec<FieldTag>)> = field
            .options
            .iter()
            .map(|option| (option.id.clone(), option.fields.clone()))
            .collect();
        let children = field.children.clone();

        self.model.insert(tag.clone(), entry);

        // Deselecting an option retracts every answer nested under it.
        if !option_children.is_empty() {
            let selected = selected_ids(&value);
            let mut to_clear = Vec::new();
            for (option_id, option_fields) in &option_children {
                if !selected.iter().any(|id| id == option_id) {
                    collect_descendants(&self.fields, option_fields, &mut to_clear);
                }
            }
            for descendant in to_clear {
                if self.model.contains_key(&descendant) {
                    self.set_model_value(&descendant, None)?;
                }
            }
        }

        // An emptied composite field retracts its children's answers.
        if !children.is_empty() && is_empty_value(field_type, &value) {
            for child in children {
                if self.model.contains_key(&child) {
                    self.set_model_value(&child, None)?;
                }
            }
        }

        Ok(())
    }

    /// The raw value stored for a tag, unwrapped from its envelope. `None`
    /// when no value was ever set or the value was cleared.
    pub fn get_model_value(&self, tag: &FieldTag) -> Option<&Value> {
        self.model.get(tag).map(|entry| &entry.value)
    }

    /// The full envelope map, e.g. for persistence by the caller.
    pub fn model(&self) -> &IndexMap<FieldTag, ModelEntry> {
        &self.model
    }

    /// Tags whose values were explicitly set through this instance.
    pub fn dirty_tags(&self) -> impl Iterator<Item = &FieldTag> {
        self.fields
            .iter()
            .filter(|(_, field)| field.dirty)
            .map(|(tag, _)| tag)
    }
}

/// The new value interpreted as a collection of selected option ids, in
/// stringified form. Scalar values select exactly one id.
fn selected_ids(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(stringify_id).collect(),
        other => vec![stringify_id(other)],
    }
}

/// Collect `roots` and every field nested below them, through both child
/// fields and option-nested fields.
fn collect_descendants(
    fields: &IndexMap<FieldTag, Field>,
    roots: &[FieldTag],
    out: &mut Vec<FieldTag>,
) {
    for tag in roots {
        out.push(tag.clone());
        if let Some(field) = fields.get(tag) {
            collect_descendants(fields, &field.children, out);
            for option in &field.options {
                collect_descendants(fields, &option.fields, out);
            }
        }
    }
}

/// Type-specific emptiness policy deciding when a composite field's new
/// value clears its children.
fn is_empty_value(field_type: FieldType, value: &Value) -> bool {
    match field_type {
        FieldType::Boolean => value == &Value::Bool(false),
        FieldType::Number => !value.is_number(),
        FieldType::Array => value.as_array().map_or(true, |items| items.is_empty()),
        FieldType::String | FieldType::Date | FieldType::Composite => match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        },
    }
}
