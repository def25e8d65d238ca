//! Decorated runtime field nodes and section layout.
//!
//! Decoration turns the schema's [`form_schema::FieldSpec`] tree into an
//! arena of [`Field`] nodes addressed by tag. Parent links are stored as tag
//! back-references ([`ParentRef`]), never as owning pointers, so the tree
//! carries no reference cycles. Fields live and die with the instance that
//! decorated them and are never shared between instances.

use form_schema::{DefaultValueCondition, DefinitionRef, FieldTag, FieldType};
use regex::Regex;
use serde_json::Value;

/// One decorated field, owned by its form instance.
#[derive(Clone, Debug)]
pub struct Field {
    /// Unique tag, enforced at decoration time.
    pub tag: FieldTag,
    /// Authored identifier, used as the calc-trigger key when present.
    pub id: Option<String>,
    /// Value type of the field.
    pub field_type: FieldType,
    /// Resolved UI annotation, if the UI schema carries one for this tag.
    pub ui_field: Option<Value>,
    /// Rendering-capability classification, opaque to the engine.
    pub component_type: Option<String>,
    /// Rendering-capability descriptor, opaque to the engine.
    pub component: Option<Value>,
    /// Compiled validation pattern.
    pub pattern: Option<Regex>,
    /// Tags of child fields (composite fields).
    pub children: Vec<FieldTag>,
    /// Selectable options, each possibly owning nested fields.
    pub options: Vec<OptionNode>,
    /// Back-reference to the owning field/option. Lookup only.
    pub parent: Option<ParentRef>,
    /// True once a value has been explicitly set through the model store,
    /// false after an explicit clear.
    pub dirty: bool,
    /// Expression deciding visibility; absent means always visible.
    pub show_condition: Option<Value>,
    /// Field-level conditional defaults, evaluated in declared order.
    pub default_value_conditions: Vec<DefaultValueCondition>,
    /// Marks the field as a calculation trigger source.
    pub calc: bool,
    /// Provenance link to the originating domain-object definition.
    pub definition: Option<DefinitionRef>,
    /// How candidate values merge into the current value.
    pub update_behavior: UpdateBehavior,
}

impl Field {
    /// Key used for calc-trigger lookups: the authored id when present,
    /// otherwise the tag.
    pub fn trigger_key(&self) -> &str {
        self.id.as_deref().unwrap_or_else(|| self.tag.as_str())
    }

    /// Check a candidate string against the compiled pattern. Fields without
    /// a pattern accept everything.
    pub fn matches_pattern(&self, candidate: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(candidate),
            None => true,
        }
    }

    /// The default-value conditions in effect for this field: its own list
    /// when non-empty, otherwise the flattened union of its options' lists.
    pub fn effective_default_value_conditions(&self) -> Vec<DefaultValueCondition> {
        if !self.default_value_conditions.is_empty() {
            return self.default_value_conditions.clone();
        }
        self.options
            .iter()
            .flat_map(|option| option.default_value_conditions.iter().cloned())
            .collect()
    }
}

/// A selectable option decorated into the arena.
#[derive(Clone, Debug)]
pub struct OptionNode {
    /// Stringified option id, the form used for selection comparison.
    pub id: String,
    /// Human-readable label.
    pub label: Option<String>,
    /// Tags of fields nested under this option.
    pub fields: Vec<FieldTag>,
    /// Option-level default-value conditions.
    pub default_value_conditions: Vec<DefaultValueCondition>,
}

/// Tag-based back-reference from a field to its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentRef {
    /// Tag of the owning field.
    pub tag: FieldTag,
    /// Set when the field is nested under one of the owner's options.
    pub option_id: Option<String>,
}

/// Closed set of value-merge behaviors, resolved per field type at
/// decoration. Invoked when a default-value cascade produces a candidate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateBehavior {
    /// The candidate overwrites the current value.
    Replace,
    /// The candidate toggles membership in the current collection, the same
    /// way a user adds or removes one selection from a checkbox group.
    Toggle,
}

impl UpdateBehavior {
    /// Behavior for a field type. Only ARRAY fields merge; everything else
    /// overwrites.
    pub fn for_type(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Array => Self::Toggle,
            _ => Self::Replace,
        }
    }

    /// Merge a candidate into the current value.
    pub fn apply(&self, current: Option<&Value>, candidate: Value) -> Value {
        match self {
            Self::Replace => candidate,
            Self::Toggle => {
                let mut items = match current {
                    Some(Value::Array(items)) => items.clone(),
                    Some(other) => vec![other.clone()],
                    None => Vec::new(),
                };
                match items.iter().position(|item| item == &candidate) {
                    Some(index) => {
                        items.remove(index);
                    }
                    None => items.push(candidate),
                }
                Value::Array(items)
            }
        }
    }
}

/// Decorated section layout, parallel to the field arena.
#[derive(Clone, Debug)]
pub struct Section {
    /// Identifier of the section.
    pub id: Option<String>,
    /// Human-readable title.
    pub title: Option<String>,
    /// Display position the sections were sorted by.
    pub sort_order: i32,
    /// Subsections in display order.
    pub subsections: Vec<Subsection>,
}

/// Decorated subsection holding top-level field tags.
#[derive(Clone, Debug)]
pub struct Subsection {
    /// Identifier of the subsection.
    pub id: Option<String>,
    /// Human-readable title.
    pub title: Option<String>,
    /// Tags of the subsection's top-level fields, in display order.
    pub tags: Vec<FieldTag>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn toggle_appends_missing_candidate() {
        let behavior = UpdateBehavior::for_type(FieldType::Array);
        let current = json!(["a"]);
        assert_eq!(
            behavior.apply(Some(&current), json!("b")),
            json!(["a", "b"])
        );
    }

    #[test]
    fn toggle_removes_present_candidate() {
        let behavior = UpdateBehavior::Toggle;
        let current = json!(["a", "b"]);
        assert_eq!(behavior.apply(Some(&current), json!("a")), json!(["b"]));
    }

    #[test]
    fn toggle_starts_collection_when_unset() {
        let behavior = UpdateBehavior::Toggle;
        assert_eq!(behavior.apply(None, json!("x")), json!(["x"]));
    }

    #[test]
    fn replace_overwrites() {
        let behavior = UpdateBehavior::for_type(FieldType::String);
        assert_eq!(
            behavior.apply(Some(&json!("old")), json!("new")),
            json!("new")
        );
    }
}
