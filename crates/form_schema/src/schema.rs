//! Descriptor tree for the authored form schema.
//!
//! These data structures capture the section → subsection → field hierarchy
//! exactly as it is supplied by the definition transport. They are plain
//! serde types; all runtime decoration (parent links, compiled patterns,
//! component resolution) happens in the engine crate.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Identifier of a single field, unique across the whole form definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldTag(Arc<str>);

impl FieldTag {
    /// Create a new field tag.
    pub fn new(tag: impl Into<String>) -> Self {
        let tag: String = tag.into();
        Self(Arc::<str>::from(tag.into_boxed_str()))
    }

    /// Borrow the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldTag {
    fn from(value: &str) -> Self {
        Self(Arc::<str>::from(value))
    }
}

impl From<String> for FieldTag {
    fn from(value: String) -> Self {
        Self(Arc::<str>::from(value.into_boxed_str()))
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for FieldTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FieldTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(FieldTag::new(value))
    }
}

/// Value type of a field. Drives the emptiness policy used when clearing
/// composite children and the update behavior of default-value merges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum FieldType {
    Boolean,
    Number,
    String,
    Date,
    Array,
    Composite,
}

/// Ordered collection of sections making up the form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Sections in authored order; display order is `sort_order`.
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
}

impl Schema {
    /// True when the schema carries no sections at all.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// A top-level section of the form.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpec {
    /// Identifier of the section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Explicit display position; sections are sorted by this at decoration.
    #[serde(default)]
    pub sort_order: i32,
    /// Subsections in display order.
    #[serde(default)]
    pub subsections: Vec<SubsectionSpec>,
}

/// A subsection grouping fields inside a section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubsectionSpec {
    /// Identifier of the subsection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Fields in display order.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Description of a single field as authored in the definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Unique tag of the field.
    pub tag: FieldTag,
    /// Value type. Required; a missing type aborts decoration.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    /// Optional identifier used as the calc-trigger key. Falls back to `tag`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Optional validation pattern, compiled to a regular expression at
    /// decoration time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Child fields of a composite field, keyed by tag.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<FieldTag, FieldSpec>,
    /// Selectable options, each possibly owning nested fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSpec>,
    /// Expression deciding whether the field is shown. Absent means visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_condition: Option<Value>,
    /// Conditional default values evaluated in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_value_conditions: Vec<DefaultValueCondition>,
    /// Marks the field as a calculation trigger source.
    #[serde(default)]
    pub calc: bool,
    /// Provenance link to an originating domain-object definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<DefinitionRef>,
}

/// A selectable option belonging to exactly one parent field.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSpec {
    /// Option identifier; string or number in the transport, compared in
    /// stringified form at runtime.
    pub id: Value,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Fields nested under this option, keyed by tag.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<FieldTag, FieldSpec>,
    /// Option-level default-value conditions, used when the owning field
    /// defines none of its own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_value_conditions: Vec<DefaultValueCondition>,
}

impl OptionSpec {
    /// The option id in the stringified form used for selection comparison.
    pub fn id_string(&self) -> String {
        stringify_id(&self.id)
    }
}

/// One guarded default value: when `condition` evaluates true, `expression`
/// yields the candidate value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultValueCondition {
    /// Boolean guard expression, opaque to the engine.
    pub condition: Value,
    /// Value expression, opaque to the engine.
    pub expression: Value,
}

/// Back-reference to the domain object a field was generated from.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionRef {
    /// Domain-object type.
    #[serde(rename = "type")]
    pub definition_type: String,
    /// Domain-object identifier.
    pub definition_id: String,
}

/// Stringify an id value the way selection comparison expects: strings keep
/// their content, everything else uses its JSON rendering.
pub fn stringify_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn field_spec_roundtrip_uses_transport_names() {
        let raw = json!({
            "tag": "smoker",
            "type": "BOOLEAN",
            "showCondition": {"ref": "age", "gte": 16},
            "defaultValueConditions": [
                {"condition": true, "expression": false}
            ],
            "calc": true,
            "definition": {"type": "Observation", "definitionId": "obs-7"}
        });

        let spec: FieldSpec = serde_json::from_value(raw).unwrap();
        assert_eq!(spec.tag.as_str(), "smoker");
        assert_eq!(spec.field_type, Some(FieldType::Boolean));
        assert!(spec.calc);
        assert!(spec.show_condition.is_some());
        assert_eq!(spec.default_value_conditions.len(), 1);
        assert_eq!(
            spec.definition.as_ref().unwrap().definition_id,
            "obs-7"
        );
    }

    #[test]
    fn option_id_stringifies_numbers_and_strings() {
        let opt: OptionSpec = serde_json::from_value(json!({"id": 3})).unwrap();
        assert_eq!(opt.id_string(), "3");

        let opt: OptionSpec = serde_json::from_value(json!({"id": "yes"})).unwrap();
        assert_eq!(opt.id_string(), "yes");
    }

    #[test]
    fn nested_option_fields_deserialize() {
        let raw = json!({
            "tag": "pets",
            "type": "ARRAY",
            "options": [
                {
                    "id": "dog",
                    "fields": {
                        "dogName": {"tag": "dogName", "type": "STRING"}
                    }
                }
            ]
        });

        let spec: FieldSpec = serde_json::from_value(raw).unwrap();
        assert_eq!(spec.options.len(), 1);
        assert!(spec.options[0].fields.contains_key(&FieldTag::from("dogName")));
    }

    #[test]
    fn missing_type_survives_deserialization() {
        // The type check belongs to decoration, not parsing.
        let spec: FieldSpec = serde_json::from_value(json!({"tag": "x"})).unwrap();
        assert_eq!(spec.field_type, None);
    }
}
