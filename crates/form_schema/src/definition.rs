//! Root definition structure: schema, UI annotations, and dependency maps.
//!
//! A [`FormDefinition`] is supplied whole by the caller and treated as
//! immutable by the engine, with one documented exception: the decorator may
//! insert minimal component entries into the UI schema for synthesized
//! fields (see [`UiSchema::insert_component_override`]).

use crate::schema::{FieldTag, Schema};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use smallvec::SmallVec;

/// Complete, externally supplied form definition.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    /// The section/subsection/field tree.
    #[serde(default)]
    pub schema: Schema,
    /// UI annotations keyed by field tag.
    #[serde(default)]
    pub ui_schema: UiSchema,
    /// Calculation specs keyed by the tag they produce.
    #[serde(default)]
    pub calc_expression_map: CalcExpressionMap,
    /// Calc-trigger edges: field id → tags to recalculate.
    #[serde(default)]
    pub calc_trigger_map: TriggerMap,
    /// Default-value edges: tag → tags whose conditions to re-evaluate.
    #[serde(default)]
    pub default_value_trigger_map: TriggerMap,
}

impl FormDefinition {
    /// True when there is nothing to decorate. Construction rejects such
    /// definitions outright.
    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }
}

/// UI annotation map, tag → opaque annotation payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UiSchema(IndexMap<FieldTag, Value>);

impl UiSchema {
    /// Look up the annotation for a tag.
    pub fn get(&self, tag: &FieldTag) -> Option<&Value> {
        self.0.get(tag)
    }

    /// Insert or replace an annotation.
    pub fn insert(&mut self, tag: FieldTag, annotation: Value) {
        self.0.insert(tag, annotation);
    }

    /// Create the minimal `{"component": {"type": ...}}` entry used when a
    /// synthesized field carries an explicit component key. This is the one
    /// intentional mutation of caller-supplied state.
    pub fn insert_component_override(&mut self, tag: &FieldTag, component_key: &str) {
        self.0.insert(
            tag.clone(),
            json!({ "component": { "type": component_key } }),
        );
    }

    /// Number of annotated tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no tag is annotated.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldTag, &Value)> {
        self.0.iter()
    }
}

/// Dependency edges from a source key to the tags it dirties.
///
/// Calc triggers are keyed by field id, default-value triggers by tag; both
/// share this shape.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerMap(IndexMap<String, SmallVec<[FieldTag; 4]>>);

impl TriggerMap {
    /// Tags that depend on the given source key, in declared order.
    pub fn dependents_of(&self, key: &str) -> &[FieldTag] {
        self.0.get(key).map(|tags| tags.as_slice()).unwrap_or(&[])
    }

    /// Add a dependency edge.
    pub fn add(&mut self, key: impl Into<String>, dependent: FieldTag) {
        self.0.entry(key.into()).or_default().push(dependent);
    }

    /// True when the map has no edges.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Specification of one calculated value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcExpression {
    /// Evaluator-defined calculation kind.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub expression_type: Option<String>,
    /// Opaque expression payloads, interpreted by the evaluator.
    #[serde(default)]
    pub expressions: Vec<Value>,
}

/// Calculation specs keyed by the tag whose value they produce.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalcExpressionMap(IndexMap<FieldTag, CalcExpression>);

impl CalcExpressionMap {
    /// Look up the calculation spec for a target tag.
    pub fn get(&self, tag: &FieldTag) -> Option<&CalcExpression> {
        self.0.get(tag)
    }

    /// Register a calculation spec.
    pub fn insert(&mut self, tag: FieldTag, calc: CalcExpression) {
        self.0.insert(tag, calc);
    }

    /// True when no calculations are defined.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
