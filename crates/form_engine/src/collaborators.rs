//! Trait seams for the engine's in-process collaborators.
//!
//! The engine has no network or file boundary; expressions, validation
//! rules, and component configuration are all supplied by the embedding
//! application through these traits. The instance is passed back into each
//! call so collaborators can read any field's current model value.

use crate::instance::FormInstance;
use crate::validation::{ValidationResults, ValidationStatus};
use form_schema::{CalcExpression, FieldSpec, FieldType};
use serde_json::Value;

/// Evaluates opaque condition and value expressions against a live instance.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate a boolean condition expression.
    fn eval_condition(&self, expr: &Value, instance: &FormInstance) -> anyhow::Result<bool>;

    /// Evaluate a value expression.
    fn eval_expression(&self, expr: &Value, instance: &FormInstance) -> anyhow::Result<Value>;

    /// Evaluate a calculation spec from the calc expression map.
    fn eval_calculation(
        &self,
        calc: &CalcExpression,
        instance: &FormInstance,
    ) -> anyhow::Result<Value>;
}

/// External validation rules producing a status per tag.
///
/// The severity comparison lives here as well so embedders with custom
/// status scales can replace the default OK < WARNING < ERROR ordering.
pub trait FormValidator: Send + Sync {
    /// Run the rules against the instance, writing results into the sink.
    fn validate(
        &self,
        instance: &FormInstance,
        results: &mut ValidationResults,
    ) -> anyhow::Result<()>;

    /// Hook invoked after `validate`, e.g. to fold cross-field results.
    fn post_process(&self, results: &mut ValidationResults) -> anyhow::Result<()> {
        let _ = results;
        Ok(())
    }

    /// True when `candidate` outranks `current` in severity.
    fn is_more_severe(&self, candidate: ValidationStatus, current: ValidationStatus) -> bool {
        candidate > current
    }

    /// True when the status blocks submission.
    fn is_error(&self, status: ValidationStatus) -> bool {
        status == ValidationStatus::Error
    }
}

/// Resolves rendering-capability descriptors for decorated fields. Treated
/// as a pure function of field metadata.
pub trait ComponentResolver: Send + Sync {
    /// Classify the component for a field, given its UI annotation.
    fn component_type(&self, field: &FieldSpec, ui_field: Option<&Value>) -> Option<String>;

    /// Look up the component descriptor for a `(type, component_type)` pair.
    fn component_config(
        &self,
        field_type: FieldType,
        component_type: Option<&str>,
    ) -> Option<Value>;
}
