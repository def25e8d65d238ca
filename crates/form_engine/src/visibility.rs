//! Show-condition evaluation with the clear-on-hide side effect.

use crate::error::FormError;
use crate::instance::FormInstance;
use form_schema::FieldTag;
use serde_json::Value;

impl FormInstance {
    /// Evaluate a field's show-condition against the live model.
    ///
    /// Fields without a condition are always visible. When the condition
    /// evaluates false and the field currently holds a non-blank value, the
    /// value is cleared: hidden fields cannot retain stale answers. The
    /// check is idempotent; re-evaluating an already-cleared hidden field
    /// performs no further writes.
    pub fn evaluate_show_condition(&mut self, tag: &FieldTag) -> Result<bool, FormError> {
        let field = self
            .fields
            .get(tag)
            .ok_or_else(|| FormError::UnknownTag(tag.clone()))?;
        let Some(condition) = field.show_condition.clone() else {
            return Ok(true);
        };
        let Some(evaluator) = self.evaluator.clone() else {
            return Ok(true);
        };

        let visible = evaluator
            .eval_condition(&condition, self)
            .map_err(FormError::Evaluator)?;

        if !visible && self.get_model_value(tag).map_or(false, |value| !is_blank(value)) {
            log::trace!("hiding '{tag}' cleared its value");
            self.set_model_value(tag, None)?;
        }
        Ok(visible)
    }
}

/// Blankness used by the clear-on-hide guard: absent-like values do not
/// need clearing. `false` and `0` are real answers.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
