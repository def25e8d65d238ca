//! Dependency cascades driven by the definition's trigger maps.
//!
//! Two independent cascades run off a changed field. The calculation cascade
//! recomputes tags listed in the calc-trigger map and, for each written tag,
//! composes directly into the default-value cascade. The default-value
//! cascade re-evaluates conditional defaults for tags listed in the
//! default-value trigger map. Both are plain synchronous recursion: the
//! trigger maps are assumed acyclic, and nothing is deduplicated — two
//! chains targeting the same tag both execute, in chain order.

use crate::error::FormError;
use crate::instance::FormInstance;
use form_schema::{FieldTag, FieldType};
use smallvec::SmallVec;

impl FormInstance {
    /// Run the calculation cascade for a changed field.
    ///
    /// A no-op unless the field is marked `calc`. Dependent tags are looked
    /// up by the field's trigger key, recomputed through the expression
    /// evaluator, written via the model store, and each write immediately
    /// triggers the default-value cascade for the written tag.
    pub fn calculate_fields(&mut self, changed: &FieldTag) -> Result<(), FormError> {
        let field = self
            .fields
            .get(changed)
            .ok_or_else(|| FormError::UnknownTag(changed.clone()))?;
        if !field.calc {
            return Ok(());
        }
        let trigger_key = field.trigger_key().to_owned();

        let dependents: SmallVec<[FieldTag; 4]> = self
            .definition
            .calc_trigger_map
            .dependents_of(&trigger_key)
            .iter()
            .cloned()
            .collect();
        if dependents.is_empty() {
            return Ok(());
        }
        let Some(evaluator) = self.evaluator.clone() else {
            log::debug!("calc cascade for '{changed}' skipped: no evaluator configured");
            return Ok(());
        };
        log::debug!(
            "calc cascade for '{changed}' (key '{trigger_key}'): {} dependent(s)",
            dependents.len()
        );

        for dependent in dependents {
            let Some(calc) = self.definition.calc_expression_map.get(&dependent) else {
                continue;
            };
            let calc = calc.clone();
            let value = evaluator
                .eval_calculation(&calc, self)
                .map_err(FormError::Evaluator)?;
            self.set_model_value(&dependent, Some(value))?;
            self.trigger_default_value_evaluation(&dependent)?;
        }
        Ok(())
    }

    /// Run the default-value cascade for a changed tag: re-evaluate the
    /// conditional defaults of every tag depending on it.
    pub fn trigger_default_value_evaluation(&mut self, changed: &FieldTag) -> Result<(), FormError> {
        let dependents: SmallVec<[FieldTag; 4]> = self
            .definition
            .default_value_trigger_map
            .dependents_of(changed.as_str())
            .iter()
            .cloned()
            .collect();
        if dependents.is_empty() {
            return Ok(());
        }
        log::debug!(
            "default-value cascade for '{changed}': {} dependent(s)",
            dependents.len()
        );
        self.evaluate_default_value_conditions(&dependents)
    }

    /// Evaluate the conditional defaults of the given tags, in order. Within
    /// one field's condition list every true guard writes; the last true
    /// condition wins.
    pub fn evaluate_default_value_conditions(
        &mut self,
        dependents: &[FieldTag],
    ) -> Result<(), FormError> {
        let Some(evaluator) = self.evaluator.clone() else {
            return Ok(());
        };

        for dependent in dependents {
            let Some(field) = self.fields.get(dependent) else {
                continue;
            };
            let conditions = field.effective_default_value_conditions();
            let field_type = field.field_type;
            let behavior = field.update_behavior;

            for condition in &conditions {
                let guard = evaluator
                    .eval_condition(&condition.condition, self)
                    .map_err(FormError::Evaluator)?;
                if !guard {
                    continue;
                }
                let candidate = evaluator
                    .eval_expression(&condition.expression, self)
                    .map_err(FormError::Evaluator)?;
                // ARRAY targets merge the candidate into the current
                // collection instead of overwriting it.
                let value = if field_type == FieldType::Array {
                    behavior.apply(self.get_model_value(dependent), candidate)
                } else {
                    candidate
                };
                self.set_model_value(dependent, Some(value))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::collaborators::ExpressionEvaluator;
    use crate::instance::FormInstance;
    use form_schema::{CalcExpression, FieldTag, FormDefinition};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    /// Minimal evaluator for tests. Conditions: `{"gt": [tag, n]}`.
    /// Expressions: `{"lit": v}` or a tag name string (model lookup).
    /// Calculations with type "SUM" add the numeric values of the listed tags.
    struct TestEvaluator;

    fn number_at(instance: &FormInstance, tag: &str) -> f64 {
        instance
            .get_model_value(&FieldTag::from(tag))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    impl ExpressionEvaluator for TestEvaluator {
        fn eval_condition(&self, expr: &Value, instance: &FormInstance) -> anyhow::Result<bool> {
            if let Some(args) = expr.get("gt").and_then(Value::as_array) {
                let tag = args[0].as_str().unwrap_or_default();
                let threshold = args[1].as_f64().unwrap_or(f64::MAX);
                return Ok(number_at(instance, tag) > threshold);
            }
            Ok(expr.as_bool().unwrap_or(false))
        }

        fn eval_expression(&self, expr: &Value, instance: &FormInstance) -> anyhow::Result<Value> {
            if let Some(lit) = expr.get("lit") {
                return Ok(lit.clone());
            }
            if let Some(tag) = expr.as_str() {
                return Ok(instance
                    .get_model_value(&FieldTag::from(tag))
                    .cloned()
                    .unwrap_or(Value::Null));
            }
            Ok(expr.clone())
        }

        fn eval_calculation(
            &self,
            calc: &CalcExpression,
            instance: &FormInstance,
        ) -> anyhow::Result<Value> {
            match calc.expression_type.as_deref() {
                Some("SUM") => {
                    let sum: f64 = calc
                        .expressions
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|tag| number_at(instance, tag))
                        .sum();
                    Ok(json!(sum))
                }
                other => anyhow::bail!("unsupported calculation type {other:?}"),
            }
        }
    }

    fn tag(s: &str) -> FieldTag {
        FieldTag::from(s)
    }

    fn cascade_definition() -> FormDefinition {
        serde_json::from_value(json!({
            "schema": {"sections": [{"subsections": [{"fields": [
                {"tag": "a", "type": "NUMBER", "id": "fieldId1", "calc": true},
                {"tag": "b", "type": "NUMBER", "id": "fieldId1", "calc": true},
                {"tag": "total", "type": "NUMBER"},
                {
                    "tag": "totalRadio", "type": "STRING",
                    "defaultValueConditions": [
                        {"condition": {"gt": ["total", 10]}, "expression": {"lit": "high"}}
                    ]
                }
            ]}]}]},
            "calcExpressionMap": {
                "total": {"type": "SUM", "expressions": ["a", "b"]}
            },
            "calcTriggerMap": {"fieldId1": ["total"]},
            "defaultValueTriggerMap": {"total": ["totalRadio"]}
        }))
        .unwrap()
    }

    fn cascade_instance() -> FormInstance {
        FormInstance::builder()
            .with_definition(cascade_definition())
            .with_expression_evaluator(TestEvaluator)
            .build()
            .unwrap()
    }

    #[test]
    fn calculation_composes_into_default_values() {
        let mut instance = cascade_instance();

        instance.set_model_value(&tag("a"), Some(json!(6))).unwrap();
        instance.calculate_fields(&tag("a")).unwrap();
        assert_eq!(instance.get_model_value(&tag("total")), Some(&json!(6.0)));
        assert_eq!(instance.get_model_value(&tag("totalRadio")), None);

        instance.set_model_value(&tag("b"), Some(json!(7))).unwrap();
        instance.calculate_fields(&tag("b")).unwrap();
        assert_eq!(instance.get_model_value(&tag("total")), Some(&json!(13.0)));
        assert_eq!(
            instance.get_model_value(&tag("totalRadio")),
            Some(&json!("high"))
        );
    }

    #[test]
    fn non_calc_fields_do_not_trigger() {
        let mut instance = cascade_instance();

        instance.set_model_value(&tag("total"), Some(json!(99))).unwrap();
        instance.calculate_fields(&tag("total")).unwrap();
        // 'total' is not a calc source; nothing recomputed it to 0.
        assert_eq!(instance.get_model_value(&tag("total")), Some(&json!(99)));
    }

    #[test]
    fn last_true_condition_wins() {
        let definition: FormDefinition = serde_json::from_value(json!({
            "schema": {"sections": [{"subsections": [{"fields": [
                {"tag": "score", "type": "NUMBER"},
                {
                    "tag": "band", "type": "STRING",
                    "defaultValueConditions": [
                        {"condition": {"gt": ["score", 0]}, "expression": {"lit": "low"}},
                        {"condition": {"gt": ["score", 10]}, "expression": {"lit": "high"}}
                    ]
                }
            ]}]}]},
            "defaultValueTriggerMap": {"score": ["band"]}
        }))
        .unwrap();

        let mut instance = FormInstance::builder()
            .with_definition(definition)
            .with_expression_evaluator(TestEvaluator)
            .build()
            .unwrap();

        instance.set_model_value(&tag("score"), Some(json!(50))).unwrap();
        instance.trigger_default_value_evaluation(&tag("score")).unwrap();
        assert_eq!(instance.get_model_value(&tag("band")), Some(&json!("high")));

        instance.set_model_value(&tag("score"), Some(json!(5))).unwrap();
        instance.trigger_default_value_evaluation(&tag("score")).unwrap();
        assert_eq!(instance.get_model_value(&tag("band")), Some(&json!("low")));
    }

    #[test]
    fn array_targets_toggle_instead_of_overwrite() {
        let definition: FormDefinition = serde_json::from_value(json!({
            "schema": {"sections": [{"subsections": [{"fields": [
                {"tag": "score", "type": "NUMBER"},
                {
                    "tag": "flags", "type": "ARRAY",
                    "defaultValueConditions": [
                        {"condition": {"gt": ["score", 10]}, "expression": {"lit": "review"}}
                    ]
                }
            ]}]}]},
            "defaultValueTriggerMap": {"score": ["flags"]}
        }))
        .unwrap();

        let mut instance = FormInstance::builder()
            .with_definition(definition)
            .with_expression_evaluator(TestEvaluator)
            .build()
            .unwrap();

        instance
            .set_model_value(&tag("flags"), Some(json!(["manual"])))
            .unwrap();
        instance.set_model_value(&tag("score"), Some(json!(20))).unwrap();
        instance.trigger_default_value_evaluation(&tag("score")).unwrap();

        // Merged into the existing collection, not overwritten.
        assert_eq!(
            instance.get_model_value(&tag("flags")),
            Some(&json!(["manual", "review"]))
        );

        // Triggering again toggles the candidate back out.
        instance.trigger_default_value_evaluation(&tag("score")).unwrap();
        assert_eq!(
            instance.get_model_value(&tag("flags")),
            Some(&json!(["manual"]))
        );
    }

    #[test]
    fn option_level_conditions_are_flattened() {
        let definition: FormDefinition = serde_json::from_value(json!({
            "schema": {"sections": [{"subsections": [{"fields": [
                {"tag": "score", "type": "NUMBER"},
                {
                    "tag": "choice", "type": "STRING",
                    "options": [
                        {"id": "low", "defaultValueConditions": []},
                        {"id": "high", "defaultValueConditions": [
                            {"condition": {"gt": ["score", 10]}, "expression": {"lit": "high"}}
                        ]}
                    ]
                }
            ]}]}]},
            "defaultValueTriggerMap": {"score": ["choice"]}
        }))
        .unwrap();

        let mut instance = FormInstance::builder()
            .with_definition(definition)
            .with_expression_evaluator(TestEvaluator)
            .build()
            .unwrap();

        instance.set_model_value(&tag("score"), Some(json!(11))).unwrap();
        instance.trigger_default_value_evaluation(&tag("score")).unwrap();
        assert_eq!(
            instance.get_model_value(&tag("choice")),
            Some(&json!("high"))
        );
    }

    #[test]
    fn missing_evaluator_makes_cascades_noops() {
        let mut instance = FormInstance::builder()
            .with_definition(cascade_definition())
            .build()
            .unwrap();

        instance.set_model_value(&tag("a"), Some(json!(6))).unwrap();
        instance.calculate_fields(&tag("a")).unwrap();
        assert_eq!(instance.get_model_value(&tag("total")), None);
    }
}
