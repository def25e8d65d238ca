//! The live form instance: owned field tree, response model, and status.
//!
//! A [`FormInstance`] is built once from a [`FormDefinition`] plus optional
//! collaborators, then driven synchronously by value-change events. Every
//! operation runs to completion on the caller's stack; the instance is the
//! sole owner of its mutable state and assumes a single logical writer.

use crate::collaborators::{ComponentResolver, ExpressionEvaluator, FormValidator};
use crate::decorate;
use crate::error::FormError;
use crate::field::{Field, Section, Subsection};
use crate::model::ModelEntry;
use crate::validation::{max_status, ValidationResult, ValidationResults, ValidationStatus};
use form_schema::{FieldTag, FormDefinition};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Builder for a [`FormInstance`].
pub struct FormInstanceBuilder {
    definition: Option<FormDefinition>,
    model: IndexMap<FieldTag, ModelEntry>,
    evaluator: Option<Arc<dyn ExpressionEvaluator>>,
    validator: Option<Arc<dyn FormValidator>>,
    resolver: Option<Arc<dyn ComponentResolver>>,
    component_overrides: IndexMap<FieldTag, String>,
}

impl FormInstanceBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            definition: None,
            model: IndexMap::new(),
            evaluator: None,
            validator: None,
            resolver: None,
            component_overrides: IndexMap::new(),
        }
    }

    /// Supply the form definition. Required.
    pub fn with_definition(mut self, definition: FormDefinition) -> Self {
        self.definition = Some(definition);
        self
    }

    /// Seed the response model, e.g. with previously saved answers.
    pub fn with_model(mut self, model: IndexMap<FieldTag, ModelEntry>) -> Self {
        self.model = model;
        self
    }

    /// Install the expression evaluator driving conditions and calculations.
    pub fn with_expression_evaluator<E>(mut self, evaluator: E) -> Self
    where
        E: ExpressionEvaluator + 'static,
    {
        self.evaluator = Some(Arc::new(evaluator));
        self
    }

    /// Install the external validator.
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: FormValidator + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Install the component configuration lookup.
    pub fn with_component_resolver<R>(mut self, resolver: R) -> Self
    where
        R: ComponentResolver + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Force a component key for a (typically synthesized) field. The
    /// decorator records a minimal UI-schema entry for the tag.
    pub fn with_component_override(
        mut self,
        tag: impl Into<FieldTag>,
        component_key: impl Into<String>,
    ) -> Self {
        self.component_overrides
            .insert(tag.into(), component_key.into());
        self
    }

    /// Decorate the definition and build the instance. Any decoration error
    /// aborts construction; no partially built instance is returned.
    pub fn build(self) -> Result<FormInstance, FormError> {
        let mut definition = self.definition.ok_or(FormError::InvalidDefinition)?;
        let decorated = decorate::decorate(
            &mut definition,
            &self.component_overrides,
            self.resolver.as_ref(),
        )?;

        Ok(FormInstance {
            definition,
            sections: decorated.sections,
            fields: decorated.fields,
            model: self.model,
            results: ValidationResults::default(),
            evaluator: self.evaluator,
            validator: self.validator,
        })
    }
}

impl Default for FormInstanceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A live, mutable form instance.
pub struct FormInstance {
    pub(crate) definition: FormDefinition,
    pub(crate) sections: Vec<Section>,
    pub(crate) fields: IndexMap<FieldTag, Field>,
    pub(crate) model: IndexMap<FieldTag, ModelEntry>,
    pub(crate) results: ValidationResults,
    pub(crate) evaluator: Option<Arc<dyn ExpressionEvaluator>>,
    pub(crate) validator: Option<Arc<dyn FormValidator>>,
}

impl FormInstance {
    /// Create a new builder.
    pub fn builder() -> FormInstanceBuilder {
        FormInstanceBuilder::new()
    }

    /// The definition this instance was built from. Note that the UI schema
    /// may carry component-override entries inserted at decoration.
    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    /// Decorated sections in display order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Look up a decorated field by tag.
    pub fn field(&self, tag: &FieldTag) -> Option<&Field> {
        self.fields.get(tag)
    }

    /// Iterate over all decorated fields in decoration order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldTag, &Field)> {
        self.fields.iter()
    }

    /// Apply one external edit: write the value, run both dependency
    /// cascades off the changed tag, then refresh validation.
    pub fn apply_change(&mut self, tag: &FieldTag, value: Option<Value>) -> Result<(), FormError> {
        self.set_model_value(tag, value)?;
        self.calculate_fields(tag)?;
        self.trigger_default_value_evaluation(tag)?;
        self.validate()
    }

    // --- Validation orchestration -------------------------------------

    /// Run the external validator, replacing all previous results. A no-op
    /// when no validator is configured.
    pub fn validate(&mut self) -> Result<(), FormError> {
        let Some(validator) = self.validator.clone() else {
            return Ok(());
        };

        let mut results = std::mem::take(&mut self.results);
        results.clear();
        let outcome = validator
            .validate(self, &mut results)
            .and_then(|()| validator.post_process(&mut results));
        self.results = results;
        outcome.map_err(FormError::Validator)
    }

    /// The result recorded for a tag in the last validation run.
    pub fn validation_result(&self, tag: &FieldTag) -> Option<&ValidationResult> {
        self.results.get(tag)
    }

    /// All results of the last validation run.
    pub fn validation_results(&self) -> &ValidationResults {
        &self.results
    }

    /// Most severe status among a subsection's fields.
    pub fn subsection_status(&self, subsection: &Subsection) -> ValidationStatus {
        max_status(
            subsection
                .tags
                .iter()
                .filter_map(|tag| self.results.status_of(tag)),
            |a, b| self.more_severe(a, b),
        )
    }

    /// Most severe status among a section's subsections.
    pub fn section_status(&self, section: &Section) -> ValidationStatus {
        max_status(
            section
                .subsections
                .iter()
                .map(|subsection| self.subsection_status(subsection)),
            |a, b| self.more_severe(a, b),
        )
    }

    /// True when any recorded result blocks submission.
    pub fn has_error(&self) -> bool {
        self.results.statuses().any(|status| match &self.validator {
            Some(validator) => validator.is_error(status),
            None => status == ValidationStatus::Error,
        })
    }

    fn more_severe(&self, candidate: ValidationStatus, current: ValidationStatus) -> bool {
        match &self.validator {
            Some(validator) => validator.is_more_severe(candidate, current),
            None => candidate > current,
        }
    }
}
