//! Field decoration: schema tree → arena of runtime fields.
//!
//! Decoration runs once, at instance construction. It walks a deep clone of
//! the schema's sections (sorted by `sort_order`), attaches runtime metadata
//! to every field and option-nested child, and produces the flat tag index
//! alongside the section layout. The caller's schema is never altered; the
//! only mutation of supplied state is the documented component-override
//! insertion into the UI schema.

use crate::collaborators::ComponentResolver;
use crate::error::FormError;
use crate::field::{Field, OptionNode, ParentRef, Section, Subsection, UpdateBehavior};
use form_schema::{FieldSpec, FieldTag, FormDefinition, UiSchema};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::Arc;

/// Output of a decoration pass: the section layout plus the flat tag index.
#[derive(Debug)]
pub(crate) struct Decorated {
    pub sections: Vec<Section>,
    pub fields: IndexMap<FieldTag, Field>,
}

struct DecorateCtx<'a> {
    fields: IndexMap<FieldTag, Field>,
    ui_schema: &'a mut UiSchema,
    overrides: &'a IndexMap<FieldTag, String>,
    resolver: Option<&'a Arc<dyn ComponentResolver>>,
}

/// Decorate the definition's schema into runtime fields.
///
/// `overrides` maps synthesized-field tags to explicit component keys; each
/// produces a minimal UI-schema entry as a side effect on `definition`.
pub(crate) fn decorate(
    definition: &mut FormDefinition,
    overrides: &IndexMap<FieldTag, String>,
    resolver: Option<&Arc<dyn ComponentResolver>>,
) -> Result<Decorated, FormError> {
    if definition.is_empty() {
        return Err(FormError::InvalidDefinition);
    }

    // Deep clone before touching anything; the supplied schema stays intact.
    let mut section_specs = definition.schema.sections.clone();
    section_specs.sort_by_key(|section| section.sort_order);

    let mut ctx = DecorateCtx {
        fields: IndexMap::new(),
        ui_schema: &mut definition.ui_schema,
        overrides,
        resolver,
    };

    let mut sections = Vec::with_capacity(section_specs.len());
    for section_spec in &section_specs {
        let mut subsections = Vec::with_capacity(section_spec.subsections.len());
        for subsection_spec in &section_spec.subsections {
            let mut tags = Vec::with_capacity(subsection_spec.fields.len());
            for field_spec in &subsection_spec.fields {
                tags.push(decorate_field(&mut ctx, field_spec, None)?);
            }
            subsections.push(Subsection {
                id: subsection_spec.id.clone(),
                title: subsection_spec.title.clone(),
                tags,
            });
        }
        sections.push(Section {
            id: section_spec.id.clone(),
            title: section_spec.title.clone(),
            sort_order: section_spec.sort_order,
            subsections,
        });
    }

    log::debug!(
        "decorated {} fields across {} sections",
        ctx.fields.len(),
        sections.len()
    );

    Ok(Decorated {
        sections,
        fields: ctx.fields,
    })
}

fn decorate_field(
    ctx: &mut DecorateCtx<'_>,
    spec: &FieldSpec,
    parent: Option<ParentRef>,
) -> Result<FieldTag, FormError> {
    let tag = spec.tag.clone();
    if ctx.fields.contains_key(&tag) {
        return Err(FormError::DuplicateTag(tag));
    }
    let field_type = spec
        .field_type
        .ok_or_else(|| FormError::MissingType(tag.clone()))?;

    if let Some(component_key) = ctx.overrides.get(&tag) {
        ctx.ui_schema.insert_component_override(&tag, component_key);
    }
    let ui_field = ctx.ui_schema.get(&tag).cloned();

    let component_type = ctx
        .resolver
        .and_then(|resolver| resolver.component_type(spec, ui_field.as_ref()));
    let component = ctx
        .resolver
        .and_then(|resolver| resolver.component_config(field_type, component_type.as_deref()));

    let pattern = spec
        .pattern
        .as_deref()
        .map(|raw| {
            Regex::new(raw).map_err(|source| FormError::Pattern {
                tag: tag.clone(),
                source,
            })
        })
        .transpose()?;

    // Decorate descendants before inserting the field itself, so parent
    // links exist by the time the index entry appears.
    let mut children = Vec::with_capacity(spec.fields.len());
    for child_spec in spec.fields.values() {
        children.push(decorate_field(
            ctx,
            child_spec,
            Some(ParentRef {
                tag: tag.clone(),
                option_id: None,
            }),
        )?);
    }

    let mut options = Vec::with_capacity(spec.options.len());
    for option_spec in &spec.options {
        let option_id = option_spec.id_string();
        let mut option_fields = Vec::with_capacity(option_spec.fields.len());
        for child_spec in option_spec.fields.values() {
            option_fields.push(decorate_field(
                ctx,
                child_spec,
                Some(ParentRef {
                    tag: tag.clone(),
                    option_id: Some(option_id.clone()),
                }),
            )?);
        }
        options.push(OptionNode {
            id: option_id,
            label: option_spec.label.clone(),
            fields: option_fields,
            default_value_conditions: option_spec.default_value_conditions.clone(),
        });
    }

    let field = Field {
        tag: tag.clone(),
        id: spec.id.clone(),
        field_type,
        ui_field,
        component_type,
        component,
        pattern,
        children,
        options,
        parent,
        dirty: false,
        show_condition: spec.show_condition.clone(),
        default_value_conditions: spec.default_value_conditions.clone(),
        calc: spec.calc,
        definition: spec.definition.clone(),
        update_behavior: UpdateBehavior::for_type(field_type),
    };

    if ctx.fields.insert(tag.clone(), field).is_some() {
        // A descendant decorated during recursion reused this tag.
        return Err(FormError::DuplicateTag(tag));
    }
    Ok(tag)
}
