//! Serializable descriptors for declarative form definitions.
//!
//! The crate focuses on *data* handling — the section/subsection/field tree,
//! the parallel UI-annotation map, and the dependency maps that drive
//! recalculation. Definitions are authored externally (typically as JSON),
//! deserialized whole, and handed to the engine crate which decorates them
//! into live form instances.
//!
//! # Example
//!
//! ```ignore
//! use form_schema::{FieldTag, FormDefinition};
//!
//! let definition: FormDefinition = serde_json::from_str(raw_json)?;
//! let deps = definition.calc_trigger_map.dependents_of("bmiSource");
//! ```

pub mod definition;
pub mod schema;

// Re-export main types
pub use definition::{CalcExpression, CalcExpressionMap, FormDefinition, TriggerMap, UiSchema};
pub use schema::{
    stringify_id, DefaultValueCondition, DefinitionRef, FieldSpec, FieldTag, FieldType,
    OptionSpec, Schema, SectionSpec, SubsectionSpec,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
