//! Live form instance runtime.
//!
//! The crate turns a declarative [`form_schema::FormDefinition`] into a
//! mutable form instance: a decorated field tree backed by a flat response
//! model, with trigger-map-driven recalculation, conditional defaults,
//! show/hide evaluation, and validation-status rollups. The rendering layer
//! reads sections, fields, values, and statuses, and writes exclusively
//! through the model store's single mutation entry point.
//!
//! # Example
//!
//! ```ignore
//! use form_engine::FormInstance;
//!
//! let mut instance = FormInstance::builder()
//!     .with_definition(definition)
//!     .with_expression_evaluator(evaluator)
//!     .with_validator(validator)
//!     .build()?;
//!
//! instance.apply_change(&"weight".into(), Some(serde_json::json!(80)))?;
//! ```
//!
//! Everything is synchronous and single-writer: one logical caller drives
//! one instance; cascades run to completion on the caller's stack.

pub mod collaborators;
pub mod error;
pub mod field;
pub mod instance;
pub mod model;
pub mod validation;

mod cascade;
mod decorate;
mod visibility;

// Re-export main types
pub use collaborators::{ComponentResolver, ExpressionEvaluator, FormValidator};
pub use error::FormError;
pub use field::{Field, OptionNode, ParentRef, Section, Subsection, UpdateBehavior};
pub use instance::{FormInstance, FormInstanceBuilder};
pub use model::ModelEntry;
pub use validation::{max_status, ValidationResult, ValidationResults, ValidationStatus};

// Re-export the descriptor crate for convenience.
pub use form_schema;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
