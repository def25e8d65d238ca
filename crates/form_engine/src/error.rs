use form_schema::FieldTag;
use thiserror::Error;

/// Errors raised by the form engine. All are synchronous; any error during
/// decoration aborts instance construction entirely.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("invalid form definition: schema missing or empty")]
    InvalidDefinition,

    #[error("duplicate field tag: {0}")]
    DuplicateTag(FieldTag),

    #[error("field '{0}' has no type")]
    MissingType(FieldTag),

    #[error("invalid pattern on field '{tag}': {source}")]
    Pattern {
        tag: FieldTag,
        #[source]
        source: regex::Error,
    },

    #[error("unknown field tag: {0}")]
    UnknownTag(FieldTag),

    #[error("expression evaluator failed")]
    Evaluator(#[source] anyhow::Error),

    #[error("validator failed")]
    Validator(#[source] anyhow::Error),
}
