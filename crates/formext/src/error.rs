use crate::model::AttributeType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    /// An empty name reached a resolver entry point. Always a caller bug.
    #[error("No {0} name given")]
    MissingName(&'static str),

    #[error("Attribute type \"{attribute_type}\" of \"{attribute}\" is not supported for section synchronization")]
    UnsupportedSyncType {
        attribute: String,
        attribute_type: AttributeType,
    },

    #[error("Format must contain a value")]
    EmptyTemplate,

    #[error("Value {0} is invalid. Valid values are 'always', 'dirty' or 'never'")]
    InvalidSubmitMode(String),

    #[error("Configuration error: {0}")]
    Config(#[from] confique::Error),

    #[error("Form script error: {0}")]
    Script(String),
}

pub type Result<T> = std::result::Result<T, FormError>;
