use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    /// The current schema of a relation could not be read. Startup cannot
    /// continue against an unknown schema.
    #[error("cannot inspect relation `{relation}`: {reason}")]
    Introspection { relation: String, reason: String },

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn introspection(relation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Introspection {
            relation: relation.into(),
            reason: reason.to_string(),
        }
    }
}
