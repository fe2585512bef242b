use strum_macros::{Display, IntoStaticStr};

/// Failure category carried by an unsuccessful response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum MessageKind {
    None,
    InvalidUsage,
    InvalidOption,
    NotANumberOrCondition,
    LessThanZeroNumber,
    NoPlayersFound,
    UnsupportedArgumentVariables,
    MissingSource,
    BadArgumentVariable,
    DisabledScript,
    NotFoundScript,
    UnknownError,
}

/// Malformed arithmetic or condition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("'{formula}' is not a valid number or condition: {reason}")]
pub struct ExprError {
    pub formula: String,
    pub reason: String,
    /// What the formula did evaluate to, when it evaluated to the wrong type
    pub partial: Option<String>,
}

impl ExprError {
    pub fn new(formula: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            reason: reason.into(),
            partial: None,
        }
    }

    pub fn with_partial(mut self, partial: impl Into<String>) -> Self {
        self.partial = Some(partial.into());
        self
    }
}

/// Raised while coercing raw arguments against their declared types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArgumentError {
    #[error("missing arguments: expected {usage}, got {got}")]
    Missing { usage: String, got: usize },

    #[error("too many arguments: expected {usage}, got {got}")]
    TooMany { usage: String, got: usize },

    #[error("invalid value '{value}' for {argument}; expected one of: {expected}")]
    InvalidOption {
        argument: &'static str,
        value: String,
        expected: String,
    },

    #[error("invalid value for {argument}: {source}")]
    NotANumberOrCondition {
        argument: &'static str,
        #[source]
        source: ExprError,
    },

    #[error("{argument} must not be negative (got {value})")]
    LessThanZero { argument: &'static str, value: f64 },

    #[error("no players found matching '{input}'")]
    NoPlayersFound { input: String },

    #[error("'{input}' is produced by an argument-taking variable and cannot be used here")]
    UnsupportedArgumentVariables { input: String },

    #[error("argument {index} has not been supplied or has the wrong type")]
    NotSupplied { index: usize },

    #[error(transparent)]
    Variable(Box<VariableError>),
}

impl ArgumentError {
    pub fn kind(&self) -> MessageKind {
        match self {
            ArgumentError::Missing { .. }
            | ArgumentError::TooMany { .. }
            | ArgumentError::NotSupplied { .. } => MessageKind::InvalidUsage,
            ArgumentError::InvalidOption { .. } => MessageKind::InvalidOption,
            ArgumentError::NotANumberOrCondition { .. } => MessageKind::NotANumberOrCondition,
            ArgumentError::LessThanZero { .. } => MessageKind::LessThanZeroNumber,
            ArgumentError::NoPlayersFound { .. } => MessageKind::NoPlayersFound,
            ArgumentError::UnsupportedArgumentVariables { .. } => {
                MessageKind::UnsupportedArgumentVariables
            }
            ArgumentError::Variable(err) => err.kind(),
        }
    }
}

impl From<VariableError> for ArgumentError {
    fn from(err: VariableError) -> Self {
        ArgumentError::Variable(Box::new(err))
    }
}

/// Raised while resolving or evaluating a `{TOKEN}`
#[derive(Debug, Clone, thiserror::Error)]
pub enum VariableError {
    #[error("{{{variable}}}: {source}")]
    BadArgument {
        variable: String,
        #[source]
        source: Box<ArgumentError>,
    },

    #[error("{{{variable}}} needs a running script to be evaluated")]
    MissingSource { variable: String },

    #[error("{{{variable}}} holds players and must be read through {{GET:...}}")]
    UnsupportedType { variable: String },

    #[error("{{{variable}}} does not accept players produced by another argument-taking variable")]
    UnsupportedArgumentVariable { variable: String },

    #[error("{{{variable}}} could not be evaluated: {reason}")]
    Evaluation { variable: String, reason: String },
}

impl VariableError {
    pub fn bad_argument(variable: impl Into<String>, source: ArgumentError) -> Self {
        VariableError::BadArgument {
            variable: variable.into(),
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            VariableError::BadArgument { .. } => MessageKind::BadArgumentVariable,
            VariableError::MissingSource { .. } => MessageKind::MissingSource,
            VariableError::UnsupportedType { .. }
            | VariableError::UnsupportedArgumentVariable { .. } => {
                MessageKind::UnsupportedArgumentVariables
            }
            VariableError::Evaluation { .. } => MessageKind::UnknownError,
        }
    }
}

/// Raised by a script catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("script '{0}' is disabled")]
    Disabled(String),

    #[error("script '{0}' not found")]
    NotFound(String),

    #[error("failed to read script '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load script '{name}': {reason}")]
    Unknown { name: String, reason: String },
}

impl CatalogError {
    pub fn kind(&self) -> MessageKind {
        match self {
            CatalogError::Disabled(_) => MessageKind::DisabledScript,
            CatalogError::NotFound(_) => MessageKind::NotFoundScript,
            CatalogError::Io { .. } | CatalogError::Unknown { .. } => MessageKind::UnknownError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("script '{0}' has already been executed")]
    AlreadyExecuted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_variable_error_keeps_kind() {
        let err = ArgumentError::from(VariableError::MissingSource {
            variable: "DOORSTATE".to_string(),
        });
        assert_eq!(err.kind(), MessageKind::MissingSource);
    }

    #[test]
    fn test_variable_error_messages() {
        let err = VariableError::bad_argument(
            "GENERATORS",
            ArgumentError::InvalidOption {
                argument: "mode",
                value: "BOGUS".to_string(),
                expected: "ENGAGED, ACTIVATING".to_string(),
            },
        );
        assert_eq!(err.kind(), MessageKind::BadArgumentVariable);
        let message = err.to_string();
        assert!(message.starts_with("{GENERATORS}"));
        assert!(message.contains("BOGUS"));
    }

    #[test]
    fn test_catalog_error_kinds() {
        assert_eq!(
            CatalogError::Disabled("a".into()).kind(),
            MessageKind::DisabledScript
        );
        assert_eq!(
            CatalogError::NotFound("a".into()).kind(),
            MessageKind::NotFoundScript
        );
    }
}
