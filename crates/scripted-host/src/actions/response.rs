use std::fmt;

use crate::error::{ArgumentError, MessageKind};

/// Result of one action invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    success: bool,
    kind: MessageKind,
    context: Vec<String>,
    halt: bool,
}

impl ActionResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            kind: MessageKind::None,
            context: Vec::new(),
            halt: false,
        }
    }

    /// Successful response that stops the rest of the script
    pub fn halt() -> Self {
        Self {
            halt: true,
            ..Self::success()
        }
    }

    /// A failure always carries a category; `MessageKind::None` is promoted to
    /// `UnknownError`
    pub fn failure(kind: MessageKind, context: impl IntoIterator<Item = String>) -> Self {
        let kind = match kind {
            MessageKind::None => MessageKind::UnknownError,
            kind => kind,
        };
        Self {
            success: false,
            kind,
            context: context.into_iter().collect(),
            halt: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Formatting context for the failure message
    pub fn context(&self) -> &[String] {
        &self.context
    }

    pub fn halts(&self) -> bool {
        self.halt
    }
}

impl From<ArgumentError> for ActionResponse {
    fn from(err: ArgumentError) -> Self {
        ActionResponse::failure(err.kind(), [err.to_string()])
    }
}

impl fmt::Display for ActionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            return write!(f, "OK");
        }
        write!(f, "{}", self.kind)?;
        if !self.context.is_empty() {
            write!(f, ": {}", self.context.join("; "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_never_has_empty_kind() {
        let response = ActionResponse::failure(MessageKind::None, Vec::new());
        assert!(!response.is_success());
        assert_eq!(response.kind(), MessageKind::UnknownError);
    }

    #[test]
    fn test_from_argument_error() {
        let response = ActionResponse::from(ArgumentError::Missing {
            usage: "HP <players> <health>".to_string(),
            got: 1,
        });
        assert_eq!(response.kind(), MessageKind::InvalidUsage);
        assert!(response.to_string().starts_with("InvalidUsage: missing arguments"));
    }
}
