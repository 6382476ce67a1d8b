use serde::Serialize;
use thiserror::Error;

use crate::domain::{product::ProductId, rule::RuleId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("pricing rule `{0}` was not found")]
    RuleNotFound(RuleId),
    #[error("pricing rule `{0}` already exists")]
    DuplicateRule(RuleId),
    #[error("product `{0}` was not found")]
    ProductNotFound(ProductId),
    #[error("cannot check out an empty cart")]
    EmptyCart,
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

/// How a failure is presented to a caller outside the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    BadRequest,
    ServiceUnavailable,
    Internal,
}

impl FailureKind {
    pub fn user_message(self) -> &'static str {
        match self {
            Self::BadRequest => "The request could not be processed. Check inputs and try again.",
            Self::ServiceUnavailable => "The service is temporarily unavailable. Please retry shortly.",
            Self::Internal => "An unexpected internal error occurred.",
        }
    }
}

/// An application failure tagged with the correlation id of the request that
/// hit it. `detail` is for logs; callers see [`InterfaceError::user_message`].
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[error("{kind:?} [{correlation_id}]: {detail}")]
pub struct InterfaceError {
    pub kind: FailureKind,
    pub detail: String,
    pub correlation_id: String,
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }
}

impl ApplicationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Domain(_) => FailureKind::BadRequest,
            Self::Persistence(_) => FailureKind::ServiceUnavailable,
            Self::Configuration(_) => FailureKind::Internal,
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        InterfaceError {
            kind: self.kind(),
            detail: self.to_string(),
            correlation_id: correlation_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{product::ProductId, rule::RuleId};
    use crate::errors::{ApplicationError, DomainError, FailureKind};

    #[test]
    fn domain_errors_surface_as_bad_requests() {
        let interface =
            ApplicationError::from(DomainError::RuleNotFound(RuleId("rule-404".to_owned())))
                .into_interface("req-1");

        assert_eq!(interface.kind, FailureKind::BadRequest);
        assert_eq!(interface.correlation_id, "req-1");
        assert!(interface.detail.contains("rule-404"));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn persistence_errors_surface_as_unavailable() {
        let interface = ApplicationError::Persistence("database lock timeout".to_owned())
            .into_interface("scheduler");

        assert_eq!(interface.kind, FailureKind::ServiceUnavailable);
        assert!(interface.to_string().contains("[scheduler]"));
    }

    #[test]
    fn configuration_errors_surface_as_internal() {
        let interface = ApplicationError::Configuration("refresh interval is zero".to_owned())
            .into_interface("req-4");

        assert_eq!(interface.kind, FailureKind::Internal);
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }

    #[test]
    fn domain_messages_name_the_missing_entity() {
        let error = DomainError::ProductNotFound(ProductId("kale-7".to_owned()));
        assert_eq!(error.to_string(), "product `kale-7` was not found");
        assert_eq!(DomainError::EmptyCart.to_string(), "cannot check out an empty cart");
    }
}
