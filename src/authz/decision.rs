//! Authorization decisions
//!
//! A decision carries two independent reasons: the admin reason holds full
//! diagnostic detail, the user reason is what the requesting principal may
//! see. A decision can only be `true` when built by [`AuthorizationDecision::permit`],
//! which carries no error.

use crate::error::{ErrorClass, PolicyError};
use serde::Serialize;

pub const AUTHZ_ERR_BAD_REQUEST_CODE: &str = "400";
pub const AUTHZ_ERR_BAD_REQUEST_MESSAGE: &str = "Bad Request";

pub const AUTHZ_ERR_FORBIDDEN_CODE: &str = "403";
pub const AUTHZ_ERR_FORBIDDEN_MESSAGE: &str = "Forbidden";

pub const AUTHZ_ERR_INTERNAL_ERROR_CODE: &str = "500";
pub const AUTHZ_ERR_INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationError {
    code: String,
    message: String,
}

impl AuthorizationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        AuthorizationError {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of one authorization request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationDecision {
    id: String,
    decision: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_error: Option<AuthorizationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_error: Option<AuthorizationError>,
}

impl AuthorizationDecision {
    /// Grant access
    pub fn permit(id: impl Into<String>) -> Self {
        AuthorizationDecision {
            id: id.into(),
            decision: true,
            admin_error: None,
            user_error: None,
        }
    }

    /// Deny access with separate admin and user reasons
    pub fn deny(
        id: impl Into<String>,
        admin_error: AuthorizationError,
        user_error: AuthorizationError,
    ) -> Self {
        AuthorizationDecision {
            id: id.into(),
            decision: false,
            admin_error: Some(admin_error),
            user_error: Some(user_error),
        }
    }

    /// Deny because no policy granted the request
    pub fn forbidden(id: impl Into<String>, admin_message: impl Into<String>) -> Self {
        Self::deny(
            id,
            AuthorizationError::new(AUTHZ_ERR_FORBIDDEN_CODE, admin_message),
            AuthorizationError::new(AUTHZ_ERR_FORBIDDEN_CODE, AUTHZ_ERR_FORBIDDEN_MESSAGE),
        )
    }

    /// Deny because the request could not be evaluated
    ///
    /// The admin reason carries the error text. The user reason is generic
    /// unless `share_admin_reason` is set.
    pub fn from_error(id: impl Into<String>, error: &PolicyError, share_admin_reason: bool) -> Self {
        let (code, generic) = match error.class() {
            ErrorClass::Internal => (
                AUTHZ_ERR_INTERNAL_ERROR_CODE,
                AUTHZ_ERR_INTERNAL_ERROR_MESSAGE,
            ),
            ErrorClass::MalformedInput | ErrorClass::ContractViolation | ErrorClass::Security => {
                (AUTHZ_ERR_BAD_REQUEST_CODE, AUTHZ_ERR_BAD_REQUEST_MESSAGE)
            }
        };
        let admin_message = error.to_string();
        let user_message = if share_admin_reason {
            admin_message.clone()
        } else {
            generic.to_string()
        };
        Self::deny(
            id,
            AuthorizationError::new(code, admin_message),
            AuthorizationError::new(code, user_message),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn decision(&self) -> bool {
        self.decision
    }

    pub fn admin_error(&self) -> Option<&AuthorizationError> {
        self.admin_error.as_ref()
    }

    pub fn user_error(&self) -> Option<&AuthorizationError> {
        self.user_error.as_ref()
    }
}
