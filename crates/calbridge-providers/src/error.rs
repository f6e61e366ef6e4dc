//! Error types for synchronization operations.
//!
//! This module defines the error taxonomy shared by the translators, the
//! mutation executors, and the dispatcher. Every error carries a
//! [`SyncErrorCode`] that maps onto the HTTP status surfaced to the caller.

use std::fmt;
use thiserror::Error;

use calbridge_core::TimeParseError;

/// The category of a synchronization error.
///
/// Each code has a fixed HTTP status. Two mappings are deliberate and load
/// bearing: an unknown internal id on update/delete is reported as 400 (not
/// 404) for compatibility with the existing caller contract, and an
/// ambiguous remote state (unexpected delete status) is a 500 because the
/// provider's state can no longer be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncErrorCode {
    /// A required request parameter is missing or malformed.
    MissingParameter,
    /// The request verb is not one of POST/PUT/DELETE.
    MethodNotAllowed,
    /// No internal record exists at the given id.
    NoSuchId,
    /// Token refresh failed, or the post-refresh retry was still rejected.
    AuthFailed,
    /// The provider rejected the mutation with a non-auth failure.
    ProviderRejected,
    /// The remote state is ambiguous (e.g. unexpected delete status).
    ProviderServer,
    /// The recurrence-collision probe found a true duplicate.
    ConsistencyFault,
    /// The requested source type is not one of the known providers.
    UnsupportedProvider,
    /// A provider timestamp had an unsupported or invalid format.
    InvalidDate,
    /// Missing or invalid configuration (access info, EWS service setup).
    Configuration,
    /// The internal store failed in an unexpected way.
    Store,
    /// Internal error - unexpected state, bug.
    Internal,
}

impl SyncErrorCode {
    /// Returns the HTTP status surfaced to the caller for this code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MethodNotAllowed => 405,
            Self::MissingParameter
            | Self::NoSuchId
            | Self::AuthFailed
            | Self::ProviderRejected
            | Self::ConsistencyFault
            | Self::UnsupportedProvider
            | Self::InvalidDate
            | Self::Configuration => 400,
            Self::ProviderServer | Self::Store | Self::Internal => 500,
        }
    }

    /// Returns a stable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingParameter => "missing_parameter",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::NoSuchId => "no_such_id",
            Self::AuthFailed => "auth_failed",
            Self::ProviderRejected => "provider_rejected",
            Self::ProviderServer => "provider_server",
            Self::ConsistencyFault => "consistency_fault",
            Self::UnsupportedProvider => "unsupported_provider",
            Self::InvalidDate => "invalid_date",
            Self::Configuration => "configuration",
            Self::Store => "store",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for SyncErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while synchronizing an event mutation.
#[derive(Debug, Error)]
pub struct SyncError {
    code: SyncErrorCode,
    message: String,
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SyncError {
    /// Creates a new error with the given code and message.
    pub fn new(code: SyncErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    /// A missing required parameter, using the caller-visible wording.
    pub fn missing_parameter(field: impl fmt::Display) -> Self {
        Self::new(
            SyncErrorCode::MissingParameter,
            format!("missing required({field}) parameter."),
        )
    }

    /// A parameter is present but cannot be read as its expected type.
    pub fn malformed_parameter(detail: impl fmt::Display) -> Self {
        Self::new(
            SyncErrorCode::MissingParameter,
            format!("malformed parameter: {detail}"),
        )
    }

    /// The request carried no parameter source at all (empty body/query).
    pub fn missing_parameter_source() -> Self {
        Self::new(
            SyncErrorCode::MissingParameter,
            "required parameter not exist.",
        )
    }

    /// The request verb is not supported.
    pub fn method_not_allowed() -> Self {
        Self::new(SyncErrorCode::MethodNotAllowed, "method not allowed")
    }

    /// No internal record at the given id.
    pub fn no_such_id() -> Self {
        Self::new(SyncErrorCode::NoSuchId, "no such id")
    }

    /// Refresh failed, or the post-refresh retry was still unauthorized.
    pub fn auth_failed() -> Self {
        Self::new(SyncErrorCode::AuthFailed, "refresh token is wrong")
    }

    /// The provider rejected the mutation; the response body is the detail.
    pub fn provider_rejected(body: impl Into<String>) -> Self {
        Self::new(SyncErrorCode::ProviderRejected, body)
    }

    /// The remote state is ambiguous after the mutation.
    pub fn provider_server(message: impl Into<String>) -> Self {
        Self::new(SyncErrorCode::ProviderServer, message)
    }

    /// The collision probe found a record with the same provider-native id.
    pub fn consistency_fault() -> Self {
        Self::new(SyncErrorCode::ConsistencyFault, "A strange condition occurred.")
    }

    /// The requested source type is not supported.
    pub fn unsupported_provider() -> Self {
        Self::new(
            SyncErrorCode::UnsupportedProvider,
            "Required srcType is not supported.",
        )
    }

    /// A provider timestamp could not be parsed.
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::new(SyncErrorCode::InvalidDate, message)
    }

    /// Missing or invalid configuration.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(SyncErrorCode::Configuration, message)
    }

    /// Unexpected internal-store failure.
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(SyncErrorCode::Store, message)
    }

    /// Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SyncErrorCode::Internal, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> SyncErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider name, if set.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns the HTTP status for this error.
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<TimeParseError> for SyncError {
    fn from(err: TimeParseError) -> Self {
        Self::invalid_date(err.to_string())
    }
}

/// A specialized Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;
