//! The error taxonomy shared by every [`crate::Store`] implementation.

use thiserror::Error;

/// Errors that can arise from a [`crate::Store`] operation.
///
/// These mirror the caller-facing error set the original service returned
/// from its data-access layer; the HTTP/API layer (out of scope here) maps
/// each to a status code.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("zone not found")]
    ZoneNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("record not found")]
    RecordNotFound,

    #[error("a zone with this name already exists")]
    ZoneAlreadyExists,

    #[error("a user with this email already exists")]
    UserAlreadyExists,

    #[error("user is already a member of this zone")]
    UserExistingZoneMember,

    #[error("cannot remove the last user from a zone")]
    LastZoneUser,

    #[error("cannot delete a user who still owns zones")]
    UserOwnsZones,

    #[error("password reset token is invalid or expired")]
    InvalidOrExpiredPasswordResetToken,

    #[error("zone name is a public suffix and cannot be claimed")]
    PublicSuffix,

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("script failed to compile: {0}")]
    ScriptCompile(String),

    #[error("proxy records require an A or AAAA type, no wildcard label, and admin privileges")]
    InvalidProxyRecord,

    #[error("underlying store error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
