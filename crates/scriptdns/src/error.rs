//! Errors the script-DNS runtime can raise.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script failed to compile: {0}")]
    Compile(String),

    #[error("script threw an exception: {0}")]
    Exception(String),

    #[error("script exceeded its execution deadline")]
    Timeout,

    #[error("script response did not match the expected shape: {0}")]
    InvalidResponse(String),

    #[error("unsupported record type in script response: {0}")]
    UnsupportedRecordType(String),

    #[error("invalid record value for type {rtype}: {value}")]
    InvalidRecordValue { rtype: String, value: String },

    #[error("failed to read SCRIPT records from the store: {0}")]
    Store(String),
}
