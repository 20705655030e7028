//! The script-DNS runtime: per-label sandboxed JavaScript handlers that
//! answer DNS questions under a hard deadline.

pub mod error;
pub mod registry;
pub mod runtime;
pub mod schema;
pub mod wire;

pub use error::ScriptError;
pub use registry::ScriptRegistry;
pub use runtime::ScriptIsolate;
pub use schema::{AnswerRr, Question, ScriptAnswer};

/// The deadline every script invocation (validation or live query dispatch)
/// is held to.
pub const QUERY_DEADLINE: std::time::Duration = std::time::Duration::from_secs(1);

/// Compile `source` in a transient isolate and run it once to completion,
/// enforcing [`QUERY_DEADLINE`]. Used by the write path before a `SCRIPT`
/// record is accepted: any exception or timeout is a user-visible
/// validation error.
pub async fn validate_script(source: &str) -> Result<(), ScriptError> {
    let isolate = ScriptIsolate::compile(source).await?;
    let probe = Question {
        name: "validate.invalid.".to_string(),
        qtype: "A".to_string(),
        cookie: None,
        subnet: None,
    };
    isolate.handle_query(&probe, QUERY_DEADLINE).await?;
    Ok(())
}
