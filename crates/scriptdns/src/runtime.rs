//! A single sandboxed JavaScript isolate running one label's handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rquickjs::function::Async;
use rquickjs::{async_with, AsyncContext, AsyncRuntime, CatchResultExt, Ctx, Func, Promise};

use crate::error::ScriptError;
use crate::schema::{Question, ScriptAnswer};

/// An isolated JavaScript execution context holding one compiled script.
///
/// One [`ScriptIsolate`] is created per `SCRIPT` record label and reused
/// across queries until the script's source changes (see
/// [`crate::registry::ScriptRegistry`]). Execution is cooperatively
/// terminated via an interrupt flag QuickJS polls between bytecode steps,
/// so a runaway script cannot hold the deadline hostage.
pub struct ScriptIsolate {
    // Kept alive for the isolate's lifetime; the context borrows its heap.
    _runtime: AsyncRuntime,
    context: AsyncContext,
    interrupt: Arc<AtomicBool>,
}

impl ScriptIsolate {
    /// Compile `source` into a fresh isolate, installing the `fetch` global.
    pub async fn compile(source: &str) -> Result<Self, ScriptError> {
        let runtime = AsyncRuntime::new().map_err(|e| ScriptError::Compile(e.to_string()))?;

        let interrupt = Arc::new(AtomicBool::new(false));
        {
            let interrupt = interrupt.clone();
            runtime
                .set_interrupt_handler(Some(Box::new(move || interrupt.load(Ordering::Relaxed))))
                .await;
        }

        let context = AsyncContext::full(&runtime)
            .await
            .map_err(|e| ScriptError::Compile(e.to_string()))?;

        let source = source.to_string();
        let result: Result<(), ScriptError> = async_with!(context => |ctx| {
            install_fetch(&ctx).map_err(|e| ScriptError::Compile(e.to_string()))?;
            ctx.eval::<(), _>(source.into_bytes())
                .catch(&ctx)
                .map_err(|e| ScriptError::Compile(e.to_string()))
        })
        .await;
        result?;

        Ok(Self {
            _runtime: runtime,
            context,
            interrupt,
        })
    }

    /// Invoke `handleQuery(q)` and await its result, enforcing `deadline`.
    ///
    /// On timeout, execution is interrupted and the caller receives
    /// [`ScriptError::Timeout`] - the DNS reply must still be sent with an
    /// empty answer section (see the edge agent's dispatch loop).
    pub async fn handle_query(&self, question: &Question, deadline: Duration) -> Result<ScriptAnswer, ScriptError> {
        self.interrupt.store(false, Ordering::Relaxed);

        match tokio::time::timeout(deadline, self.invoke(question)).await {
            Ok(result) => result,
            Err(_) => {
                self.interrupt.store(true, Ordering::Relaxed);
                Err(ScriptError::Timeout)
            }
        }
    }

    async fn invoke(&self, question: &Question) -> Result<ScriptAnswer, ScriptError> {
        let question_json = serde_json::to_string(question).expect("Question always serializes");

        let response_json: String = async_with!(self.context => |ctx| {
            let handle_query: rquickjs::Function = ctx
                .globals()
                .get("handleQuery")
                .catch(&ctx)
                .map_err(|e| ScriptError::Exception(format!("handleQuery is not defined: {e}")))?;

            let question_value: rquickjs::Value = ctx
                .json_parse(question_json)
                .catch(&ctx)
                .map_err(|e| ScriptError::Exception(e.to_string()))?;

            let promise: Promise = handle_query
                .call((question_value,))
                .catch(&ctx)
                .map_err(|e| ScriptError::Exception(e.to_string()))?;

            let result: rquickjs::Value = promise
                .into_future()
                .await
                .catch(&ctx)
                .map_err(|e| ScriptError::Exception(e.to_string()))?;

            ctx.json_stringify(result)
                .catch(&ctx)
                .map_err(|e| ScriptError::Exception(e.to_string()))?
                .map(|s| s.to_string())
                .ok_or_else(|| ScriptError::InvalidResponse("handleQuery resolved to undefined".into()))
        })
        .await?;

        serde_json::from_str(&response_json).map_err(|e| ScriptError::InvalidResponse(e.to_string()))
    }
}

/// Install the `fetch` global: a minimal `fetch(url) -> Promise<{status,
/// body}>` backed by a real HTTP client, as required by SPEC_FULL §4.3.3.
fn install_fetch(ctx: &Ctx<'_>) -> rquickjs::Result<()> {
    // Resolves to a `[status, body]` pair rather than an object, sidestepping
    // a bespoke JS-value conversion for a polyfill scripts use read-only.
    let fetch = Func::from(Async(|url: String| async move {
        let response = reqwest::get(&url).await.map_err(|_| rquickjs::Error::Unknown)?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok::<(u16, String), rquickjs::Error>((status, body))
    }));
    ctx.globals().set("fetch", fetch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simple_script_answers_its_query() {
        let isolate = ScriptIsolate::compile(
            "async function handleQuery(q) { \
               return {authoritative: true, rrs: [{name: q.name, ttl: 300, type: 'TXT', value: 'hello'}]}; \
             }",
        )
        .await
        .unwrap();

        let question = Question {
            name: "api.example.com.".into(),
            qtype: "TXT".into(),
            cookie: None,
            subnet: None,
        };
        let answer = isolate.handle_query(&question, Duration::from_secs(1)).await.unwrap();
        assert!(answer.authoritative);
        assert_eq!(answer.rrs.len(), 1);
        assert_eq!(answer.rrs[0].value, "hello");
    }

    #[tokio::test]
    async fn infinite_loop_times_out() {
        let isolate = ScriptIsolate::compile("async function handleQuery(q) { while (true) {} }")
            .await
            .unwrap();
        let question = Question {
            name: "stuck.example.com.".into(),
            qtype: "A".into(),
            cookie: None,
            subnet: None,
        };
        let result = isolate.handle_query(&question, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(ScriptError::Timeout)));
    }
}
