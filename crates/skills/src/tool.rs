//! Tools and the failure-containment boundary around them.
//!
//! A skill body returns `Result<String, SkillError>` and may even panic;
//! [`Tool::call`] always hands back a string. Failures are logged and come
//! back prefixed with [`ERROR_MARKER`].

use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::types::Result;
use sableye_core::logging::{LOG_PREVIEW_CHARS, truncate_for_log};

/// Prefix of every failed tool result.
pub const ERROR_MARKER: &str = "Error:";

/// The body of a tool.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    async fn run(&self, input: &str) -> Result<String>;
}

/// Adapts an async closure into a [`ToolHandler`].
struct FnHandler<F> {
    f: F,
}

#[async_trait::async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send,
{
    async fn run(&self, input: &str) -> Result<String> {
        (self.f)(input.to_string()).await
    }
}

/// Result of a tool call, tagged with whether it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self { content: content.into(), is_error: false }
    }

    pub fn error(reason: impl fmt::Display) -> Self {
        Self { content: format!("{} {}", ERROR_MARKER, reason), is_error: true }
    }
}

/// A named, described capability the agent can call with one string.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, handler: impl ToolHandler + 'static) -> Self {
        Self { name: name.into(), description: description.into(), handler: Arc::new(handler) }
    }

    /// Tool whose body is an async closure over the owned input.
    pub fn from_fn<F, Fut>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self::new(name, description, FnHandler { f })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Run the tool, containing errors and panics.
    pub async fn invoke(&self, input: &str) -> ToolOutput {
        tracing::debug!(tool = %self.name, input = %truncate_for_log(input, LOG_PREVIEW_CHARS), "invoking tool");

        match AssertUnwindSafe(self.handler.run(input)).catch_unwind().await {
            Ok(Ok(content)) if content.trim().is_empty() => {
                ToolOutput::success(format!("{} produced no output", self.name))
            }
            Ok(Ok(content)) => {
                tracing::debug!(
                    tool = %self.name,
                    output = %truncate_for_log(&content, LOG_PREVIEW_CHARS),
                    "tool finished"
                );
                ToolOutput::success(content)
            }
            Ok(Err(e)) => {
                tracing::error!(tool = %self.name, error = %e, "tool failed");
                ToolOutput::error(e)
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::error!(tool = %self.name, panic = %reason, "tool panicked");
                ToolOutput::error(format!("{} failed unexpectedly: {}", self.name, reason))
            }
        }
    }

    /// Run the tool; never fails.
    pub async fn call(&self, input: &str) -> String {
        self.invoke(input).await.content
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
