//! A template engine double that records what it was asked to render.

use encore_render::{TemplateEngine, ViewBag};
use parking_lot::Mutex;
use serde_json::Value;

/// One call to [`RecordingTemplateEngine::render`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    /// View name.
    pub view: String,
    /// Model passed to the view.
    pub model: Value,
    /// View bag passed to the view.
    pub bag: ViewBag,
}

/// Renders `<view>` followed by the compact model JSON, and records each call.
#[derive(Debug, Default)]
pub struct RecordingTemplateEngine {
    calls: Mutex<Vec<RenderCall>>,
    failure: Option<String>,
}

impl RecordingTemplateEngine {
    /// A working engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose every render fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    /// The most recent call.
    pub fn last(&self) -> Option<RenderCall> {
        self.calls.lock().last().cloned()
    }

    /// Number of render calls.
    pub fn render_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl TemplateEngine for RecordingTemplateEngine {
    fn render(&self, view: &str, model: &Value, bag: &ViewBag) -> anyhow::Result<String> {
        self.calls.lock().push(RenderCall {
            view: view.to_string(),
            model: model.clone(),
            bag: bag.clone(),
        });
        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }
        Ok(format!("<{view}>{model}"))
    }
}
