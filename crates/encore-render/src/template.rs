//! The template engine collaborator and the view bag handed to it.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Well-known view bag keys.
pub mod keys {
    /// The signed-in identity, `{userName, role}`.
    pub const USER: &str = "user";
    /// The cart key the count was computed for.
    pub const CART_ID: &str = "cartId";
    /// Sum of quantities in the cart.
    pub const CART_COUNT: &str = "cartCount";
}

/// Side data for a view, next to its model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewBag {
    entries: BTreeMap<String, Value>,
}

impl ViewBag {
    /// Creates an empty view bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns the value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns true if `key` is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns true if nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Renders named views to HTML.
pub trait TemplateEngine: Send + Sync + 'static {
    /// Renders `view` with `model` and `bag`.
    fn render(&self, view: &str, model: &Value, bag: &ViewBag) -> anyhow::Result<String>;
}
