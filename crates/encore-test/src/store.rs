//! An in-memory store double.

use encore_render::{CartLine, StoreContext};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Cart lines held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    lines: Mutex<Vec<CartLine>>,
    failure: Option<String>,
    opened: AtomicUsize,
}

/// A handle returned by [`InMemoryStore::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreHandle {
    id: usize,
}

impl StoreHandle {
    /// Sequence number of this handle, starting at zero.
    pub fn id(&self) -> usize {
        self.id
    }
}

impl InMemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `open` always fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Adds a cart line.
    #[must_use]
    pub fn with_cart_line(self, cart_id: &str, album_id: i32, count: i32) -> Self {
        self.add_cart_line(cart_id, album_id, count);
        self
    }

    /// Adds a cart line in place.
    pub fn add_cart_line(&self, cart_id: &str, album_id: i32, count: i32) {
        self.lines.lock().push(CartLine {
            cart_id: cart_id.to_string(),
            album_id,
            count,
        });
    }

    /// Number of handles opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl StoreContext for InMemoryStore {
    type Handle = StoreHandle;

    fn open(&self) -> anyhow::Result<StoreHandle> {
        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }
        let id = self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(StoreHandle { id })
    }

    fn cart_lines(&self, _handle: &mut StoreHandle, cart_key: &str) -> anyhow::Result<Vec<CartLine>> {
        Ok(self
            .lines
            .lock()
            .iter()
            .filter(|line| line.cart_id == cart_key)
            .cloned()
            .collect())
    }
}
