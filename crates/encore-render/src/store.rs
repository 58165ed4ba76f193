//! The persistent store collaborator.

use serde::{Deserialize, Serialize};

/// One line of a shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Cart key: a user name, or an anonymous cart id.
    pub cart_id: String,
    /// Album on this line.
    pub album_id: i32,
    /// Quantity.
    pub count: i32,
}

/// Access to the persistent store.
///
/// Calls are synchronous over an already-open handle. Concurrency control is
/// the store's own business.
pub trait StoreContext: Send + Sync + 'static {
    /// An open connection or unit of work.
    type Handle: Send;

    /// Opens a fresh handle.
    fn open(&self) -> anyhow::Result<Self::Handle>;

    /// Returns every cart line stored under `cart_key`, in store order.
    fn cart_lines(&self, handle: &mut Self::Handle, cart_key: &str) -> anyhow::Result<Vec<CartLine>>;
}

/// Sums the quantities on `lines`. Zero when there are none.
#[must_use]
pub fn cart_count(lines: &[CartLine]) -> i64 {
    lines.iter().map(|line| i64::from(line.count)).sum()
}
