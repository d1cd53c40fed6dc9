//! Storage contract shared by every backend.
use chrono::NaiveDate;

use crate::{ExpenseItem, ResultLedger};

/// A backend able to record items under a date and read them back.
///
/// One instance is selected at startup (see [`crate::registry`]) and shared
/// by every conversation as `Arc<dyn Repository>`.
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    /// Name the backend is registered under.
    fn name(&self) -> &'static str;

    /// Returns all items stored for `date`, in storage order.
    ///
    /// An empty vector is returned when nothing was recorded for the date.
    async fn get_all(&self, date: NaiveDate) -> ResultLedger<Vec<ExpenseItem>>;

    /// Records `item` under `date`.
    async fn add(&self, item: ExpenseItem, date: NaiveDate) -> ResultLedger<()>;
}
