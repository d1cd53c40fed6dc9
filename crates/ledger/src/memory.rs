//! Volatile backend, used for local runs and tests.
use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::{ExpenseItem, Repository, ResultLedger};

pub const IN_MEMORY: &str = "InMemory";

/// Map from date to the items added for it, in insertion order.
#[derive(Debug, Default)]
pub struct InMemory {
    storage: Mutex<HashMap<NaiveDate, Vec<ExpenseItem>>>,
}

impl InMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Repository for InMemory {
    fn name(&self) -> &'static str {
        IN_MEMORY
    }

    async fn get_all(&self, date: NaiveDate) -> ResultLedger<Vec<ExpenseItem>> {
        let guard = self.storage.lock().await;
        Ok(guard.get(&date).cloned().unwrap_or_default())
    }

    async fn add(&self, item: ExpenseItem, date: NaiveDate) -> ResultLedger<()> {
        let mut guard = self.storage.lock().await;
        guard.entry(date).or_default().push(item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn get_all_keeps_insertion_order() {
        let repo = InMemory::new();
        let day = date(2022, 7, 11);
        let items = vec![
            ExpenseItem::spend(Amount::new(1250), "Coffee"),
            ExpenseItem::earn(Amount::new(100_000), "Paycheck"),
            ExpenseItem::spend(Amount::new(399), "Bagel"),
        ];
        for item in &items {
            repo.add(item.clone(), day).await.unwrap();
        }

        assert_eq!(repo.get_all(day).await.unwrap(), items);
    }

    #[tokio::test]
    async fn get_all_on_empty_date_is_empty() {
        let repo = InMemory::new();
        repo.add(ExpenseItem::spend(Amount::new(1), "x"), date(2022, 7, 11))
            .await
            .unwrap();

        assert!(repo.get_all(date(2022, 7, 12)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_capacity_limit() {
        let repo = InMemory::new();
        let day = date(2018, 1, 1);
        for cents in 0..10 {
            repo.add(ExpenseItem::spend(Amount::new(cents), "x"), day)
                .await
                .unwrap();
        }
        assert_eq!(repo.get_all(day).await.unwrap().len(), 10);
    }
}
