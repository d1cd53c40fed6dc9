//! Expense ledger.
//!
//! Holds the expense model and the storage backends the bot writes to: a
//! volatile in-memory map and a Google Sheets workbook with one sheet per
//! month.
pub use amount::Amount;
pub use error::Error;
pub use memory::InMemory;
pub use model::{Category, ExpenseItem};
pub use registry::{BackendSettings, new_repository};
pub use repository::Repository;
pub use sheets::{GoogleSheets, GoogleSheetsSettings};

pub mod registry;
pub mod sheets;

mod amount;
mod error;
mod memory;
mod model;
mod repository;

pub type ResultLedger<T> = Result<T, Error>;
