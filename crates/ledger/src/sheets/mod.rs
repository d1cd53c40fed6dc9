//! Google Sheets backed storage.
//!
//! The workbook holds one sheet per month, named `MM/YY`, created from a
//! template sheet the first time an item is added to that month. See
//! [`layout`] for the position of each value in a sheet.
//!
//! Ledger rows are written as raw values, so a description like `7-11` or
//! `=1+1` stays text. Date labels and the balance formula are parsed as if
//! typed by a user.
use std::{path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;

pub use api::{Scope, SheetProperties, SheetsApi, SheetsConnector, ValueInput, ValueRender};
pub use auth::ServiceAccount;
pub use rest::RestConnector;

use crate::{Category, Error, ExpenseItem, Repository, ResultLedger};

pub mod api;
pub mod layout;

mod auth;
mod rest;

pub const GOOGLE_SHEETS: &str = "GoogleSheets";

/// Position of a new month sheet among the tabs.
const NEW_SHEET_INDEX: i64 = 1;

#[derive(Clone, Debug, Deserialize)]
pub struct GoogleSheetsSettings {
    pub spreadsheet_id: String,
    #[serde(default = "default_template_sheet")]
    pub template_sheet: String,
    /// Cell holding the running total balance formula.
    #[serde(default = "default_formula_cell")]
    pub formula_cell: String,
    pub credentials_path: Option<PathBuf>,
    /// Base64 of the service account JSON, alternative to `credentials_path`.
    pub credentials_base64: Option<String>,
}

fn default_template_sheet() -> String {
    "TEMPLATE".to_string()
}

fn default_formula_cell() -> String {
    "Notes!D2:D2".to_string()
}

impl GoogleSheetsSettings {
    fn service_account(&self) -> ResultLedger<ServiceAccount> {
        match (&self.credentials_path, &self.credentials_base64) {
            (Some(path), _) => ServiceAccount::from_file(path),
            (None, Some(encoded)) => ServiceAccount::from_base64(encoded),
            (None, None) => Err(Error::Configuration(
                "Credentials were not provided".to_string(),
            )),
        }
    }
}

/// Google Sheets-backed repository.
pub struct GoogleSheets {
    connector: Arc<dyn SheetsConnector>,
    template_sheet: String,
    formula_cell: String,
    reader: OnceCell<Arc<dyn SheetsApi>>,
    writer: OnceCell<Arc<dyn SheetsApi>>,
}

impl GoogleSheets {
    pub fn new(
        connector: Arc<dyn SheetsConnector>,
        template_sheet: &str,
        formula_cell: &str,
    ) -> Self {
        Self {
            connector,
            template_sheet: template_sheet.to_string(),
            formula_cell: formula_cell.to_string(),
            reader: OnceCell::new(),
            writer: OnceCell::new(),
        }
    }

    pub fn from_settings(settings: &GoogleSheetsSettings) -> ResultLedger<Self> {
        let account = settings.service_account()?;
        tracing::info!(
            "Using spreadsheet {} as {}",
            settings.spreadsheet_id,
            account.client_email()
        );
        let connector = RestConnector::new(&settings.spreadsheet_id, account);
        Ok(Self::new(
            Arc::new(connector),
            &settings.template_sheet,
            &settings.formula_cell,
        ))
    }

    /// Read-only handle, built on first use.
    async fn sheet(&self) -> ResultLedger<&Arc<dyn SheetsApi>> {
        self.reader.get_or_try_init(|| self.connect(Scope::Read)).await
    }

    /// Read-write handle, built on first use.
    async fn mutable_sheet(&self) -> ResultLedger<&Arc<dyn SheetsApi>> {
        self.writer.get_or_try_init(|| self.connect(Scope::Write)).await
    }

    async fn connect(&self, scope: Scope) -> ResultLedger<Arc<dyn SheetsApi>> {
        tracing::info!("Configuring sheet service with scope '{scope}'...");
        self.connector.connect(scope).await
    }

    async fn read_row(&self, page: &str, row: u32) -> ResultLedger<Vec<ExpenseItem>> {
        let values = self
            .sheet()
            .await?
            .get_values(&layout::row_range(page, row), ValueRender::UnformattedValue)
            .await?;
        let cells = values.into_iter().next().unwrap_or_default();
        layout::decode_row(&cells, layout::category_for_row(row))
    }

    async fn sheet_id_by_title(&self, title: &str) -> ResultLedger<Option<i64>> {
        let sheets = self.sheet().await?.sheets().await?;
        Ok(sheets
            .into_iter()
            .find(|sheet| sheet.title == title)
            .map(|sheet| sheet.sheet_id))
    }

    async fn sheet_exists(&self, page: &str) -> ResultLedger<bool> {
        Ok(self.sheet_id_by_title(page).await?.is_some())
    }

    /// Creates the sheet `page` for the month of `date` from the template.
    async fn create_new_sheet(&self, page: &str, date: NaiveDate) -> ResultLedger<()> {
        if self.sheet_exists(page).await? {
            return Err(Error::Validation(format!("Sheet '{page}' already exists!")));
        }

        tracing::info!("Creating a new sheet from the template...");
        let template_id = self
            .sheet_id_by_title(&self.template_sheet)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Sheet with title '{}' not found!",
                    self.template_sheet
                ))
            })?;

        let writer = self.mutable_sheet().await?;
        let copy = writer.copy_sheet(template_id).await?;
        tracing::info!(
            "Created new sheet (id={}, title='{}')",
            copy.sheet_id,
            copy.title
        );

        tracing::info!("Renaming created sheet to '{page}' and moving it to the front...");
        writer
            .update_sheet_properties(SheetProperties {
                sheet_id: copy.sheet_id,
                title: page.to_string(),
                index: NEW_SHEET_INDEX,
            })
            .await?;

        tracing::info!("Clearing cells in range '{}'...", layout::DATA_RANGE);
        writer
            .clear_values(&format!("{}!{}", layout::quoted(page), layout::DATA_RANGE))
            .await?;

        tracing::info!("Updating the date column...");
        let labels = layout::date_labels(date);
        let days = labels.len();
        writer
            .update_values(
                &layout::date_column_range(page, days),
                labels.into_iter().map(|label| vec![Value::String(label)]).collect(),
                ValueInput::UserEntered,
            )
            .await?;

        if let Some(range) = layout::unused_rows_range(page, days) {
            tracing::info!("Removing the last {} rows in the sheet...", 31 - days);
            writer.clear_values(&range).await?;
        }

        self.register_balance(page).await
    }

    /// Makes the running total balance subtract the balance of `page`.
    async fn register_balance(&self, page: &str) -> ResultLedger<()> {
        tracing::info!("Fetching the formula for the total balance...");
        let values = self
            .sheet()
            .await?
            .get_values(&self.formula_cell, ValueRender::Formula)
            .await?;
        let formula = match values.first().and_then(|row| row.first()) {
            Some(Value::String(formula)) => formula.clone(),
            Some(other) => other.to_string(),
            None => {
                return Err(Error::NotFound(format!(
                    "No balance formula in '{}'",
                    self.formula_cell
                )));
            }
        };

        if formula.contains(page) {
            tracing::debug!("Sheet '{page}' already in the total balance");
            return Ok(());
        }

        tracing::info!("Updating the formula for the total balance...");
        let formula = format!("{formula}{}", layout::balance_term(page));
        self.mutable_sheet()
            .await?
            .update_values(
                &self.formula_cell,
                vec![vec![Value::String(formula)]],
                ValueInput::UserEntered,
            )
            .await
    }
}

#[async_trait::async_trait]
impl Repository for GoogleSheets {
    fn name(&self) -> &'static str {
        GOOGLE_SHEETS
    }

    async fn get_all(&self, date: NaiveDate) -> ResultLedger<Vec<ExpenseItem>> {
        let page = layout::sheet_name(date);
        let row = layout::ledger_row(date, Category::Spend);

        if !self.sheet_exists(&page).await? {
            return Err(Error::NotFound(format!("Sheet '{page}' does not exist!")));
        }
        self.read_row(&page, row).await
    }

    async fn add(&self, item: ExpenseItem, date: NaiveDate) -> ResultLedger<()> {
        if date < layout::min_date() {
            return Err(Error::Validation("Date is too far in the past!".to_string()));
        }
        layout::check_description(&item.description)?;

        let page = layout::sheet_name(date);
        let row = layout::ledger_row(date, item.category);

        if !self.sheet_exists(&page).await? {
            self.create_new_sheet(&page, date).await?;
        }

        let mut items = self.read_row(&page, row).await?;
        if items.len() >= layout::ROW_CAPACITY {
            let msg = match item.category {
                Category::Spend => format!("No room to add more purchases for {date}!"),
                Category::Earn => format!(
                    "No room to add more earnings for {}!",
                    date.format("%m/%Y")
                ),
            };
            return Err(Error::Validation(msg));
        }

        items.push(item);
        self.mutable_sheet()
            .await?
            .update_values(
                &layout::row_range(&page, row),
                vec![layout::encode_row(&items)?],
                ValueInput::Raw,
            )
            .await
    }
}
