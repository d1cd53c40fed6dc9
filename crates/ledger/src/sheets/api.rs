//! Low level operations on a spreadsheet, as exposed by the Sheets API v4.
use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ResultLedger;

/// Authorization scopes for the Sheets API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Read,
    Write,
}

impl Scope {
    pub const fn url(self) -> &'static str {
        match self {
            Scope::Read => "https://www.googleapis.com/auth/spreadsheets.readonly",
            Scope::Write => "https://www.googleapis.com/auth/spreadsheets",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Read => write!(f, "READ"),
            Scope::Write => write!(f, "WRITE"),
        }
    }
}

/// Parsing option for data written into the sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueInput {
    Raw,
    UserEntered,
}

impl ValueInput {
    pub const fn as_str(self) -> &'static str {
        match self {
            ValueInput::Raw => "RAW",
            ValueInput::UserEntered => "USER_ENTERED",
        }
    }
}

/// Rendering option for values read from the sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueRender {
    Formula,
    FormattedValue,
    UnformattedValue,
}

impl ValueRender {
    pub const fn as_str(self) -> &'static str {
        match self {
            ValueRender::Formula => "FORMULA",
            ValueRender::FormattedValue => "FORMATTED_VALUE",
            ValueRender::UnformattedValue => "UNFORMATTED_VALUE",
        }
    }
}

/// Properties of a single tab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: i64,
}

/// Operations on one spreadsheet, authorized for a single [`Scope`].
#[async_trait::async_trait]
pub trait SheetsApi: Send + Sync {
    /// Properties of every tab of the spreadsheet.
    async fn sheets(&self) -> ResultLedger<Vec<SheetProperties>>;

    /// Values in `range` (A1 notation). Empty when the range holds nothing.
    async fn get_values(&self, range: &str, render: ValueRender) -> ResultLedger<Vec<Vec<Value>>>;

    async fn update_values(
        &self,
        range: &str,
        values: Vec<Vec<Value>>,
        input: ValueInput,
    ) -> ResultLedger<()>;

    async fn clear_values(&self, range: &str) -> ResultLedger<()>;

    /// Duplicates a tab inside the same spreadsheet and returns the copy.
    async fn copy_sheet(&self, sheet_id: i64) -> ResultLedger<SheetProperties>;

    /// Renames and moves a tab (updates `index` and `title`).
    async fn update_sheet_properties(&self, properties: SheetProperties) -> ResultLedger<()>;
}

/// Opens a [`SheetsApi`] handle for a scope.
#[async_trait::async_trait]
pub trait SheetsConnector: Send + Sync {
    async fn connect(&self, scope: Scope) -> ResultLedger<Arc<dyn SheetsApi>>;
}
