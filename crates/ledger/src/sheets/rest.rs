//! [`SheetsApi`] over the Google Sheets REST API v4.
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use super::{
    api::{Scope, SheetProperties, SheetsApi, SheetsConnector, ValueInput, ValueRender},
    auth::{ScopedToken, ServiceAccount},
};
use crate::{Error, ResultLedger};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Connects to one spreadsheet with service account credentials.
#[derive(Clone, Debug)]
pub struct RestConnector {
    client: Client,
    spreadsheet_id: String,
    account: Arc<ServiceAccount>,
}

impl RestConnector {
    pub fn new(spreadsheet_id: &str, account: ServiceAccount) -> Self {
        Self {
            client: Client::new(),
            spreadsheet_id: spreadsheet_id.to_string(),
            account: Arc::new(account),
        }
    }
}

#[async_trait::async_trait]
impl SheetsConnector for RestConnector {
    async fn connect(&self, scope: Scope) -> ResultLedger<Arc<dyn SheetsApi>> {
        Ok(Arc::new(RestSheets {
            client: self.client.clone(),
            spreadsheet_id: self.spreadsheet_id.clone(),
            token: ScopedToken::new(self.client.clone(), self.account.clone(), scope),
        }))
    }
}

struct RestSheets {
    client: Client,
    spreadsheet_id: String,
    token: ScopedToken,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl RestSheets {
    /// URL below `spreadsheets/`. The first segment is appended to the
    /// spreadsheet id (`{id}:batchUpdate`), the others are path segments.
    fn url(&self, suffix: &str, segments: &[&str]) -> ResultLedger<Url> {
        let mut url = Url::parse(SHEETS_API)
            .map_err(|err| Error::Configuration(format!("invalid Sheets API url: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::Configuration("invalid Sheets API url".to_string()))?
            .push(&format!("{}{suffix}", self.spreadsheet_id))
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ResultLedger<T> {
        let token = self.token.bearer().await?;
        let resp = req.bearer_auth(token).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => "Sheets API error".to_string(),
        };
        tracing::debug!("Sheets API request failed: {status} {message}");
        Err(Error::Api { status, message })
    }
}

#[async_trait::async_trait]
impl SheetsApi for RestSheets {
    async fn sheets(&self) -> ResultLedger<Vec<SheetProperties>> {
        let url = self.url("", &[])?;
        let spreadsheet: Spreadsheet = self
            .send(self.client.get(url).query(&[("fields", "sheets.properties")]))
            .await?;
        Ok(spreadsheet.sheets.into_iter().map(|s| s.properties).collect())
    }

    async fn get_values(&self, range: &str, render: ValueRender) -> ResultLedger<Vec<Vec<Value>>> {
        let url = self.url("", &["values", range])?;
        let values: ValueRange = self
            .send(
                self.client
                    .get(url)
                    .query(&[("valueRenderOption", render.as_str())]),
            )
            .await?;
        Ok(values.values)
    }

    async fn update_values(
        &self,
        range: &str,
        values: Vec<Vec<Value>>,
        input: ValueInput,
    ) -> ResultLedger<()> {
        let url = self.url("", &["values", range])?;
        let _: Value = self
            .send(
                self.client
                    .put(url)
                    .query(&[("valueInputOption", input.as_str())])
                    .json(&json!({ "range": range, "values": values })),
            )
            .await?;
        Ok(())
    }

    async fn clear_values(&self, range: &str) -> ResultLedger<()> {
        let url = self.url("", &["values", &format!("{range}:clear")])?;
        let _: Value = self.send(self.client.post(url).json(&json!({}))).await?;
        Ok(())
    }

    async fn copy_sheet(&self, sheet_id: i64) -> ResultLedger<SheetProperties> {
        let url = self.url("", &["sheets", &format!("{sheet_id}:copyTo")])?;
        self.send(
            self.client
                .post(url)
                .json(&json!({ "destinationSpreadsheetId": self.spreadsheet_id })),
        )
        .await
    }

    async fn update_sheet_properties(&self, properties: SheetProperties) -> ResultLedger<()> {
        let url = self.url(":batchUpdate", &[])?;
        let body = json!({
            "requests": [{
                "updateSheetProperties": {
                    "fields": "index,title",
                    "properties": properties,
                }
            }]
        });
        let _: Value = self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}
