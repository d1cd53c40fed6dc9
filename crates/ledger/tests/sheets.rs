use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::NaiveDate;
use serde_json::Value;

use ledger::{
    Amount, Category, Error, ExpenseItem, GoogleSheets, Repository, ResultLedger,
    sheets::{Scope, SheetProperties, SheetsApi, SheetsConnector, ValueInput, ValueRender},
};

const FORMULA_CELL: &str = "Notes!D2:D2";

#[derive(Default)]
struct Workbook {
    sheets: Vec<SheetProperties>,
    values: HashMap<String, Vec<Vec<Value>>>,
    cleared: Vec<String>,
    writes: Vec<(String, ValueInput)>,
    calls: usize,
}

/// In-process stand-in for a spreadsheet: values are stored by range string.
#[derive(Clone, Default)]
struct FakeSheets {
    book: Arc<Mutex<Workbook>>,
}

impl FakeSheets {
    fn with_template() -> Self {
        let fake = Self::default();
        {
            let mut book = fake.book.lock().unwrap();
            book.sheets.push(SheetProperties {
                sheet_id: 100,
                title: "Notes".to_string(),
                index: 0,
            });
            book.sheets.push(SheetProperties {
                sheet_id: 200,
                title: "TEMPLATE".to_string(),
                index: 1,
            });
            book.values.insert(
                FORMULA_CELL.to_string(),
                vec![vec![Value::from("=SUM(Income!A1:A9)")]],
            );
        }
        fake
    }

    fn add_sheet(&self, title: &str) {
        let mut book = self.book.lock().unwrap();
        let sheet_id = 300 + book.sheets.len() as i64;
        book.sheets.push(SheetProperties {
            sheet_id,
            title: title.to_string(),
            index: 1,
        });
    }

    fn set_row(&self, range: &str, cells: Vec<Value>) {
        let mut book = self.book.lock().unwrap();
        book.values.insert(range.to_string(), vec![cells]);
    }

    fn values(&self, range: &str) -> Vec<Vec<Value>> {
        let book = self.book.lock().unwrap();
        book.values.get(range).cloned().unwrap_or_default()
    }

    fn formula(&self) -> String {
        match self.values(FORMULA_CELL).first().and_then(|r| r.first()) {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }

    fn sheet(&self, title: &str) -> Option<SheetProperties> {
        let book = self.book.lock().unwrap();
        book.sheets.iter().find(|s| s.title == title).cloned()
    }

    fn writes(&self) -> Vec<String> {
        let book = self.book.lock().unwrap();
        book.writes.iter().map(|(range, _)| range.clone()).collect()
    }

    fn input_of(&self, range: &str) -> Option<ValueInput> {
        let book = self.book.lock().unwrap();
        book.writes.iter().rev().find(|(r, _)| r == range).map(|(_, input)| *input)
    }

    fn cleared(&self) -> Vec<String> {
        self.book.lock().unwrap().cleared.clone()
    }

    fn calls(&self) -> usize {
        self.book.lock().unwrap().calls
    }
}

#[async_trait::async_trait]
impl SheetsApi for FakeSheets {
    async fn sheets(&self) -> ResultLedger<Vec<SheetProperties>> {
        let mut book = self.book.lock().unwrap();
        book.calls += 1;
        Ok(book.sheets.clone())
    }

    async fn get_values(&self, range: &str, _render: ValueRender) -> ResultLedger<Vec<Vec<Value>>> {
        let mut book = self.book.lock().unwrap();
        book.calls += 1;
        Ok(book.values.get(range).cloned().unwrap_or_default())
    }

    async fn update_values(
        &self,
        range: &str,
        values: Vec<Vec<Value>>,
        input: ValueInput,
    ) -> ResultLedger<()> {
        let mut book = self.book.lock().unwrap();
        book.calls += 1;
        book.writes.push((range.to_string(), input));
        book.values.insert(range.to_string(), values);
        Ok(())
    }

    async fn clear_values(&self, range: &str) -> ResultLedger<()> {
        let mut book = self.book.lock().unwrap();
        book.calls += 1;
        book.cleared.push(range.to_string());
        Ok(())
    }

    async fn copy_sheet(&self, sheet_id: i64) -> ResultLedger<SheetProperties> {
        let mut book = self.book.lock().unwrap();
        book.calls += 1;
        let source = book
            .sheets
            .iter()
            .find(|s| s.sheet_id == sheet_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no sheet {sheet_id}")))?;
        let copy = SheetProperties {
            sheet_id: 900 + book.sheets.len() as i64,
            title: format!("Copy of {}", source.title),
            index: book.sheets.len() as i64,
        };
        book.sheets.push(copy.clone());
        Ok(copy)
    }

    async fn update_sheet_properties(&self, properties: SheetProperties) -> ResultLedger<()> {
        let mut book = self.book.lock().unwrap();
        book.calls += 1;
        let sheet = book
            .sheets
            .iter_mut()
            .find(|s| s.sheet_id == properties.sheet_id)
            .ok_or_else(|| Error::NotFound(format!("no sheet {}", properties.sheet_id)))?;
        *sheet = properties;
        Ok(())
    }
}

struct FakeConnector {
    sheets: FakeSheets,
    connects: Mutex<Vec<Scope>>,
}

#[async_trait::async_trait]
impl SheetsConnector for FakeConnector {
    async fn connect(&self, scope: Scope) -> ResultLedger<Arc<dyn SheetsApi>> {
        self.connects.lock().unwrap().push(scope);
        Ok(Arc::new(self.sheets.clone()))
    }
}

fn store(sheets: &FakeSheets) -> (GoogleSheets, Arc<FakeConnector>) {
    let connector = Arc::new(FakeConnector {
        sheets: sheets.clone(),
        connects: Mutex::new(Vec::new()),
    });
    let repo = GoogleSheets::new(connector.clone(), "TEMPLATE", FORMULA_CELL);
    (repo, connector)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn full_row() -> Vec<Value> {
    vec![
        Value::from(1),
        Value::from(2),
        Value::from(3),
        Value::from(4),
        Value::from("a, b, c, d"),
    ]
}

#[tokio::test]
async fn add_creates_month_sheet_from_template() {
    let sheets = FakeSheets::with_template();
    let (repo, _) = store(&sheets);
    let day = date(2023, 2, 14);

    repo.add(ExpenseItem::spend(Amount::new(1250), "Coffee"), day)
        .await
        .unwrap();

    let created = sheets.sheet("02/23").unwrap();
    assert_eq!(created.index, 1);
    assert!(sheets.cleared().contains(&"'02/23'!D3:H35".to_string()));
    assert!(sheets.cleared().contains(&"'02/23'!B33:C35".to_string()));

    let labels = sheets.values("'02/23'!B5:B32");
    assert_eq!(labels.len(), 28);
    assert_eq!(labels[0], vec![Value::from("02/01/2023")]);
    assert_eq!(labels[27], vec![Value::from("02/28/2023")]);

    assert_eq!(sheets.formula(), "=SUM(Income!A1:A9)-'02/23'!A1");
    assert_eq!(sheets.input_of("'02/23'!B5:B32"), Some(ValueInput::UserEntered));
    assert_eq!(sheets.input_of(FORMULA_CELL), Some(ValueInput::UserEntered));
    assert_eq!(sheets.input_of("'02/23'!D18:H18"), Some(ValueInput::Raw));
    assert_eq!(
        sheets.values("'02/23'!D18:H18"),
        vec![vec![
            Value::from(12.5),
            Value::from(""),
            Value::from(""),
            Value::from(""),
            Value::from("Coffee"),
        ]]
    );
}

#[tokio::test]
async fn add_then_get_all_round_trips() {
    let sheets = FakeSheets::with_template();
    let (repo, _) = store(&sheets);
    let day = date(2022, 7, 11);
    let items = vec![
        ExpenseItem::spend(Amount::new(1250), "Coffee"),
        ExpenseItem::spend(Amount::new(4599), "Groceries"),
    ];

    for item in &items {
        repo.add(item.clone(), day).await.unwrap();
    }

    assert_eq!(repo.get_all(day).await.unwrap(), items);
    assert!(repo.get_all(date(2022, 7, 12)).await.unwrap().is_empty());
    assert_eq!(sheets.formula(), "=SUM(Income!A1:A9)-'07/22'!A1");
}

#[tokio::test]
async fn earnings_go_to_the_month_row() {
    let sheets = FakeSheets::with_template();
    let (repo, _) = store(&sheets);

    repo.add(ExpenseItem::earn(Amount::new(250_000), "Paycheck"), date(2022, 7, 11))
        .await
        .unwrap();

    assert_eq!(
        sheets.values("'07/22'!D3:H3")[0][4],
        Value::from("Paycheck")
    );
    assert!(repo.get_all(date(2022, 7, 11)).await.unwrap().is_empty());
}

#[tokio::test]
async fn balance_formula_is_not_registered_twice() {
    let sheets = FakeSheets::with_template();
    sheets.set_row(FORMULA_CELL, vec![Value::from("=A1-'07/22'!A1")]);
    let (repo, _) = store(&sheets);

    repo.add(ExpenseItem::spend(Amount::new(100), "Tea"), date(2022, 7, 1))
        .await
        .unwrap();

    assert_eq!(sheets.formula(), "=A1-'07/22'!A1");
    assert!(!sheets.writes().contains(&FORMULA_CELL.to_string()));
}

#[tokio::test]
async fn fifth_purchase_is_rejected_without_writing() {
    let sheets = FakeSheets::with_template();
    sheets.add_sheet("07/22");
    sheets.set_row("'07/22'!D15:H15", full_row());
    let (repo, _) = store(&sheets);

    let err = repo
        .add(ExpenseItem::spend(Amount::new(500), "e"), date(2022, 7, 11))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::Validation("No room to add more purchases for 2022-07-11!".to_string())
    );
    assert!(sheets.writes().is_empty());
}

#[tokio::test]
async fn fifth_earning_is_rejected_without_writing() {
    let sheets = FakeSheets::with_template();
    sheets.add_sheet("07/22");
    sheets.set_row("'07/22'!D3:H3", full_row());
    let (repo, _) = store(&sheets);

    let err = repo
        .add(ExpenseItem::earn(Amount::new(500), "Cashback"), date(2022, 7, 20))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::Validation("No room to add more earnings for 07/2022!".to_string())
    );
    assert!(sheets.writes().is_empty());
}

#[tokio::test]
async fn descriptions_with_the_separator_are_rejected_before_any_call() {
    let sheets = FakeSheets::with_template();
    sheets.add_sheet("07/22");
    let (repo, _) = store(&sheets);
    let day = date(2022, 7, 11);

    let err = repo
        .add(ExpenseItem::spend(Amount::new(1250), "Coffee, Bagel"), day)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "ValidationError");
    assert_eq!(sheets.calls(), 0);

    repo.add(ExpenseItem::spend(Amount::new(100), "Tea"), day)
        .await
        .unwrap();
    assert_eq!(
        repo.get_all(day).await.unwrap(),
        vec![ExpenseItem::spend(Amount::new(100), "Tea")]
    );
}

#[tokio::test]
async fn formula_like_descriptions_are_written_raw() {
    let sheets = FakeSheets::with_template();
    sheets.add_sheet("07/22");
    let (repo, _) = store(&sheets);
    let day = date(2022, 7, 11);
    let item = ExpenseItem::spend(Amount::new(799), "7-11");

    repo.add(item.clone(), day).await.unwrap();

    assert_eq!(sheets.input_of("'07/22'!D15:H15"), Some(ValueInput::Raw));
    assert_eq!(repo.get_all(day).await.unwrap(), vec![item]);
}

#[tokio::test]
async fn old_dates_are_rejected_before_any_call() {
    let sheets = FakeSheets::with_template();
    let (repo, connector) = store(&sheets);

    let err = repo
        .add(ExpenseItem::spend(Amount::new(500), "x"), date(2018, 12, 31))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "ValidationError");
    assert_eq!(sheets.calls(), 0);
    assert!(connector.connects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn get_all_requires_the_sheet() {
    let sheets = FakeSheets::with_template();
    let (repo, _) = store(&sheets);

    let err = repo.get_all(date(2022, 7, 11)).await.unwrap_err();

    assert_eq!(
        err,
        Error::NotFound("Sheet '07/22' does not exist!".to_string())
    );
}

#[tokio::test]
async fn get_all_reports_corrupted_rows() {
    let sheets = FakeSheets::with_template();
    sheets.add_sheet("07/22");
    sheets.set_row(
        "'07/22'!D15:H15",
        vec![
            Value::from(1),
            Value::from(2),
            Value::from(""),
            Value::from(""),
            Value::from("only one"),
        ],
    );
    let (repo, _) = store(&sheets);

    let err = repo.get_all(date(2022, 7, 11)).await.unwrap_err();

    assert_eq!(err.kind(), "DataIntegrityError");
}

#[tokio::test]
async fn decoded_items_take_category_from_the_row() {
    let sheets = FakeSheets::with_template();
    sheets.add_sheet("07/22");
    sheets.set_row(
        "'07/22'!D15:H15",
        vec![
            Value::from(12.5),
            Value::from(""),
            Value::from(""),
            Value::from(""),
            Value::from("Coffee"),
        ],
    );
    let (repo, _) = store(&sheets);

    let items = repo.get_all(date(2022, 7, 11)).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].category, Category::Spend);
    assert_eq!(items[0].amount, Amount::new(1250));
}

#[tokio::test]
async fn missing_template_is_not_found() {
    let sheets = FakeSheets::default();
    let (repo, _) = store(&sheets);

    let err = repo
        .add(ExpenseItem::spend(Amount::new(500), "x"), date(2022, 7, 11))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::NotFound("Sheet with title 'TEMPLATE' not found!".to_string())
    );
}

#[tokio::test]
async fn handles_are_built_once_per_scope() {
    let sheets = FakeSheets::with_template();
    let (repo, connector) = store(&sheets);

    for day in 1..=3 {
        repo.add(ExpenseItem::spend(Amount::new(100), "x"), date(2022, 7, day))
            .await
            .unwrap();
        repo.get_all(date(2022, 7, day)).await.unwrap();
    }

    let connects = connector.connects.lock().unwrap().clone();
    assert_eq!(connects, vec![Scope::Read, Scope::Write]);
}
