//! Cell layout of a monthly ledger sheet.
//!
//! ```text
//!        B (date)      D   E   F   G   H (descriptions)
//! row 3                earnings of the whole month
//! row 5  MM/01/YYYY    purchases of day 1
//! ...
//! row 35 MM/31/YYYY    purchases of day 31
//! ```
use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::{Amount, Category, Error, ExpenseItem, ResultLedger};

/// Row holding the earnings of the whole month.
pub const EARNINGS_ROW: u32 = 3;
/// Rows above the first day of the month.
pub const HEADER_OFFSET: u32 = 4;
/// Amount cells in a ledger row.
pub const ROW_CAPACITY: usize = 4;
/// Separator between descriptions in the last cell of a row.
pub const DESCRIPTION_SEPARATOR: &str = ", ";
/// Data area wiped when a sheet is created from the template.
pub const DATA_RANGE: &str = "D3:H35";
const MAX_DAYS: u32 = 31;

/// Oldest date the workbook has sheets for.
pub fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Title of the sheet holding `date`: `MM/YY`.
pub fn sheet_name(date: NaiveDate) -> String {
    date.format("%m/%y").to_string()
}

/// Row of the ledger row an item of `category` dated `date` belongs to.
pub fn ledger_row(date: NaiveDate, category: Category) -> u32 {
    match category {
        Category::Earn => EARNINGS_ROW,
        Category::Spend => date.day() + HEADER_OFFSET,
    }
}

pub fn category_for_row(row: u32) -> Category {
    if row == EARNINGS_ROW {
        Category::Earn
    } else {
        Category::Spend
    }
}

/// Quotes a sheet title for use in A1 notation.
pub fn quoted(page: &str) -> String {
    format!("'{}'", page.replace('\'', "''"))
}

/// A1 range of the ledger row: 4 amount cells and the description cell.
pub fn row_range(page: &str, row: u32) -> String {
    format!("{}!D{row}:H{row}", quoted(page))
}

/// Checks that `description` reads back as exactly one description.
pub fn check_description(description: &str) -> ResultLedger<()> {
    if description.is_empty() {
        return Err(Error::Validation("Description is empty!".to_string()));
    }
    if description.contains(DESCRIPTION_SEPARATOR) {
        return Err(Error::Validation(format!(
            "Description can't contain '{DESCRIPTION_SEPARATOR}'"
        )));
    }
    Ok(())
}

/// Encodes items into the 5 cells of a ledger row.
///
/// Amounts are numbers, so the row is meant to be written as raw values.
pub fn encode_row(items: &[ExpenseItem]) -> ResultLedger<Vec<Value>> {
    if items.is_empty() {
        return Err(Error::Validation("Items list is empty!".to_string()));
    }
    if items.len() > ROW_CAPACITY {
        return Err(Error::Validation(format!(
            "A ledger row holds at most {ROW_CAPACITY} items"
        )));
    }
    for item in items {
        check_description(&item.description)?;
    }

    let mut cells: Vec<Value> = items
        .iter()
        .map(|item| Value::from(item.amount.dollars()))
        .collect();
    cells.resize(ROW_CAPACITY, Value::String(String::new()));

    let descriptions = items
        .iter()
        .map(|item| item.description.as_str())
        .collect::<Vec<_>>()
        .join(DESCRIPTION_SEPARATOR);
    cells.push(Value::String(descriptions));
    Ok(cells)
}

/// Decodes the cells of a ledger row.
///
/// The API drops trailing empty cells, so `cells` may be shorter than 5.
pub fn decode_row(cells: &[Value], category: Category) -> ResultLedger<Vec<ExpenseItem>> {
    let description = cells.get(ROW_CAPACITY).map(cell_text).unwrap_or_default();
    let descriptions: Vec<&str> = if description.is_empty() {
        Vec::new()
    } else {
        description.split(DESCRIPTION_SEPARATOR).collect()
    };

    let mut amounts = Vec::new();
    for cell in cells.iter().take(ROW_CAPACITY) {
        if let Some(amount) = cell_amount(cell)? {
            amounts.push(amount);
        }
    }

    if amounts.len() != descriptions.len() {
        return Err(Error::DataIntegrity(format!(
            "Descriptions don't match amounts! ({} amounts, {} descriptions)",
            amounts.len(),
            descriptions.len()
        )));
    }

    Ok(amounts
        .into_iter()
        .zip(descriptions)
        .map(|(amount, description)| ExpenseItem::new(amount, description, category))
        .collect())
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell_amount(cell: &Value) -> ResultLedger<Option<Amount>> {
    match cell {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .parse::<Amount>()
            .map(Some)
            .map_err(|_| Error::DataIntegrity(format!("Cell '{s}' is not an amount"))),
        Value::Number(n) => n
            .as_f64()
            .and_then(Amount::from_dollars)
            .map(Some)
            .ok_or_else(|| Error::DataIntegrity(format!("Cell '{n}' is not an amount"))),
        other => Err(Error::DataIntegrity(format!(
            "Cell '{other}' is not an amount"
        ))),
    }
}

/// Labels of the date column, `MM/DD/YYYY` for every day of the month.
pub fn date_labels(date: NaiveDate) -> Vec<String> {
    (1..=MAX_DAYS)
        .map_while(|day| date.with_day(day))
        .map(|day| day.format("%m/%d/%Y").to_string())
        .collect()
}

/// Range of the date column holding `days` labels.
pub fn date_column_range(page: &str, days: usize) -> String {
    format!("{}!B{}:B{}", quoted(page), HEADER_OFFSET + 1, HEADER_OFFSET as usize + days)
}

/// Rows left over by the template for months shorter than 31 days.
pub fn unused_rows_range(page: &str, days: usize) -> Option<String> {
    let diff = (MAX_DAYS as usize).checked_sub(days).filter(|d| *d > 0)?;
    let last = (HEADER_OFFSET + MAX_DAYS) as usize;
    Some(format!("{}!B{}:C{last}", quoted(page), last + 1 - diff))
}

/// Term subtracted from the running balance for the sheet `page`.
pub fn balance_term(page: &str) -> String {
    format!("-{}!A1", quoted(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn addressing() {
        let day = date(2022, 7, 11);
        assert_eq!(sheet_name(day), "07/22");
        assert_eq!(ledger_row(day, Category::Spend), 15);
        assert_eq!(ledger_row(day, Category::Earn), 3);
        assert_eq!(row_range("07/22", 15), "'07/22'!D15:H15");
        assert_eq!(category_for_row(3), Category::Earn);
        assert_eq!(category_for_row(15), Category::Spend);
    }

    #[test]
    fn encode_then_decode_keeps_items() {
        for n in 1..=ROW_CAPACITY {
            let items: Vec<ExpenseItem> = (0..n)
                .map(|i| ExpenseItem::spend(Amount::new(1250 + i as i64), format!("Shop {i}")))
                .collect();
            let cells = encode_row(&items).unwrap();
            assert_eq!(cells.len(), ROW_CAPACITY + 1);
            assert_eq!(decode_row(&cells, Category::Spend).unwrap(), items);
        }
    }

    #[test]
    fn decode_derives_category_from_row() {
        let items = vec![ExpenseItem::earn(Amount::new(100_000), "Paycheck")];
        let cells = encode_row(&items).unwrap();
        assert_eq!(decode_row(&cells, category_for_row(EARNINGS_ROW)).unwrap(), items);
    }

    #[test]
    fn encode_layout() {
        let items = vec![
            ExpenseItem::spend(Amount::new(1250), "Coffee"),
            ExpenseItem::spend(Amount::new(300), "Bagel"),
        ];
        let cells = encode_row(&items).unwrap();
        assert_eq!(
            cells,
            vec![
                Value::from(12.5),
                Value::from(3.0),
                Value::from(""),
                Value::from(""),
                Value::from("Coffee, Bagel"),
            ]
        );
        assert!(encode_row(&[]).is_err());
    }

    #[test]
    fn encode_rejects_descriptions_that_would_not_split_back() {
        let joined = vec![ExpenseItem::spend(Amount::new(1250), "Coffee, Bagel")];
        assert_eq!(
            encode_row(&joined).unwrap_err(),
            Error::Validation("Description can't contain ', '".to_string())
        );

        let empty = vec![ExpenseItem::spend(Amount::new(1250), "")];
        assert_eq!(encode_row(&empty).unwrap_err().kind(), "ValidationError");

        let items = vec![
            ExpenseItem::spend(Amount::new(100), "a,b"),
            ExpenseItem::spend(Amount::new(200), "c,"),
            ExpenseItem::spend(Amount::new(300), " d"),
        ];
        let cells = encode_row(&items).unwrap();
        assert_eq!(decode_row(&cells, Category::Spend).unwrap(), items);
    }

    #[test]
    fn decode_unformatted_values() {
        let cells = vec![
            Value::from(12.5),
            Value::from(3),
            Value::from(""),
            Value::from(""),
            Value::from("Coffee, Bagel"),
        ];
        let items = decode_row(&cells, Category::Spend).unwrap();
        assert_eq!(
            items,
            vec![
                ExpenseItem::spend(Amount::new(1250), "Coffee"),
                ExpenseItem::spend(Amount::new(300), "Bagel"),
            ]
        );
        assert!(decode_row(&[], Category::Spend).unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_mismatched_counts() {
        let cells = vec![
            Value::from(12.5),
            Value::from(3),
            Value::from(""),
            Value::from(""),
            Value::from("Coffee"),
        ];
        let err = decode_row(&cells, Category::Spend).unwrap_err();
        assert_eq!(err.kind(), "DataIntegrityError");

        let err = decode_row(&[Value::from(1)], Category::Spend).unwrap_err();
        assert_eq!(err.kind(), "DataIntegrityError");
    }

    #[test]
    fn date_column_for_short_months() {
        let labels = date_labels(date(2023, 2, 14));
        assert_eq!(labels.len(), 28);
        assert_eq!(labels[0], "02/01/2023");
        assert_eq!(labels[27], "02/28/2023");
        assert_eq!(date_column_range("02/23", 28), "'02/23'!B5:B32");
        assert_eq!(
            unused_rows_range("02/23", 28).as_deref(),
            Some("'02/23'!B33:C35")
        );
        assert_eq!(date_labels(date(2024, 2, 1)).len(), 29);
        assert_eq!(unused_rows_range("07/22", 31), None);
    }

    #[test]
    fn balance_term_quotes_the_sheet() {
        assert_eq!(balance_term("07/22"), "-'07/22'!A1");
    }
}
