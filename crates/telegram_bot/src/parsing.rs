//! Parsing of user input: dates and amounts.
use chrono::NaiveDate;
use ledger::Amount;

use crate::error::BotError;

pub(crate) const TODAY: &str = "today";
pub(crate) const YESTERDAY: &str = "yesterday";

/// Accepted date layouts, tried in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateFormat {
    /// `2022-07-11`
    Iso,
    /// `20220711`, `2022711`
    Compact,
    /// `07/11/2022`, `7/11/2022`
    UsLong,
    /// `07/11/22`, `7/11/22`
    UsShort,
}

pub const DATE_FORMATS: [DateFormat; 4] = [
    DateFormat::Iso,
    DateFormat::Compact,
    DateFormat::UsLong,
    DateFormat::UsShort,
];

#[derive(Clone, Copy, Debug)]
enum Token {
    /// Exactly four digits.
    Year4,
    /// Two digits, `69..=99` in the 1900s and `00..=68` in the 2000s.
    Year2,
    /// `1`-`12`, optionally zero padded.
    Month,
    /// `1`-`31`, optionally zero padded.
    Day,
    Lit(u8),
}

#[derive(Clone, Copy, Debug, Default)]
struct Fields {
    year: i32,
    month: u32,
    day: u32,
}

impl DateFormat {
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::Iso => "%Y-%m-%d",
            Self::Compact => "%Y%m%d",
            Self::UsLong => "%m/%d/%Y",
            Self::UsShort => "%m/%d/%y",
        }
    }

    const fn tokens(self) -> &'static [Token] {
        use Token::{Day, Lit, Month, Year2, Year4};
        match self {
            Self::Iso => &[Year4, Lit(b'-'), Month, Lit(b'-'), Day],
            Self::Compact => &[Year4, Month, Day],
            Self::UsLong => &[Month, Lit(b'/'), Day, Lit(b'/'), Year4],
            Self::UsShort => &[Month, Lit(b'/'), Day, Lit(b'/'), Year2],
        }
    }

    /// Matches the whole of `input`. Month and day take one or two digits,
    /// so `2022711` is July 11th.
    pub fn parse(self, input: &str) -> Option<NaiveDate> {
        let mut found = None;
        match_tokens(input.as_bytes(), self.tokens(), Fields::default(), &mut |f: Fields| {
            let date = NaiveDate::from_ymd_opt(f.year, f.month, f.day);
            found = date;
            date.is_some()
        });
        found
    }

    pub fn format(self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }
}

/// Backtracking matcher. `accept` is called on every complete match until it
/// returns true.
fn match_tokens(
    input: &[u8],
    tokens: &[Token],
    fields: Fields,
    accept: &mut dyn FnMut(Fields) -> bool,
) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return input.is_empty() && accept(fields);
    };

    candidates(*token, input).into_iter().any(|(value, len)| {
        let mut next = fields;
        match token {
            Token::Year4 => next.year = value as i32,
            Token::Year2 if value < 69 => next.year = 2000 + value as i32,
            Token::Year2 => next.year = 1900 + value as i32,
            Token::Month => next.month = value,
            Token::Day => next.day = value,
            Token::Lit(_) => {}
        }
        match_tokens(&input[len..], rest, next, accept)
    })
}

/// Values `token` can read at the start of `input`, with their length.
fn candidates(token: Token, input: &[u8]) -> Vec<(u32, usize)> {
    let digits = |n: usize| -> Option<u32> {
        let head = input.get(..n)?;
        head.iter()
            .all(u8::is_ascii_digit)
            .then(|| head.iter().fold(0, |acc, d| acc * 10 + u32::from(d - b'0')))
    };

    match token {
        Token::Lit(c) => match input.first() {
            Some(first) if *first == c => vec![(0, 1)],
            _ => Vec::new(),
        },
        Token::Year4 => digits(4).map(|v| (v, 4)).into_iter().collect(),
        Token::Year2 => digits(2).map(|v| (v, 2)).into_iter().collect(),
        Token::Month => ranged(digits, 12),
        Token::Day => ranged(digits, 31),
    }
}

/// Two digit reading first, then one digit. Zero is never a valid value.
fn ranged(digits: impl Fn(usize) -> Option<u32>, max: u32) -> Vec<(u32, usize)> {
    [2, 1]
        .into_iter()
        .filter_map(|len| digits(len).map(|v| (v, len)))
        .filter(|(v, _)| (1..=max).contains(v))
        .collect()
}

/// Parses a date, relative to `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate, BotError> {
    let input = input.trim();
    match input {
        TODAY => return Ok(today),
        YESTERDAY => {
            return today
                .pred_opt()
                .ok_or_else(|| BotError::Validation("Date out of range".to_string()));
        }
        _ => {}
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| format.parse(input))
        .ok_or_else(|| {
            let patterns = DATE_FORMATS
                .iter()
                .map(|f| f.pattern())
                .collect::<Vec<_>>()
                .join(", ");
            BotError::Validation(format!(
                "time data '{input}' does not match any of the formats: {patterns}"
            ))
        })
}

/// Parses a dollar amount, e.g. `12.50`, `$12.5` or `12,50`.
pub(crate) fn parse_amount(input: &str) -> Result<Amount, BotError> {
    Ok(input.trim().parse::<Amount>()?)
}
