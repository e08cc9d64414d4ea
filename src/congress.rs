//! Bill identifiers and congress arithmetic.
//!
//! A [`BillKey`] is the `<congress><type><number>` slug (e.g. `116hr299`)
//! used both as the metadata map key and as the repository lookup key.

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Bill types in the order they are listed on a congress page
const BILL_TYPE_ORDER: &[&str] = &[
    "hr", "s", "hjres", "sjres", "hconres", "sconres", "hres", "sres",
];

fn bill_key_regex() -> &'static Regex {
    static BILL_KEY: OnceLock<Regex> = OnceLock::new();
    BILL_KEY.get_or_init(|| {
        Regex::new(r"^([1-9][0-9]{0,2})([a-z]+)(\d+)$").expect("static bill key pattern")
    })
}

/// Normalized bill identifier, e.g. `116hr299`
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillKey(String);

impl BillKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split the key into congress, bill type and number.
    /// Returns `None` for keys that are not of the `<congress><type><number>` form.
    pub fn parts(&self) -> Option<(u32, &str, u32)> {
        let caps = bill_key_regex().captures(&self.0)?;
        let congress = caps.get(1)?.as_str().parse().ok()?;
        let bill_type = caps.get(2)?.as_str();
        let number = caps.get(3)?.as_str().parse().ok()?;
        Some((congress, bill_type, number))
    }

    pub fn congress(&self) -> Option<u32> {
        self.parts().map(|(congress, _, _)| congress)
    }

    /// The key without its congress prefix (`116hr299` -> `hr299`)
    pub fn bill_number(&self) -> &str {
        let digits = self.0.chars().take_while(|c| c.is_ascii_digit()).count();
        &self.0[digits..]
    }
}

impl fmt::Display for BillKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BillKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Convert a hyphenated `bill_id` (`hr299-116`) into a [`BillKey`] (`116hr299`)
pub fn normalize_bill_id(bill_id: &str) -> Result<BillKey> {
    let parts: Vec<&str> = bill_id.trim().split('-').collect();
    if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(Error::InvalidBillId(bill_id.to_string()));
    }
    Ok(BillKey(parts.iter().rev().copied().collect::<String>()))
}

fn bill_type_rank(bill_type: &str) -> usize {
    BILL_TYPE_ORDER
        .iter()
        .position(|t| *t == bill_type)
        .unwrap_or(BILL_TYPE_ORDER.len())
}

/// Congress-aware ordering: newest congress first, then bill type in
/// chamber order, then bill number ascending. Unparseable keys sort last.
pub fn compare_bill_keys(a: &BillKey, b: &BillKey) -> Ordering {
    match (a.parts(), b.parts()) {
        (Some((ca, ta, na)), Some((cb, tb, nb))) => cb
            .cmp(&ca)
            .then_with(|| bill_type_rank(ta).cmp(&bill_type_rank(tb)))
            .then_with(|| ta.cmp(tb))
            .then_with(|| na.cmp(&nb)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Sort bill keys in place with [`compare_bill_keys`]
pub fn sort_bills_for_congress(keys: &mut [BillKey]) {
    keys.sort_by(compare_bill_keys);
}

/// A congress number and the session within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CongressSession {
    pub congress: u32,
    pub session: u32,
}

impl CongressSession {
    /// Congress in session on `date`. A new congress is seated on January 3rd
    /// of odd years; until then the previous year's congress applies.
    pub fn for_date(date: NaiveDate) -> Self {
        let jan_third = |year: i32| NaiveDate::from_ymd_opt(year, 1, 3);
        let year = match jan_third(date.year()) {
            Some(seated) if date > seated => date.year(),
            _ => date.year() - 1,
        };

        let days = match (jan_third(year), jan_third(1788)) {
            (Some(start), Some(first)) => (start - first).num_days(),
            _ => 0,
        };
        let n = (days as f64 / 365.0).round() as u32 + 1;

        Self {
            congress: n / 2,
            session: n % 2 + 1,
        }
    }

    /// Congress in session today (local time)
    pub fn current() -> Self {
        Self::for_date(chrono::Local::now().date_naive())
    }
}

impl fmt::Display for CongressSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (session {})", self.congress, self.session)
    }
}
