use std::{fmt::Debug, iter::Sum, ops::Add, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};

/// Setting key for the ui language.
pub const SETTING_LANGUAGE: &str = "language";
/// Setting key for folding starting balances into aggregates.
pub const SETTING_INCLUDE_STARTING_BALANCES: &str = "includeStartingBalances";

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum BoxType {
    E1,
    E2,
}

impl BoxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoxType::E1 => "E1",
            BoxType::E2 => "E2",
        }
    }
}

impl FromStr for BoxType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "E1" => Ok(BoxType::E1),
            "E2" => Ok(BoxType::E2),
            _ => Err(()),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Language {
    #[default]
    En,
    Pl,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pl => "pl",
        }
    }
}

impl FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "pl" => Ok(Language::Pl),
            _ => Err(()),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum DisplayMode {
    #[default]
    Raw,
    Balance,
}

/// Intake and output counts for both box types.
///
/// This is the only place where balances are derived, every view that shows a balance goes
/// through `balance_e1`/`balance_e2`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct BoxCounts {
    pub e2_in: i64,
    pub e1_in: i64,
    pub e2_out: i64,
    pub e1_out: i64,
}

impl BoxCounts {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn balance_e1(&self) -> i64 {
        self.e1_out - self.e1_in
    }

    pub fn balance_e2(&self) -> i64 {
        self.e2_out - self.e2_in
    }

    pub fn balance_total(&self) -> i64 {
        self.balance_e1() + self.balance_e2()
    }

    pub fn balance(&self, box_type: BoxType) -> i64 {
        match box_type {
            BoxType::E1 => self.balance_e1(),
            BoxType::E2 => self.balance_e2(),
        }
    }

    pub fn intake(&self, box_type: BoxType) -> i64 {
        match box_type {
            BoxType::E1 => self.e1_in,
            BoxType::E2 => self.e2_in,
        }
    }

    pub fn output(&self, box_type: BoxType) -> i64 {
        match box_type {
            BoxType::E1 => self.e1_out,
            BoxType::E2 => self.e2_out,
        }
    }

    /// Keep only the counts of the given box types, all others are zeroed.
    pub fn restricted_to(&self, box_types: &[BoxType]) -> Self {
        let e1 = box_types.contains(&BoxType::E1);
        let e2 = box_types.contains(&BoxType::E2);
        Self {
            e2_in: if e2 { self.e2_in } else { 0 },
            e1_in: if e1 { self.e1_in } else { 0 },
            e2_out: if e2 { self.e2_out } else { 0 },
            e1_out: if e1 { self.e1_out } else { 0 },
        }
    }
}

impl Add for BoxCounts {
    type Output = BoxCounts;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            e2_in: self.e2_in + rhs.e2_in,
            e1_in: self.e1_in + rhs.e1_in,
            e2_out: self.e2_out + rhs.e2_out,
            e1_out: self.e1_out + rhs.e1_out,
        }
    }
}

impl Sum for BoxCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(BoxCounts::zero(), |a, b| a + b)
    }
}

impl<'a> Sum<&'a BoxCounts> for BoxCounts {
    fn sum<I: Iterator<Item = &'a BoxCounts>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Read the leading number of a count, `114.00` and `7 szt` read as 114 and 7.
///
/// Fractions are truncated, text without a leading number reads as 0.
pub fn count_prefix(value: &str) -> i64 {
    let value = value.trim();
    let mut end = 0;
    let mut has_digits = false;
    let mut has_point = false;
    for (i, c) in value.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => has_digits = true,
            '.' if !has_point => has_point = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !has_digits {
        return 0;
    }
    value[..end]
        .parse::<f64>()
        .map(|v| v.trunc() as i64)
        .unwrap_or(0)
}

#[derive(Debug, PartialEq, Clone)]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub balance: Option<i64>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Entry {
    pub id: i32,
    pub entry_date: NaiveDate,
    pub company_id: i32,
    pub company: String,
    pub counts: BoxCounts,
    pub photo_url: Option<String>,
    pub is_starting_balance: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Values for creating or updating an entry.
#[derive(Debug, PartialEq, Clone)]
pub struct NewEntry {
    pub entry_date: NaiveDate,
    pub company_id: i32,
    pub counts: BoxCounts,
    pub photo_url: Option<String>,
    pub is_starting_balance: bool,
}

/// One group of an aggregation, labeled by company name, month or quarter.
#[derive(Debug, PartialEq, Clone)]
pub struct GroupStats {
    pub label: String,
    pub counts: BoxCounts,
    pub entry_count: i64,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StatsGrouping {
    Company,
    Month,
    Quarter,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct StatsFilter {
    pub include_starting_balances: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl StatsFilter {
    pub fn new(include_starting_balances: bool) -> Self {
        Self {
            include_starting_balances,
            start_date: None,
            end_date: None,
        }
    }
}

/// Fold groups into grand totals.
pub fn grand_totals(groups: &[GroupStats]) -> (BoxCounts, i64) {
    let counts = groups.iter().map(|g| &g.counts).sum();
    let entry_count = groups.iter().map(|g| g.entry_count).sum();
    (counts, entry_count)
}

#[derive(Debug, PartialEq, Clone)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub email_verified: Option<DateTime<Utc>>,
}

/// The authenticated caller, restored from a signed session token.
#[derive(Debug, PartialEq, Clone)]
pub struct Session {
    pub user_id: i32,
    pub email: String,
    pub is_admin: bool,
    pub token: String,
    pub valid_until: DateTime<Utc>,
}

#[derive(PartialEq, Clone)]
pub struct Image {
    pub data: Vec<u8>,
    pub mimetype: String,
}

impl Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field(
                "data",
                &format!("{:?}[..20]", &self.data[..20.min(self.data.len())]),
            )
            .field("mimetype", &self.mimetype)
            .finish()
    }
}
