//! # Tables, cashier cards and take-away slots
//!
//! Every order is attached to a slug:
//! - `T-05`: a physical table, printed on its QR code
//! - `A-07`: a cashier card handed to a walk-in customer
//! - `TAKEAWAY-03`: a virtual queue slot for orders with no table
//!
//! Slugs arrive in whatever shape a customer or cashier typed them, so they are
//! normalized (trim, uppercase, spaces and underscores to `-`) before matching.
//! Numbers are padded to two digits in the canonical form.
use std::{collections::BTreeMap, fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TillError;

const MAX_TAKEAWAY_SLOT: u8 = 99;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_-]+").unwrap());
static TAKEAWAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:TAKEAWAY|TAKE-AWAY|TA)-?(\d{1,2})$").unwrap());
static CARD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^A-?(\d{1,2})$").unwrap());
static TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:T|TABLE|MEJA)?-?(\d{1,3})$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugKind {
    Table,
    CashierCard,
    TakeAway,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    pub slug: String,
    pub kind: SlugKind,
    pub number: Option<u16>,
    pub label: String,
}

impl Slug {
    pub fn parse(raw: &str) -> Result<Self, TillError> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(TillError::InvalidSlug(raw.to_string()));
        }

        let matched = [
            (&*TAKEAWAY, SlugKind::TakeAway),
            (&*CARD, SlugKind::CashierCard),
            (&*TABLE, SlugKind::Table),
        ]
        .into_iter()
        .find_map(|(pattern, kind)| {
            let number: u16 = pattern.captures(&normalized)?.get(1)?.as_str().parse().ok()?;
            (number > 0).then_some((kind, number))
        });

        Ok(match matched {
            Some((kind, number)) => Self::numbered(kind, number),
            None => Self {
                label: raw.trim().to_string(),
                slug: normalized,
                kind: SlugKind::Other,
                number: None,
            },
        })
    }

    pub fn takeaway(slot: u8) -> Self {
        Self::numbered(SlugKind::TakeAway, slot as u16)
    }

    fn numbered(kind: SlugKind, number: u16) -> Self {
        let (slug, label) = match kind {
            SlugKind::TakeAway => (
                format!("TAKEAWAY-{number:02}"),
                format!("Take-away #{number:02}"),
            ),
            SlugKind::CashierCard => (format!("A-{number:02}"), format!("Card A-{number:02}")),
            _ => (format!("T-{number:02}"), format!("Table {number}")),
        };

        Self {
            slug,
            kind,
            number: Some(number),
            label,
        }
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug)
    }
}

fn normalize(raw: &str) -> String {
    SEPARATORS
        .replace_all(raw.trim(), "-")
        .trim_matches('-')
        .to_uppercase()
}

/// Display label for any slug, falling back to the raw text.
pub fn label_for(raw: &str) -> String {
    Slug::parse(raw)
        .map(|slug| slug.label)
        .unwrap_or_else(|_| raw.trim().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub slug: String,
    pub kind: SlugKind,
    pub label: String,
    pub seats: u8,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableInput {
    pub slug: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub seats: Option<u8>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableUpdate {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub seats: Option<u8>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Physical tables and cashier cards the café has set up.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: BTreeMap<String, Table>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces. Returns the stored table and whether it was new.
    pub fn upsert(&mut self, input: TableInput) -> Result<(Table, bool), TillError> {
        let slug = Slug::parse(&input.slug)?;
        if !matches!(slug.kind, SlugKind::Table | SlugKind::CashierCard) {
            return Err(TillError::Invalid {
                field: "slug",
                reason: format!("{} is not a table or cashier card", slug.slug),
            });
        }

        let table = Table {
            label: input
                .label
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .unwrap_or(slug.label),
            slug: slug.slug,
            kind: slug.kind,
            seats: input.seats.unwrap_or(if slug.kind == SlugKind::Table { 2 } else { 0 }),
            active: input.active.unwrap_or(true),
        };

        let created = self
            .tables
            .insert(table.slug.clone(), table.clone())
            .is_none();

        Ok((table, created))
    }

    pub fn get(&self, raw: &str) -> Result<&Table, TillError> {
        let slug = Slug::parse(raw)?;
        self.tables
            .get(&slug.slug)
            .ok_or(TillError::UnknownTable(slug.slug))
    }

    /// Registered table for `slug`, if any. Unregistered slugs are allowed to order.
    pub fn find(&self, slug: &Slug) -> Option<&Table> {
        self.tables.get(&slug.slug)
    }

    pub fn update(&mut self, raw: &str, update: TableUpdate) -> Result<Table, TillError> {
        let slug = Slug::parse(raw)?;
        let table = self
            .tables
            .get_mut(&slug.slug)
            .ok_or(TillError::UnknownTable(slug.slug))?;

        if let Some(label) = update.label.filter(|label| !label.trim().is_empty()) {
            table.label = label.trim().to_string();
        }
        if let Some(seats) = update.seats {
            table.seats = seats;
        }
        if let Some(active) = update.active {
            table.active = active;
        }

        Ok(table.clone())
    }

    pub fn remove(&mut self, raw: &str) -> Result<Table, TillError> {
        let slug = Slug::parse(raw)?;
        self.tables
            .remove(&slug.slug)
            .ok_or(TillError::UnknownTable(slug.slug))
    }

    pub fn list(&self) -> Vec<Table> {
        self.tables.values().cloned().collect()
    }
}

/// Hands out `TAKEAWAY-NN` slots in order, wrapping after 99.
#[derive(Debug, Clone, Default)]
pub struct TakeawayQueue {
    last: u8,
}

impl TakeawayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_slot(&mut self) -> Slug {
        self.last = self.last % MAX_TAKEAWAY_SLOT + 1;
        Slug::takeaway(self.last)
    }
}
