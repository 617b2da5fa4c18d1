//! # Cart
//!
//! Customer cart lines and how they turn into a priced quote.
//!
//! ## Line identity
//! Two items are the same line when they share a product id and the same set
//! of option selections, regardless of the order the options were picked in.
//! The identity is `"{product_id}|{group}:{label};{group}:{label}"` with the
//! options sorted by group then label. Notes never take part in it.
//!
//! ## Pricing
//! Prices always come from the catalog at quote time. The `price_delta` a
//! client sends with an option is only informational and gets replaced by the
//! catalog's value.
use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Catalog, Product},
    error::TillError,
    money::tax_for,
};

/// Most units a single cart line can hold.
pub const MAX_LINE_QUANTITY: u32 = 999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSelection {
    pub group: String,
    pub label: String,
    #[serde(default)]
    pub price_delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: u32,
    pub quantity: u32,
    #[serde(default)]
    pub options: Vec<OptionSelection>,
    #[serde(default)]
    pub notes: String,
}

impl CartItem {
    pub fn line_key(&self) -> String {
        line_key(self.product_id, &self.options)
    }
}

pub fn line_key(product_id: u32, options: &[OptionSelection]) -> String {
    let mut picked: Vec<(&str, &str)> = options
        .iter()
        .map(|option| (option.group.as_str(), option.label.as_str()))
        .collect();
    picked.sort_unstable();

    let options = picked
        .iter()
        .map(|(group, label)| format!("{group}:{label}"))
        .collect::<Vec<_>>()
        .join(";");

    format!("{product_id}|{options}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart by adding every item in order, merging repeats.
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Result<Self, TillError> {
        let mut cart = Self::new();
        for item in items {
            cart.add(item)?;
        }

        Ok(cart)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count: u32, item| count.saturating_add(item.quantity))
    }

    pub fn add(&mut self, mut item: CartItem) -> Result<&CartItem, TillError> {
        check_quantity(item.quantity)?;

        item.options
            .sort_by(|a, b| (&a.group, &a.label).cmp(&(&b.group, &b.label)));
        item.notes = item.notes.trim().to_string();

        let key = item.line_key();
        let index = match self.position(&key) {
            Some(index) => {
                let existing = &mut self.items[index];
                let merged = existing.quantity.saturating_add(item.quantity);
                existing.quantity = check_quantity(merged)?;
                if !item.notes.is_empty() {
                    existing.notes = item.notes;
                }
                index
            }
            None => {
                self.items.push(item);
                self.items.len() - 1
            }
        };

        Ok(&self.items[index])
    }

    /// Sets a line's quantity; zero drops the line.
    pub fn set_quantity(&mut self, key: &str, quantity: u32) -> Result<(), TillError> {
        let index = self
            .position(key)
            .ok_or_else(|| TillError::UnknownLine(key.to_string()))?;

        if quantity == 0 {
            self.items.remove(index);
        } else {
            self.items[index].quantity = check_quantity(quantity)?;
        }

        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<CartItem, TillError> {
        let index = self
            .position(key)
            .ok_or_else(|| TillError::UnknownLine(key.to_string()))?;

        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn price(&self, catalog: &Catalog, tax_rate_bps: u32) -> Result<Quote, TillError> {
        if self.is_empty() {
            return Err(TillError::EmptyCart);
        }

        let lines = self
            .items
            .iter()
            .map(|item| price_line(catalog, item))
            .collect::<Result<Vec<_>, _>>()?;

        let subtotal = lines
            .iter()
            .try_fold(0i64, |sum, line| sum.checked_add(line.line_total))
            .ok_or_else(|| too_large("subtotal"))?;
        let tax = tax_for(subtotal, tax_rate_bps);
        let total = subtotal.checked_add(tax).ok_or_else(|| too_large("total"))?;

        Ok(Quote {
            item_count: self.item_count(),
            lines,
            subtotal,
            tax,
            total,
            tax_rate_bps,
        })
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.line_key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub key: String,
    pub product_id: u32,
    pub name: String,
    pub unit_price: i64,
    pub quantity: u32,
    pub options: Vec<OptionSelection>,
    pub notes: String,
    pub line_total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub item_count: u32,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub tax_rate_bps: u32,
}

fn price_line(catalog: &Catalog, item: &CartItem) -> Result<QuoteLine, TillError> {
    let product = catalog.get(item.product_id)?;
    if !product.available {
        return Err(TillError::UnavailableProduct(product.id));
    }

    let options = resolve_options(&product, &item.options)?;
    let unit_price = options
        .iter()
        .try_fold(product.price, |price, o| price.checked_add(o.price_delta))
        .ok_or_else(|| too_large("unit_price"))?;
    let line_total = unit_price
        .checked_mul(i64::from(item.quantity))
        .ok_or_else(|| too_large("line_total"))?;

    Ok(QuoteLine {
        key: item.line_key(),
        product_id: product.id,
        name: product.name,
        unit_price,
        quantity: item.quantity,
        options,
        notes: item.notes.clone(),
        line_total,
    })
}

fn check_quantity(quantity: u32) -> Result<u32, TillError> {
    if quantity == 0 {
        return Err(TillError::ZeroQuantity);
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(TillError::Invalid {
            field: "quantity",
            reason: format!("{quantity} is above {MAX_LINE_QUANTITY} per line"),
        });
    }

    Ok(quantity)
}

fn too_large(field: &'static str) -> TillError {
    TillError::Invalid {
        field,
        reason: "amount is too large".to_string(),
    }
}

fn resolve_options(
    product: &Product,
    selections: &[OptionSelection],
) -> Result<Vec<OptionSelection>, TillError> {
    let mut resolved: Vec<OptionSelection> = Vec::with_capacity(selections.len());

    for selection in selections {
        let unknown = || TillError::UnknownOption {
            product_id: product.id,
            group: selection.group.clone(),
            label: selection.label.clone(),
        };

        let choice = product
            .option_group(&selection.group)
            .and_then(|group| group.choice(&selection.label))
            .ok_or_else(unknown)?;

        if resolved.iter().any(|o| o.group == selection.group) {
            return Err(TillError::Invalid {
                field: "options",
                reason: format!("group {} picked more than once", selection.group),
            });
        }

        resolved.push(OptionSelection {
            group: selection.group.clone(),
            label: choice.label.clone(),
            price_delta: choice.price_delta,
        });
    }

    for group in product.option_groups.iter().filter(|group| group.required) {
        if !resolved.iter().any(|o| o.group == group.name) {
            return Err(TillError::MissingOption {
                product_id: product.id,
                group: group.name.clone(),
            });
        }
    }

    Ok(resolved)
}
