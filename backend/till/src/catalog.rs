//! # Catalog
//!
//! Static menu entries plus the admin layer on top of them.
//!
//! The static menu ships as `catalog.json` (or is fetched from a remote URL at
//! startup) and is never mutated in place. Admin edits land in an override map
//! keyed by product id:
//! - A patch: every `Some` field replaces the static value
//! - A tombstone: the static product is hidden until reset
//!
//! Products created by an admin live in their own map and take the next free
//! id, so ids never collide with the static menu.
use std::{
    collections::{BTreeMap, HashMap},
    sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TillError;

/// Highest price or option delta an admin can set, in rupiah.
pub const MAX_PRICE: i64 = 100_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub label: String,
    #[serde(default)]
    pub price_delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    pub choices: Vec<OptionChoice>,
}

impl OptionGroup {
    pub fn choice(&self, label: &str) -> Option<&OptionChoice> {
        self.choices.iter().find(|choice| choice.label == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "available_by_default")]
    pub available: bool,
    #[serde(default)]
    pub option_groups: Vec<OptionGroup>,
}

impl Product {
    pub fn option_group(&self, name: &str) -> Option<&OptionGroup> {
        self.option_groups.iter().find(|group| group.name == name)
    }
}

fn available_by_default() -> bool {
    true
}

/// Body of an admin create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "available_by_default")]
    pub available: bool,
    #[serde(default)]
    pub option_groups: Vec<OptionGroup>,
}

/// Admin edit. `None` keeps whatever the product currently has.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_groups: Option<Vec<OptionGroup>>,
}

impl ProductPatch {
    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = &self.image {
            product.image = image.clone();
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(available) = self.available {
            product.available = available;
        }
        if let Some(option_groups) = &self.option_groups {
            product.option_groups = option_groups.clone();
        }
    }

    /// Layers `newer` on top of `self`.
    fn merge(&mut self, newer: ProductPatch) {
        self.name = newer.name.or(self.name.take());
        self.description = newer.description.or(self.description.take());
        self.price = newer.price.or(self.price);
        self.image = newer.image.or(self.image.take());
        self.category = newer.category.or(self.category.take());
        self.available = newer.available.or(self.available);
        self.option_groups = newer.option_groups.or(self.option_groups.take());
    }

    fn validate(&self) -> Result<(), TillError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(option_groups) = &self.option_groups {
            validate_option_groups(option_groups)?;
        }

        Ok(())
    }
}

/// On-disk menu: products plus the next id to hand out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Menu {
    #[serde(default)]
    pub next_product_id: u32,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone)]
enum Override {
    Patch(ProductPatch),
    Hidden,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    base: BTreeMap<u32, Product>,
    overrides: HashMap<u32, Override>,
    custom: BTreeMap<u32, Product>,
    next_product_id: u32,
}

impl Catalog {
    pub fn new(menu: Menu) -> Self {
        let max_id = menu.products.iter().map(|p| p.id).max();
        let next_product_id = match max_id {
            Some(id) => menu.next_product_id.max(id + 1),
            None => menu.next_product_id,
        };

        Self {
            base: menu.products.into_iter().map(|p| (p.id, p)).collect(),
            overrides: HashMap::new(),
            custom: BTreeMap::new(),
            next_product_id,
        }
    }

    pub fn next_product_id(&self) -> u32 {
        self.next_product_id
    }

    /// The product as customers see it, `None` if unknown or hidden.
    pub fn effective(&self, id: u32) -> Option<Product> {
        if let Some(product) = self.custom.get(&id) {
            return Some(product.clone());
        }

        let mut product = self.base.get(&id)?.clone();
        match self.overrides.get(&id) {
            Some(Override::Hidden) => return None,
            Some(Override::Patch(patch)) => patch.apply(&mut product),
            None => {}
        }

        Some(product)
    }

    pub fn get(&self, id: u32) -> Result<Product, TillError> {
        self.effective(id).ok_or(TillError::UnknownProduct(id))
    }

    pub fn list(&self, include_unavailable: bool) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .base
            .keys()
            .chain(self.custom.keys())
            .filter_map(|id| self.effective(*id))
            .filter(|product| include_unavailable || product.available)
            .collect();

        products.sort_by_key(|product| product.id);
        products
    }

    pub fn create(&mut self, new: NewProduct) -> Result<Product, TillError> {
        validate_name(&new.name)?;
        validate_price(new.price)?;
        validate_option_groups(&new.option_groups)?;

        let product = Product {
            id: self.next_product_id,
            name: new.name.trim().to_string(),
            description: new.description,
            price: new.price,
            image: new.image,
            category: new.category,
            available: new.available,
            option_groups: new.option_groups,
        };

        self.next_product_id += 1;
        self.custom.insert(product.id, product.clone());

        Ok(product)
    }

    pub fn patch(&mut self, id: u32, patch: ProductPatch) -> Result<Product, TillError> {
        patch.validate()?;

        if let Some(product) = self.custom.get_mut(&id) {
            patch.apply(product);
            return Ok(product.clone());
        }

        if self.effective(id).is_none() {
            return Err(TillError::UnknownProduct(id));
        }

        match self.overrides.get_mut(&id) {
            Some(Override::Patch(existing)) => existing.merge(patch),
            _ => {
                self.overrides.insert(id, Override::Patch(patch));
            }
        }

        self.get(id)
    }

    pub fn remove(&mut self, id: u32) -> Result<(), TillError> {
        if self.custom.remove(&id).is_some() {
            return Ok(());
        }

        if self.effective(id).is_none() {
            return Err(TillError::UnknownProduct(id));
        }

        self.overrides.insert(id, Override::Hidden);
        Ok(())
    }

    /// Drops the admin layer of a static product, unhiding it if needed.
    pub fn reset(&mut self, id: u32) -> Result<Product, TillError> {
        let product = self
            .base
            .get(&id)
            .cloned()
            .ok_or(TillError::UnknownProduct(id))?;
        self.overrides.remove(&id);

        Ok(product)
    }
}

fn validate_name(name: &str) -> Result<(), TillError> {
    if sanitize(name).is_empty() {
        return Err(TillError::Invalid {
            field: "name",
            reason: "must contain letters or digits".to_string(),
        });
    }

    Ok(())
}

fn validate_price(price: i64) -> Result<(), TillError> {
    if price < 0 {
        return Err(TillError::Invalid {
            field: "price",
            reason: format!("{price} is negative"),
        });
    }
    if price > MAX_PRICE {
        return Err(TillError::Invalid {
            field: "price",
            reason: format!("{price} is above {MAX_PRICE}"),
        });
    }

    Ok(())
}

fn validate_option_groups(groups: &[OptionGroup]) -> Result<(), TillError> {
    for (index, group) in groups.iter().enumerate() {
        if group.name.trim().is_empty() {
            return Err(TillError::Invalid {
                field: "option_groups",
                reason: format!("group {index} has no name"),
            });
        }
        if group.choices.is_empty() {
            return Err(TillError::Invalid {
                field: "option_groups",
                reason: format!("group {} has no choices", group.name),
            });
        }
        if let Some(choice) = group
            .choices
            .iter()
            .find(|choice| choice.price_delta.unsigned_abs() > MAX_PRICE.unsigned_abs())
        {
            return Err(TillError::Invalid {
                field: "option_groups",
                reason: format!("{} costs too much", choice.label),
            });
        }
        if groups[..index].iter().any(|other| other.name == group.name) {
            return Err(TillError::Invalid {
                field: "option_groups",
                reason: format!("group {} is listed twice", group.name),
            });
        }
    }

    Ok(())
}

static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_]").unwrap());
static NOT_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9- ]").unwrap());
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").unwrap());

/// Lowercase key used to spot duplicate product names.
pub fn sanitize(input: &str) -> String {
    let s = UNDERSCORES.replace_all(input, " ");
    let s = NOT_NAME.replace_all(&s, "");

    SPACES.replace_all(s.trim(), " ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latte() -> Product {
        Product {
            id: 1,
            name: "Caffe Latte".to_string(),
            description: "Espresso and steamed milk".to_string(),
            price: 28_000,
            image: "/images/latte.jpg".to_string(),
            category: "coffee".to_string(),
            available: true,
            option_groups: vec![OptionGroup {
                name: "Size".to_string(),
                required: true,
                choices: vec![
                    OptionChoice {
                        label: "Regular".to_string(),
                        price_delta: 0,
                    },
                    OptionChoice {
                        label: "Large".to_string(),
                        price_delta: 5_000,
                    },
                ],
            }],
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(Menu {
            next_product_id: 0,
            products: vec![latte()],
        })
    }

    fn new_product(name: &str, price: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            price,
            image: String::new(),
            category: "food".to_string(),
            available: true,
            option_groups: Vec::new(),
        }
    }

    #[test]
    fn test_next_id_follows_static_menu() {
        let mut catalog = catalog();
        assert_eq!(catalog.next_product_id(), 2);

        let created = catalog.create(new_product("Croissant", 22_000)).unwrap();
        assert_eq!(created.id, 2);
        assert_eq!(catalog.next_product_id(), 3);
        assert_eq!(catalog.list(false).len(), 2);
    }

    #[test]
    fn test_patch_layers_over_static_entry() {
        let mut catalog = catalog();

        catalog
            .patch(
                1,
                ProductPatch {
                    price: Some(30_000),
                    ..Default::default()
                },
            )
            .unwrap();
        let patched = catalog
            .patch(
                1,
                ProductPatch {
                    available: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(patched.price, 30_000);
        assert!(!patched.available);
        assert!(catalog.list(false).is_empty());
        assert_eq!(catalog.list(true).len(), 1);

        let reset = catalog.reset(1).unwrap();
        assert_eq!(reset.price, 28_000);
        assert!(catalog.get(1).unwrap().available);
    }

    #[test]
    fn test_remove_hides_static_and_drops_custom() {
        let mut catalog = catalog();
        let created = catalog.create(new_product("Croissant", 22_000)).unwrap();

        catalog.remove(1).unwrap();
        catalog.remove(created.id).unwrap();

        assert!(catalog.effective(1).is_none());
        assert!(matches!(
            catalog.remove(1),
            Err(TillError::UnknownProduct(1))
        ));
        assert!(matches!(
            catalog.reset(created.id),
            Err(TillError::UnknownProduct(2))
        ));

        catalog.reset(1).unwrap();
        assert!(catalog.effective(1).is_some());
    }

    #[test]
    fn test_rejects_bad_products() {
        let mut catalog = catalog();

        assert!(catalog.create(new_product("  !!  ", 10_000)).is_err());
        assert!(catalog.create(new_product("Tea", -1)).is_err());
        assert!(catalog.create(new_product("Tea", MAX_PRICE + 1)).is_err());

        let mut pricey_option = new_product("Tea", 10_000);
        pricey_option.option_groups = latte().option_groups;
        pricey_option.option_groups[0].choices[0].price_delta = i64::MIN;
        assert!(catalog.create(pricey_option).is_err());

        let mut duplicated = new_product("Tea", 10_000);
        duplicated.option_groups = vec![latte().option_groups[0].clone(); 2];
        assert!(catalog.create(duplicated).is_err());

        let patch = ProductPatch {
            price: Some(-5),
            ..Default::default()
        };
        assert!(catalog.patch(1, patch).is_err());
        assert_eq!(catalog.get(1).unwrap().price, 28_000);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Caffe_Latte"), "caffe latte");
        assert_eq!(sanitize("  Es   Kopi Susu!  "), "es kopi susu");
        assert_eq!(sanitize("Pain-au-Chocolat"), "pain-au-chocolat");
        assert_eq!(sanitize("!@#$%^&*()"), "");
        assert_eq!(sanitize(""), "");
    }
}
