//! # Till
//!
//! Café domain logic shared by the server and the tools: the product catalog,
//! customer carts, orders, table slugs and the QRIS payment simulation.
//!
//! Nothing here does IO except the catalog loaders below. Stores are plain
//! structs; the server wraps them in locks.
use std::{fs, path::Path};

use reqwest::get;
use tracing::info;

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod receipt;
pub mod table;

use catalog::Menu;
use error::TillError;

pub const CATALOG_PATH: &str = "../till/catalog.json";

const BUNDLED_CATALOG: &str = include_str!("../catalog.json");

pub fn bundled_menu() -> Result<Menu, TillError> {
    Ok(serde_json::from_str(BUNDLED_CATALOG)?)
}

pub fn get_menu(path: impl AsRef<Path>) -> Result<Menu, TillError> {
    let data = fs::read(path)?;

    Ok(serde_json::from_slice(&data)?)
}

pub async fn get_menu_remote(url: &str) -> Result<Menu, TillError> {
    let response = get(url).await?.error_for_status()?;
    let bytes = response.bytes().await?;
    let menu: Menu = serde_json::from_slice(&bytes)?;

    info!("Fetched {} products from {url}", menu.products.len());
    Ok(menu)
}

pub fn write_menu(path: impl AsRef<Path>, menu: &Menu) -> Result<(), TillError> {
    fs::write(path, serde_json::to_vec_pretty(menu)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_bundled_menu_is_valid() {
        let menu = bundled_menu().unwrap();
        assert!(!menu.products.is_empty());

        let catalog = Catalog::new(menu.clone());
        assert_eq!(catalog.list(true).len(), menu.products.len());
        assert!(catalog.next_product_id() > menu.products.iter().map(|p| p.id).max().unwrap());
    }

    #[test]
    fn test_write_then_read_menu() {
        let path = std::env::temp_dir().join(format!("till-menu-{}.json", std::process::id()));
        let menu = bundled_menu().unwrap();

        write_menu(&path, &menu).unwrap();
        let read = get_menu(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(read.products, menu.products);
        assert_eq!(read.next_product_id, menu.next_product_id);
    }
}
