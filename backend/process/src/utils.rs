use std::collections::HashMap;

use till::catalog::{Menu, sanitize};

/// Sanitized name to index in `menu.products`.
pub fn name_index(menu: &Menu) -> HashMap<String, usize> {
    menu.products
        .iter()
        .enumerate()
        .map(|(index, product)| (sanitize(&product.name), index))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Keeps `next_product_id` ahead of every id in the file.
pub fn sanitize_menu(menu: &mut Menu) {
    if let Some(max_id) = menu.products.iter().map(|p| p.id).max() {
        menu.next_product_id = menu.next_product_id.max(max_id + 1);
    }
    menu.products.sort_by_key(|product| product.id);
}

#[cfg(test)]
mod tests {
    use till::catalog::Product;

    use super::*;

    fn product(id: u32, name: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            description: String::new(),
            price: 10_000,
            image: String::new(),
            category: String::new(),
            available: true,
            option_groups: Vec::new(),
        }
    }

    #[test]
    fn test_name_index() {
        let menu = Menu {
            next_product_id: 0,
            products: vec![product(4, "Teh_Tarik"), product(2, "!!!")],
        };

        let index = name_index(&menu);
        assert_eq!(index.get("teh tarik"), Some(&0));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_sanitize_menu() {
        let mut menu = Menu {
            next_product_id: 2,
            products: vec![product(7, "Croissant"), product(3, "Americano")],
        };

        sanitize_menu(&mut menu);
        assert_eq!(menu.next_product_id, 8);
        assert_eq!(menu.products[0].id, 3);
    }
}
