use std::{env, fs};

use serde_json::json;
use till::{
    bundled_menu,
    cart::{Cart, CartItem, OptionSelection},
    catalog::Catalog,
    money::{DEFAULT_TAX_RATE_BPS, format_rupiah},
};

fn main() -> anyhow::Result<()> {
    let path = env::args().nth(1).unwrap_or_else(|| "../checkout.json".to_string());
    let catalog = Catalog::new(bundled_menu()?);

    // first choice of every required group, two of each
    let items: Vec<CartItem> = catalog
        .list(false)
        .into_iter()
        .take(3)
        .map(|product| CartItem {
            product_id: product.id,
            quantity: 2,
            options: product
                .option_groups
                .iter()
                .filter(|group| group.required)
                .filter_map(|group| {
                    group.choices.first().map(|choice| OptionSelection {
                        group: group.name.clone(),
                        label: choice.label.clone(),
                        price_delta: choice.price_delta,
                    })
                })
                .collect(),
            notes: String::new(),
        })
        .collect();

    let quote = Cart::from_items(items.clone())?.price(&catalog, DEFAULT_TAX_RATE_BPS)?;

    println!("Lines: {}", quote.lines.len());
    println!("Expected total: {}", format_rupiah(quote.total));

    let payload = json!({
        "table": "T-01",
        "customer": { "name": "Tester" },
        "items": items,
    });

    fs::write(&path, serde_json::to_vec_pretty(&payload)?)?;
    println!("Wrote {path}");

    Ok(())
}
