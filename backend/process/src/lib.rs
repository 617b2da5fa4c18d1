//! # Catalog Import
//!
//! Merges a product export into `catalog.json`.
//!
//! 1. Load the catalog and make sure `next_product_id` is ahead of every id.
//!
//! 2. For each imported product, sanitize its name. Names that sanitize to
//!    nothing are skipped.
//!
//! 3. A name already in the catalog updates that product in place and keeps its
//!    id, so table QR codes and open carts keep pointing at the same thing.
//!
//! 4. Anything else is a new product and takes the next free id.
//!
//! 5. Write the catalog back unless it is a dry run.
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use till::{
    catalog::{Menu, NewProduct, Product, sanitize},
    get_menu, write_menu,
};

pub mod models;
pub mod utils;

use models::ImportFile;
use utils::{name_index, sanitize_menu};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub new_items: usize,
    pub updated_items: usize,
    pub skipped: usize,
}

pub fn load_products(import: &Path, catalog: &Path, dry_run: bool) -> Result<MergeStats> {
    let mut menu = get_menu(catalog)
        .with_context(|| format!("reading catalog {}", catalog.display()))?;
    sanitize_menu(&mut menu);

    println!("Loaded Products: {}\n", menu.products.len());

    let data = std::fs::read(import).with_context(|| format!("reading {}", import.display()))?;
    let incoming = serde_json::from_slice::<ImportFile>(&data)
        .with_context(|| format!("parsing {}", import.display()))?
        .into_products();

    let pb = ProgressBar::new(incoming.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let stats = merge_products(&mut menu, incoming, &pb);
    pb.finish_with_message("Done");

    if stats.new_items == 0 && stats.updated_items == 0 {
        println!("No new or changed products found.");
    } else {
        println!("Total New Products: {}", stats.new_items);
        println!("Total Updated Products: {}", stats.updated_items);
        println!("Product Verification: {}", menu.products.len());
    }
    if stats.skipped > 0 {
        println!("Skipped (unusable names): {}", stats.skipped);
    }

    sanitize_menu(&mut menu);
    if dry_run {
        println!("\nDry run, {} left untouched.", catalog.display());
    } else {
        write_menu(catalog, &menu)
            .with_context(|| format!("writing catalog {}", catalog.display()))?;
    }

    Ok(stats)
}

pub fn merge_products(menu: &mut Menu, incoming: Vec<NewProduct>, pb: &ProgressBar) -> MergeStats {
    let mut stats = MergeStats::default();
    let mut index = name_index(menu);

    for new in incoming {
        let key = sanitize(&new.name);
        pb.set_message(new.name.clone());
        pb.inc(1);

        if key.is_empty() || new.price < 0 {
            stats.skipped += 1;
            continue;
        }

        match index.get(&key) {
            Some(&position) => {
                let existing = &mut menu.products[position];
                let id = existing.id;
                let updated = product_from(id, new);

                if *existing != updated {
                    *existing = updated;
                    stats.updated_items += 1;
                }
            }
            None => {
                let id = menu.next_product_id;
                menu.next_product_id += 1;
                menu.products.push(product_from(id, new));
                index.insert(key, menu.products.len() - 1);
                stats.new_items += 1;
            }
        }
    }

    stats
}

fn product_from(id: u32, new: NewProduct) -> Product {
    Product {
        id,
        name: new.name.trim().to_string(),
        description: new.description,
        price: new.price,
        image: new.image,
        category: new.category,
        available: new.available,
        option_groups: new.option_groups,
    }
}
