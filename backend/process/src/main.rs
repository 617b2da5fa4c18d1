use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Product export to merge (JSON list or `{ "products": [...] }`)
    import: PathBuf,

    #[arg(long, default_value = till::CATALOG_PATH)]
    catalog: PathBuf,

    /// Report what would change without writing the catalog
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    process::load_products(&args.import, &args.catalog, args.dry_run)?;

    Ok(())
}
