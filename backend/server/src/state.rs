use std::sync::Arc;

use chrono::Duration;
use till::{
    bundled_menu,
    catalog::{Catalog, Menu},
    get_menu_remote,
    order::OrderBook,
    payment::PaymentDesk,
    table::{TableRegistry, TakeawayQueue},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::{config::Config, error::AppError};

/// Everything the café keeps in memory. A restart starts from the catalog again.
///
/// Handlers that need several stores take the locks in field order:
/// catalog, tables, takeaway, orders, payments.
pub struct State {
    pub config: Config,
    pub catalog: RwLock<Catalog>,
    pub tables: RwLock<TableRegistry>,
    pub takeaway: Mutex<TakeawayQueue>,
    pub orders: RwLock<OrderBook>,
    pub payments: Mutex<PaymentDesk>,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, AppError> {
        let config = Config::load()?;

        let menu = match &config.catalog_url {
            Some(url) => match get_menu_remote(url).await {
                Ok(menu) => menu,
                Err(e) => {
                    warn!("Failed to fetch catalog from {url}: {e}, using bundled catalog");
                    bundled_menu()?
                }
            },
            None => bundled_menu()?,
        };

        Ok(Self::with_menu(config, menu))
    }

    pub fn with_menu(config: Config, menu: Menu) -> Arc<Self> {
        let catalog = Catalog::new(menu);
        info!("Loaded {} products", catalog.list(true).len());

        let payments = PaymentDesk::new(
            config.merchant.clone(),
            Duration::seconds(config.payment_ttl_secs),
        );

        Arc::new(Self {
            config,
            catalog: RwLock::new(catalog),
            tables: RwLock::new(TableRegistry::new()),
            takeaway: Mutex::new(TakeawayQueue::new()),
            orders: RwLock::new(OrderBook::new()),
            payments: Mutex::new(payments),
        })
    }
}
