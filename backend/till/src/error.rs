use thiserror::Error;

use crate::order::OrderStatus;

#[derive(Error, Debug)]
pub enum TillError {
    #[error("Product {0} not found")]
    UnknownProduct(u32),

    #[error("Product {0} is not available")]
    UnavailableProduct(u32),

    #[error("Option {group}/{label} is not offered for product {product_id}")]
    UnknownOption {
        product_id: u32,
        group: String,
        label: String,
    },

    #[error("Option group {group} is required for product {product_id}")]
    MissingOption { product_id: u32, group: String },

    #[error("Quantity must be at least 1")]
    ZeroQuantity,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart line {0} not found")]
    UnknownLine(String),

    #[error("Order {0} not found")]
    UnknownOrder(u64),

    #[error("Order {id} is already {status}")]
    OrderClosed { id: u64, status: OrderStatus },

    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Table {0} not found")]
    UnknownTable(String),

    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),

    #[error("Payment {0} not found")]
    UnknownPayment(u64),

    #[error("Payment {0} has expired")]
    PaymentExpired(u64),

    #[error("Payment {0} is already settled")]
    PaymentSettled(u64),

    #[error("Order {0} is already paid")]
    AlreadyPaid(u64),

    #[error("Invalid field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Catalog decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Catalog io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog fetch error: {0}")]
    Fetch(#[from] reqwest::Error),
}
