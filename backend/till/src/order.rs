//! # Orders
//!
//! Placed orders and the kitchen flow they go through.
//!
//! ```text
//! pending -> preparing -> ready -> served
//!    \__________\___________\_____-> cancelled
//! ```
//!
//! An order only ever moves one step forward or gets cancelled. `served` and
//! `cancelled` are final. Line items and totals are frozen at checkout so a
//! later price change in the catalog never rewrites an order.
use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    cart::{Quote, QuoteLine},
    error::TillError,
    table::Slug,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Cancelled,
    ];

    pub fn next(self) -> Option<Self> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Served),
            OrderStatus::Served | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Served | OrderStatus::Cancelled)
    }

    pub fn can_become(self, to: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }

        to == OrderStatus::Cancelled || self.next() == Some(to)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = TillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| TillError::Invalid {
                field: "status",
                reason: format!("unknown status {s:?}"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Unpaid,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Customer {
    /// A customer needs at least a name the kitchen can call out.
    pub fn validate(&self) -> Result<(), TillError> {
        if self.name.trim().is_empty() {
            return Err(TillError::Invalid {
                field: "customer.name",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: u64,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub table: String,
    pub table_label: String,
    pub customer: Customer,
    pub items: Vec<QuoteLine>,
    pub item_count: u32,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub status: OrderStatus,
    pub payment: PaymentState,
    #[serde(default)]
    pub note: String,
}

impl OrderEntry {
    pub fn is_paid(&self) -> bool {
        self.payment == PaymentState::Paid
    }
}

pub fn order_code(id: u64) -> String {
    format!("ORD-{id:06}")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub orders: usize,
    pub by_status: BTreeMap<OrderStatus, usize>,
    pub items_sold: u64,
    pub paid_revenue: i64,
    pub unpaid_revenue: i64,
    pub average_ticket: i64,
}

#[derive(Debug, Clone)]
pub struct OrderBook {
    orders: BTreeMap<u64, OrderEntry>,
    next_order_id: u64,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self {
            orders: BTreeMap::new(),
            next_order_id: 1,
        }
    }
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn place(
        &mut self,
        quote: Quote,
        table: &Slug,
        customer: Customer,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<OrderEntry, TillError> {
        customer.validate()?;
        if quote.lines.is_empty() {
            return Err(TillError::EmptyCart);
        }

        let id = self.next_order_id;
        let order = OrderEntry {
            id,
            code: order_code(id),
            created_at: now,
            updated_at: now,
            table: table.slug.clone(),
            table_label: table.label.clone(),
            customer: Customer {
                name: customer.name.trim().to_string(),
                phone: customer
                    .phone
                    .map(|phone| phone.trim().to_string())
                    .filter(|phone| !phone.is_empty()),
            },
            item_count: quote.item_count,
            items: quote.lines,
            subtotal: quote.subtotal,
            tax: quote.tax,
            total: quote.total,
            status: OrderStatus::Pending,
            payment: PaymentState::Unpaid,
            note: note.trim().to_string(),
        };

        self.next_order_id += 1;
        self.orders.insert(id, order.clone());

        Ok(order)
    }

    pub fn get(&self, id: u64) -> Result<&OrderEntry, TillError> {
        self.orders.get(&id).ok_or(TillError::UnknownOrder(id))
    }

    /// Newest first.
    pub fn list(&self, filter: &OrderFilter) -> Result<Vec<OrderEntry>, TillError> {
        let table = filter
            .table
            .as_deref()
            .map(Slug::parse)
            .transpose()?
            .map(|slug| slug.slug);

        let mut orders: Vec<OrderEntry> = self
            .orders
            .values()
            .filter(|order| filter.status.is_none_or(|status| order.status == status))
            .filter(|order| table.as_ref().is_none_or(|table| &order.table == table))
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    /// Orders the kitchen still has to deal with, oldest first.
    pub fn kitchen_queue(&self) -> Vec<OrderEntry> {
        let mut orders: Vec<OrderEntry> = self
            .orders
            .values()
            .filter(|order| !order.status.is_terminal())
            .cloned()
            .collect();

        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        orders
    }

    pub fn advance(&mut self, id: u64, now: DateTime<Utc>) -> Result<OrderEntry, TillError> {
        let order = self.orders.get_mut(&id).ok_or(TillError::UnknownOrder(id))?;
        let next = order.status.next().ok_or(TillError::OrderClosed {
            id,
            status: order.status,
        })?;

        order.status = next;
        order.updated_at = now;

        Ok(order.clone())
    }

    /// Moves to `to`. Asking for the current status is a no-op.
    pub fn set_status(
        &mut self,
        id: u64,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<OrderEntry, TillError> {
        let order = self.orders.get_mut(&id).ok_or(TillError::UnknownOrder(id))?;

        if order.status == to {
            return Ok(order.clone());
        }
        if order.status.is_terminal() {
            return Err(TillError::OrderClosed {
                id,
                status: order.status,
            });
        }
        if !order.status.can_become(to) {
            return Err(TillError::InvalidTransition {
                from: order.status,
                to,
            });
        }

        order.status = to;
        order.updated_at = now;

        Ok(order.clone())
    }

    pub fn mark_paid(&mut self, id: u64, now: DateTime<Utc>) -> Result<OrderEntry, TillError> {
        let order = self.orders.get_mut(&id).ok_or(TillError::UnknownOrder(id))?;

        if order.status == OrderStatus::Cancelled {
            return Err(TillError::OrderClosed {
                id,
                status: order.status,
            });
        }
        if order.is_paid() {
            return Err(TillError::AlreadyPaid(id));
        }

        order.payment = PaymentState::Paid;
        order.updated_at = now;

        Ok(order.clone())
    }

    pub fn remove(&mut self, id: u64) -> Result<OrderEntry, TillError> {
        self.orders.remove(&id).ok_or(TillError::UnknownOrder(id))
    }

    /// Counts and revenue for orders created on `date` in the café's `offset`.
    pub fn summary(&self, date: NaiveDate, offset: FixedOffset) -> DailySummary {
        let mut by_status: BTreeMap<OrderStatus, usize> =
            OrderStatus::ALL.into_iter().map(|status| (status, 0)).collect();
        let mut orders = 0;
        let mut items_sold: u64 = 0;
        let mut paid_revenue: i64 = 0;
        let mut unpaid_revenue: i64 = 0;
        let mut paid_orders = 0;

        for order in self
            .orders
            .values()
            .filter(|order| order.created_at.with_timezone(&offset).date_naive() == date)
        {
            orders += 1;
            *by_status.entry(order.status).or_default() += 1;

            if order.status == OrderStatus::Cancelled {
                continue;
            }

            items_sold = u64::from(order.item_count).saturating_add(items_sold);
            if order.is_paid() {
                paid_revenue = order.total.saturating_add(paid_revenue);
                paid_orders += 1;
            } else {
                unpaid_revenue = order.total.saturating_add(unpaid_revenue);
            }
        }

        DailySummary {
            date,
            orders,
            by_status,
            items_sold,
            paid_revenue,
            unpaid_revenue,
            average_ticket: if paid_orders == 0 {
                0
            } else {
                paid_revenue / paid_orders
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Offset, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    fn quote(total_units: u32, unit_price: i64) -> Quote {
        let subtotal = unit_price * total_units as i64;
        Quote {
            lines: vec![QuoteLine {
                key: "2|".to_string(),
                product_id: 2,
                name: "Croissant".to_string(),
                unit_price,
                quantity: total_units,
                options: Vec::new(),
                notes: String::new(),
                line_total: subtotal,
            }],
            item_count: total_units,
            subtotal,
            tax: subtotal / 10,
            total: subtotal + subtotal / 10,
            tax_rate_bps: 1000,
        }
    }

    fn customer(name: &str) -> Customer {
        Customer {
            name: name.to_string(),
            phone: None,
        }
    }

    fn place(book: &mut OrderBook, table: &str, at: DateTime<Utc>) -> OrderEntry {
        book.place(
            quote(2, 20_000),
            &Slug::parse(table).unwrap(),
            customer("Sari"),
            "",
            at,
        )
        .unwrap()
    }

    #[test]
    fn test_status_flow() {
        use OrderStatus::*;

        assert_eq!(Pending.next(), Some(Preparing));
        assert_eq!(Ready.next(), Some(Served));
        assert_eq!(Served.next(), None);
        assert!(Pending.can_become(Cancelled));
        assert!(Ready.can_become(Cancelled));
        assert!(!Pending.can_become(Ready));
        assert!(!Served.can_become(Cancelled));
        assert!(!Cancelled.can_become(Pending));
        assert_eq!("Preparing".parse::<OrderStatus>().unwrap(), Preparing);
        assert!("done".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_place_freezes_quote() {
        let mut book = OrderBook::new();
        let order = place(&mut book, "t-3", now());

        assert_eq!(order.id, 1);
        assert_eq!(order.code, "ORD-000001");
        assert_eq!(order.table, "T-03");
        assert_eq!(order.table_label, "Table 3");
        assert_eq!(order.subtotal, 40_000);
        assert_eq!(order.total, 44_000);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment, PaymentState::Unpaid);

        let second = place(&mut book, "a-1", now());
        assert_eq!(second.code, "ORD-000002");
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_place_requires_customer_name() {
        let mut book = OrderBook::new();
        let result = book.place(
            quote(1, 10_000),
            &Slug::parse("T-1").unwrap(),
            customer("   "),
            "",
            now(),
        );

        assert!(matches!(result, Err(TillError::Invalid { .. })));
        assert!(book.is_empty());
    }

    #[test]
    fn test_advance_and_set_status() {
        let mut book = OrderBook::new();
        let id = place(&mut book, "T-1", now()).id;

        assert_eq!(book.advance(id, now()).unwrap().status, OrderStatus::Preparing);
        assert!(matches!(
            book.set_status(id, OrderStatus::Served, now()),
            Err(TillError::InvalidTransition { .. })
        ));
        assert_eq!(
            book.set_status(id, OrderStatus::Preparing, now()).unwrap().status,
            OrderStatus::Preparing
        );
        book.advance(id, now()).unwrap();
        let served = book.advance(id, now() + Duration::minutes(5)).unwrap();
        assert_eq!(served.status, OrderStatus::Served);
        assert_eq!(served.updated_at, now() + Duration::minutes(5));

        assert!(matches!(
            book.advance(id, now()),
            Err(TillError::OrderClosed { .. })
        ));
        assert!(matches!(
            book.set_status(id, OrderStatus::Cancelled, now()),
            Err(TillError::OrderClosed { .. })
        ));
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let mut book = OrderBook::new();
        place(&mut book, "T-1", now());
        place(&mut book, "T-2", now() + Duration::minutes(1));
        place(&mut book, "T-1", now() + Duration::minutes(2));
        book.advance(1, now()).unwrap();

        let all = book.list(&OrderFilter::default()).unwrap();
        assert_eq!(all.iter().map(|o| o.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        let table_one = book
            .list(&OrderFilter {
                status: None,
                table: Some("table 1".to_string()),
            })
            .unwrap();
        assert_eq!(table_one.iter().map(|o| o.id).collect::<Vec<_>>(), vec![3, 1]);

        let pending = book
            .list(&OrderFilter {
                status: Some(OrderStatus::Pending),
                table: None,
            })
            .unwrap();
        assert_eq!(pending.len(), 2);

        let kitchen = book.kitchen_queue();
        assert_eq!(kitchen.iter().map(|o| o.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_mark_paid() {
        let mut book = OrderBook::new();
        let id = place(&mut book, "T-1", now()).id;

        assert!(book.mark_paid(id, now()).unwrap().is_paid());
        assert!(matches!(
            book.mark_paid(id, now()),
            Err(TillError::AlreadyPaid(_))
        ));

        let cancelled = place(&mut book, "T-2", now()).id;
        book.set_status(cancelled, OrderStatus::Cancelled, now()).unwrap();
        assert!(matches!(
            book.mark_paid(cancelled, now()),
            Err(TillError::OrderClosed { .. })
        ));
    }

    #[test]
    fn test_summary() {
        let mut book = OrderBook::new();
        let paid = place(&mut book, "T-1", now()).id;
        place(&mut book, "T-2", now());
        let cancelled = place(&mut book, "T-3", now()).id;
        place(&mut book, "T-4", now() - Duration::days(1));

        book.mark_paid(paid, now()).unwrap();
        book.set_status(cancelled, OrderStatus::Cancelled, now()).unwrap();

        let summary = book.summary(now().date_naive(), Utc.fix());
        assert_eq!(summary.orders, 3);
        assert_eq!(summary.by_status[&OrderStatus::Pending], 2);
        assert_eq!(summary.by_status[&OrderStatus::Cancelled], 1);
        assert_eq!(summary.by_status[&OrderStatus::Served], 0);
        assert_eq!(summary.items_sold, 4);
        assert_eq!(summary.paid_revenue, 44_000);
        assert_eq!(summary.unpaid_revenue, 44_000);
        assert_eq!(summary.average_ticket, 44_000);

        assert!(book.remove(paid).is_ok());
        assert!(matches!(book.remove(paid), Err(TillError::UnknownOrder(_))));
    }

    #[test]
    fn test_summary_uses_local_day() {
        let jakarta = FixedOffset::east_opt(7 * 3600).unwrap();
        let mut book = OrderBook::new();
        // 01:30 WIB on the 15th, still the 14th in UTC.
        place(&mut book, "T-1", Utc.with_ymd_and_hms(2026, 3, 14, 18, 30, 0).unwrap());

        let day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(book.summary(day, jakarta).orders, 1);
        assert_eq!(book.summary(day, Utc.fix()).orders, 0);
    }

    #[test]
    fn test_summary_saturates_revenue() {
        let mut book = OrderBook::new();
        for _ in 0..3 {
            let id = book
                .place(
                    quote(1, i64::MAX / 3),
                    &Slug::parse("T-1").unwrap(),
                    customer("Sari"),
                    "",
                    now(),
                )
                .unwrap()
                .id;
            book.mark_paid(id, now()).unwrap();
        }

        let summary = book.summary(now().date_naive(), Utc.fix());
        assert_eq!(summary.paid_revenue, i64::MAX);
        assert_eq!(summary.items_sold, 3);
    }
}
