//! # QRIS payment simulation
//!
//! Builds dynamic QRIS strings the way a merchant-presented EMVCo QR looks and
//! tracks the payment intent behind each one. Nothing talks to a real acquirer:
//! an intent is settled by calling [`PaymentDesk::confirm`], which stands in for
//! the customer scanning and paying.
//!
//! ## Payload
//! Tag-length-value pairs, two digit tag and two digit length:
//! - `00` payload format `01`, `01` point of initiation `12` (dynamic)
//! - `26` merchant account: `00` GUID, `01` merchant id, `03` criteria
//! - `52` MCC, `53` currency `360` (IDR), `54` amount, `58` country `ID`
//! - `59` merchant name, `60` city, `62` additional data with `01` bill number
//! - `63` CRC-16/CCITT-FALSE over everything up to and including `6304`
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::TillError,
    order::{OrderEntry, OrderStatus},
};

const QRIS_GUID: &str = "ID.CO.QRIS.WWW";
const MCC_EATING_PLACES: &str = "5812";
const CURRENCY_IDR: &str = "360";
const MAX_NAME_LEN: usize = 25;
const MAX_CITY_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrisMerchant {
    pub name: String,
    pub city: String,
    pub merchant_id: String,
}

/// CRC-16/CCITT-FALSE: poly 0x1021, init 0xFFFF, no reflection.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;

    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }

    crc
}

fn tlv(tag: &str, value: &str) -> String {
    format!("{tag}{:02}{value}", value.len())
}

/// Keeps printable ASCII and cuts to `max` characters.
fn field(value: &str, max: usize) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .take(max)
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn build_payload(merchant: &QrisMerchant, amount: i64, bill_number: &str) -> String {
    let account = [
        tlv("00", QRIS_GUID),
        tlv("01", &field(&merchant.merchant_id, 50)),
        tlv("03", "UMI"),
    ]
    .concat();

    let mut payload = [
        tlv("00", "01"),
        tlv("01", "12"),
        tlv("26", &account),
        tlv("52", MCC_EATING_PLACES),
        tlv("53", CURRENCY_IDR),
        tlv("54", &amount.to_string()),
        tlv("58", "ID"),
        tlv("59", &field(&merchant.name, MAX_NAME_LEN)),
        tlv("60", &field(&merchant.city, MAX_CITY_LEN)),
        tlv("62", &tlv("01", &field(bill_number, 25))),
        "6304".to_string(),
    ]
    .concat();

    let crc = crc16(payload.as_bytes());
    payload.push_str(&format!("{crc:04X}"));
    payload
}

/// Splits a payload into its top level `(tag, value)` pairs.
pub fn parse_payload(payload: &str) -> Result<Vec<(String, String)>, TillError> {
    let malformed = |reason: String| TillError::Invalid {
        field: "qr_payload",
        reason,
    };

    if !payload.is_ascii() {
        return Err(malformed("not ascii".to_string()));
    }

    let mut fields = Vec::new();
    let mut rest = payload;

    while !rest.is_empty() {
        if rest.len() < 4 {
            return Err(malformed(format!("truncated header {rest:?}")));
        }

        let tag = &rest[..2];
        let len: usize = rest[2..4]
            .parse()
            .map_err(|_| malformed(format!("bad length for tag {tag}")))?;
        let end = 4 + len;
        if rest.len() < end {
            return Err(malformed(format!("tag {tag} overruns payload")));
        }

        fields.push((tag.to_string(), rest[4..end].to_string()));
        rest = &rest[end..];
    }

    Ok(fields)
}

/// Checks structure and the trailing CRC.
pub fn verify_payload(payload: &str) -> bool {
    let Ok(fields) = parse_payload(payload) else {
        return false;
    };
    let Some((tag, crc)) = fields.last() else {
        return false;
    };
    if tag != "63" || crc.len() != 4 {
        return false;
    }

    let signed = &payload[..payload.len() - 4];
    format!("{:04X}", crc16(signed.as_bytes())) == *crc
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: u64,
    pub order_id: u64,
    pub order_code: String,
    pub amount: i64,
    pub qr_payload: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

impl PaymentIntent {
    fn expire_if_due(&mut self, now: DateTime<Utc>) {
        if self.status == PaymentStatus::Pending && now >= self.expires_at {
            self.status = PaymentStatus::Expired;
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentDesk {
    merchant: QrisMerchant,
    ttl: Duration,
    intents: BTreeMap<u64, PaymentIntent>,
    next_payment_id: u64,
}

impl PaymentDesk {
    pub fn new(merchant: QrisMerchant, ttl: Duration) -> Self {
        Self {
            merchant,
            ttl,
            intents: BTreeMap::new(),
            next_payment_id: 1,
        }
    }

    /// Opens an intent for `order`, handing back the live one if it still matches.
    pub fn open(&mut self, order: &OrderEntry, now: DateTime<Utc>) -> Result<PaymentIntent, TillError> {
        if order.is_paid() {
            return Err(TillError::AlreadyPaid(order.id));
        }
        if order.status == OrderStatus::Cancelled {
            return Err(TillError::OrderClosed {
                id: order.id,
                status: order.status,
            });
        }

        for intent in self.intents.values_mut().filter(|i| i.order_id == order.id) {
            intent.expire_if_due(now);
            if intent.status == PaymentStatus::Pending && intent.amount == order.total {
                return Ok(intent.clone());
            }
            if intent.status == PaymentStatus::Pending {
                intent.status = PaymentStatus::Expired;
            }
        }

        let id = self.next_payment_id;
        let intent = PaymentIntent {
            id,
            order_id: order.id,
            order_code: order.code.clone(),
            amount: order.total,
            qr_payload: build_payload(&self.merchant, order.total, &order.code),
            created_at: now,
            expires_at: now + self.ttl,
            status: PaymentStatus::Pending,
            paid_at: None,
        };

        self.next_payment_id += 1;
        self.intents.insert(id, intent.clone());

        Ok(intent)
    }

    pub fn get(&mut self, id: u64, now: DateTime<Utc>) -> Result<PaymentIntent, TillError> {
        let intent = self
            .intents
            .get_mut(&id)
            .ok_or(TillError::UnknownPayment(id))?;
        intent.expire_if_due(now);

        Ok(intent.clone())
    }

    /// Fails unless the intent is pending and unexpired; leaves it untouched.
    pub fn check_payable(&mut self, id: u64, now: DateTime<Utc>) -> Result<PaymentIntent, TillError> {
        let intent = self.get(id, now)?;
        match intent.status {
            PaymentStatus::Pending => Ok(intent),
            PaymentStatus::Expired => Err(TillError::PaymentExpired(id)),
            PaymentStatus::Paid => Err(TillError::PaymentSettled(id)),
        }
    }

    pub fn confirm(&mut self, id: u64, now: DateTime<Utc>) -> Result<PaymentIntent, TillError> {
        self.check_payable(id, now)?;

        let intent = self
            .intents
            .get_mut(&id)
            .ok_or(TillError::UnknownPayment(id))?;
        intent.status = PaymentStatus::Paid;
        intent.paid_at = Some(now);

        Ok(intent.clone())
    }

    pub fn for_order(&mut self, order_id: u64, now: DateTime<Utc>) -> Vec<PaymentIntent> {
        self.intents
            .values_mut()
            .filter(|intent| intent.order_id == order_id)
            .map(|intent| {
                intent.expire_if_due(now);
                intent.clone()
            })
            .collect()
    }
}
