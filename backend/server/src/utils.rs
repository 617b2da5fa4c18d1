use till::{
    cart::{Cart, CartItem},
    order::OrderStatus,
};

use crate::error::AppError::{self, MalformedPayload};

pub fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T, AppError> {
    raw.trim().parse().map_err(|_| MalformedPayload)
}

/// Blank or missing means "no filter".
pub fn parse_status(raw: Option<&str>) -> Result<Option<OrderStatus>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(Some(raw.parse()?)),
        None => Ok(None),
    }
}

pub fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn build_cart(items: Vec<CartItem>) -> Result<Cart, AppError> {
    if items.is_empty() {
        return Err(till::error::TillError::EmptyCart.into());
    }

    Ok(Cart::from_items(items)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id::<u64>(" 42 ").unwrap(), 42);
        assert!(matches!(parse_id::<u64>("abc"), Err(MalformedPayload)));
        assert!(matches!(parse_id::<u32>("-1"), Err(MalformedPayload)));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(parse_status(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_status(Some("ready")).unwrap(),
            Some(OrderStatus::Ready)
        );
        assert!(parse_status(Some("eaten")).is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some(" T-1 ".to_string())), Some("T-1".to_string()));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }
}
