//! Rupiah amounts.
//!
//! Everything is whole rupiah in an `i64`. Rates are basis points so tax
//! stays in integer math.

pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;

/// Tax on `subtotal` at `rate_bps`, rounded half up.
pub fn tax_for(subtotal: i64, rate_bps: u32) -> i64 {
    let scaled = subtotal as i128 * rate_bps as i128;
    let rounded = if scaled >= 0 {
        (scaled + 5_000) / 10_000
    } else {
        (scaled - 5_000) / 10_000
    };

    rounded as i64
}

/// Renders `25000` as `Rp 25.000`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rupiah() {
        assert_eq!(format_rupiah(0), "Rp 0");
        assert_eq!(format_rupiah(500), "Rp 500");
        assert_eq!(format_rupiah(25_000), "Rp 25.000");
        assert_eq!(format_rupiah(1_250_000), "Rp 1.250.000");
        assert_eq!(format_rupiah(-5_000), "-Rp 5.000");
    }

    #[test]
    fn test_tax_rounds_half_up() {
        assert_eq!(tax_for(25_000, DEFAULT_TAX_RATE_BPS), 2_500);
        assert_eq!(tax_for(12_345, 1000), 1_235);
        assert_eq!(tax_for(12_344, 1000), 1_234);
        assert_eq!(tax_for(0, 1000), 0);
        assert_eq!(tax_for(10_000, 1100), 1_100);
    }
}
