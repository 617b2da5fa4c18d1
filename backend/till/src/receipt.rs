//! Plain text receipts for the cashier printer and the customer's order page.
use chrono::FixedOffset;

use crate::{money::format_rupiah, order::OrderEntry};

const WIDTH: usize = 32;
const INDENT: &str = "   ";

/// Renders `order` at 32 columns, with times shown in the café's `offset`.
pub fn render_receipt(order: &OrderEntry, cafe_name: &str, offset: FixedOffset) -> String {
    let rule = "-".repeat(WIDTH);
    let cafe_name: String = cafe_name.trim().chars().take(WIDTH).collect();
    let placed = order.created_at.with_timezone(&offset);

    let mut lines = vec![
        format!("{cafe_name:^width$}", width = WIDTH),
        rule.clone(),
        row(&order.code, &order.table_label),
        row(&order.customer.name, &placed.format("%d/%m/%Y %H:%M").to_string()),
        rule.clone(),
    ];

    for line in &order.items {
        lines.push(row(
            &format!("{}x {}", line.quantity, line.name),
            &format_rupiah(line.line_total),
        ));
        for option in &line.options {
            push_wrapped(&mut lines, INDENT, &format!("{}: {}", option.group, option.label));
        }
        if !line.notes.is_empty() {
            push_wrapped(&mut lines, INDENT, &format!("\"{}\"", line.notes));
        }
    }

    lines.push(rule.clone());
    lines.push(row("Subtotal", &format_rupiah(order.subtotal)));
    lines.push(row("Tax", &format_rupiah(order.tax)));
    lines.push(row("Total", &format_rupiah(order.total)));
    lines.push(row(
        "Status",
        if order.is_paid() { "PAID" } else { "UNPAID" },
    ));
    if !order.note.is_empty() {
        lines.push(rule);
        push_wrapped(&mut lines, "", &format!("Note: {}", order.note));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn push_wrapped(lines: &mut Vec<String>, indent: &str, text: &str) {
    lines.extend(
        wrap(text, WIDTH - indent.len())
            .into_iter()
            .map(|piece| format!("{indent}{piece}")),
    );
}

/// Splits on whitespace into lines of at most `width` chars, breaking words
/// that are longer than a whole line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            out.push(word.drain(..width).collect());
        }
        if word.is_empty() {
            continue;
        }

        let line_len = line.chars().count();
        if line_len > 0 && line_len + 1 + word.len() > width {
            out.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }

    if !line.is_empty() {
        out.push(line);
    }
    out
}

/// Left and right text on one line, right side wins when it doesn't fit.
fn row(left: &str, right: &str) -> String {
    let right: String = right.chars().take(WIDTH - 1).collect();
    let room = WIDTH - right.chars().count() - 1;
    let left: String = left.chars().take(room).collect();
    let gap = WIDTH - left.chars().count() - right.chars().count();

    format!("{left}{}{right}", " ".repeat(gap))
}

#[cfg(test)]
mod tests {
    use chrono::{Offset, TimeZone, Utc};

    use super::*;
    use crate::{
        cart::{OptionSelection, QuoteLine},
        order::{Customer, OrderStatus, PaymentState},
    };

    fn order() -> OrderEntry {
        let created = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        OrderEntry {
            id: 7,
            code: "ORD-000007".to_string(),
            created_at: created,
            updated_at: created,
            table: "T-04".to_string(),
            table_label: "Table 4".to_string(),
            customer: Customer {
                name: "Sari".to_string(),
                phone: None,
            },
            items: vec![QuoteLine {
                key: "1|Size:Large".to_string(),
                product_id: 1,
                name: "Kopi Susu Gula Aren".to_string(),
                unit_price: 30_000,
                quantity: 2,
                options: vec![OptionSelection {
                    group: "Size".to_string(),
                    label: "Large".to_string(),
                    price_delta: 5_000,
                }],
                notes: "less ice".to_string(),
                line_total: 60_000,
            }],
            item_count: 2,
            subtotal: 60_000,
            tax: 6_000,
            total: 66_000,
            status: OrderStatus::Pending,
            payment: PaymentState::Unpaid,
            note: String::new(),
        }
    }

    #[test]
    fn test_receipt_lines() {
        let receipt = render_receipt(&order(), "Kopi Senja", Utc.fix());
        let lines: Vec<&str> = receipt.lines().collect();

        assert_eq!(lines[0].trim(), "Kopi Senja");
        assert!(lines[2].starts_with("ORD-000007"));
        assert!(lines[2].ends_with("Table 4"));
        assert!(lines[3].ends_with("14/03/2026 09:30"));
        assert!(lines[5].starts_with("2x Kopi Susu Gula Aren"));
        assert!(lines[5].ends_with("Rp 60.000"));
        assert_eq!(lines[6], "   Size: Large");
        assert_eq!(lines[7], "   \"less ice\"");
        assert!(receipt.contains("Rp 66.000"));
        assert!(lines.last().unwrap().ends_with("UNPAID"));
        assert!(lines.iter().all(|line| line.chars().count() <= WIDTH));
    }

    #[test]
    fn test_row_truncates_left_side() {
        let line = row("A very long product name that will not fit", "Rp 1.000.000");
        assert_eq!(line.chars().count(), WIDTH);
        assert!(line.ends_with(" Rp 1.000.000"));
    }

    #[test]
    fn test_long_text_wraps_within_width() {
        let mut order = order();
        order.items[0].options[0].label =
            "Extra large with double shot and caramel drizzle".to_string();
        order.items[0].notes =
            "please make it very hot and bring it to the window seat thanks".to_string();
        order.note = "Birthday table, bring the candles with dessert please".to_string();
        order.table_label = "Rooftop-Garden-Section-North-Corner".to_string();

        let cafe_name = "Kopi Senja Coffee and Eatery Kemang Raya";
        let receipt = render_receipt(&order, cafe_name, Utc.fix());
        let lines: Vec<&str> = receipt.lines().collect();

        assert!(lines.iter().all(|line| line.chars().count() <= WIDTH));
        assert_eq!(lines[0], "Kopi Senja Coffee and Eatery Kem");
        assert_eq!(lines[6], "   Size: Extra large with double");
        assert!(lines.iter().any(|line| line.starts_with("Note: Birthday table")));
        assert!(receipt.contains("dessert please"));
    }

    #[test]
    fn test_receipt_uses_local_time() {
        let jakarta = FixedOffset::east_opt(7 * 3600).unwrap();
        let receipt = render_receipt(&order(), "Kopi Senja", jakarta);

        assert!(receipt.lines().nth(3).unwrap().ends_with("14/03/2026 16:30"));
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("ab cd ef", 5), vec!["ab cd", "ef"]);
        assert!(wrap("   ", 5).is_empty());
    }
}
