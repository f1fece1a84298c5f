//! Display helpers for money values. Stored amounts stay raw decimals.

use rust_decimal::Decimal;

pub const CURRENCY_SYMBOL: &str = "₱";

/// Formats an amount as `₱1,234.56`: two decimals, comma thousands separator.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    format!("{}{}{}.{}", sign, CURRENCY_SYMBOL, group_thousands(whole), cents)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn groups_thousands_with_two_decimals() {
        assert_eq!(format_currency(dec!(5499.99)), "₱5,499.99");
        assert_eq!(format_currency(dec!(12999.98)), "₱12,999.98");
        assert_eq!(format_currency(dec!(1234567.5)), "₱1,234,567.50");
        assert_eq!(format_currency(dec!(999)), "₱999.00");
    }

    #[test]
    fn zero_and_negative_amounts() {
        assert_eq!(format_currency(Decimal::ZERO), "₱0.00");
        assert_eq!(format_currency(dec!(-0.001)), "₱0.00");
        assert_eq!(format_currency(dec!(-1500.25)), "-₱1,500.25");
    }
}
