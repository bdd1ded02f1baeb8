use rust_decimal::Decimal;

/// Amount with two decimals and thousands separators, e.g. `12,500.00`.
pub fn format_currency(amount: Decimal) -> String {
    let amount = amount.round_dp(2);
    let formatted = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < Decimal::ZERO { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", value.round_dp(2))
}

/// Truncate to `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::ZERO), "0.00");
        assert_eq!(format_currency(dec!(-0.001)), "0.00");
        assert_eq!(format_currency(dec!(999.5)), "999.50");
        assert_eq!(format_currency(dec!(12500)), "12,500.00");
        assert_eq!(format_currency(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_currency(dec!(-4500)), "-4,500.00");
        assert_eq!(format_currency(dec!(1.005)), "1.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(6.666)), "6.67%");
        assert_eq!(format_percent(dec!(12.5)), "12.50%");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Operacoes", 20), "Operacoes");
        assert_eq!(truncate("Infraestrutura Cloud", 10), "Infraestr…");
    }
}
