//! Display formatting for monetary amounts: `1234.5` renders as `1 234,50`.

/// Formats `value` with two decimals, a comma decimal separator and the
/// integer part grouped by threes with single spaces.
///
/// Rounding is Rust's fixed-precision `{:.2}`, which rounds the exact binary
/// value to the nearest hundredth, so `2.675` (stored as 2.67499...) gives
/// `2,67`. The sign is kept in front of the grouped digits unless the
/// rounded amount is zero. Non-finite values render as `NaN`, `inf`, `-inf`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (integral, decimals) = match fixed.split_once('.') {
        Some(parts) => parts,
        None => (fixed.as_str(), "00"),
    };
    let negative = value < 0. && fixed.bytes().any(|b| matches!(b, b'1'..=b'9'));

    let mut out = String::with_capacity(fixed.len() + integral.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, digit) in integral.chars().enumerate() {
        if i > 0 && (integral.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(digit);
    }
    out.push(',');
    out.push_str(decimals);
    out
}

/// Right-justifies `s` in a column of `width` characters.
pub fn align_right(s: &str, width: usize) -> String {
    format!("{:>width$}", s, width = width)
}

#[cfg(test)]
mod tests {
    use super::{align_right, format_amount};
    use test_log::test;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234.5), "1 234,50");
        assert_eq!(format_amount(999.999), "1 000,00");
        assert_eq!(format_amount(0.), "0,00");
        assert_eq!(format_amount(1000000.), "1 000 000,00");
        assert_eq!(format_amount(100.), "100,00");
        assert_eq!(format_amount(0.5), "0,50");
        assert_eq!(format_amount(12345.678), "12 345,68");
        assert_eq!(format_amount(123456789.01), "123 456 789,01");
        assert_eq!(format_amount(2.675), "2,67");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_amount(-1234.5), "-1 234,50");
        assert_eq!(format_amount(-234.), "-234,00");
        assert_eq!(format_amount(-1000.), "-1 000,00");
        // rounds to zero, so no sign
        assert_eq!(format_amount(-0.001), "0,00");
        assert_eq!(format_amount(-0.), "0,00");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_amount(f64::NAN), "NaN");
        assert_eq!(format_amount(f64::INFINITY), "inf");
        assert_eq!(format_amount(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_align_right() {
        assert_eq!(align_right("1", 8), "       1");
        assert_eq!(align_right("1 234,50", 15), "       1 234,50");
        assert_eq!(align_right("too long", 3), "too long");
    }
}
