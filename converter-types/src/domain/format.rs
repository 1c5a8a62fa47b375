//! Number formatting shared by records and the presentation layer.

/// Formats `value` with thousands separators and between `min_fraction` and
/// `max_fraction` fraction digits, e.g. `1234.5` with (2, 2) is `"1,234.50"`.
pub fn format_grouped(value: f64, min_fraction: usize, max_fraction: usize) -> String {
    let fixed = format!("{:.*}", max_fraction, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut fraction = frac_part.trim_end_matches('0').to_string();
    while fraction.len() < min_fraction {
        fraction.push('0');
    }

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && (int_part != "0" || !fraction.trim_matches('0').is_empty()) {
        "-"
    } else {
        ""
    };

    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping() {
        assert_eq!(format_grouped(1234567.891, 2, 2), "1,234,567.89");
        assert_eq!(format_grouped(999.0, 2, 2), "999.00");
        assert_eq!(format_grouped(1000.0, 2, 2), "1,000.00");
    }

    #[test]
    fn test_fraction_bounds() {
        assert_eq!(format_grouped(0.923456789, 2, 6), "0.923457");
        assert_eq!(format_grouped(1.5, 2, 6), "1.50");
        assert_eq!(format_grouped(2.0, 0, 2), "2");
    }

    #[test]
    fn test_negative() {
        assert_eq!(format_grouped(-1234.5, 2, 2), "-1,234.50");
        assert_eq!(format_grouped(-0.001, 2, 2), "0.00");
    }
}
