/// Insert thousands separators into a string of ASCII digits.
fn group_thousands(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Accounting style: whole numbers with thousands separators, negatives in
/// parentheses, and a dash for zero or missing values: (1,234)
pub fn accounting_format(val: Option<f64>) -> String {
    let rounded = match val {
        Some(v) if v.is_finite() && v != 0.0 => v.round_ties_even(),
        _ => return "-".to_string(),
    };
    let digits = group_thousands(&format!("{:.0}", rounded.abs()));
    if rounded < 0.0 {
        format!("({digits})")
    } else {
        digits
    }
}

/// One decimal place with a percent sign; a dash for zero or missing values.
pub fn percentage_format(val: Option<f64>) -> String {
    match val {
        Some(v) if v.is_finite() && v != 0.0 => format!("{v:.1}%"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounting_formatting() {
        assert_eq!(accounting_format(Some(1234.56)), "1,235");
        assert_eq!(accounting_format(Some(-500.0)), "(500)");
        assert_eq!(accounting_format(Some(1000000.49)), "1,000,000");
        assert_eq!(accounting_format(Some(42.0)), "42");
        assert_eq!(accounting_format(Some(-1234567.0)), "(1,234,567)");
    }

    #[test]
    fn test_accounting_dash_for_empty() {
        assert_eq!(accounting_format(Some(0.0)), "-");
        assert_eq!(accounting_format(None), "-");
        assert_eq!(accounting_format(Some(f64::NAN)), "-");
    }

    #[test]
    fn test_accounting_rounds_half_to_even() {
        assert_eq!(accounting_format(Some(2.5)), "2");
        assert_eq!(accounting_format(Some(3.5)), "4");
        assert_eq!(accounting_format(Some(-2.5)), "(2)");
        assert_eq!(accounting_format(Some(1234.5)), "1,234");
    }

    #[test]
    fn test_accounting_rounds_small_values_to_zero() {
        assert_eq!(accounting_format(Some(0.4)), "0");
        assert_eq!(accounting_format(Some(-0.4)), "0");
    }

    #[test]
    fn test_percentage_formatting() {
        assert_eq!(percentage_format(Some(12.345)), "12.3%");
        assert_eq!(percentage_format(Some(-3.0)), "-3.0%");
        assert_eq!(percentage_format(Some(0.0)), "-");
        assert_eq!(percentage_format(None), "-");
    }
}
