//! Phone number normalization to international format.

/// Turkey's country calling code, without the `+`.
const COUNTRY_CODE: &str = "90";

/// Normalize an upstream phone number to `+90…` international format.
///
/// Numbers already carrying a `+` are trusted as-is. Otherwise any leading
/// trunk zeros are stripped and the country code is prepended unless the
/// digits already start with it. No digit is ever dropped.
///
/// # Examples
///
/// ```
/// use pharmacy_server::domain::normalize_phone;
///
/// assert_eq!(normalize_phone("5321234567"), "+905321234567");
/// assert_eq!(normalize_phone("05321234567"), "+905321234567");
/// assert_eq!(normalize_phone("905321234567"), "+905321234567");
/// assert_eq!(normalize_phone("+905321234567"), "+905321234567");
/// ```
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('+') {
        return trimmed.to_string();
    }

    let digits = trimmed.trim_start_matches('0');
    if digits.starts_with(COUNTRY_CODE) {
        format!("+{digits}")
    } else {
        format!("+{COUNTRY_CODE}{digits}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_subscriber_number() {
        assert_eq!(normalize_phone("5321234567"), "+905321234567");
        assert_eq!(normalize_phone("2121234567"), "+902121234567");
    }

    /// Regression: a leading trunk zero must not eat a digit. An earlier
    /// revision of this rule produced "+95321234567" here.
    #[test]
    fn trunk_zero_loses_no_digits() {
        assert_eq!(normalize_phone("05321234567"), "+905321234567");
    }

    #[test]
    fn country_code_not_doubled() {
        assert_eq!(normalize_phone("905321234567"), "+905321234567");
        assert_eq!(normalize_phone("0905321234567"), "+905321234567");
    }

    #[test]
    fn already_international_untouched() {
        assert_eq!(normalize_phone("+905321234567"), "+905321234567");
        assert_eq!(normalize_phone(" +905321234567 "), "+905321234567");
    }
}
