use crate::error::{PaymentError, Result};

/// Kenyan dialing code every normalized number starts with.
pub const COUNTRY_CODE: &str = "254";

/// Domestic trunk prefix replaced by [`COUNTRY_CODE`].
pub const TRUNK_PREFIX: char = '0';

/// Subscriber digits following the country code.
pub const SUBSCRIBER_DIGITS: usize = 9;

/// Canonicalize a phone number into `254XXXXXXXXX` form.
///
/// Never fails: input that cannot be normalized comes back as its digits
/// only, and [`is_valid_msisdn`] decides whether it is usable.
pub fn normalize_phone(input: &str) -> String {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == SUBSCRIBER_DIGITS {
        return format!("{}{}", COUNTRY_CODE, digits);
    }

    if digits.len() == SUBSCRIBER_DIGITS + 1 && digits.starts_with(TRUNK_PREFIX) {
        return format!("{}{}", COUNTRY_CODE, &digits[1..]);
    }

    // `+254...` has already lost its plus sign, so an international number
    // is just the country code followed by the subscriber digits.
    digits
}

/// `254` followed by exactly nine digits.
pub fn is_valid_msisdn(phone: &str) -> bool {
    phone.len() == COUNTRY_CODE.len() + SUBSCRIBER_DIGITS
        && phone.starts_with(COUNTRY_CODE)
        && phone.chars().all(|c| c.is_ascii_digit())
}

/// Normalize and reject anything that does not end up as a valid MSISDN.
pub fn normalize_valid(input: &str) -> Result<String> {
    let phone = normalize_phone(input);
    if !is_valid_msisdn(&phone) {
        return Err(PaymentError::invalid_phone(input.trim()));
    }
    Ok(phone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_local_formats() {
        assert_eq!(normalize_phone("0712345678"), "254712345678");
        assert_eq!(normalize_phone("712345678"), "254712345678");
        assert_eq!(normalize_phone("0712 345 678"), "254712345678");
        assert_eq!(normalize_phone("0712-345-678"), "254712345678");
    }

    #[test]
    fn test_international_formats() {
        assert_eq!(normalize_phone("+254712345678"), "254712345678");
        assert_eq!(normalize_phone("254712345678"), "254712345678");
        assert_eq!(normalize_phone("+254 (712) 345-678"), "254712345678");
    }

    #[test]
    fn test_unusable_numbers_pass_through() {
        assert_eq!(normalize_phone("12345"), "12345");
        assert_eq!(normalize_phone(""), "");
        assert!(!is_valid_msisdn(&normalize_phone("12345")));
        assert!(!is_valid_msisdn(&normalize_phone("1712345678")));
        assert!(!is_valid_msisdn(&normalize_phone("255712345678")));
    }

    #[test]
    fn test_normalize_valid() {
        assert_eq!(normalize_valid("0712345678").unwrap(), "254712345678");

        let err = normalize_valid("07123").unwrap_err();
        assert!(matches!(err, PaymentError::InvalidPhoneNumber(_)));
    }

    proptest! {
        #[test]
        fn nine_digits_get_country_code(digits in "[0-9]{9}") {
            prop_assert_eq!(normalize_phone(&digits), format!("254{}", digits));
        }

        #[test]
        fn trunk_prefix_is_replaced(digits in "[0-9]{9}") {
            let local = format!("0{}", digits);
            prop_assert_eq!(normalize_phone(&local), format!("254{}", digits));
        }

        #[test]
        fn normalization_is_idempotent(digits in "[0-9]{9}", style in 0usize..4) {
            let input = match style {
                0 => digits.clone(),
                1 => format!("0{}", digits),
                2 => format!("+254{}", digits),
                _ => format!("254 {} {} {}", &digits[..3], &digits[3..6], &digits[6..]),
            };
            let once = normalize_phone(&input);
            prop_assert!(is_valid_msisdn(&once));
            prop_assert_eq!(normalize_phone(&once), once.clone());
        }
    }
}
