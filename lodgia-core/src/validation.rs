use serde::Serialize;

use crate::booking::BookingRequest;

/// One inline field error, keyed by the wire field name so the form layer
/// can render it next to the offending input.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    fn push(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.errors.iter().map(|e| e.field).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Field rules for the guest form: names required, phone must look like a
/// loose international number, email must be well-formed, special requests
/// optional, hotel/destination ids required (they come from the stay
/// context, so a miss there is a wiring bug, not user error).
pub fn validate_booking(booking: &BookingRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if booking.first_name.trim().is_empty() {
        errors.push("firstName", "Required");
    }
    if booking.last_name.trim().is_empty() {
        errors.push("lastName", "Required");
    }
    if booking.phone_no.trim().is_empty() {
        errors.push("phoneNo", "Required");
    } else if !is_valid_phone(&booking.phone_no) {
        errors.push("phoneNo", "Invalid Phone Number");
    }
    if booking.email.trim().is_empty() {
        errors.push("email", "Required");
    } else if !validator::validate_email(booking.email.as_str()) {
        errors.push("email", "Invalid email format");
    }
    if booking.hotel_id.is_empty() {
        errors.push("hotelID", "Required");
    }
    if booking.dest_id.is_empty() {
        errors.push("destID", "Required");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Loose international phone shape: any number of leading `+`, an optional
/// `(`, a 1-4 digit prefix, an optional `)`, then digits, spaces, dashes
/// and slashes. Equivalent to `^[+]*[(]?[0-9]{1,4}[)]?[-\s/0-9]*$`; the
/// parens are each independently optional, so an unclosed `(` is accepted.
fn is_valid_phone(phone: &str) -> bool {
    let mut chars = phone.chars().peekable();

    while chars.peek() == Some(&'+') {
        chars.next();
    }
    if chars.peek() == Some(&'(') {
        chars.next();
    }
    let mut prefix_digits = 0;
    while prefix_digits < 4 && chars.peek().is_some_and(|c| c.is_ascii_digit()) {
        chars.next();
        prefix_digits += 1;
    }
    if prefix_digits == 0 {
        return false;
    }
    if chars.peek() == Some(&')') {
        chars.next();
    }
    chars.all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> BookingRequest {
        BookingRequest {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            phone_no: "+65 85848392".to_string(),
            email: "abc@mail.com".to_string(),
            special_req: String::new(),
            hotel_id: "H1".to_string(),
            dest_id: "D1".to_string(),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(validate_booking(&valid_request()).is_ok());
    }

    #[test]
    fn test_names_required() {
        let mut req = valid_request();
        req.first_name.clear();
        req.last_name = "   ".to_string();
        let errors = validate_booking(&req).unwrap_err();
        assert_eq!(errors.field("firstName").unwrap().message, "Required");
        assert_eq!(errors.field("lastName").unwrap().message, "Required");
    }

    #[test]
    fn test_phone_rejects_letters() {
        let mut req = valid_request();
        req.phone_no = "abc".to_string();
        let errors = validate_booking(&req).unwrap_err();
        assert_eq!(
            errors.field("phoneNo").unwrap().message,
            "Invalid Phone Number"
        );
    }

    #[test]
    fn test_phone_shapes() {
        assert!(is_valid_phone("+65 85848392"));
        assert!(is_valid_phone("(65) 8584-8392"));
        assert!(is_valid_phone("+++123"));
        assert!(is_valid_phone("12345 678/90"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("()"));
        assert!(!is_valid_phone("+65x123"));
    }

    #[test]
    fn test_phone_parens_each_optional() {
        // `(` and `)` are each independently optional in the pattern
        assert!(is_valid_phone("(123"));
        assert!(is_valid_phone("(123 456"));
        assert!(is_valid_phone("123)"));
        assert!(is_valid_phone("(123) 456"));
    }

    #[test]
    fn test_email_format() {
        let mut req = valid_request();
        req.email = "not-an-email".to_string();
        let errors = validate_booking(&req).unwrap_err();
        assert_eq!(
            errors.field("email").unwrap().message,
            "Invalid email format"
        );
    }

    #[test]
    fn test_special_request_optional() {
        let mut req = valid_request();
        req.special_req = String::new();
        assert!(validate_booking(&req).is_ok());
        req.special_req = "Green Bed sheets".to_string();
        assert!(validate_booking(&req).is_ok());
    }
}
