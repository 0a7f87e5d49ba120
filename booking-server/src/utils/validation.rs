//! Input validation helpers
//!
//! Centralized limits and validation functions for booking input.
//! Rejections happen before any store call is made.

use shared::request::BookingRequest;
use uuid::Uuid;

use crate::utils::AppError;

// ── Limits ──────────────────────────────────────────────────────────

/// Largest party a single table-slot can seat
pub const MAX_PARTY_SIZE: i64 = 50;

/// Special requests free text
pub const MAX_SPECIAL_REQUESTS_LEN: usize = 500;

/// Client-supplied idempotency keys
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 100;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that an id is not the nil UUID.
pub fn validate_id(value: Uuid, field: &str) -> Result<(), AppError> {
    if value.is_nil() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Validate a booking request before it reaches any store.
pub fn validate_booking_request(request: &BookingRequest) -> Result<(), AppError> {
    validate_id(request.slot_id, "slotId")?;
    validate_id(request.user_id, "userId")?;

    if request.party_size < 1 {
        return Err(AppError::validation("partySize must be at least 1"));
    }
    if request.party_size > MAX_PARTY_SIZE {
        return Err(AppError::validation(format!(
            "partySize must not exceed {MAX_PARTY_SIZE}"
        )));
    }
    if let Some(requests) = &request.special_requests {
        if requests.len() > MAX_SPECIAL_REQUESTS_LEN {
            return Err(AppError::validation(format!(
                "specialRequests is too long ({} chars, max {MAX_SPECIAL_REQUESTS_LEN})",
                requests.len()
            )));
        }
    }
    Ok(())
}

/// Validate an idempotency key if one was supplied.
pub fn validate_idempotency_key(key: &str) -> Result<(), AppError> {
    if key.trim().is_empty() {
        return Err(AppError::validation("Idempotency-Key must not be empty"));
    }
    if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(AppError::validation(format!(
            "Idempotency-Key is too long ({} chars, max {MAX_IDEMPOTENCY_KEY_LEN})",
            key.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BookingRequest {
        BookingRequest {
            slot_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            hold_token: None,
            party_size: 2,
            special_requests: None,
            payment_token: None,
            idempotency_key: None,
        }
    }

    #[test]
    fn accepts_minimal_request() {
        assert!(validate_booking_request(&request()).is_ok());
    }

    #[test]
    fn rejects_nil_slot_id() {
        let mut req = request();
        req.slot_id = Uuid::nil();
        assert!(validate_booking_request(&req).is_err());
    }

    #[test]
    fn rejects_non_positive_party_size() {
        let mut req = request();
        req.party_size = 0;
        assert!(validate_booking_request(&req).is_err());
        req.party_size = -3;
        assert!(validate_booking_request(&req).is_err());
    }

    #[test]
    fn rejects_oversized_special_requests() {
        let mut req = request();
        req.special_requests = Some("x".repeat(MAX_SPECIAL_REQUESTS_LEN + 1));
        assert!(validate_booking_request(&req).is_err());
    }

    #[test]
    fn rejects_blank_idempotency_key() {
        assert!(validate_idempotency_key("  ").is_err());
        assert!(validate_idempotency_key("retry-attempt-1").is_ok());
    }
}
