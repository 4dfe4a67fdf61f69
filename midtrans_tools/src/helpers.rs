use chrono::{DateTime, NaiveDateTime, Utc};
use sha2::{Digest, Sha512};

/// Midtrans reports times in a few shapes depending on the product: RFC 3339 with an offset or `Z`, or a naive
/// `YYYY-MM-DD HH:MM:SS` (optionally with a `T` separator). Naive times are taken to be UTC.
///
/// Returns `None` if the value cannot be parsed.
pub fn parse_transaction_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|t| t.and_utc())
}

/// The notification signature: the hex-encoded SHA-512 of `order_id + status_code + gross_amount + server_key`.
pub fn signature_key(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_signature(
    signature: &str,
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> bool {
    let expected = signature_key(order_id, status_code, gross_amount, server_key);
    expected.eq_ignore_ascii_case(signature.trim())
}
