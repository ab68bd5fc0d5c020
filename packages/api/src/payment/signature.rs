//! HMAC-SHA256 signatures as used by the gateway, hex encoded.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn sign(secret: &str, payload: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature.
pub fn verify(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// The payload the gateway signs for a client-side payment callback.
pub fn payment_payload(order_id: &str, payment_id: &str) -> String {
    format!("{order_id}|{payment_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            sign("key", b"The quick brown fox jumps over the lazy dog").unwrap(),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_verify_payment_callback() {
        let payload = payment_payload("order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f");
        let signature = sign("secret", payload.as_bytes()).unwrap();

        assert!(verify("secret", payload.as_bytes(), &signature));
        assert!(verify("secret", payload.as_bytes(), &signature.to_uppercase()));
        assert!(!verify("other", payload.as_bytes(), &signature));
        assert!(!verify("secret", b"order_x|pay_y", &signature));
        assert!(!verify("secret", payload.as_bytes(), "not-hex"));
        assert!(!verify("secret", payload.as_bytes(), ""));
    }
}
