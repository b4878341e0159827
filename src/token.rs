use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

use crate::types::SessionId;

/// Generates a cryptographically random session identifier.
///
/// Returns a 43-character URL-safe string (32 random bytes → base64url).
#[must_use]
pub fn generate_session_id() -> SessionId {
    let random_bytes: [u8; 32] = rand::rng().random();
    SessionId(URL_SAFE_NO_PAD.encode(random_bytes))
}
