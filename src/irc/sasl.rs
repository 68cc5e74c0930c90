//! SASL PLAIN payload encoding.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// The only mechanism this client speaks.
pub const MECHANISM: &str = "PLAIN";

/// Longest payload a single `AUTHENTICATE` line may carry.
pub const CHUNK_SIZE: usize = 400;

/// Base64 of `authzid \0 authcid \0 password`, with the nickname used for
/// both identities.
pub fn encode_plain(nick: &str, password: &str) -> String {
    BASE64.encode(format!("{nick}\0{nick}\0{password}"))
}

/// Split an encoded payload into `AUTHENTICATE` lines.
///
/// A payload that is an exact multiple of the chunk size gets a closing
/// `AUTHENTICATE +` so the server knows nothing more follows.
pub fn authenticate_lines(encoded: &str) -> Vec<String> {
    let mut lines: Vec<String> = encoded
        .as_bytes()
        .chunks(CHUNK_SIZE)
        .map(|chunk| format!("AUTHENTICATE {}", String::from_utf8_lossy(chunk)))
        .collect();
    if encoded.is_empty() || encoded.len() % CHUNK_SIZE == 0 {
        lines.push("AUTHENTICATE +".to_string());
    }
    lines
}
