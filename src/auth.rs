use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{CircleTraceError, Result};

/// API token for a CircleCI server.
///
/// Wraps the raw credential so it never shows up in `Debug` output or logs.
#[derive(Clone)]
pub struct Token(String);

impl Token {
    /// Decodes a base64-encoded token as stored in settings files and the
    /// `CIRCLE_TOKEN` environment variable.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CircleTraceError::Config(format!("Token is not valid base64: {e}")))?;
        let decoded = String::from_utf8(bytes)
            .map_err(|e| CircleTraceError::Config(format!("Token is not valid UTF-8: {e}")))?;
        Ok(Self(decoded.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_base64_token() {
        // "c2VjcmV0LXRva2Vu" is "secret-token"
        let token = Token::from_base64("c2VjcmV0LXRva2Vu").unwrap();
        assert_eq!(token.as_str(), "secret-token");
    }

    #[test]
    fn test_trims_whitespace_around_encoded_and_decoded_forms() {
        let token = Token::from_base64("  c2VjcmV0LXRva2VuCg==  ").unwrap();
        assert_eq!(token.as_str(), "secret-token");
    }

    #[test]
    fn test_rejects_invalid_base64() {
        assert!(Token::from_base64("not base64 !!").is_err());
    }

    #[test]
    fn test_debug_does_not_leak_credential() {
        let token = Token::from("super-secret");
        assert_eq!(format!("{token:?}"), "Token(****)");
    }
}
