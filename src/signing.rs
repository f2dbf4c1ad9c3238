use crate::error::EmitError;

/// Header carrying the caller-supplied document signature.
pub const SIGNATURE_HEADER: &str = "Signature";

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Content type of every emission body.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Headers attached to one emission.
///
/// The signature is opaque: it is forwarded verbatim, never computed or
/// verified here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    pub content_type_header: (String, String),
    pub signature_header: (String, String),
}

impl SignatureHeaders {
    /// Iterate `(name, value)` pairs in the order they are sent.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        [&self.content_type_header, &self.signature_header]
            .into_iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Case-insensitive header lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

pub fn build_signature_headers(signature: &str) -> Result<SignatureHeaders, EmitError> {
    if !is_valid_header_value(signature) {
        return Err(EmitError::Transport(
            "signature is not a valid HTTP header value".to_string(),
        ));
    }

    Ok(SignatureHeaders {
        content_type_header: (CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string()),
        signature_header: (SIGNATURE_HEADER.to_string(), signature.to_string()),
    })
}

/// Field-value bytes: tab, space, visible ASCII and obs-text (`0x80..=0xff`).
/// CR, LF, DEL and other controls are rejected.
pub fn is_valid_header_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b == b'\t' || (b >= 0x20 && b != 0x7f))
}
