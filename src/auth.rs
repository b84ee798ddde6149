//! Indodax private API request signing.
//!
//! Every call to the `/tapi` endpoint carries a `Sign` header holding the
//! lowercase hex HMAC-SHA512 of the exact form body, keyed with the API
//! secret. The body is encoded with a stable (sorted) key order so the same
//! parameter set always produces the same bytes and therefore the same tag.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha512;

/// Form parameters of a private API call, ordered by key.
pub type FormParams = BTreeMap<String, String>;

/// Computes the `Sign` header value.
///
/// Algorithm: `hex(HMAC-SHA512(secret, payload))`.
#[must_use]
pub fn sign(api_secret: &str, payload: &[u8]) -> String {
    // HMAC accepts keys of any length, including empty.
    let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(api_secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(payload);
    let digest = mac.finalize().into_bytes();

    digest
        .iter()
        .fold(String::with_capacity(digest.len() * 2), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

/// URL-encodes `params` in key order.
#[must_use]
pub fn encode_params(params: &FormParams) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Milliseconds since the UNIX epoch, used as the request `timestamp`.
#[must_use]
pub fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis())
}

/// An encoded form body together with its authentication tag.
///
/// Only constructible through [`SignedRequest::new`], so a body never
/// travels without its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    body: String,
    signature: String,
}

impl SignedRequest {
    /// Encodes `params` and signs the result with `api_secret`.
    #[must_use]
    pub fn new(params: &FormParams, api_secret: &str) -> Self {
        let body = encode_params(params);
        let signature = sign(api_secret, body.as_bytes());
        Self { body, signature }
    }

    /// The URL-encoded form body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The hex HMAC-SHA512 tag over [`body`](Self::body).
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Splits into `(body, signature)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.body, self.signature)
    }
}
