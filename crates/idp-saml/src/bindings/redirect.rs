//! HTTP-Redirect binding.

use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::error::{SamlError, SamlResult};

use super::{DecodedMessage, SamlMessageType};

/// Upper bound on an inflated message.
const MAX_INFLATED_LEN: u64 = 512 * 1024;

/// HTTP-Redirect binding encoder/decoder.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Decodes a `SAMLRequest` value: base64 (standard alphabet), then raw
    /// inflate, then UTF-8.
    ///
    /// Line breaks and surrounding whitespace are ignored. Spaces inside the
    /// value are read as `+`, which is what an unencoded `+` becomes after
    /// form decoding.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::MalformedBinding`] if any step fails.
    pub fn decode(encoded: &str) -> SamlResult<String> {
        let cleaned: String = encoded
            .trim()
            .chars()
            .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
            .map(|c| if c == ' ' { '+' } else { c })
            .collect();

        let compressed = base64::engine::general_purpose::STANDARD.decode(cleaned)?;
        let xml_bytes = deflate_decompress(&compressed)?;

        String::from_utf8(xml_bytes)
            .map_err(|e| SamlError::MalformedBinding(format!("invalid UTF-8 in message: {e}")))
    }

    /// Encodes XML text the way a service provider does: raw deflate, then
    /// base64. The result is not URL encoded.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::MalformedBinding`] if compression fails.
    pub fn encode(xml: &str) -> SamlResult<String> {
        let compressed = deflate_compress(xml.as_bytes())?;
        Ok(base64::engine::general_purpose::STANDARD.encode(compressed))
    }

    /// Builds a redirect-binding URL carrying `xml` as `SAMLRequest`.
    ///
    /// # Errors
    ///
    /// Returns an error if compression fails.
    pub fn redirect_url(
        destination: &str,
        xml: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<String> {
        let encoded = Self::encode(xml)?;
        let separator = if destination.contains('?') { '&' } else { '?' };

        let mut url = format!(
            "{destination}{separator}{}={}",
            SamlMessageType::Request.form_param(),
            urlencoding::encode(&encoded)
        );
        if let Some(rs) = relay_state {
            url.push_str(&format!("&RelayState={}", urlencoding::encode(rs)));
        }

        Ok(url)
    }

    /// Decodes the message carried by a full redirect-binding URL.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::MalformedBinding`] if the URL is invalid, carries
    /// no SAML parameter, or the parameter does not decode.
    pub fn decode_url(url: &str) -> SamlResult<DecodedMessage> {
        let parsed = url::Url::parse(url)
            .map_err(|e| SamlError::MalformedBinding(format!("invalid URL: {e}")))?;

        let mut message = None;
        let mut relay_state = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "SAMLRequest" => message = Some((value.into_owned(), SamlMessageType::Request)),
                "SAMLResponse" => message = Some((value.into_owned(), SamlMessageType::Response)),
                "RelayState" => relay_state = Some(value.into_owned()),
                _ => {}
            }
        }

        let (encoded, message_type) = message.ok_or_else(|| {
            SamlError::MalformedBinding("no SAMLRequest or SAMLResponse parameter".to_string())
        })?;

        Ok(DecodedMessage {
            xml: Self::decode(&encoded)?,
            message_type,
            relay_state,
        })
    }
}

/// Compresses data using DEFLATE (raw, no zlib header).
fn deflate_compress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SamlError::MalformedBinding(format!("compression error: {e}")))?;
    encoder
        .finish()
        .map_err(|e| SamlError::MalformedBinding(format!("compression error: {e}")))
}

/// Decompresses raw DEFLATE data.
fn deflate_decompress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data).take(MAX_INFLATED_LEN + 1);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| SamlError::MalformedBinding(format!("inflate error: {e}")))?;

    if decompressed.len() as u64 > MAX_INFLATED_LEN {
        return Err(SamlError::MalformedBinding(
            "message exceeds the size limit".to_string(),
        ));
    }
    Ok(decompressed)
}
