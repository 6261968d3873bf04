//! `data:` payload decoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode_str;
use wisp_core::Error;

use crate::locator::DataTarget;

/// Decode an inline payload to text.
///
/// The payload is percent-decoded; when the media type ends in `;base64` the
/// result is then base64-decoded. Invalid UTF-8 is replaced, not rejected.
pub fn decode_data(target: &DataTarget) -> Result<String, Error> {
    let unescaped = percent_decode_str(&target.data);

    if target.is_base64() {
        let raw: Vec<u8> = unescaped.collect();
        let bytes = STANDARD
            .decode(&raw)
            .map_err(|e| Error::MalformedLocator(format!("invalid base64 payload: {e}")))?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    Ok(unescaped.decode_utf8_lossy().into_owned())
}
