//! Content span extraction and transfer-encoding decode for one part.

use super::headers::{CONTENT_TRANSFER_ENCODING, Headers};
use super::scanner::Scanner;
use crate::codec::CodecRegistry;
use crate::error::FormError;

/// Finds the first exact occurrence of `needle` in `haystack`.
pub(crate) fn find_bytes_pattern(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }

    (0..=(haystack.len() - needle.len())).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Returns the raw content from the cursor up to the next `full_boundary`
/// (`CRLF--boundary`) and leaves the cursor on that boundary's CRLF.
pub(crate) fn extract_content<'a>(
    scanner: &mut Scanner<'a>,
    full_boundary: &[u8],
) -> Result<&'a [u8], FormError> {
    let rest = scanner.rest();
    let end = find_bytes_pattern(rest, full_boundary).ok_or_else(|| {
        FormError::unexpected_end(format!(
            "no closing boundary after content starting at offset {}",
            scanner.position()
        ))
    })?;

    let content = &rest[..end];
    scanner.seek(scanner.position() + end);
    Ok(content)
}

/// Applies the part's `Content-Transfer-Encoding`, if any.
pub(crate) fn decode_content(
    raw: &[u8],
    headers: &Headers,
    registry: &CodecRegistry,
) -> Result<Vec<u8>, FormError> {
    let Some(encoding) = headers.get(CONTENT_TRANSFER_ENCODING) else {
        return Ok(raw.to_vec());
    };

    let factory = registry
        .lookup(encoding)
        .ok_or_else(|| FormError::unknown_encoding(encoding))?;
    let mut codec = factory.construct(headers);
    codec.decode(raw).map_err(FormError::Codec)
}
