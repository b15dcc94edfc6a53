use crate::error::FormError;

/// Extract the boundary from a `Content-Type` header value.
///
/// The media type must be `multipart/*`. The `boundary` parameter is found
/// case-insensitively; its value keeps its original case and loses any
/// surrounding quotes.
pub fn extract_boundary(content_type: &str) -> Result<Vec<u8>, FormError> {
    let mut params = content_type.split(';');
    let media_type = params.next().unwrap_or("").trim();

    let is_multipart = media_type
        .get(..10)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/"));
    if !is_multipart {
        return Err(FormError::missing_boundary(format!(
            "not a multipart content type: {media_type}"
        )));
    }

    for param in params {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("boundary") {
            let boundary = value.trim().trim_matches('"');
            if boundary.is_empty() {
                return Err(FormError::missing_boundary("boundary parameter is empty"));
            }
            return Ok(boundary.as_bytes().to_vec());
        }
    }

    Err(FormError::missing_boundary(
        "no boundary parameter in Content-Type",
    ))
}
