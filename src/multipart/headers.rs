//! Part header blocks and the `Content-Disposition` header.

use super::scanner::Scanner;
use crate::error::FormError;

const CRLF: &[u8] = b"\r\n";

pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
pub const CONTENT_TYPE: &str = "Content-Type";

/// Ordered header list with case-insensitive name lookup.
///
/// Inserting a name that is already present replaces its value but keeps its
/// original position and spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Headers in the order they appeared
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Parsed `Content-Disposition` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// The disposition type (always begins with `form-data` here)
    pub disposition_type: String,
    /// Parameters in order of appearance, names lowercased
    pub parameters: Vec<(String, String)>,
}

impl ContentDisposition {
    /// Parses a `Content-Disposition` value. Only `form-data` dispositions are
    /// accepted.
    pub fn parse(value: &str) -> Result<Self, FormError> {
        if !value.starts_with("form-data") {
            return Err(FormError::MissingContentDisposition(format!(
                "disposition is not form-data: {value}"
            )));
        }

        let mut segments = split_parameters(value).into_iter();
        let disposition_type = segments.next().unwrap_or_default().to_string();

        let parameters = segments
            .filter_map(|segment| {
                let (key, val) = segment.split_once('=')?;
                let val = val.trim();
                let val = if val.len() > 1 && val.starts_with('"') && val.ends_with('"') {
                    &val[1..val.len() - 1]
                } else {
                    val
                };
                Some((key.trim().to_ascii_lowercase(), val.to_string()))
            })
            .collect();

        Ok(Self {
            disposition_type,
            parameters,
        })
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The form field name
    pub fn name(&self) -> Option<&str> {
        self.parameter("name")
    }

    pub fn filename(&self) -> Option<&str> {
        self.parameter("filename")
    }
}

/// Splits on `;` outside of double quotes, trimming each segment.
fn split_parameters(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(value[start..].trim());
    segments.retain(|segment| !segment.is_empty());
    segments
}

/// Reads the header block of one part. The cursor must sit on the CRLF that
/// ends the delimiter line; on success it sits on the first content byte.
pub(crate) fn parse_header_block(scanner: &mut Scanner<'_>) -> Result<Headers, FormError> {
    let mut headers = Headers::new();

    while scanner.peek_equals(CRLF) {
        scanner.skip(CRLF.len())?;
        if scanner.peek_equals(CRLF) {
            scanner.skip(CRLF.len())?;
            break;
        }
        if scanner.is_at_end() {
            return Err(FormError::unexpected_end(format!(
                "header block not terminated at offset {}",
                scanner.position()
            )));
        }

        let (key, colon) = scanner
            .scan_until(b':')
            .map_err(|e| FormError::InvalidHeaderKey(e.to_string()))?;
        scanner.seek(colon);
        // Separator is assumed to be exactly ": "
        scanner
            .skip(2)
            .map_err(|e| FormError::InvalidHeaderValue(e.to_string()))?;

        let (value, cr) = scanner
            .scan_until(b'\r')
            .map_err(|e| FormError::InvalidHeaderValue(e.to_string()))?;
        scanner.seek(cr);

        headers.insert(key, value);
    }

    Ok(headers)
}

/// Locates the required `form-data` disposition among a part's headers.
pub(crate) fn form_data_disposition(headers: &Headers) -> Result<ContentDisposition, FormError> {
    let value = headers.get(CONTENT_DISPOSITION).ok_or_else(|| {
        FormError::MissingContentDisposition("part has no Content-Disposition header".to_string())
    })?;
    ContentDisposition::parse(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_block(input: &[u8]) -> Result<(Headers, usize), FormError> {
        let mut scanner = Scanner::new(input);
        let headers = parse_header_block(&mut scanner)?;
        Ok((headers, scanner.position()))
    }

    #[test]
    fn test_headers_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(!headers.contains("content-length"));
    }

    #[test]
    fn test_headers_last_write_wins_in_place() {
        let mut headers = Headers::new();
        headers.insert("A", "1");
        headers.insert("B", "2");
        headers.insert("a", "3");

        let entries: Vec<_> = headers.iter().collect();
        assert_eq!(entries, vec![("A", "3"), ("B", "2")]);
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_header_block_parsing() {
        let input = b"\r\nContent-Disposition: form-data; name=\"f\"\r\nContent-Type: text/plain\r\n\r\nbody";
        let (headers, position) = parse_block(input).unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.get("content-disposition"),
            Some("form-data; name=\"f\"")
        );
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(&input[position..], b"body");
    }

    #[test]
    fn test_empty_header_block() {
        let (headers, position) = parse_block(b"\r\n\r\ndata").unwrap();
        assert!(headers.is_empty());
        assert_eq!(position, 4);
    }

    #[test]
    fn test_header_value_preserved_byte_for_byte() {
        let (headers, _) = parse_block(b"\r\nX-Note:  spaced ; \"quoted\"\t\r\n\r\n").unwrap();
        // Only the two separator bytes are consumed
        assert_eq!(headers.get("X-Note"), Some(" spaced ; \"quoted\"\t"));
    }

    #[test]
    fn test_separator_without_space_loses_first_byte() {
        let (headers, _) = parse_block(b"\r\nContent-Type:text/plain\r\n\r\n").unwrap();
        assert_eq!(headers.get("Content-Type"), Some("ext/plain"));
    }

    #[test]
    fn test_missing_colon_is_invalid_key() {
        let result = parse_block(b"\r\nno colon at all");
        assert!(matches!(result, Err(FormError::InvalidHeaderKey(_))));
    }

    #[test]
    fn test_unterminated_value_is_invalid_value() {
        let result = parse_block(b"\r\nKey: value without end");
        assert!(matches!(result, Err(FormError::InvalidHeaderValue(_))));
    }

    #[test]
    fn test_non_utf8_key_is_invalid_key() {
        let result = parse_block(b"\r\nK\xffy: v\r\n\r\n");
        assert!(matches!(result, Err(FormError::InvalidHeaderKey(_))));
    }

    #[test]
    fn test_non_utf8_value_is_invalid_value() {
        let result = parse_block(b"\r\nX: \xff\r\n\r\n");
        assert!(matches!(result, Err(FormError::InvalidHeaderValue(_))));
    }

    #[test]
    fn test_truncated_block_is_unexpected_end() {
        let result = parse_block(b"\r\n");
        assert!(matches!(result, Err(FormError::UnexpectedEndOfInput(_))));
    }

    #[test]
    fn test_content_disposition_parsing() {
        let cd = ContentDisposition::parse(r#"form-data; name="file"; filename="a;b.txt""#)
            .unwrap();
        assert_eq!(cd.disposition_type, "form-data");
        assert_eq!(cd.name(), Some("file"));
        assert_eq!(cd.filename(), Some("a;b.txt"));

        let cd = ContentDisposition::parse("form-data; Name=bare").unwrap();
        assert_eq!(cd.name(), Some("bare"));

        let cd = ContentDisposition::parse("form-data").unwrap();
        assert_eq!(cd.name(), None);
        assert!(cd.parameters.is_empty());
    }

    #[test]
    fn test_non_form_data_disposition_rejected() {
        assert!(matches!(
            ContentDisposition::parse(r#"attachment; name="x""#),
            Err(FormError::MissingContentDisposition(_))
        ));

        let headers = Headers::new();
        assert!(matches!(
            form_data_disposition(&headers),
            Err(FormError::MissingContentDisposition(_))
        ));
    }
}
