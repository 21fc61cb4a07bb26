//! Request body parsing.
//!
//! The parser is chosen from the `Content-Type` media type (compared
//! case-insensitively, ignoring parameters after `;`):
//!
//! | Media type | Result |
//! |------------|--------|
//! | `application/json` | [`ParsedBody::Json`] |
//! | `application/x-www-form-urlencoded` | [`ParsedBody::Form`] |
//! | `multipart/form-data` | [`ParsedBody::Multipart`] |
//! | `application/octet-stream` | [`ParsedBody::Bytes`] |
//! | anything else, or absent | [`ParsedBody::Text`] |

use std::collections::HashMap;

use bytes::Bytes;
use futures_util::stream;
use serde::de::DeserializeOwned;

use crate::error::{HermesError, HermesResult};

/// A file uploaded through a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The client-supplied file name.
    pub file_name: String,
    /// The declared content type of the part, if any.
    pub content_type: Option<String>,
    /// The file contents.
    pub data: Bytes,
}

/// A single multipart form value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A plain text field.
    Text(String),
    /// A file part.
    File(UploadedFile),
}

impl FormValue {
    /// Returns the text value, if this is a text field.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File(_) => None,
        }
    }

    /// Returns the file, if this is a file part.
    #[must_use]
    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::File(file) => Some(file),
            Self::Text(_) => None,
        }
    }
}

/// A request body parsed according to its content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// A JSON document.
    Json(serde_json::Value),
    /// URL-encoded form fields; the last value of a repeated key wins.
    Form(HashMap<String, String>),
    /// Multipart fields and files; the last part of a repeated name wins.
    Multipart(HashMap<String, FormValue>),
    /// Raw text, decoded lossily as UTF-8.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
}

impl ParsedBody {
    /// Returns the JSON value, if the body was JSON.
    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Deserializes a JSON body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> HermesResult<T> {
        match self {
            Self::Json(value) => Ok(T::deserialize(value)?),
            other => Err(HermesError::malformed_body(
                "json",
                format!("body is {}, not json", other.kind()),
            )),
        }
    }

    /// Returns the form fields, if the body was URL-encoded.
    #[must_use]
    pub fn as_form(&self) -> Option<&HashMap<String, String>> {
        match self {
            Self::Form(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns the multipart values, if the body was multipart.
    #[must_use]
    pub fn as_multipart(&self) -> Option<&HashMap<String, FormValue>> {
        match self {
            Self::Multipart(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns the text, if the body was read as text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the bytes, if the body was read as raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Form(_) => "form",
            Self::Multipart(_) => "multipart",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
        }
    }
}

/// Returns the lowercased media type of a `Content-Type` value.
#[must_use]
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Parses `raw` according to `content_type`.
pub async fn parse(content_type: Option<&str>, raw: Bytes) -> HermesResult<ParsedBody> {
    let media = content_type.map(media_type).unwrap_or_default();
    match media.as_str() {
        "application/json" => serde_json::from_slice(&raw)
            .map(ParsedBody::Json)
            .map_err(|e| HermesError::malformed_body("json", e)),
        "application/x-www-form-urlencoded" => {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&raw)
                .map_err(|e| HermesError::malformed_body("form", e))?;
            Ok(ParsedBody::Form(pairs.into_iter().collect()))
        }
        "multipart/form-data" => {
            // media type matched, so the header is present
            let content_type = content_type.unwrap_or_default();
            parse_multipart(content_type, raw).await.map(ParsedBody::Multipart)
        }
        "application/octet-stream" => Ok(ParsedBody::Bytes(raw)),
        _ => Ok(ParsedBody::Text(String::from_utf8_lossy(&raw).into_owned())),
    }
}

async fn parse_multipart(
    content_type: &str,
    raw: Bytes,
) -> HermesResult<HashMap<String, FormValue>> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| HermesError::malformed_body("multipart", e))?;
    let source = stream::once(async move { Ok::<Bytes, std::io::Error>(raw) });
    let mut multipart = multer::Multipart::new(source, boundary);

    let mut fields = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HermesError::malformed_body("multipart", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(ToString::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| HermesError::malformed_body("multipart", e))?;
            FormValue::File(UploadedFile {
                file_name,
                content_type,
                data,
            })
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| HermesError::malformed_body("multipart", e))?;
            FormValue::Text(text)
        };
        fields.insert(name, value);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_media_type_strips_parameters() {
        assert_eq!(media_type("Application/JSON; charset=utf-8"), "application/json");
        assert_eq!(media_type("text/plain"), "text/plain");
    }

    #[tokio::test]
    async fn test_parse_json() {
        let parsed = parse(Some("application/json"), Bytes::from_static(b"{\"a\":1}"))
            .await
            .unwrap();
        assert_eq!(parsed.as_json(), Some(&serde_json::json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_parse_json_typed() {
        #[derive(Deserialize)]
        struct Payload {
            name: String,
        }
        let parsed = parse(Some("application/json"), Bytes::from_static(b"{\"name\":\"x\"}"))
            .await
            .unwrap();
        let payload: Payload = parsed.json().unwrap();
        assert_eq!(payload.name, "x");
    }

    #[tokio::test]
    async fn test_parse_malformed_json() {
        let err = parse(Some("application/json"), Bytes::from_static(b"{nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, HermesError::MalformedBody { kind: "json", .. }));
    }

    #[tokio::test]
    async fn test_parse_form_last_value_wins() {
        let parsed = parse(
            Some("application/x-www-form-urlencoded"),
            Bytes::from_static(b"name=a+b&tag=1&tag=2"),
        )
        .await
        .unwrap();
        let form = parsed.as_form().unwrap();
        assert_eq!(form["name"], "a b");
        assert_eq!(form["tag"], "2");
    }

    #[tokio::test]
    async fn test_parse_multipart_with_file() {
        let body = concat!(
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
            "hello\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "file-contents\r\n",
            "--XyZ--\r\n",
        );
        let parsed = parse(
            Some("multipart/form-data; boundary=XyZ"),
            Bytes::from_static(body.as_bytes()),
        )
        .await
        .unwrap();
        let fields = parsed.as_multipart().unwrap();
        assert_eq!(fields["title"].as_text(), Some("hello"));

        let file = fields["upload"].as_file().unwrap();
        assert_eq!(file.file_name, "a.txt");
        assert_eq!(file.content_type.as_deref(), Some("text/plain"));
        assert_eq!(file.data, Bytes::from_static(b"file-contents"));
    }

    #[tokio::test]
    async fn test_parse_multipart_without_boundary() {
        let err = parse(Some("multipart/form-data"), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HermesError::MalformedBody { kind: "multipart", .. }));
    }

    #[tokio::test]
    async fn test_parse_octet_stream() {
        let parsed = parse(Some("application/octet-stream"), Bytes::from_static(&[0, 159, 146]))
            .await
            .unwrap();
        assert_eq!(parsed.as_bytes(), Some(&Bytes::from_static(&[0, 159, 146])));
    }

    #[tokio::test]
    async fn test_parse_defaults_to_text() {
        let parsed = parse(None, Bytes::from_static(b"plain")).await.unwrap();
        assert_eq!(parsed.as_text(), Some("plain"));

        let parsed = parse(Some("text/csv"), Bytes::from_static(b"a,b")).await.unwrap();
        assert_eq!(parsed.as_text(), Some("a,b"));
    }
}
