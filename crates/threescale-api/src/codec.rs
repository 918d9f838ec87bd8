use serde_json::Value;

use crate::error::{Error, preview};

/// Wire format used by [`HttpTransport`](crate::HttpTransport).
///
/// The format name doubles as the URL suffix (`/services.json`) and the
/// media type subtype (`application/json`).
pub trait Codec: Send + Sync {
    fn format(&self) -> &str;

    fn mime_type(&self) -> String {
        format!("application/{}", self.format())
    }

    fn encode(&self, value: &Value) -> Result<String, Error>;

    /// Decode a response body; blank bodies decode to `None`.
    fn decode(&self, body: &str) -> Result<Option<Value>, Error>;
}

/// JSON, the management API's default format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format(&self) -> &str {
        "json"
    }

    fn encode(&self, value: &Value) -> Result<String, Error> {
        serde_json::to_string(value).map_err(Error::Encode)
    }

    fn decode(&self, body: &str) -> Result<Option<Value>, Error> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(body)
            .map(Some)
            .map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(body)),
                body: body.to_owned(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn blank_body_decodes_to_none() {
        assert_eq!(JsonCodec.decode("").unwrap(), None);
        assert_eq!(JsonCodec.decode("  \n").unwrap(), None);
    }

    #[test]
    fn malformed_body_keeps_raw_text() {
        let err = JsonCodec.decode("<html>").unwrap_err();
        assert!(matches!(err, Error::Deserialization { body, .. } if body == "<html>"));
    }

    #[test]
    fn mime_type_follows_format() {
        assert_eq!(JsonCodec.mime_type(), "application/json");
        assert_eq!(JsonCodec.decode("{\"a\":1}").unwrap(), Some(json!({"a": 1})));
    }
}
