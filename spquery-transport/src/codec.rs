//! JSON body encoding and response/fault decoding for the REST endpoint.

use crate::TransportError;
use serde_json::Value;
use spquery_core::{RemoteFault, RestResponse};

/// Serialize a request body.
pub fn encode_body(body: &Value) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(body).map_err(|e| TransportError::Codec(e.to_string()))
}

/// Turn a raw HTTP status and body into a response, or a fault for non-2xx.
pub fn decode_response(status: u16, text: &str) -> Result<RestResponse, TransportError> {
    let text = text.trim();
    let success = (200..300).contains(&status);

    if text.is_empty() {
        return if success {
            Ok(RestResponse::new(status, Value::Null))
        } else {
            Err(TransportError::Remote(RemoteFault::new(
                status,
                format!("empty response body (status {})", status),
            )))
        };
    }

    match serde_json::from_str::<Value>(text) {
        Ok(body) if success => Ok(RestResponse::new(status, body)),
        Ok(body) => Err(TransportError::Remote(parse_fault(status, &body))),
        Err(e) if success => Err(TransportError::Codec(format!(
            "Failed to parse response body: {}",
            e
        ))),
        Err(_) => Err(TransportError::Remote(RemoteFault::new(status, text))),
    }
}

/// Reads the OData error envelope in either verbose or light form:
///
/// `{"error": {"code": "...", "message": {"lang": "en-US", "value": "..."}}}`
/// `{"error": {"code": "...", "message": "..."}}`
/// `{"odata.error": {...}}`
pub fn parse_fault(status: u16, body: &Value) -> RemoteFault {
    let error = body
        .get("error")
        .or_else(|| body.get("odata.error"))
        .unwrap_or(body);

    let code = error
        .get("code")
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let message = match error.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(m) => m
            .get("value")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| m.to_string()),
        None => body.to_string(),
    };

    RemoteFault {
        status,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_success_body() {
        let response = decode_response(200, r#"{"d": {"Title": "All Items"}}"#).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.payload()["Title"], json!("All Items"));
    }

    #[test]
    fn test_decode_no_content() {
        let response = decode_response(204, "").unwrap();
        assert_eq!(response.body, Value::Null);
    }

    #[test]
    fn test_decode_verbose_fault() {
        let body = r#"{"error": {"code": "-2130575322, Microsoft.SharePoint.SPException", "message": {"lang": "en-US", "value": "The view does not exist."}}}"#;
        match decode_response(404, body) {
            Err(TransportError::Remote(fault)) => {
                assert_eq!(fault.status, 404);
                assert_eq!(fault.code.as_deref(), Some("-2130575322, Microsoft.SharePoint.SPException"));
                assert_eq!(fault.message, "The view does not exist.");
            }
            other => panic!("expected remote fault, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_light_fault() {
        let fault = parse_fault(400, &json!({"odata.error": {"code": "", "message": "Bad query"}}));
        assert_eq!(fault.code, None);
        assert_eq!(fault.message, "Bad query");
    }

    #[test]
    fn test_decode_non_json_fault() {
        match decode_response(502, "<html>Bad Gateway</html>") {
            Err(TransportError::Remote(fault)) => assert_eq!(fault.message, "<html>Bad Gateway</html>"),
            other => panic!("expected remote fault, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_success_is_codec_error() {
        assert!(matches!(
            decode_response(200, "not json"),
            Err(TransportError::Codec(_))
        ));
    }

    #[test]
    fn test_encode_body() {
        let bytes = encode_body(&json!({"query": {"ViewXml": "<View/>"}})).unwrap();
        assert_eq!(bytes, br#"{"query":{"ViewXml":"<View/>"}}"#.to_vec());
    }
}
