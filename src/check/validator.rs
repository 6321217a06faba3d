// src/check/validator.rs
use super::model::{
    Check, CheckState, HttpMethod, Protocol, CHECK_ID_LEN, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
    PHONE_LEN,
};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("record is not an object")]
    NotAnObject,

    #[error("id must be a 20-character string")]
    Id,

    #[error("phone must be a 10-character string")]
    Phone,

    #[error("protocol must be one of http, https")]
    Protocol,

    #[error("url must be a non-empty string")]
    Url,

    #[error("method must be one of get, post, put, delete")]
    Method,

    #[error("successCodes must be a non-empty list of HTTP status codes")]
    SuccessCodes,

    #[error("timeoutSeconds must be an integer between 1 and 5")]
    TimeoutSeconds,
}

/// Normalize a raw check record into a [`Check`].
///
/// All-or-nothing: the first required field that fails rejects the whole
/// record. `state` and `lastChecked` fall back to `down` / absent instead of
/// rejecting, since a check the monitor has never seen carries neither.
pub fn validate(record: &Value) -> Result<Check, ValidationError> {
    let obj = record.as_object().ok_or(ValidationError::NotAnObject)?;

    let id = trimmed_with_len(obj.get("id"), CHECK_ID_LEN).ok_or(ValidationError::Id)?;
    let owner_phone =
        trimmed_with_len(obj.get("phone"), PHONE_LEN).ok_or(ValidationError::Phone)?;

    let protocol = obj
        .get("protocol")
        .and_then(Value::as_str)
        .and_then(Protocol::parse)
        .ok_or(ValidationError::Protocol)?;

    let url = obj
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::Url)?
        .to_string();

    let method = obj
        .get("method")
        .and_then(Value::as_str)
        .and_then(HttpMethod::parse)
        .ok_or(ValidationError::Method)?;

    let success_codes =
        success_codes(obj.get("successCodes")).ok_or(ValidationError::SuccessCodes)?;

    let timeout_seconds = obj
        .get("timeoutSeconds")
        .and_then(Value::as_u64)
        .filter(|t| (MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(t))
        .ok_or(ValidationError::TimeoutSeconds)?;

    let state = obj
        .get("state")
        .and_then(Value::as_str)
        .and_then(CheckState::parse)
        .unwrap_or_default();

    let last_checked = obj
        .get("lastChecked")
        .and_then(Value::as_i64)
        .filter(|ms| *ms > 0);

    Ok(Check {
        id,
        owner_phone,
        protocol,
        url,
        method,
        success_codes,
        timeout_seconds,
        state,
        last_checked,
    })
}

fn trimmed_with_len(value: Option<&Value>, len: usize) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| s.chars().count() == len)
        .map(str::to_string)
}

fn success_codes(value: Option<&Value>) -> Option<Vec<u16>> {
    let items = value?.as_array()?;
    if items.is_empty() {
        return None;
    }

    items
        .iter()
        .map(|code| {
            code.as_u64()
                .filter(|c| (100..=599).contains(c))
                .map(|c| c as u16)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "id": "abcdefghij0123456789",
            "phone": "5551234567",
            "protocol": "http",
            "url": "example.com",
            "method": "get",
            "successCodes": [200, 201],
            "timeoutSeconds": 3
        })
    }

    #[test]
    fn test_defaults_state_and_last_checked() {
        let check = validate(&record()).unwrap();
        assert_eq!(check.state, CheckState::Down);
        assert_eq!(check.last_checked, None);
        assert_eq!(check.target(), "http://example.com");
    }

    #[test]
    fn test_trims_strings() {
        let mut raw = record();
        raw["id"] = json!("  abcdefghij0123456789 ");
        raw["url"] = json!(" example.com/status ");
        let check = validate(&raw).unwrap();
        assert_eq!(check.id, "abcdefghij0123456789");
        assert_eq!(check.url, "example.com/status");
    }

    #[test]
    fn test_rejects_missing_success_codes() {
        let mut raw = record();
        raw.as_object_mut().unwrap().remove("successCodes");
        assert_eq!(validate(&raw), Err(ValidationError::SuccessCodes));
    }

    #[test]
    fn test_rejects_bad_fields() {
        let cases = [
            ("id", json!("short"), ValidationError::Id),
            ("phone", json!(5551234567u64), ValidationError::Phone),
            ("protocol", json!("ftp"), ValidationError::Protocol),
            ("url", json!("   "), ValidationError::Url),
            ("method", json!("GET"), ValidationError::Method),
            ("successCodes", json!([]), ValidationError::SuccessCodes),
            ("successCodes", json!([200, "ok"]), ValidationError::SuccessCodes),
            ("timeoutSeconds", json!(6), ValidationError::TimeoutSeconds),
            ("timeoutSeconds", json!(2.5), ValidationError::TimeoutSeconds),
        ];

        for (field, value, expected) in cases {
            let mut raw = record();
            raw[field] = value;
            assert_eq!(validate(&raw), Err(expected), "field {}", field);
        }
    }

    #[test]
    fn test_unknown_state_falls_back_to_down() {
        let mut raw = record();
        raw["state"] = json!("sideways");
        raw["lastChecked"] = json!(-5);
        let check = validate(&raw).unwrap();
        assert_eq!(check.state, CheckState::Down);
        assert_eq!(check.last_checked, None);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let mut raw = record();
        raw["state"] = json!("up");
        raw["lastChecked"] = json!(1_700_000_000_000i64);
        let once = validate(&raw).unwrap();
        let twice = validate(&once.to_record()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rejects_non_object() {
        assert_eq!(validate(&json!([1, 2])), Err(ValidationError::NotAnObject));
    }
}
