//! Session record types

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Server-side state for one logged-in principal.
///
/// One record exists per user key. It holds the only token currently
/// accepted for that user, so re-issuing a token implicitly invalidates
/// the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Stable identity of the principal
    pub user_key: String,
    /// Currently valid token for this user
    pub token: String,
    /// Caller payload, already serialized by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Epoch milliseconds of the last issue or refresh
    pub create_time: i64,
    /// Number of times the expiry has been extended
    #[serde(default)]
    pub refresh_num: u32,
}

impl SessionRecord {
    /// Create a fresh record stamped with the current time
    pub fn new(user_key: impl Into<String>, token: impl Into<String>, data: Option<String>) -> Self {
        Self {
            user_key: user_key.into(),
            token: token.into(),
            data,
            create_time: now_millis(),
            refresh_num: 0,
        }
    }

    /// A record with no identity and no token carries nothing worth storing
    pub fn is_empty(&self) -> bool {
        self.user_key.is_empty() && self.token.is_empty()
    }

    /// Milliseconds since `create_time`, saturating at zero for clock skew
    pub fn elapsed_millis(&self, now: i64) -> i64 {
        now.saturating_sub(self.create_time).max(0)
    }

    /// Mark the record as refreshed at `now`.
    ///
    /// `create_time` never moves backwards.
    pub fn mark_refreshed(&mut self, now: i64) {
        self.create_time = self.create_time.max(now);
        self.refresh_num = self.refresh_num.saturating_add(1);
    }

    /// Serialize to the JSON text stored by every cache backend
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse the JSON text stored by a cache backend
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_starts_unrefreshed() {
        let record = SessionRecord::new("alice", "tok", None);
        assert_eq!(record.user_key, "alice");
        assert_eq!(record.refresh_num, 0);
        assert!(record.create_time > 0);
        assert!(!record.is_empty());
    }

    #[test]
    fn test_json_uses_camel_case_fields() {
        let record = SessionRecord {
            user_key: "alice".into(),
            token: "tok".into(),
            data: Some(r#"{"role":"admin"}"#.into()),
            create_time: 1_700_000_000_000,
            refresh_num: 2,
        };
        let json = record.to_json().unwrap();
        assert!(json.contains("\"userKey\":\"alice\""));
        assert!(json.contains("\"createTime\":1700000000000"));
        assert!(json.contains("\"refreshNum\":2"));

        let parsed = SessionRecord::from_json(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_missing_refresh_num_defaults_to_zero() {
        let parsed =
            SessionRecord::from_json(r#"{"userKey":"bob","token":"t","createTime":5}"#).unwrap();
        assert_eq!(parsed.refresh_num, 0);
        assert_eq!(parsed.data, None);
    }

    #[test]
    fn test_mark_refreshed_is_monotonic() {
        let mut record = SessionRecord::new("alice", "tok", None);
        let original = record.create_time;

        record.mark_refreshed(original - 1_000);
        assert_eq!(record.create_time, original);
        assert_eq!(record.refresh_num, 1);

        record.mark_refreshed(original + 1_000);
        assert_eq!(record.create_time, original + 1_000);
        assert_eq!(record.refresh_num, 2);
    }

    #[test]
    fn test_elapsed_never_negative() {
        let record = SessionRecord {
            user_key: "a".into(),
            token: "t".into(),
            data: None,
            create_time: 10_000,
            refresh_num: 0,
        };
        assert_eq!(record.elapsed_millis(12_500), 2_500);
        assert_eq!(record.elapsed_millis(9_000), 0);
    }

    #[test]
    fn test_empty_record() {
        let record = SessionRecord {
            user_key: String::new(),
            token: String::new(),
            data: None,
            create_time: 0,
            refresh_num: 0,
        };
        assert!(record.is_empty());
    }
}
