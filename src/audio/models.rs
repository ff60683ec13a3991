use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalized success payload for `/get-audio`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioResult {
    pub title: String,
    pub duration: u64,
    pub audio_url: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Active,
    Blocked,
}

/// The caller behind a validated API key, fetched fresh per request from the
/// `apikey:{key}` hash.
#[derive(Debug, Clone)]
pub struct ApiKeyPrincipal {
    pub user_id: String,
    pub api_key: String,
    pub status: KeyStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: u64,
}

impl ApiKeyPrincipal {
    pub fn as_vec(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("user_id".to_string(), self.user_id.clone()),
            ("api_key".to_string(), self.api_key.clone()),
            (
                "status".to_string(),
                match self.status {
                    KeyStatus::Active => "active".to_string(),
                    KeyStatus::Blocked => "blocked".to_string(),
                },
            ),
            ("usage_count".to_string(), self.usage_count.to_string()),
        ];
        if let Some(expires_at) = self.expires_at {
            fields.push(("expires_at".to_string(), expires_at.to_rfc3339()));
        }
        fields
    }

    pub fn from_vec(v: Vec<(String, String)>) -> Self {
        let mut principal = Self {
            user_id: String::new(),
            api_key: String::new(),
            status: KeyStatus::Active,
            expires_at: None,
            usage_count: 0,
        };

        for (key, value) in v {
            match key.as_str() {
                "user_id" => principal.user_id = value,
                "api_key" => principal.api_key = value,
                "status" => {
                    principal.status = if value == "blocked" {
                        KeyStatus::Blocked
                    } else {
                        KeyStatus::Active
                    }
                }
                "expires_at" => {
                    principal.expires_at = DateTime::parse_from_rfc3339(&value)
                        .ok()
                        .map(|t| t.with_timezone(&Utc))
                }
                "usage_count" => principal.usage_count = value.parse().unwrap_or(0),
                _ => (),
            }
        }

        principal
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expires_at| expires_at < now).unwrap_or(false)
    }
}

/// Request metadata captured for the usage log.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub user_agent: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Failed,
}

/// One audit record per completed authenticated request attempt, appended to
/// the `usage_log` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub id: String,
    pub user_id: String,
    pub api_key: String,
    pub query: String,
    pub user_agent: String,
    pub ip_address: String,
    pub status: LogStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AudioResult>,
    pub created_at: DateTime<Utc>,
}

impl UsageLogEntry {
    fn new(principal: &ApiKeyPrincipal, query: &str, client: &ClientInfo) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: principal.user_id.clone(),
            api_key: principal.api_key.clone(),
            query: query.to_string(),
            user_agent: client.user_agent.clone(),
            ip_address: client.ip_address.clone(),
            status: LogStatus::Success,
            error_message: None,
            response: None,
            created_at: Utc::now(),
        }
    }

    pub fn success(
        principal: &ApiKeyPrincipal,
        query: &str,
        client: &ClientInfo,
        result: AudioResult,
    ) -> Self {
        let mut entry = Self::new(principal, query, client);
        entry.response = Some(result);
        entry
    }

    pub fn failure(
        principal: &ApiKeyPrincipal,
        query: &str,
        client: &ClientInfo,
        error_message: String,
    ) -> Self {
        let mut entry = Self::new(principal, query, client);
        entry.status = LogStatus::Failed;
        entry.error_message = Some(error_message);
        entry
    }
}
