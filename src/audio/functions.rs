use chrono::{DateTime, Utc};
use log::error;

use crate::audio::models::{ApiKeyPrincipal, AudioResult, ClientInfo, KeyStatus, UsageLogEntry};
use crate::config::Config;
use crate::database::{self, Database};
use crate::errors::ApiError;
use crate::{format, youtube};

/// Pull the credential out of an `Authorization: Bearer <key>` header.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Gate decisions that need no I/O: expiry first, then blocked status.
pub fn gate(principal: &ApiKeyPrincipal, now: DateTime<Utc>) -> Result<(), ApiError> {
    if principal.is_expired(now) {
        return Err(ApiError::ExpiredApiKey);
    }
    if principal.status == KeyStatus::Blocked {
        return Err(ApiError::BlockedApiKey);
    }
    Ok(())
}

/// Resolve the bearer credential to a principal and charge one usage unit.
///
/// The increment happens on every request that passes the gate, before the
/// extraction attempt. A blocked key is the one rejection that still leaves
/// an audit trail, recorded under the synthetic query "blocked_attempt".
pub async fn authenticate(
    db: &mut Database,
    token: Option<&str>,
    client: &ClientInfo,
) -> Result<ApiKeyPrincipal, ApiError> {
    let token = token.ok_or(ApiError::MissingApiKey)?;
    let principal = database::find_principal_by_key(db, token)
        .await?
        .ok_or(ApiError::InvalidApiKey)?;

    if let Err(why) = gate(&principal, Utc::now()) {
        if matches!(why, ApiError::BlockedApiKey) {
            let entry =
                UsageLogEntry::failure(&principal, "blocked_attempt", client, why.to_string());
            if let Err(log_why) = database::append_log(db, &entry).await {
                error!("Failed to record blocked key attempt: {log_why}");
            }
        }
        return Err(why);
    }

    database::increment_usage(db, &principal.api_key).await?;
    Ok(principal)
}

/// Search, then run the format selector over the top result.
pub async fn fetch_audio(query: &str, config: &Config) -> Result<AudioResult, ApiError> {
    let video = youtube::search_top_result(query, config).await?;
    format::select_audio(&video)
}

/// Append the audit record for a completed extraction attempt. An append
/// failure is surfaced to the operator log only; the outcome already decided
/// for the client stays as it is.
pub async fn record_outcome(
    db: &mut Database,
    principal: &ApiKeyPrincipal,
    query: &str,
    client: &ClientInfo,
    outcome: &Result<AudioResult, ApiError>,
) {
    let entry = match outcome {
        Ok(result) => UsageLogEntry::success(principal, query, client, result.clone()),
        Err(why) => UsageLogEntry::failure(principal, query, client, why.to_string()),
    };
    if let Err(why) = database::append_log(db, &entry).await {
        error!("Failed to append usage log entry: {why}");
    }
}
