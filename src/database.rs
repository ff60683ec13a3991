use poem::{async_trait, FromRequest, Request, RequestBody, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::audio::models::{ApiKeyPrincipal, UsageLogEntry};
use crate::errors::ApiError;

const USAGE_LOG_KEY: &str = "usage_log";

pub struct Database(pub ConnectionManager);

#[async_trait]
impl<'a> FromRequest<'a> for Database {
    async fn from_request(req: &'a Request, _body: &mut RequestBody) -> Result<Self> {
        let con = req.extensions().get::<ConnectionManager>().unwrap();
        Ok(Database(con.clone()))
    }
}

fn principal_key(api_key: &str) -> String {
    format!("apikey:{api_key}")
}

pub async fn find_principal_by_key(
    db: &mut Database,
    api_key: &str,
) -> Result<Option<ApiKeyPrincipal>, ApiError> {
    let fields: Vec<(String, String)> = db.0.hgetall(principal_key(api_key)).await?;
    if fields.is_empty() {
        return Ok(None);
    }
    Ok(Some(ApiKeyPrincipal::from_vec(fields)))
}

/// Charge one usage unit. HINCRBY is atomic on the Redis side, so concurrent
/// requests on the same key never lose increments.
pub async fn increment_usage(db: &mut Database, api_key: &str) -> Result<(), ApiError> {
    let _: i64 = db.0.hincr(principal_key(api_key), "usage_count", 1).await?;
    Ok(())
}

/// Append one audit record to the usage log. Awaited by callers; this is
/// never fire-and-forget.
pub async fn append_log(db: &mut Database, entry: &UsageLogEntry) -> Result<(), ApiError> {
    let serialized = serde_json::to_string(entry).map_err(|_| ApiError::Internal)?;
    let _: () = db.0.rpush(USAGE_LOG_KEY, serialized).await?;
    Ok(())
}
