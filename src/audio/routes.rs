use log::{error, info};
use poem::web::{Data, Json, Query};
use poem::{get, handler, Request, Response, Route};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::audio::functions::{authenticate, bearer_token, fetch_audio, record_outcome};
use crate::audio::models::ClientInfo;
use crate::config::Config;
use crate::database::Database;
use crate::errors::{self, ApiError};

pub const SERVICE_NAME: &str = "radhaapi-youtube-audio";

#[handler]
fn root(config: Data<&Config>) -> Json<Value> {
    Json(json!({
        "message": "RadhaAPI YouTube Audio Streaming Backend",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "get_audio": "/get-audio?query=your_search_query",
            "health": "/health",
        },
        "authentication": if config.require_api_key {
            "Bearer API key required for /get-audio"
        } else {
            "disabled"
        },
        "status": "active",
    }))
}

#[handler]
fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

#[derive(Debug, Deserialize)]
struct AudioParams {
    #[serde(default)]
    query: Option<String>,
}

fn client_info(req: &Request) -> ClientInfo {
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    // First hop of X-Forwarded-For when deployed behind a proxy, otherwise
    // the socket peer.
    let ip_address = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| req.remote_addr().to_string());

    ClientInfo { user_agent, ip_address }
}

#[handler]
async fn get_audio(
    req: &Request,
    Query(params): Query<AudioParams>,
    mut db: Database,
    config: Data<&Config>,
) -> Response {
    let config = config.0;

    let raw_query = params.query.unwrap_or_default();
    let query = raw_query.trim();
    if query.is_empty() {
        return errors::failure(&ApiError::EmptyQuery, query);
    }

    let client = client_info(req);

    let principal = if config.require_api_key {
        let token = bearer_token(
            req.headers()
                .get("authorization")
                .and_then(|value| value.to_str().ok()),
        );
        match authenticate(&mut db, token, &client).await {
            Ok(principal) => Some(principal),
            Err(why) => return errors::failure(&why, query),
        }
    } else {
        None
    };

    info!("Processing audio request for query: {query}");
    let outcome = fetch_audio(query, config).await;

    // Log before responding so a client disconnect cannot lose the audit
    // record.
    if let Some(principal) = &principal {
        record_outcome(&mut db, principal, query, &client, &outcome).await;
    }

    match outcome {
        Ok(result) => {
            info!("Successfully extracted audio info for: {}", result.title);
            errors::success(&result)
        }
        Err(why) => {
            error!("Audio request failed for query '{query}': {why}");
            errors::failure(&why, query)
        }
    }
}

pub fn register_routes() -> Route {
    Route::new()
        .at("/", get(root))
        .at("/health", get(health))
        .at("/get-audio", get(get_audio))
}
