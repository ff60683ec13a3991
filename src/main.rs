mod audio;
mod config;
mod database;
mod errors;
mod format;
mod youtube;

use std::path::Path;

use chrono::Local;
use dotenvy::dotenv;
use fern::colors::{Color, ColoredLevelConfig};
use log::{error, info, warn};
use poem::{listener::TcpListener, middleware::Cors, EndpointExt, Server};
use redis::aio::ConnectionManager;
use youtube_dl::download_yt_dlp;

use crate::config::Config;

fn setup_logger() -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .debug(Color::BrightBlue)
        .warn(Color::Yellow)
        .error(Color::Red);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let date = Local::now();

            out.finish(format_args!(
                "{}[{} {} {}] {}\x1B[0m",
                format_args!(
                    "\x1B[{}m",
                    colors.get_color(&record.level()).to_fg_str()
                ),
                date.format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message,
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

/// Explicit path from config wins; then a binary next to the executable;
/// then a fresh download. `None` leaves the lookup to PATH.
async fn resolve_yt_dlp(config: &Config) -> Option<String> {
    if config.yt_dlp_path.is_some() {
        return config.yt_dlp_path.clone();
    }

    let local = if cfg!(windows) { "./yt-dlp.exe" } else { "./yt-dlp" };
    if Path::new(local).exists() {
        return Some(local.to_string());
    }

    info!("yt-dlp not found, downloading");
    match download_yt_dlp(".").await {
        Ok(path) => Some(path.to_string_lossy().into_owned()),
        Err(why) => {
            warn!("Could not download yt-dlp, falling back to PATH lookup: {why}");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(why) = setup_logger() {
        eprintln!("Failed to setup logger: {why}");
    }

    dotenv().ok();
    let mut config = Config::from_env();
    config.yt_dlp_path = resolve_yt_dlp(&config).await;
    info!(
        "API key authentication {}",
        if config.require_api_key { "enabled" } else { "disabled" }
    );

    let client = redis::Client::open(config.redis_url.clone()).unwrap();
    let con = ConnectionManager::new(client).await;

    match con {
        Ok(con) => {
            info!("Connected to Redis");

            let bind_address = config.bind_address.clone();
            let app = audio::routes::register_routes()
                .data(con)
                .data(config)
                .with(Cors::new());

            let server = Server::new(TcpListener::bind(bind_address))
                .run(app)
                .await;

            if let Err(why) = server {
                error!("Failed to start API: {why}");
            }
        }
        Err(why) => error!("Failed to connect to Redis: {why}"),
    }
}
