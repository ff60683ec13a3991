use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use youtube_dl::{YoutubeDl, YoutubeDlOutput};

use crate::config::Config;
use crate::errors::ApiError;

/// One encoded variant of a video, reduced to the fields the selector needs.
/// Codecs default to "none" and the bitrate to 0 so the selector never has
/// to reason about yt-dlp's optional fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFormat {
    pub url: Option<String>,
    pub audio_codec: String,
    pub video_codec: String,
    pub extension: String,
    pub avg_bitrate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailInfo {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Search result validated at the extraction boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoRecord {
    pub title: Option<String>,
    pub duration_seconds: Option<i64>,
    pub thumbnails: Vec<ThumbnailInfo>,
    pub formats: Vec<StreamFormat>,
    pub fallback_url: Option<String>,
}

impl From<youtube_dl::model::SingleVideo> for VideoRecord {
    fn from(video: youtube_dl::model::SingleVideo) -> Self {
        let formats = video
            .formats
            .unwrap_or_default()
            .into_iter()
            .map(|f| StreamFormat {
                url: f.url,
                audio_codec: f.acodec.unwrap_or_else(|| "none".to_string()),
                video_codec: f.vcodec.unwrap_or_else(|| "none".to_string()),
                extension: f.ext.unwrap_or_default(),
                avg_bitrate: f.abr.unwrap_or(0.0),
            })
            .collect();

        let thumbnails = video
            .thumbnails
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| {
                Some(ThumbnailInfo {
                    url: t.url?,
                    width: t.width.map(|w| w as u32).unwrap_or(0),
                    height: t.height.map(|h| h as u32).unwrap_or(0),
                })
            })
            .collect();

        Self {
            title: video.title,
            duration_seconds: video.duration.as_ref().and_then(Value::as_f64).map(|d| d as i64),
            thumbnails,
            formats,
            fallback_url: video.url,
        }
    }
}

/// Ask yt-dlp for the top search result and validate it into a VideoRecord.
pub async fn search_top_result(query: &str, config: &Config) -> Result<VideoRecord, ApiError> {
    let mut ytdl = YoutubeDl::new(format!("ytsearch1:{query}"));
    if let Some(path) = &config.yt_dlp_path {
        ytdl.youtube_dl_path(path.as_str());
    }

    let output = ytdl
        .socket_timeout("30")
        .process_timeout(Duration::from_secs(config.extraction_timeout))
        .extra_arg("--no-playlist")
        .run_async()
        .await
        .map_err(|why| {
            log::error!("yt-dlp extraction failed: {why}");
            ApiError::Extraction(why.to_string())
        })?;

    // ytsearch wraps results in a playlist; a direct URL would come back as
    // a single video.
    let video = match output {
        YoutubeDlOutput::Playlist(playlist) => playlist
            .entries
            .and_then(|mut entries| (!entries.is_empty()).then(|| entries.remove(0))),
        YoutubeDlOutput::SingleVideo(video) => Some(*video),
    };

    video.map(VideoRecord::from).ok_or(ApiError::NoResults)
}
