use crate::audio::models::AudioResult;
use crate::errors::ApiError;
use crate::youtube::{StreamFormat, VideoRecord};

/// Composite ranking: audio-only streams beat muxed ones outright, preferred
/// containers beat the rest, average bitrate decides within a class.
fn score(format: &StreamFormat) -> f64 {
    let audio_only_bonus = if format.video_codec == "none" { 1000.0 } else { 0.0 };
    let extension_bonus = match format.extension.as_str() {
        "m4a" | "webm" => 100.0,
        "mp4" => 50.0,
        _ => 0.0,
    };
    audio_only_bonus + extension_bonus + format.avg_bitrate
}

fn has_audio(format: &StreamFormat) -> bool {
    format.audio_codec != "none" && format.url.as_deref().map_or(false, |url| !url.is_empty())
}

/// Pick the best audio stream out of a video record.
///
/// Candidates are the formats that carry both a URL and an audio track,
/// ranked by `score` with a stable sort so ties keep their original order.
/// An empty pool falls back to the record's top-level URL; failing that the
/// whole operation fails rather than returning an empty `audio_url`.
pub fn select_audio(video: &VideoRecord) -> Result<AudioResult, ApiError> {
    let mut candidates: Vec<&StreamFormat> = video.formats.iter().filter(|f| has_audio(f)).collect();
    candidates.sort_by(|a, b| score(b).total_cmp(&score(a)));

    let audio_url = candidates
        .first()
        .and_then(|f| f.url.clone())
        .or_else(|| video.fallback_url.clone().filter(|url| !url.is_empty()))
        .ok_or(ApiError::NoAudioStream)?;

    let mut thumbnails: Vec<_> = video.thumbnails.iter().collect();
    thumbnails.sort_by_key(|t| std::cmp::Reverse(u64::from(t.width) * u64::from(t.height)));
    let thumbnail = thumbnails.first().map(|t| t.url.clone()).unwrap_or_default();

    let title = match &video.title {
        Some(title) if !title.is_empty() => title.clone(),
        _ => "Unknown Title".to_string(),
    };

    Ok(AudioResult {
        title,
        duration: video.duration_seconds.unwrap_or(0).max(0) as u64,
        audio_url,
        thumbnail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::ThumbnailInfo;

    fn stream(url: &str, acodec: &str, vcodec: &str, ext: &str, abr: f64) -> StreamFormat {
        StreamFormat {
            url: Some(url.to_string()),
            audio_codec: acodec.to_string(),
            video_codec: vcodec.to_string(),
            extension: ext.to_string(),
            avg_bitrate: abr,
        }
    }

    fn record(formats: Vec<StreamFormat>) -> VideoRecord {
        VideoRecord {
            title: Some("a song".to_string()),
            duration_seconds: Some(245),
            formats,
            ..VideoRecord::default()
        }
    }

    #[test]
    fn prefers_audio_only_over_muxed_regardless_of_bitrate() {
        let video = record(vec![
            stream("https://a/muxed", "mp4a", "h264", "m4a", 999.0),
            stream("https://a/audio", "mp4a", "none", "m4a", 0.0),
        ]);
        let result = select_audio(&video).unwrap();
        assert_eq!(result.audio_url, "https://a/audio");
    }

    #[test]
    fn prefers_m4a_and_webm_over_mp4_at_equal_bitrate() {
        let video = record(vec![
            stream("https://a/mp4", "mp4a", "none", "mp4", 128.0),
            stream("https://a/webm", "opus", "none", "webm", 128.0),
        ]);
        assert_eq!(select_audio(&video).unwrap().audio_url, "https://a/webm");
    }

    #[test]
    fn mp4_outranks_other_extensions() {
        let video = record(vec![
            stream("https://a/3gp", "mp4a", "none", "3gp", 128.0),
            stream("https://a/mp4", "mp4a", "none", "mp4", 128.0),
        ]);
        assert_eq!(select_audio(&video).unwrap().audio_url, "https://a/mp4");
    }

    #[test]
    fn higher_bitrate_wins_within_the_same_class() {
        let video = record(vec![
            stream("https://a/low", "opus", "none", "webm", 64.0),
            stream("https://a/high", "opus", "none", "webm", 160.0),
        ]);
        assert_eq!(select_audio(&video).unwrap().audio_url, "https://a/high");
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let video = record(vec![
            stream("https://a/first", "opus", "none", "webm", 128.0),
            stream("https://a/second", "opus", "none", "webm", 128.0),
        ]);
        assert_eq!(select_audio(&video).unwrap().audio_url, "https://a/first");
    }

    #[test]
    fn selection_is_deterministic() {
        let video = record(vec![
            stream("https://a/one", "mp4a", "h264", "mp4", 128.0),
            stream("https://a/two", "opus", "none", "webm", 96.0),
            stream("https://a/three", "mp4a", "none", "m4a", 96.0),
        ]);
        let first = select_audio(&video).unwrap();
        for _ in 0..10 {
            assert_eq!(select_audio(&video).unwrap().audio_url, first.audio_url);
        }
    }

    #[test]
    fn skips_formats_without_url_or_audio() {
        let mut missing_url = stream("", "opus", "none", "webm", 192.0);
        missing_url.url = None;
        let video = record(vec![
            missing_url,
            stream("https://a/video", "none", "vp9", "webm", 0.0),
            stream("https://a/ok", "mp4a", "h264", "mp4", 48.0),
        ]);
        assert_eq!(select_audio(&video).unwrap().audio_url, "https://a/ok");
    }

    #[test]
    fn falls_back_to_top_level_url_when_no_candidates() {
        let mut video = record(vec![stream("https://a/video", "none", "vp9", "webm", 0.0)]);
        video.fallback_url = Some("https://a/fallback".to_string());
        assert_eq!(select_audio(&video).unwrap().audio_url, "https://a/fallback");
    }

    #[test]
    fn fails_when_no_url_can_be_derived() {
        let video = record(vec![stream("https://a/video", "none", "vp9", "webm", 0.0)]);
        assert!(matches!(select_audio(&video), Err(ApiError::NoAudioStream)));
    }

    #[test]
    fn picks_thumbnail_with_largest_area() {
        let mut video = record(vec![stream("https://a/audio", "opus", "none", "webm", 128.0)]);
        video.thumbnails = vec![
            ThumbnailInfo { url: "https://t/small".to_string(), width: 100, height: 100 },
            ThumbnailInfo { url: "https://t/wide".to_string(), width: 300, height: 200 },
            ThumbnailInfo { url: "https://t/tall".to_string(), width: 50, height: 800 },
        ];
        assert_eq!(select_audio(&video).unwrap().thumbnail, "https://t/wide");
    }

    #[test]
    fn missing_thumbnails_give_empty_string() {
        let video = record(vec![stream("https://a/audio", "opus", "none", "webm", 128.0)]);
        assert_eq!(select_audio(&video).unwrap().thumbnail, "");
    }

    #[test]
    fn duration_defaults_to_zero_when_absent() {
        let mut video = record(vec![stream("https://a/audio", "opus", "none", "webm", 128.0)]);
        video.duration_seconds = None;
        assert_eq!(select_audio(&video).unwrap().duration, 0);

        video.duration_seconds = Some(-3);
        assert_eq!(select_audio(&video).unwrap().duration, 0);

        video.duration_seconds = Some(245);
        assert_eq!(select_audio(&video).unwrap().duration, 245);
    }

    #[test]
    fn missing_or_empty_title_uses_placeholder() {
        let mut video = record(vec![stream("https://a/audio", "opus", "none", "webm", 128.0)]);
        video.title = None;
        assert_eq!(select_audio(&video).unwrap().title, "Unknown Title");

        video.title = Some(String::new());
        assert_eq!(select_audio(&video).unwrap().title, "Unknown Title");
    }
}
