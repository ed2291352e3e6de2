use crate::types::VideoId;

const WATCH_MARKER: &str = "youtube.com/watch?v=";
const SHORT_MARKER: &str = "youtu.be/";

/// Extract the video id from a `youtube.com/watch?v=<id>` or `youtu.be/<id>` URL.
///
/// The id runs from the marker to the next `&` (watch URLs) or `?` (short URLs).
/// The id itself is not validated; anything non-empty is passed through.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    let id = if let Some((_, rest)) = url.split_once(WATCH_MARKER) {
        rest.split('&').next()
    } else if let Some((_, rest)) = url.split_once(SHORT_MARKER) {
        rest.split('?').next()
    } else {
        None
    };

    id.filter(|id| !id.is_empty()).map(VideoId::new)
}
