/// Best-effort `Content-Type` from a file extension.
///
/// Used when the origin's HEAD response does not carry a content type.
pub fn guess_content_type(path: &str) -> Option<&'static str> {
    let name = path.split(['?', '#']).next().unwrap_or(path);
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mpd" => "application/dash+xml",
        "m3u8" => "application/vnd.apple.mpegurl",
        "mp4" | "m4v" => "video/mp4",
        "m4a" => "audio/mp4",
        "webm" => "video/webm",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "json" => "application/json",
        "vtt" => "text/vtt",
        _ => return None,
    };
    Some(mime)
}
