// normalize.rs - URL Normalization
// Rewrites alias URLs that yt-dlp does not understand into the canonical
// form of the platform that actually hosts the media.

use once_cell::sync::Lazy;
use regex::Regex;

// Threads posts are served from Instagram's media backend.
static THREADS_POST_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:www\.)?threads\.(?:net|com)/(?:@[^/?#]+/post|t)/([A-Za-z0-9_-]+)")
        .unwrap()
});

/// Normalize a URL. Unrecognised input is returned unchanged (trimmed).
pub fn normalize(url: &str) -> String {
    let url = url.trim();
    match THREADS_POST_REGEX.captures(url).and_then(|c| c.get(1)) {
        Some(post_id) => format!("https://www.instagram.com/p/{}/", post_id.as_str()),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threads_post_becomes_instagram() {
        assert_eq!(
            normalize("https://www.threads.net/@u/post/ABC123"),
            "https://www.instagram.com/p/ABC123/"
        );
        assert_eq!(
            normalize("https://threads.net/t/XyZ_-9?igshid=1"),
            "https://www.instagram.com/p/XyZ_-9/"
        );
    }

    #[test]
    fn test_unmatched_input_passes_through() {
        assert_eq!(normalize("https://www.tiktok.com/@u/video/1"), "https://www.tiktok.com/@u/video/1");
        assert_eq!(normalize("https://www.threads.net/@u"), "https://www.threads.net/@u");
        assert_eq!(normalize("%%%not a url"), "%%%not a url");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://www.threads.net/@u/post/ABC123",
            "  https://threads.com/t/Q1  ",
            "https://www.instagram.com/p/ABC123/",
            "https://ok.ru/video/1",
            "garbage",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {:?}", input);
        }
    }
}
