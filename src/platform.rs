// platform.rs - Source Platform Classification
// Maps a video URL to the platform it was posted on. The tag picks the fetch
// deadline and the failure copy shown to the user.
//
// Used by: fetch.rs (deadline + error classification), reporter.rs (copy)

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Tiktok,
    Instagram,
    Facebook,
    Twitter,
    Vk,
    Okru,
    Generic,
}

// Ordered keyword table, first match wins.
// Keywords are lowercase; hosts that are substrings of unrelated domains
// (x.com, ok.ru, vk.com) are anchored on "://" or a leading dot.
const KEYWORDS: &[(Platform, &[&str])] = &[
    (Platform::Tiktok, &["tiktok.com"]),
    (Platform::Instagram, &["instagram.com", "instagr.am"]),
    (Platform::Facebook, &["facebook.com", "fb.watch", "fb.com/"]),
    (Platform::Twitter, &["twitter.com", "://x.com", ".x.com"]),
    (Platform::Vk, &["://vk.com", ".vk.com", "vkvideo.ru", "://vk.ru"]),
    (Platform::Okru, &["://ok.ru", ".ok.ru", "odnoklassniki.ru"]),
];

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Facebook,
        Platform::Twitter,
        Platform::Vk,
        Platform::Okru,
        Platform::Generic,
    ];

    /// Classify a URL. Total: anything unrecognised is `Generic`.
    pub fn classify(url: &str) -> Platform {
        let lowered = url.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(platform, _)| *platform)
            .unwrap_or(Platform::Generic)
    }

    pub fn tag(self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
            Platform::Vk => "vk",
            Platform::Okru => "okru",
            Platform::Generic => "generic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Platform::Tiktok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::Twitter => "X/Twitter",
            Platform::Vk => "VK",
            Platform::Okru => "OK.ru",
            Platform::Generic => "video",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Platform::Tiktok => "🎵",
            Platform::Instagram => "📸",
            Platform::Facebook => "📘",
            Platform::Twitter => "🐦",
            Platform::Vk => "🟦",
            Platform::Okru => "🟠",
            Platform::Generic => "🎬",
        }
    }

    /// Platforms that tend to stall; these get the short deadline.
    pub fn is_slow(self) -> bool {
        matches!(self, Platform::Okru | Platform::Vk)
    }

    /// Whether extraction failures on this platform get their own copy
    /// instead of the generic failure message.
    pub fn has_dedicated_failure(self) -> bool {
        matches!(
            self,
            Platform::Tiktok | Platform::Instagram | Platform::Twitter | Platform::Vk | Platform::Okru
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_platforms() {
        let cases = [
            ("https://www.tiktok.com/@u/video/1", Platform::Tiktok),
            ("https://vm.tiktok.com/ZMabc/", Platform::Tiktok),
            ("https://www.instagram.com/reel/xyz/", Platform::Instagram),
            ("https://www.facebook.com/watch?v=1", Platform::Facebook),
            ("https://fb.watch/abc/", Platform::Facebook),
            ("https://twitter.com/u/status/1", Platform::Twitter),
            ("https://x.com/u/status/1", Platform::Twitter),
            ("https://vk.com/video-1_2", Platform::Vk),
            ("https://vkvideo.ru/video-1_2", Platform::Vk),
            ("https://www.ok.ru/video/1", Platform::Okru),
            ("https://ok.ru/video/1", Platform::Okru),
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Platform::Generic),
        ];
        for (url, expected) in cases {
            assert_eq!(Platform::classify(url), expected, "url: {}", url);
        }
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(Platform::classify("HTTPS://WWW.TIKTOK.COM/@U/VIDEO/1"), Platform::Tiktok);
        assert_eq!(Platform::classify("https://WWW.OK.RU/video/1"), Platform::Okru);
    }

    #[test]
    fn test_classify_does_not_match_lookalike_hosts() {
        assert_eq!(Platform::classify("https://www.dropbox.com/s/clip.mp4"), Platform::Generic);
        assert_eq!(Platform::classify("https://book.ru/video/1"), Platform::Generic);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let urls = ["", "not a url", "https://www.tiktok.com/@u/video/1", "https://ok.ru/x", "ftp://vk.com"];
        for url in urls {
            let first = Platform::classify(url);
            for _ in 0..10 {
                assert_eq!(Platform::classify(url), first);
            }
        }
    }

    #[test]
    fn test_slow_and_dedicated_sets() {
        assert!(Platform::Okru.is_slow());
        assert!(!Platform::Tiktok.is_slow());
        assert!(!Platform::Facebook.has_dedicated_failure());
        assert!(!Platform::Generic.has_dedicated_failure());
        assert!(Platform::Instagram.has_dedicated_failure());
    }
}
