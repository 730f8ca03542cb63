//! URL classification: decides which retrieval path handles a request.
//!
//! Plain substring matching, no URL parsing. A string like
//! `instagram.com/p/abc` without a scheme is accepted.

use crate::config::PlatformMarkers;

/// Post segments recognised on Instagram, checked in this order
const POST_SEGMENTS: [&str; 2] = ["/reel/", "/p/"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Instagram post or reel, handled by the post backend first
    Instagram { shortcode: String },
    /// Any site the generic backend is trusted with
    Generic,
    Unsupported,
}

pub fn classify(url: &str, markers: &PlatformMarkers) -> Route {
    if url.contains(markers.instagram.as_str()) {
        // profiles, stories etc. have no shortcode; yt-dlp gets those
        return match extract_shortcode(url) {
            Some(shortcode) => Route::Instagram { shortcode },
            None => Route::Generic,
        };
    }

    if markers.generic.iter().any(|m| url.contains(m.as_str())) {
        return Route::Generic;
    }

    Route::Unsupported
}

/// Path component following the last `/reel/` (or, failing that, `/p/`)
pub fn extract_shortcode(url: &str) -> Option<String> {
    POST_SEGMENTS.iter().find_map(|segment| {
        let (_, rest) = url.rsplit_once(segment)?;
        let shortcode = rest
            .split(|c: char| c == '/' || c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        (!shortcode.is_empty()).then(|| shortcode.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> PlatformMarkers {
        PlatformMarkers::default()
    }

    #[test]
    fn test_instagram_post_and_reel() {
        assert_eq!(
            classify("https://www.instagram.com/p/CxYz123/", &markers()),
            Route::Instagram { shortcode: "CxYz123".to_string() }
        );
        assert_eq!(
            classify("https://www.instagram.com/reel/Cabc_-9/?igsh=xyz", &markers()),
            Route::Instagram { shortcode: "Cabc_-9".to_string() }
        );
    }

    #[test]
    fn test_reel_wins_over_post_segment() {
        assert_eq!(
            extract_shortcode("https://instagram.com/p/first/reel/second"),
            Some("second".to_string())
        );
    }

    #[test]
    fn test_last_occurrence_is_used() {
        assert_eq!(
            extract_shortcode("https://instagram.com/p/one/p/two#frag"),
            Some("two".to_string())
        );
    }

    #[test]
    fn test_scheme_less_url_matches() {
        assert_eq!(
            classify("instagram.com/p/abc", &markers()),
            Route::Instagram { shortcode: "abc".to_string() }
        );
    }

    #[test]
    fn test_instagram_without_shortcode_goes_generic() {
        assert_eq!(classify("https://www.instagram.com/natgeo/", &markers()), Route::Generic);
        assert_eq!(classify("https://www.instagram.com/reel/", &markers()), Route::Generic);
    }

    #[test]
    fn test_generic_markers() {
        for url in [
            "https://www.tiktok.com/@user/video/123",
            "https://www.youtube.com/watch?v=abc",
            "https://youtu.be/abc",
        ] {
            assert_eq!(classify(url, &markers()), Route::Generic, "{}", url);
        }
    }

    #[test]
    fn test_instagram_checked_before_generic_group() {
        assert_eq!(
            classify("https://instagram.com/reel/abc?ref=youtube.com", &markers()),
            Route::Instagram { shortcode: "abc".to_string() }
        );
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(classify("https://example.com/x", &markers()), Route::Unsupported);
        assert_eq!(classify("not a url", &markers()), Route::Unsupported);
        // matching is case-sensitive
        assert_eq!(classify("https://YOUTUBE.COM/watch", &markers()), Route::Unsupported);
    }
}
