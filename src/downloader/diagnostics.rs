// Failure diagnostics - identifies why an extractor refused a URL
//
// instaloader and yt-dlp only report failures as free text on stderr.
// This module maps that text onto a small set of reasons so callers can
// decide whether another backend is worth trying.

/// Reasons why a platform may refuse to hand out media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    /// Anonymous access refused, login wall (401, "login required")
    LoginRequired,

    /// Private account or post
    PrivateContent,

    /// Post deleted, never existed, or otherwise unavailable
    ContentUnavailable,

    /// Rate limiting (429, "please wait a few minutes")
    RateLimited,

    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// Checkpoint / captcha / bot detection
    BotCheckpoint,

    /// Geographic restriction
    GeoBlocked,

    /// Network timeout (soft IP block)
    NetworkTimeout,

    /// The extractor binary itself is missing
    ToolUnavailable,

    /// The extractor does not understand the URL
    UnsupportedUrl,

    /// Generic/unknown failure
    Unknown,
}

impl BlockingReason {
    /// Access-related refusal: another extractor may still succeed
    pub fn is_restricted(&self) -> bool {
        matches!(
            self,
            Self::LoginRequired
                | Self::PrivateContent
                | Self::ContentUnavailable
                | Self::RateLimited
                | Self::Http403Forbidden
                | Self::BotCheckpoint
                | Self::GeoBlocked
                | Self::NetworkTimeout
        )
    }

    /// Whether the generic extractor should be tried after this failure
    pub fn allows_fallback(&self) -> bool {
        self.is_restricted() || matches!(self, Self::ToolUnavailable | Self::UnsupportedUrl)
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::LoginRequired => "Login required",
            Self::PrivateContent => "Private content",
            Self::ContentUnavailable => "Content unavailable",
            Self::RateLimited => "Rate limited by the platform",
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::BotCheckpoint => "Bot checkpoint triggered",
            Self::GeoBlocked => "Geographic restriction",
            Self::NetworkTimeout => "Network timeout",
            Self::ToolUnavailable => "Extractor not installed",
            Self::UnsupportedUrl => "URL not supported by extractor",
            Self::Unknown => "Unknown failure",
        }
    }
}

/// Analyze error message and return blocking reason
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    // Check patterns in order of specificity

    if lower.contains("private profile")
        || lower.contains("private account")
        || lower.contains("is private")
        || lower.contains("private video")
    {
        return Some(BlockingReason::PrivateContent);
    }

    if lower.contains("login required")
        || lower.contains("login_required")
        || lower.contains("requires login")
        || lower.contains("401 unauthorized")
        || lower.contains("redirected to login")
        || lower.contains("use --cookies")
    {
        return Some(BlockingReason::LoginRequired);
    }

    if lower.contains("checkpoint")
        || lower.contains("challenge_required")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
    {
        return Some(BlockingReason::BotCheckpoint);
    }

    if lower.contains("http error 429")
        || lower.contains("status 429")
        || lower.contains("429 too many")
        || lower.contains("too many requests")
        || lower.contains("rate limit")
        || lower.contains("please wait a few minutes")
    {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("not available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("geo restriction")
        || lower.contains("geo-restricted")
    {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("unsupported url") {
        return Some(BlockingReason::UnsupportedUrl);
    }

    if lower.contains("http error 404")
        || lower.contains("404 not found")
        || lower.contains("not found")
        || lower.contains("does not exist")
        || lower.contains("unavailable")
        || lower.contains("has been removed")
        || lower.contains("fetching post metadata failed")
    {
        return Some(BlockingReason::ContentUnavailable);
    }

    // HTTP 403 (general)
    if lower.contains("http error 403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network unreachable")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    if !error.trim().is_empty() {
        return Some(BlockingReason::Unknown);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_detection() {
        let error = "JSON Query to graphql/query: 401 Unauthorized - \"fail\" status, message \"Please wait a few minutes\"";
        assert_eq!(diagnose_error(error), Some(BlockingReason::LoginRequired));
    }

    #[test]
    fn test_instaloader_login_required() {
        let error = "Login required to access comments of a post.";
        assert_eq!(diagnose_error(error), Some(BlockingReason::LoginRequired));
    }

    #[test]
    fn test_rate_limit_detection() {
        let error = "Too many queries in the last time. Please wait a few minutes";
        assert_eq!(diagnose_error(error), Some(BlockingReason::RateLimited));
    }

    #[test]
    fn test_private_detection() {
        let error = "Profile somebody is private.";
        assert_eq!(diagnose_error(error), Some(BlockingReason::PrivateContent));
    }

    #[test]
    fn test_unavailable_detection() {
        let error = "Fetching Post metadata failed.";
        assert_eq!(diagnose_error(error), Some(BlockingReason::ContentUnavailable));
    }

    #[test]
    fn test_checkpoint_detection() {
        let error = "Checkpoint required. Point your browser to /challenge/";
        assert_eq!(diagnose_error(error), Some(BlockingReason::BotCheckpoint));
    }

    #[test]
    fn test_403_detection() {
        let error = "ERROR: HTTP Error 403: Forbidden";
        assert_eq!(diagnose_error(error), Some(BlockingReason::Http403Forbidden));
    }

    #[test]
    fn test_unsupported_url_detection() {
        let error = "ERROR: Unsupported URL: https://example.com/x";
        assert_eq!(diagnose_error(error), Some(BlockingReason::UnsupportedUrl));
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(diagnose_error("KeyError: 'shortcode_media'"), Some(BlockingReason::Unknown));
        assert_eq!(diagnose_error("   "), None);
    }

    #[test]
    fn test_status_digits_in_ids_are_not_statuses() {
        for error in [
            "KeyError: 'C429xYz' in post payload",
            "KeyError: 'C404abc' in post payload",
            "KeyError: 'C403abc' in post payload",
        ] {
            let reason = diagnose_error(error);
            assert_eq!(reason, Some(BlockingReason::Unknown), "{error}");
            assert!(!reason.is_some_and(|r| r.allows_fallback()));
        }
        assert_eq!(
            diagnose_error("ERROR: HTTP Error 429: Too Many Requests"),
            Some(BlockingReason::RateLimited)
        );
        assert_eq!(
            diagnose_error("ERROR: HTTP Error 404: Not Found"),
            Some(BlockingReason::ContentUnavailable)
        );
    }

    #[test]
    fn test_fallback_rules() {
        assert!(BlockingReason::LoginRequired.allows_fallback());
        assert!(BlockingReason::ToolUnavailable.allows_fallback());
        assert!(!BlockingReason::ToolUnavailable.is_restricted());
        assert!(!BlockingReason::Unknown.allows_fallback());
        assert!(BlockingReason::UnsupportedUrl.allows_fallback());
        assert!(BlockingReason::RateLimited.allows_fallback());
    }
}
