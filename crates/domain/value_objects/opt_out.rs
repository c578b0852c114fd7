pub const OPT_OUT_KEYWORDS: [&str; 5] = ["stop", "unsubscribe", "cancel", "end", "quit"];

/// Lower-cases the inbound body and strips surrounding whitespace and trailing punctuation,
/// so "Stop!" and " STOP." normalize to "stop".
pub fn normalize_inbound_body(body: &str) -> String {
    body.trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_lowercase()
}

/// The whole normalized body must be a keyword; "my order was cancelled" does not opt out.
pub fn is_opt_out_request(body: &str) -> bool {
    let normalized = normalize_inbound_body(body);
    OPT_OUT_KEYWORDS.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_keywords_regardless_of_case_and_punctuation() {
        assert!(is_opt_out_request("STOP"));
        assert!(is_opt_out_request("  Unsubscribe. "));
        assert!(is_opt_out_request("quit!!"));
        assert!(is_opt_out_request("End"));
    }

    #[test]
    fn ignores_keywords_inside_longer_messages() {
        assert!(!is_opt_out_request("my order was cancelled"));
        assert!(!is_opt_out_request("please stop by the store"));
        assert!(!is_opt_out_request("weekend"));
        assert!(!is_opt_out_request(""));
    }
}
