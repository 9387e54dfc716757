use crate::workspace::{InputConfig, InputKind};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_RETRY_MESSAGE: &str = "Invalid message. Please, try again.";

static MAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex")
});

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s\-.()]+$").expect("Invalid regex"));

static WEBSITE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?://)?[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)+(:[0-9]{1,5})?([/?#]\S*)?$")
        .expect("Invalid regex")
});

/// Checks a reply against the input's kind and bounds. Returns the value to
/// store on success.
pub(crate) fn validate_reply(input: InputKind, config: &InputConfig, reply: &str) -> Option<String> {
    let trimmed = reply.trim();
    match input {
        InputKind::Text => Some(reply.to_string()),
        InputKind::Number => {
            let number: f64 = trimmed.parse().ok().filter(|n: &f64| n.is_finite())?;
            if config.min.is_some_and(|min| number < min) || config.max.is_some_and(|max| number > max) {
                return None;
            }
            Some(trimmed.to_string())
        }
        InputKind::Mail => MAIL_REGEX.is_match(trimmed).then(|| trimmed.to_string()),
        InputKind::Phone => {
            let digits = trimmed.chars().filter(char::is_ascii_digit).count();
            (PHONE_REGEX.is_match(trimmed) && (6..=15).contains(&digits))
                .then(|| trimmed.to_string())
        }
        InputKind::Website => WEBSITE_REGEX.is_match(trimmed).then(|| trimmed.to_string()),
        InputKind::Image | InputKind::Video | InputKind::Audio | InputKind::Document => {
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded(min: Option<f64>, max: Option<f64>) -> InputConfig {
        InputConfig {
            min,
            max,
            ..Default::default()
        }
    }

    #[test]
    fn test_text_is_stored_verbatim() {
        let config = InputConfig::default();
        assert_eq!(
            validate_reply(InputKind::Text, &config, "  hi  ").as_deref(),
            Some("  hi  ")
        );
        assert_eq!(validate_reply(InputKind::Text, &config, "").as_deref(), Some(""));
    }

    #[test]
    fn test_number_bounds() {
        let config = bounded(Some(1.0), Some(10.0));
        assert_eq!(validate_reply(InputKind::Number, &config, " 7 ").as_deref(), Some("7"));
        assert_eq!(validate_reply(InputKind::Number, &config, "10").as_deref(), Some("10"));
        assert!(validate_reply(InputKind::Number, &config, "11").is_none());
        assert!(validate_reply(InputKind::Number, &config, "0.5").is_none());
        assert!(validate_reply(InputKind::Number, &config, "seven").is_none());
        assert!(validate_reply(InputKind::Number, &config, "NaN").is_none());
    }

    #[test]
    fn test_mail_and_phone() {
        let config = InputConfig::default();
        assert!(validate_reply(InputKind::Mail, &config, "bob@example.com").is_some());
        assert!(validate_reply(InputKind::Mail, &config, "bob@example").is_none());
        assert!(validate_reply(InputKind::Mail, &config, "bob example.com").is_none());

        assert!(validate_reply(InputKind::Phone, &config, "+1 (555) 010-2030").is_some());
        assert!(validate_reply(InputKind::Phone, &config, "12345").is_none());
        assert!(validate_reply(InputKind::Phone, &config, "call me").is_none());
    }

    #[test]
    fn test_website_scheme_is_optional() {
        let config = InputConfig::default();
        assert!(validate_reply(InputKind::Website, &config, "example.com").is_some());
        assert!(validate_reply(InputKind::Website, &config, "https://example.com/a?b=c").is_some());
        assert!(validate_reply(InputKind::Website, &config, "not a site").is_none());
    }

    #[test]
    fn test_media_requires_content() {
        let config = InputConfig::default();
        assert!(validate_reply(InputKind::Image, &config, "https://cdn/x.png").is_some());
        assert!(validate_reply(InputKind::Document, &config, "   ").is_none());
    }
}
