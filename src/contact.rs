use once_cell::sync::Lazy;
use regex::Regex;

// Matches are not anchored to label boundaries: "example.info" yields
// "example.inf".
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9_\-+]+@[a-z0-9\-]+\.([a-z]{2,3})(?:\.[a-z]{2})?").unwrap()
});
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(http|https|ftp|ftps)://[a-zA-Z0-9\-.]+\.[a-zA-Z]{2,3}(/\S*)?").unwrap()
});

pub fn email_matches(text: &str) -> Vec<&str> {
    EMAIL_RE.find_iter(text).map(|m| m.as_str()).collect()
}

pub fn url_matches(text: &str) -> Vec<&str> {
    URL_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Pick an application contact out of free-text "how to apply" instructions.
///
/// The first email address wins. Without one, the first URL is used, and
/// with neither the result is empty.
pub fn extract_application_contact(how_to_apply: &str) -> String {
    if let Some(email) = email_matches(how_to_apply).first() {
        return email.to_string();
    }
    url_matches(how_to_apply)
        .first()
        .map(|url| url.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_beats_earlier_url() {
        assert_eq!(
            extract_application_contact("Apply at http://example.com/jobs or email jobs@example.com"),
            "jobs@example.com"
        );
    }

    #[test]
    fn url_is_the_fallback() {
        assert_eq!(
            extract_application_contact("See http://example.org/apply"),
            "http://example.org/apply"
        );
    }

    #[test]
    fn neither_pattern_yields_empty() {
        assert_eq!(extract_application_contact("Call Sam on 0113 496 0000"), "");
        assert_eq!(extract_application_contact(""), "");
    }

    #[test]
    fn first_of_several_emails_is_taken() {
        assert_eq!(
            extract_application_contact("hr@acme.co.uk, cc boss+jobs@Acme.COM"),
            "hr@acme.co.uk"
        );
        assert_eq!(
            email_matches("hr@acme.co.uk, cc boss+jobs@Acme.COM"),
            vec!["hr@acme.co.uk", "boss+jobs@Acme.COM"]
        );
    }

    #[test]
    fn email_domain_may_not_contain_dots_before_tld() {
        // Only one label may sit between '@' and the TLD, so the second
        // label is cut down to three letters.
        assert_eq!(email_matches("recruit@mail.acme.com"), vec!["recruit@mail.acm"]);
    }

    #[test]
    fn url_patterns_keep_loose_matching() {
        assert_eq!(url_matches("https://example.info"), vec!["https://example.inf"]);
        assert_eq!(
            url_matches("ftps://files.example.net/cv/upload?x=1 then"),
            vec!["ftps://files.example.net/cv/upload?x=1"]
        );
        assert!(url_matches("www.example.com").is_empty());
    }
}
