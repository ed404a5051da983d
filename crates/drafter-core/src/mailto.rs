//! `mailto:` compose links.

/// Subject used when the config does not override it.
pub const DEFAULT_SUBJECT: &str = "Quick Chat?";

/// Build `mailto:?subject=..&body=..` with both parts percent-encoded.
pub fn compose_uri(subject: &str, body: &str) -> String {
    format!(
        "mailto:?subject={}&body={}",
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}

/// Decode the `body` query parameter of a compose link.
pub fn parse_body(uri: &str) -> Option<String> {
    query_param(uri, "body")
}

fn query_param(uri: &str, name: &str) -> Option<String> {
    let query = uri.strip_prefix("mailto:")?.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_subject_is_encoded() {
        let uri = compose_uri(DEFAULT_SUBJECT, "hello");
        assert_eq!(uri, "mailto:?subject=Quick%20Chat%3F&body=hello");
    }

    #[test]
    fn test_body_survives_reserved_characters() {
        let body = "a=1&b=2?c #d\nDear Zoë, 你好 ☕";
        let uri = compose_uri(DEFAULT_SUBJECT, body);
        assert!(!uri["mailto:?".len()..].contains(' '));
        assert_eq!(uri.matches('&').count(), 1);
        assert_eq!(parse_body(&uri).as_deref(), Some(body));
        assert_eq!(
            query_param(&uri, "subject").as_deref(),
            Some(DEFAULT_SUBJECT)
        );
    }

    #[test]
    fn test_empty_body() {
        let uri = compose_uri(DEFAULT_SUBJECT, "");
        assert!(uri.ends_with("&body="));
        assert_eq!(parse_body(&uri).as_deref(), Some(""));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert_eq!(parse_body("https://example.com/?body=x"), None);
    }
}
