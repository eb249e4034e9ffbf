use url::Url;

/// Parse a boolean value from a raw string, accepting common env-style forms.
///
/// Accepted truthy values (case-insensitive): `"1"`, `"true"`, `"yes"`, `"on"`.
/// Accepted falsy values: `"0"`, `"false"`, `"no"`, `"off"`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Normalise a user-supplied server URL.
///
/// Operators frequently type `localhost:8080`, which HTTP clients reject, so
/// a missing scheme defaults to `http://`. Trailing slashes are dropped so
/// joining paths never produces `//`.
pub fn normalize_base_url(raw: &str) -> Result<String, url::ParseError> {
    let trimmed = raw.trim();
    let with_scheme =
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

    // Slashes are only trimmed once the host is known to be present, so
    // "http://" cannot collapse into a scheme-like host.
    let parsed = Url::parse(&with_scheme)?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(url::ParseError::EmptyHost);
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Ensure a console path starts with a single `/`.
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    format!("/{trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_scheme_and_loses_trailing_slash() {
        assert_eq!(
            normalize_base_url("localhost:8080/").unwrap(),
            "http://localhost:8080"
        );
        assert_eq!(
            normalize_base_url(" https://admin.example.com ").unwrap(),
            "https://admin.example.com"
        );
        assert_eq!(
            normalize_base_url("http://example.com/console/").unwrap(),
            "http://example.com/console"
        );
    }

    #[test]
    fn base_url_without_host_is_rejected() {
        assert!(normalize_base_url("http://").is_err());
        assert!(normalize_base_url("https:///").is_err());
        assert!(normalize_base_url("  ").is_err());
    }

    #[test]
    fn parse_bool_accepts_env_forms() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn paths_are_rooted() {
        assert_eq!(normalize_path("admin/"), "/admin");
        assert_eq!(normalize_path("/user"), "/user");
    }
}
