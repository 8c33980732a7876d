//! URL canonicalisation and domain matching.

use url::Url;

/// Query parameters that never identify content.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "ref", "ref_src", "si", "feature",
];

fn is_tracking_param(key: &str) -> bool {
    let k = key.to_lowercase();
    k.starts_with("utm_") || TRACKING_PARAMS.contains(&k.as_str())
}

/// Canonical form of an http(s) URL, or `None` when it cannot be parsed.
///
/// Lowercases scheme and host, removes default ports and the fragment,
/// strips tracking parameters, sorts the rest and drops a trailing slash
/// (except on the root path). Two URLs pointing at the same article
/// normalise to the same string.
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }

    parsed.set_fragment(None);
    // Url::parse already drops ports that match the scheme default.

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(params);
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    Some(parsed.to_string())
}

/// Host (without a leading `www.`) and path of a URL.
pub fn host_and_path(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    Some((host, parsed.path().to_string()))
}

/// Whether `host`/`path` is covered by a domain pattern.
///
/// `reuters.com` matches `reuters.com` and any subdomain of it. A pattern
/// with a path (`pap.pl/biznes`) also requires that path prefix.
pub fn domain_matches(host: &str, path: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    let (domain, prefix) = match pattern.split_once('/') {
        Some((d, p)) => (d, Some(p.trim_matches('/'))),
        None => (pattern.as_str(), None),
    };
    if domain.is_empty() {
        return false;
    }
    let host_ok = host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|head| head.ends_with('.'));
    if !host_ok {
        return false;
    }
    match prefix {
        None | Some("") => true,
        Some(p) => {
            let path = path.trim_start_matches('/').to_lowercase();
            path == p || path.starts_with(&format!("{}/", p))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tracking_and_fragment() {
        let result = normalize_url(
            "https://www.Reuters.com/tech/ai/?utm_source=x&utm_campaign=y&fbclid=1&id=7#top",
        );
        assert_eq!(result.as_deref(), Some("https://www.reuters.com/tech/ai?id=7"));
    }

    #[test]
    fn equivalent_urls_collapse() {
        let a = normalize_url("https://example.com:443/a/?b=2&a=1&ref=feed");
        let b = normalize_url("https://EXAMPLE.com/a?a=1&b=2#frag");
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn keeps_root_slash_and_ports() {
        assert_eq!(normalize_url("https://example.com/").as_deref(), Some("https://example.com/"));
        assert_eq!(
            normalize_url("http://example.com:8080/x").as_deref(),
            Some("http://example.com:8080/x")
        );
    }

    #[test]
    fn rejects_non_web_urls() {
        assert_eq!(normalize_url("not a url"), None);
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("mailto:desk@reuters.com"), None);
        assert_eq!(normalize_url("ftp://example.com/file"), None);
    }

    #[test]
    fn host_strips_www() {
        let (host, path) = host_and_path("https://www.ft.com/content/abc").unwrap();
        assert_eq!(host, "ft.com");
        assert_eq!(path, "/content/abc");
    }

    #[test]
    fn domain_and_subdomain_match() {
        assert!(domain_matches("reuters.com", "/", "reuters.com"));
        assert!(domain_matches("spectrum.ieee.org", "/", "ieee.org"));
        assert!(!domain_matches("notreuters.com", "/", "reuters.com"));
        assert!(!domain_matches("reuters.com.evil.io", "/", "reuters.com"));
        assert!(!domain_matches("reuters.com", "/", ""));
    }

    #[test]
    fn path_patterns_need_prefix() {
        assert!(domain_matches("pap.pl", "/biznes/news-1", "pap.pl/biznes"));
        assert!(domain_matches("pap.pl", "/biznes", "pap.pl/biznes"));
        assert!(!domain_matches("pap.pl", "/sport/x", "pap.pl/biznes"));
        assert!(!domain_matches("pap.pl", "/biznesowe", "pap.pl/biznes"));
    }
}
