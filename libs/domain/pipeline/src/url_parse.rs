// [libs/domain/pipeline/src/url_parse.rs]
/*!
 * Deterministic URL → (platform, handle, domain) mapping for the known-
 * account allowlist check and for platform tagging on discovered images.
 * Recognizes a fixed platform set; anything else falls through to
 * `platform = None, domain = host`.
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub platform: Option<&'static str>,
    pub handle: Option<String>,
    pub domain: String,
}

fn strip_known_subdomains(host: &str) -> &str {
    host.strip_prefix("www.").or_else(|| host.strip_prefix("m.")).unwrap_or(host)
}

fn first_path_segment(path: &str) -> Option<&str> {
    path.trim_matches('/').split('/').next().filter(|s| !s.is_empty())
}

fn segment_after<'a>(path: &'a str, marker: &str) -> Option<&'a str> {
    let trimmed = path.trim_matches('/');
    let mut parts = trimmed.split('/');
    while let Some(part) = parts.next() {
        if part == marker {
            return parts.next();
        }
    }
    None
}

/// Parses a page URL into its recognized platform, extracted handle, and
/// bare domain. Malformed URLs yield an all-`None`/empty result rather than
/// erroring, since this feeds a best-effort allowlist check.
pub fn parse_url(raw: &str) -> ParsedUrl {
    let Ok(parsed) = url::Url::parse(raw) else {
        return ParsedUrl { platform: None, handle: None, domain: String::new() };
    };

    let Some(host) = parsed.host_str() else {
        return ParsedUrl { platform: None, handle: None, domain: String::new() };
    };

    let host = strip_known_subdomains(&host.to_lowercase()).to_string();
    let path = parsed.path();

    let (platform, handle) = match host.as_str() {
        "instagram.com" => ("instagram", first_path_segment(path)),
        "twitter.com" | "x.com" => ("twitter", first_path_segment(path)),
        "tiktok.com" => ("tiktok", first_path_segment(path).map(|h| h.trim_start_matches('@'))),
        "facebook.com" => ("facebook", first_path_segment(path)),
        "linkedin.com" => ("linkedin", segment_after(path, "in")),
        "deviantart.com" => ("deviantart", first_path_segment(path)),
        "reddit.com" => ("reddit", segment_after(path, "user")),
        "civitai.com" => ("civitai", segment_after(path, "user")),
        "youtube.com" => ("youtube", first_path_segment(path).map(|h| h.trim_start_matches('@'))),
        _ => {
            return ParsedUrl { platform: None, handle: None, domain: host };
        }
    };

    ParsedUrl {
        platform: Some(platform),
        handle: handle.map(|h| h.to_lowercase()),
        domain: host,
    }
}
