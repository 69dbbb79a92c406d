// [libs/domain/pipeline/src/allowlist.rs]
/*!
 * Given a discovered image's page URL and a contributor's declared known
 * accounts, decide whether the image is the contributor's own post — a
 * match against a known account is persisted but never triggers AI
 * detection, evidence capture, or notification.
 */

use crate::url_parse::parse_url;
use sentinel_domain_models::contributor::KnownAccount;

/// Checks `page_url` against `accounts`, preferring a platform+handle match
/// over a bare domain match. Returns `None` if `page_url` is absent or no
/// account matches.
pub fn check_allowlist<'a>(page_url: Option<&str>, accounts: &'a [KnownAccount]) -> Option<&'a KnownAccount> {
    let page_url = page_url?;
    let parsed = parse_url(page_url);

    if let (Some(platform), Some(handle)) = (parsed.platform, parsed.handle.as_deref()) {
        if let Some(account) = accounts.iter().find(|a| {
            a.platform.as_deref() == Some(platform) && a.handle.as_deref().map(str::to_lowercase).as_deref() == Some(handle)
        }) {
            return Some(account);
        }
    }

    accounts.iter().find(|a| a.domain.as_deref() == Some(parsed.domain.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn account(platform: Option<&str>, handle: Option<&str>, domain: Option<&str>) -> KnownAccount {
        KnownAccount {
            id: Uuid::new_v4(),
            contributor_id: Uuid::new_v4(),
            platform: platform.map(String::from),
            handle: handle.map(String::from),
            domain: domain.map(String::from),
        }
    }

    #[test]
    fn matches_by_platform_and_handle() {
        let accounts = vec![account(Some("instagram"), Some("jane"), None)];
        let found = check_allowlist(Some("https://instagram.com/jane"), &accounts);
        assert!(found.is_some());
    }

    #[test]
    fn falls_back_to_domain_match() {
        let accounts = vec![account(None, None, Some("janesblog.example"))];
        let found = check_allowlist(Some("https://janesblog.example/post/1"), &accounts);
        assert!(found.is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let accounts = vec![account(Some("instagram"), Some("jane"), None)];
        let found = check_allowlist(Some("https://instagram.com/someone-else"), &accounts);
        assert!(found.is_none());
    }

    #[test]
    fn absent_page_url_returns_none() {
        let accounts = vec![account(Some("instagram"), Some("jane"), None)];
        assert!(check_allowlist(None, &accounts).is_none());
    }
}
