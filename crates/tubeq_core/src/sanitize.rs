use std::collections::HashSet;

use url::Url;

/// Video platform hosts accepted by the sanitizer, matched exactly or as a
/// parent domain (`music.youtube.com`, `m.youtube.com`).
pub const ALLOWED_HOSTS: [&str; 2] = ["youtube.com", "youtu.be"];

/// Splits pasted text into distinct, allow-listed links in first-seen order.
///
/// Entries are separated by newlines or commas. Anything that is not an
/// http(s) URL on an allowed host is dropped without error.
pub fn sanitize_links(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .filter(|candidate| is_allowed_link(candidate))
        .filter(|candidate| seen.insert(normalize_url_for_dedupe(candidate)))
        .map(ToOwned::to_owned)
        .collect()
}

pub fn is_allowed_link(candidate: &str) -> bool {
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    url.host_str().is_some_and(is_allowed_host)
}

fn is_allowed_host(host: &str) -> bool {
    let host = host.trim_end_matches('.');
    ALLOWED_HOSTS.iter().any(|allowed| {
        host == *allowed
            || host
                .strip_suffix(allowed)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Comparison key for URL uniqueness: scheme and host lower-cased, fragment
/// and trailing slash removed. Path and query keep their case (video ids are
/// case-sensitive).
pub fn normalize_url_for_dedupe(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(url) = Url::parse(trimmed) else {
        return trimmed.to_ascii_lowercase();
    };

    let mut key = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        key.push_str(&format!(":{port}"));
    }
    key.push_str(url.path().trim_end_matches('/'));
    if let Some(query) = url.query() {
        key.push('?');
        key.push_str(query);
    }
    key
}

/// Video id from the common link shapes: `youtu.be/<id>`, `watch?v=<id>`,
/// `/shorts/<id>` and `/embed/<id>`.
pub fn extract_video_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?;

    if host == "youtu.be" {
        return url
            .path_segments()?
            .next()
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned);
    }
    if !host.ends_with("youtube.com") {
        return None;
    }
    if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v") {
        if !id.is_empty() {
            return Some(id.into_owned());
        }
    }
    let segments: Vec<&str> = url.path_segments()?.collect();
    segments
        .windows(2)
        .find(|pair| matches!(pair[0], "shorts" | "embed") && !pair[1].is_empty())
        .map(|pair| pair[1].to_owned())
}

pub fn thumbnail_url(raw: &str) -> Option<String> {
    extract_video_id(raw).map(|id| format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_newlines_and_commas_and_keeps_order() {
        let raw = " https://youtu.be/b ,https://www.youtube.com/watch?v=a\n\n https://youtu.be/c\r\n";
        assert_eq!(
            sanitize_links(raw),
            vec![
                "https://youtu.be/b".to_string(),
                "https://www.youtube.com/watch?v=a".to_string(),
                "https://youtu.be/c".to_string(),
            ]
        );
    }

    #[test]
    fn drops_foreign_hosts_and_garbage() {
        let raw = "https://example.com/watch?v=a\nnot a url\nftp://youtu.be/x\nhttps://notyoutube.com/x\nhttps://youtube.com.evil.io/x";
        assert!(sanitize_links(raw).is_empty());
    }

    #[test]
    fn accepts_subdomains_of_allowed_hosts() {
        assert!(is_allowed_link("https://music.youtube.com/watch?v=a"));
        assert!(is_allowed_link("https://m.youtube.com/watch?v=a"));
        assert!(is_allowed_link("http://youtu.be/a"));
    }

    #[test]
    fn output_has_no_duplicates_and_only_allowed_hosts() {
        let raw = "https://youtu.be/a\nhttps://YOUTU.BE/a/\nhttps://youtu.be/a#t=3,https://example.org,https://youtu.be/A";
        let links = sanitize_links(raw);
        assert_eq!(
            links,
            vec!["https://youtu.be/a".to_string(), "https://youtu.be/A".to_string()]
        );
        let keys: HashSet<_> = links.iter().map(|l| normalize_url_for_dedupe(l)).collect();
        assert_eq!(keys.len(), links.len());
        assert!(links.iter().all(|l| is_allowed_link(l)));
    }

    #[test]
    fn video_ids_from_common_shapes() {
        assert_eq!(extract_video_id("https://youtu.be/abc123"), Some("abc123".into()));
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=xyz&list=1"),
            Some("xyz".into())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/short1"),
            Some("short1".into())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/emb1"),
            Some("emb1".into())
        );
        assert_eq!(extract_video_id("https://www.youtube.com/feed"), None);
        assert_eq!(
            thumbnail_url("https://youtu.be/abc123"),
            Some("https://i.ytimg.com/vi/abc123/mqdefault.jpg".into())
        );
    }
}
