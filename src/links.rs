use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static MARKDOWN_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]\n]+)\]\(\s*((?:[^()\s]|\([^()\s]*\))+)\s*\)")
        .expect("valid markdown link regex")
});

static STRICT_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhttps?://(?:[^\s<>"'\[\]()]|\([^\s<>"'\[\]()]*\))+"#)
        .expect("valid strict url regex")
});

static LOOSE_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\bhttps?://(?:[^\s<>"'\[\]()]|\([^\s<>"'\[\]()]*\))+|\b(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,24}(?:/(?:[^\s<>"'\[\]()]|\([^\s<>"'\[\]()]*\))*)?"#,
    )
    .expect("valid loose url regex")
});

/// Bare domains without `www.` or a path are only accepted on these TLDs, so
/// that prose like `node.js` or `notes.txt` is not mistaken for a link.
const COMMON_TLDS: &[&str] = &[
    "com", "org", "net", "io", "dev", "edu", "gov", "co", "ai", "app", "info", "me", "us", "uk",
];

/// Suffixes that read as file names in prose (`React.js/Node.js`). Never
/// treated as a bare domain, even with a path.
const FILE_EXTENSIONS: &[&str] = &[
    "js", "ts", "jsx", "tsx", "md", "txt", "py", "rs", "rb", "go", "java", "json", "yaml", "yml",
    "toml", "csv", "html", "css", "sh", "exe", "zip",
];

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum UrlPattern {
    /// Only `http://` / `https://` URLs.
    Strict,
    /// Also bare domains such as `example.com/path`, prefixed with `https://`.
    #[default]
    Loose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub url: String,
    /// Label of a `[label](url)` link; `None` for bare URLs.
    pub label: Option<String>,
}

/// Extracts links from a resources cell: markdown links first, then bare
/// URLs, each in document order, without duplicates.
pub fn resolve_links(text: &str, pattern: UrlPattern) -> Vec<ResolvedLink> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    let mut masked = text.to_owned();

    for caps in MARKDOWN_LINK_REGEX.captures_iter(text) {
        let (Some(whole), Some(label), Some(target)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        masked.replace_range(whole.range(), &" ".repeat(whole.len()));

        let Some(url) = normalize_candidate(target.as_str(), pattern) else {
            tracing::debug!(target = target.as_str(), "skipping markdown link with invalid url");
            continue;
        };
        if seen.insert(dedup_key(&url)) {
            let label = label.as_str().trim();
            links.push(ResolvedLink {
                url,
                label: (!label.is_empty()).then(|| label.to_owned()),
            });
        }
    }

    let regex = match pattern {
        UrlPattern::Strict => &*STRICT_URL_REGEX,
        UrlPattern::Loose => &*LOOSE_URL_REGEX,
    };
    for found in regex.find_iter(&masked) {
        if masked[..found.start()].ends_with('@') {
            continue;
        }
        let candidate = found.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        let Some(url) = normalize_candidate(candidate, pattern) else {
            continue;
        };
        if seen.insert(dedup_key(&url)) {
            links.push(ResolvedLink { url, label: None });
        }
    }

    links
}

/// Short label for a URL: its host without a leading `www.`.
pub fn host_label(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_owned())
}

fn normalize_candidate(raw: &str, pattern: UrlPattern) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let has_scheme = raw.to_ascii_lowercase().starts_with("http://")
        || raw.to_ascii_lowercase().starts_with("https://");
    let candidate = if has_scheme {
        raw.to_owned()
    } else {
        match pattern {
            UrlPattern::Strict => return None,
            UrlPattern::Loose if looks_like_bare_domain(raw) => format!("https://{raw}"),
            UrlPattern::Loose => return None,
        }
    };

    let parsed = Url::parse(&candidate).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    parsed.host_str()?;
    Some(candidate)
}

fn looks_like_bare_domain(raw: &str) -> bool {
    let (host, has_path) = match raw.split_once('/') {
        Some((host, _)) => (host, true),
        None => (raw, false),
    };
    if !host.contains('.') || host.starts_with('.') || host.ends_with('.') {
        return false;
    }
    let host = host.to_ascii_lowercase();
    let tld = host.rsplit('.').next().unwrap_or_default();
    if FILE_EXTENSIONS.contains(&tld) {
        return false;
    }
    has_path || host.starts_with("www.") || COMMON_TLDS.contains(&tld)
}

fn dedup_key(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_owned(), |u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(links: &[ResolvedLink]) -> Vec<&str> {
        links.iter().map(|l| l.url.as_str()).collect()
    }

    #[test]
    fn markdown_and_bare_duplicate_resolves_once() {
        let links = resolve_links("[Docs](https://x.com/doc) see https://x.com/doc", UrlPattern::Loose);
        assert_eq!(urls(&links), vec!["https://x.com/doc"]);
        assert_eq!(links[0].label.as_deref(), Some("Docs"));
    }

    #[test]
    fn markdown_links_come_before_bare_urls() {
        let text = "first https://a.com/1 then [B](https://b.com/2) and https://c.com/3.";
        let links = resolve_links(text, UrlPattern::Strict);
        assert_eq!(
            urls(&links),
            vec!["https://b.com/2", "https://a.com/1", "https://c.com/3"]
        );
    }

    #[test]
    fn loose_pattern_prefixes_bare_domains() {
        let links = resolve_links("read example.com/path and www.rust-lang.org", UrlPattern::Loose);
        assert_eq!(
            urls(&links),
            vec!["https://example.com/path", "https://www.rust-lang.org"]
        );
    }

    #[test]
    fn strict_pattern_ignores_bare_domains() {
        let links = resolve_links("read example.com/path", UrlPattern::Strict);
        assert!(links.is_empty());
    }

    #[test]
    fn loose_pattern_skips_emails_and_file_names() {
        let links = resolve_links("mail bob@example.com about notes.txt and node.js", UrlPattern::Loose);
        assert!(links.is_empty(), "{links:?}");
    }

    #[test]
    fn trailing_slash_variants_are_duplicates() {
        let links = resolve_links("https://x.com https://x.com/", UrlPattern::Strict);
        assert_eq!(urls(&links), vec!["https://x.com"]);
    }

    #[test]
    fn balanced_parentheses_stay_inside_bare_urls() {
        let links = resolve_links(
            "see https://en.wikipedia.org/wiki/Rust_(programming_language) now",
            UrlPattern::Loose,
        );
        assert_eq!(
            urls(&links),
            vec!["https://en.wikipedia.org/wiki/Rust_(programming_language)"]
        );

        let links = resolve_links("(docs at https://example.com/guide)", UrlPattern::Strict);
        assert_eq!(urls(&links), vec!["https://example.com/guide"]);
    }

    #[test]
    fn markdown_target_ends_at_balancing_paren() {
        let links = resolve_links(
            "[Rust](https://en.wikipedia.org/wiki/Rust_(programming_language)) and more",
            UrlPattern::Loose,
        );
        assert_eq!(
            urls(&links),
            vec!["https://en.wikipedia.org/wiki/Rust_(programming_language)"]
        );
        assert_eq!(links[0].label.as_deref(), Some("Rust"));
    }

    #[test]
    fn file_names_with_paths_are_not_domains() {
        let links = resolve_links("built with React.js/Node.js and main.py", UrlPattern::Loose);
        assert!(links.is_empty(), "{links:?}");

        let links = resolve_links("see docs.google.com/document/d/1", UrlPattern::Loose);
        assert_eq!(urls(&links), vec!["https://docs.google.com/document/d/1"]);
    }

    #[test]
    fn host_label_strips_www() {
        assert_eq!(
            host_label("https://www.youtube.com/watch?v=1").as_deref(),
            Some("youtube.com")
        );
        assert_eq!(host_label("not a url"), None);
    }
}
