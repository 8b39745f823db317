//! Best-effort guesses for content type and study time. Callers treat the
//! results as defaults that a reviewer may override.

use url::Url;

use crate::formats::ContentType;

const VIDEO_HOSTS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "loom.com",
    "wistia.com",
    "dailymotion.com",
];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".webm", ".m4v"];

const DOCUMENT_HOSTS: &[&str] = &[
    "docs.google.com",
    "drive.google.com",
    "notion.so",
    "notion.site",
    "office.com",
    "sharepoint.com",
    "onedrive.live.com",
    "paper.dropbox.com",
];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    ".doc", ".docx", ".ppt", ".pptx", ".xls", ".xlsx", ".odt", ".odp", ".ods",
];

const AGGREGATOR_MARKERS: &[&str] = &["playlist", "course"];

/// Lower-cased pieces of a URL the rules match against.
#[derive(Debug)]
struct UrlFacts {
    host: String,
    path: String,
}

impl UrlFacts {
    fn new(url: &str) -> Self {
        match Url::parse(url) {
            Ok(parsed) => Self {
                host: parsed.host_str().unwrap_or_default().to_ascii_lowercase(),
                path: parsed.path().to_ascii_lowercase(),
            },
            Err(_) => Self {
                host: String::new(),
                path: url.to_ascii_lowercase(),
            },
        }
    }

    fn host_is_any(&self, hosts: &[&str]) -> bool {
        hosts
            .iter()
            .any(|h| self.host == *h || self.host.ends_with(&format!(".{h}")))
    }

    fn path_ends_with_any(&self, extensions: &[&str]) -> bool {
        extensions.iter().any(|ext| self.path.ends_with(ext))
    }
}

type Rule = (fn(&UrlFacts) -> bool, ContentType);

/// Ordered; first match wins. Anything unmatched is an external link.
const CONTENT_TYPE_RULES: &[Rule] = &[
    (is_pdf, ContentType::Pdf),
    (is_video, ContentType::Video),
    (is_document, ContentType::Document),
];

fn is_pdf(url: &UrlFacts) -> bool {
    url.path.ends_with(".pdf")
}

fn is_video(url: &UrlFacts) -> bool {
    url.host_is_any(VIDEO_HOSTS) || url.path_ends_with_any(VIDEO_EXTENSIONS)
}

fn is_document(url: &UrlFacts) -> bool {
    url.host_is_any(DOCUMENT_HOSTS) || url.path_ends_with_any(DOCUMENT_EXTENSIONS)
}

pub fn infer_content_type(url: Option<&str>) -> ContentType {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return ContentType::Text;
    };
    let facts = UrlFacts::new(url);
    CONTENT_TYPE_RULES
        .iter()
        .find(|(matches, _)| matches(&facts))
        .map_or(ContentType::ExternalLink, |(_, content_type)| *content_type)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationPolicy {
    pub base: u32,
    pub long_text_threshold: usize,
    pub long_text_bonus: u32,
    pub per_url: u32,
    pub aggregator_bonus: u32,
    pub min: u32,
    pub max: u32,
}

impl DurationPolicy {
    /// Default for content items; bounds keep module sums readable.
    pub const CONTENT_ITEM: Self = Self {
        base: 30,
        long_text_threshold: 200,
        long_text_bonus: 30,
        per_url: 15,
        aggregator_bonus: 60,
        min: 15,
        max: 180,
    };

    /// One estimate for a whole row, fed every URL of that row at once.
    pub const MERGED_ROW: Self = Self::CONTENT_ITEM;

    /// Smaller base, wider bounds. Selected with `--durations rich`.
    pub const RICH: Self = Self {
        base: 15,
        min: 5,
        max: 240,
        ..Self::CONTENT_ITEM
    };

    pub fn estimate<S: AsRef<str>>(&self, description: &str, urls: &[S]) -> u32 {
        let mut minutes = self.base;
        if description.chars().count() > self.long_text_threshold {
            minutes += self.long_text_bonus;
        }
        let url_count = u32::try_from(urls.len()).unwrap_or(u32::MAX);
        minutes = minutes.saturating_add(self.per_url.saturating_mul(url_count));
        if urls.iter().any(|u| is_aggregator(u.as_ref())) {
            minutes = minutes.saturating_add(self.aggregator_bonus);
        }
        minutes.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DurationMode {
    #[default]
    Standard,
    Rich,
}

impl DurationMode {
    pub fn policy(self) -> DurationPolicy {
        match self {
            Self::Standard => DurationPolicy::CONTENT_ITEM,
            Self::Rich => DurationPolicy::RICH,
        }
    }
}

fn is_aggregator(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    AGGREGATOR_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_rules_apply_in_order() {
        let cases = [
            (Some("https://example.com/guide.pdf"), ContentType::Pdf),
            (Some("https://docs.google.com/file.PDF"), ContentType::Pdf),
            (Some("https://www.youtube.com/watch?v=abc"), ContentType::Video),
            (Some("https://youtu.be/abc"), ContentType::Video),
            (Some("https://cdn.example.com/intro.mp4"), ContentType::Video),
            (Some("https://docs.google.com/document/d/1/edit"), ContentType::Document),
            (Some("https://example.com/slides.pptx"), ContentType::Document),
            (Some("https://example.com/video1"), ContentType::ExternalLink),
            (Some("https://notyoutube.com/watch"), ContentType::ExternalLink),
            (Some("   "), ContentType::Text),
            (None, ContentType::Text),
        ];
        for (url, expected) in cases {
            assert_eq!(infer_content_type(url), expected, "url={url:?}");
        }
    }

    #[test]
    fn single_url_adds_fifteen_minutes() {
        let minutes = DurationPolicy::CONTENT_ITEM.estimate("Learn basics", &["https://example.com/video1"]);
        assert_eq!(minutes, 45);
    }

    #[test]
    fn text_only_uses_base() {
        let none: [&str; 0] = [];
        assert_eq!(DurationPolicy::CONTENT_ITEM.estimate("short", &none), 30);
        assert_eq!(DurationPolicy::CONTENT_ITEM.estimate(&"x".repeat(201), &none), 60);
        assert_eq!(DurationPolicy::CONTENT_ITEM.estimate(&"x".repeat(200), &none), 30);
    }

    #[test]
    fn aggregator_bonus_applies_once() {
        let urls = [
            "https://youtube.com/playlist?list=1",
            "https://example.com/course/rust",
        ];
        // 30 + 2 * 15 + 60
        assert_eq!(DurationPolicy::CONTENT_ITEM.estimate("", &urls), 120);
    }

    #[test]
    fn merged_row_sums_every_url_of_the_row() {
        let urls = [
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/c",
        ];
        // 30 + 3 * 15
        assert_eq!(DurationPolicy::MERGED_ROW.estimate("Read all three", &urls), 75);

        let long_row = ["https://example.com/x"; 12];
        assert_eq!(DurationPolicy::MERGED_ROW.estimate("", &long_row), 180);
    }

    #[test]
    fn estimates_are_clamped() {
        let urls = ["https://example.com/playlist"; 20];
        assert_eq!(DurationPolicy::CONTENT_ITEM.estimate(&"x".repeat(500), &urls), 180);
        assert_eq!(DurationPolicy::RICH.estimate(&"x".repeat(500), &urls), 240);
    }
}
