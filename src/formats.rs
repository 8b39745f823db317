use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Titles and module names are cut to this many characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Used for a module whose content items add up to zero minutes.
pub const DEFAULT_MODULE_DURATION_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Text,
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "External Link")]
    ExternalLink,
    Video,
    Document,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Pdf => "PDF",
            Self::ExternalLink => "External Link",
            Self::Video => "Video",
            Self::Document => "Document",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "text" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            "external link" | "link" => Ok(Self::ExternalLink),
            "video" => Ok(Self::Video),
            "document" | "doc" => Ok(Self::Document),
            _ => anyhow::bail!(
                "unknown content type: {raw:?}. expected one of: Text, PDF, External Link, Video, Document"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInfo {
    pub course_name: String,
    pub course_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCourseData {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub course: CourseInfo,
    pub modules: Vec<ParsedModule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ParsedCourseData {
    pub fn failure(err: &ImportError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            course: CourseInfo::default(),
            modules: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Rewrites `module_order` / `content_order` to 1..=n in current vector
    /// order and recomputes module durations.
    pub fn renormalize(&mut self) {
        for (idx, module) in self.modules.iter_mut().enumerate() {
            module.module_order = position(idx);
            for (content_idx, item) in module.contents.iter_mut().enumerate() {
                item.content_order = position(content_idx);
            }
            module.recompute_duration();
        }
    }

    pub fn content_count(&self) -> usize {
        self.modules.iter().map(|m| m.contents.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedModule {
    pub module_name: String,
    pub module_description: String,
    pub module_order: u32,
    pub estimated_duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<String>,
    pub contents: Vec<ParsedContentItem>,
}

impl ParsedModule {
    pub fn recompute_duration(&mut self) {
        let total: u32 = self
            .contents
            .iter()
            .map(|c| c.estimated_duration_minutes)
            .sum();
        self.estimated_duration_minutes = if total == 0 {
            DEFAULT_MODULE_DURATION_MINUTES
        } else {
            total
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedContentItem {
    pub content_title: String,
    pub content_description: String,
    pub content_url: String,
    pub content_type: ContentType,
    pub content_order: u32,
    pub estimated_duration_minutes: u32,
}

/// Cuts `text` to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_owned(),
        None => text.to_owned(),
    }
}

pub(crate) fn position(idx: usize) -> u32 {
    u32::try_from(idx + 1).unwrap_or(u32::MAX)
}
