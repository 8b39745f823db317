use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::Digest as _;
use uuid::Uuid;

use crate::formats::{ContentType, ParsedCourseData};

/// Everything a persistence layer needs to create one course: a course row,
/// its modules, and their content items, linked by foreign keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertBatch {
    /// Hex SHA-256 of the course document; identical imports share a key.
    pub import_key: String,
    pub course: CourseRecord,
    pub modules: Vec<ModuleRecord>,
    pub contents: Vec<ContentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: Uuid,
    pub course_name: String,
    pub course_description: String,
    pub imported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: Uuid,
    pub course_id: Uuid,
    pub module_name: String,
    pub module_description: String,
    pub module_order: u32,
    pub estimated_duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: Uuid,
    pub module_id: Uuid,
    pub content_title: String,
    pub content_description: String,
    pub content_url: String,
    pub content_type: ContentType,
    pub content_order: u32,
    pub estimated_duration_minutes: u32,
}

impl InsertBatch {
    pub fn from_course(data: &ParsedCourseData) -> anyhow::Result<Self> {
        validate(data)?;

        let import_key = import_key(data)?;
        let course = CourseRecord {
            id: Uuid::new_v4(),
            course_name: data.course.course_name.clone(),
            course_description: data.course.course_description.clone(),
            imported_at: Utc::now(),
        };

        let mut modules = Vec::with_capacity(data.modules.len());
        let mut contents = Vec::with_capacity(data.content_count());
        for module in &data.modules {
            let module_id = Uuid::new_v4();
            modules.push(ModuleRecord {
                id: module_id,
                course_id: course.id,
                module_name: module.module_name.clone(),
                module_description: module.module_description.clone(),
                module_order: module.module_order,
                estimated_duration_minutes: module.estimated_duration_minutes,
            });
            contents.extend(module.contents.iter().map(|item| ContentRecord {
                id: Uuid::new_v4(),
                module_id,
                content_title: item.content_title.clone(),
                content_description: item.content_description.clone(),
                content_url: item.content_url.clone(),
                content_type: item.content_type,
                content_order: item.content_order,
                estimated_duration_minutes: item.estimated_duration_minutes,
            }));
        }

        Ok(Self {
            import_key,
            course,
            modules,
            contents,
        })
    }
}

/// Rejects documents that must not reach persistence: failed imports,
/// empty courses, and broken order sequences (e.g. hand-edited files).
pub fn validate(data: &ParsedCourseData) -> anyhow::Result<()> {
    if !data.success {
        let reason = data.error.as_deref().unwrap_or("unknown error");
        anyhow::bail!("refusing to persist a failed import: {reason}");
    }
    if data.modules.is_empty() {
        anyhow::bail!("course has no modules");
    }
    if data.course.course_name.trim().is_empty() {
        anyhow::bail!("course name is empty");
    }
    for (idx, module) in data.modules.iter().enumerate() {
        if module.module_order as usize != idx + 1 {
            anyhow::bail!(
                "module {:?} has order {} at position {}",
                module.module_name,
                module.module_order,
                idx + 1
            );
        }
        for (content_idx, item) in module.contents.iter().enumerate() {
            if item.content_order as usize != content_idx + 1 {
                anyhow::bail!(
                    "content {:?} in module {} has order {} at position {}",
                    item.content_title,
                    module.module_order,
                    item.content_order,
                    content_idx + 1
                );
            }
        }
    }
    Ok(())
}

pub fn import_key(data: &ParsedCourseData) -> anyhow::Result<String> {
    let canonical = serde_json::to_vec(data).context("serialize course for import key")?;
    let digest = sha2::Sha256::digest(&canonical);
    Ok(hex::encode(digest))
}
