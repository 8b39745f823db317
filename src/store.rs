use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::batch::InsertBatch;
use crate::cli::PublishArgs;
use crate::fetch::FetchConfig;
use crate::formats::ParsedCourseData;
use crate::output::read_document;

const DEFAULT_STORE_DIR: &str = "course-batches";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreMode {
    File,
    Rest,
}

impl StoreMode {
    pub fn from_env() -> anyhow::Result<Self> {
        let raw = std::env::var("COURSEIMPORT_STORE").unwrap_or_else(|_| "file".to_owned());
        Self::parse(&raw).with_context(|| {
            format!("invalid COURSEIMPORT_STORE={raw:?}. expected one of: file, rest")
        })
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "file" => Ok(Self::File),
            "rest" => Ok(Self::Rest),
            other => anyhow::bail!("unsupported store: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreReceipt {
    pub course_id: Uuid,
    pub import_key: String,
    pub modules: usize,
    pub contents: usize,
    pub location: String,
}

impl StoreReceipt {
    fn new(batch: &InsertBatch, location: String) -> Self {
        Self {
            course_id: batch.course.id,
            import_key: batch.import_key.clone(),
            modules: batch.modules.len(),
            contents: batch.contents.len(),
            location,
        }
    }
}

/// Persists a whole insert batch, or nothing.
#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn insert_batch(&self, batch: &InsertBatch) -> anyhow::Result<StoreReceipt>;
}

/// Writes each batch to `<dir>/<import_key>.json`.
#[derive(Debug, Clone)]
pub struct LocalFsCourseStore {
    base_dir: PathBuf,
}

impl LocalFsCourseStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn from_env() -> Self {
        let dir = std::env::var("COURSEIMPORT_STORE_DIR")
            .ok()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_DIR.to_owned());
        Self::new(dir)
    }

    fn batch_path(&self, import_key: &str) -> PathBuf {
        self.base_dir.join(format!("{import_key}.json"))
    }
}

#[async_trait]
impl CourseStore for LocalFsCourseStore {
    async fn insert_batch(&self, batch: &InsertBatch) -> anyhow::Result<StoreReceipt> {
        let path = self.batch_path(&batch.import_key);
        let data = serde_json::to_vec_pretty(batch).context("serialize course batch")?;

        let target = path.clone();
        let persisted = tokio::task::spawn_blocking(move || persist_new(&target, &data))
            .await
            .context("join course batch writer")?;
        match persisted {
            Ok(()) => Ok(StoreReceipt::new(batch, path.to_string_lossy().to_string())),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => anyhow::bail!(
                "course batch already stored (same import key): {}",
                path.display()
            ),
            Err(err) => {
                Err(err).with_context(|| format!("write course batch: {}", path.display()))
            }
        }
    }
}

/// Inserts into a PostgREST-style row store (`/rest/v1/<table>`).
#[derive(Debug, Clone)]
pub struct RestCourseStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestCourseStore {
    pub fn new(base_url: &str, api_key: &str, config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .context("build rest store http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("COURSEIMPORT_REST_URL")
            .context("COURSEIMPORT_REST_URL is required for the rest store")?;
        if base_url.trim().is_empty() {
            anyhow::bail!("COURSEIMPORT_REST_URL is empty");
        }
        let api_key = std::env::var("COURSEIMPORT_REST_KEY")
            .context("COURSEIMPORT_REST_KEY is required for the rest store")?;
        let api_key = api_key.trim().to_owned();
        if api_key.is_empty() {
            anyhow::bail!("COURSEIMPORT_REST_KEY is empty");
        }
        let config = FetchConfig::from_env().context("load http config")?;
        Self::new(base_url.trim(), &api_key, &config)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    async fn insert_rows<T: Serialize + Sync>(&self, table: &str, rows: &[T]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.table_url(table);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        let status = resp.status();
        if status.is_success() {
            tracing::debug!(table, rows = rows.len(), "inserted rows");
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("insert into {table} failed ({status}): {body}");
    }

    async fn delete_course(&self, course_id: Uuid) -> anyhow::Result<()> {
        let url = format!("{}?id=eq.{course_id}", self.table_url("courses"));
        let resp = self
            .client
            .delete(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("DELETE {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("delete course failed ({status})");
        }
        Ok(())
    }

    async fn insert_children(&self, batch: &InsertBatch) -> anyhow::Result<()> {
        self.insert_rows("modules", &batch.modules)
            .await
            .context("insert modules")?;
        self.insert_rows("module_contents", &batch.contents)
            .await
            .context("insert module contents")?;
        Ok(())
    }
}

#[async_trait]
impl CourseStore for RestCourseStore {
    async fn insert_batch(&self, batch: &InsertBatch) -> anyhow::Result<StoreReceipt> {
        self.insert_rows("courses", std::slice::from_ref(&batch.course))
            .await
            .context("insert course")?;

        if let Err(err) = self.insert_children(batch).await {
            tracing::warn!(
                course_id = %batch.course.id,
                error = %format!("{err:#}"),
                "child insert failed; removing course"
            );
            if let Err(cleanup) = self.delete_course(batch.course.id).await {
                tracing::error!(
                    course_id = %batch.course.id,
                    error = %format!("{cleanup:#}"),
                    "failed to remove partially inserted course"
                );
            }
            return Err(err);
        }

        Ok(StoreReceipt::new(
            batch,
            format!("{}?id=eq.{}", self.table_url("courses"), batch.course.id),
        ))
    }
}

pub async fn run(args: PublishArgs) -> anyhow::Result<()> {
    let input_path = PathBuf::from(&args.input);
    let data: ParsedCourseData = read_document(&input_path).context("read course")?;
    let batch = InsertBatch::from_course(&data).context("build insert batch")?;

    let mode = match args.store {
        Some(mode) => mode,
        None => StoreMode::from_env()?,
    };
    let store: Box<dyn CourseStore> = match mode {
        StoreMode::File => Box::new(LocalFsCourseStore::from_env()),
        StoreMode::Rest => Box::new(RestCourseStore::from_env()?),
    };

    tracing::info!(
        ?mode,
        import_key = %batch.import_key,
        modules = batch.modules.len(),
        contents = batch.contents.len(),
        "publish course"
    );
    let receipt = store.insert_batch(&batch).await.context("store course")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&receipt).context("serialize receipt")?
    );
    Ok(())
}

/// Writes `data` to a temp file beside `path`, then links it into place only
/// if `path` does not exist yet. The temp file is removed on every failure.
fn persist_new(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "batch path has no parent dir")
    })?;
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(path).map_err(|err| err.error)?;
    Ok(())
}
