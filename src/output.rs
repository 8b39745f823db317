use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn render<T: Serialize>(self, value: &T) -> anyhow::Result<String> {
        match self {
            Self::Json => {
                let mut json = serde_json::to_string_pretty(value).context("serialize json")?;
                json.push('\n');
                Ok(json)
            }
            Self::Yaml => serde_yaml::to_string(value).context("serialize yaml"),
        }
    }
}

/// Writes `value` to `out`, or to stdout when `out` is `None`. Existing
/// files are only replaced with `force`.
pub fn write_document<T: Serialize>(
    value: &T,
    out: Option<&str>,
    format: OutputFormat,
    force: bool,
) -> anyhow::Result<()> {
    let rendered = format.render(value)?;

    let Some(out) = out else {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(rendered.as_bytes())
            .context("write stdout")?;
        stdout.flush().context("flush stdout")?;
        return Ok(());
    };

    let out_path = PathBuf::from(out);
    if out_path.exists() && !force {
        anyhow::bail!("output already exists: {}", out_path.display());
    }
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut file = options
        .open(&out_path)
        .with_context(|| format!("open output: {}", out_path.display()))?;
    file.write_all(rendered.as_bytes())
        .with_context(|| format!("write output: {}", out_path.display()))?;
    file.flush().context("flush output")?;

    tracing::info!(out = %out_path.display(), "wrote output");
    Ok(())
}

/// Reads a JSON or YAML document, chosen by file extension.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read input: {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        serde_yaml::from_str(&raw).with_context(|| format!("parse yaml: {}", path.display()))
    } else {
        serde_json::from_str(&raw).with_context(|| format!("parse json: {}", path.display()))
    }
}
