use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    courseimport::logging::init().context("init logging")?;

    let cli = courseimport::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        courseimport::cli::Command::Import(args) => {
            courseimport::import::run(args).await.context("import")?;
        }
        courseimport::cli::Command::Parse(args) => {
            courseimport::import::parse(args).context("parse")?;
        }
        courseimport::cli::Command::ExportUrl(args) => {
            courseimport::import::export_url(args).context("export-url")?;
        }
        courseimport::cli::Command::Edit(args) => {
            courseimport::edit::run(args).context("edit")?;
        }
        courseimport::cli::Command::Publish(args) => {
            courseimport::store::run(args).await.context("publish")?;
        }
    }

    Ok(())
}
