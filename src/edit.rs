use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context as _;

use crate::cli::EditArgs;
use crate::formats::{ContentType, MAX_TITLE_CHARS, ParsedCourseData, truncate_chars};
use crate::output::{read_document, write_document};

/// One reviewer edit. Positions are 1-based, as shown in `module_order` /
/// `content_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    RenameCourse { name: String },
    RenameModule { module: usize, name: String },
    DeleteModule { module: usize },
    MoveModule { from: usize, to: usize },
    RenameContent { module: usize, content: usize, title: String },
    DeleteContent { module: usize, content: usize },
    MoveContent { module: usize, from: usize, to: usize },
    SetType { module: usize, content: usize, content_type: ContentType },
}

impl FromStr for EditOp {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = raw
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("edit op must look like <kind>:<args>: {raw:?}"))?;

        let op = match kind.trim() {
            "rename-course" => Self::RenameCourse {
                name: non_empty(rest)?,
            },
            "rename-module" => {
                let (module, name) = split_arg(rest)?;
                Self::RenameModule {
                    module: parse_position(module)?,
                    name: non_empty(name)?,
                }
            }
            "delete-module" => Self::DeleteModule {
                module: parse_position(rest)?,
            },
            "move-module" => {
                let (from, to) = split_arg(rest)?;
                Self::MoveModule {
                    from: parse_position(from)?,
                    to: parse_position(to)?,
                }
            }
            "rename-content" => {
                let (address, title) = split_arg(rest)?;
                let (module, content) = parse_address(address)?;
                Self::RenameContent {
                    module,
                    content,
                    title: non_empty(title)?,
                }
            }
            "delete-content" => {
                let (module, content) = parse_address(rest)?;
                Self::DeleteContent { module, content }
            }
            "move-content" => {
                let (module, positions) = split_arg(rest)?;
                let (from, to) = split_arg(positions)?;
                Self::MoveContent {
                    module: parse_position(module)?,
                    from: parse_position(from)?,
                    to: parse_position(to)?,
                }
            }
            "set-type" => {
                let (address, content_type) = split_arg(rest)?;
                let (module, content) = parse_address(address)?;
                Self::SetType {
                    module,
                    content,
                    content_type: content_type.parse()?,
                }
            }
            other => anyhow::bail!("unknown edit op: {other:?}"),
        };
        Ok(op)
    }
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RenameCourse { name } => write!(f, "rename-course:{name}"),
            Self::RenameModule { module, name } => write!(f, "rename-module:{module}:{name}"),
            Self::DeleteModule { module } => write!(f, "delete-module:{module}"),
            Self::MoveModule { from, to } => write!(f, "move-module:{from}:{to}"),
            Self::RenameContent {
                module,
                content,
                title,
            } => write!(f, "rename-content:{module}.{content}:{title}"),
            Self::DeleteContent { module, content } => {
                write!(f, "delete-content:{module}.{content}")
            }
            Self::MoveContent { module, from, to } => {
                write!(f, "move-content:{module}:{from}:{to}")
            }
            Self::SetType {
                module,
                content,
                content_type,
            } => write!(f, "set-type:{module}.{content}:{content_type}"),
        }
    }
}

/// Applies one edit and re-normalizes orders and durations.
pub fn apply(data: &mut ParsedCourseData, op: &EditOp) -> anyhow::Result<()> {
    if !data.success {
        anyhow::bail!("cannot edit a failed import");
    }

    match op {
        EditOp::RenameCourse { name } => {
            data.course.course_name = truncate_chars(name.trim(), MAX_TITLE_CHARS);
        }
        EditOp::RenameModule { module, name } => {
            let idx = index(*module, data.modules.len(), "module")?;
            data.modules[idx].module_name = truncate_chars(name.trim(), MAX_TITLE_CHARS);
        }
        EditOp::DeleteModule { module } => {
            let idx = index(*module, data.modules.len(), "module")?;
            if data.modules.len() == 1 {
                anyhow::bail!("cannot delete the only module; a course needs at least one");
            }
            data.modules.remove(idx);
        }
        EditOp::MoveModule { from, to } => {
            let from = index(*from, data.modules.len(), "module")?;
            let to = index(*to, data.modules.len(), "module")?;
            let module = data.modules.remove(from);
            data.modules.insert(to, module);
        }
        EditOp::RenameContent {
            module,
            content,
            title,
        } => {
            let (m, c) = content_index(data, *module, *content)?;
            data.modules[m].contents[c].content_title = truncate_chars(title.trim(), MAX_TITLE_CHARS);
        }
        EditOp::DeleteContent { module, content } => {
            let (m, c) = content_index(data, *module, *content)?;
            data.modules[m].contents.remove(c);
        }
        EditOp::MoveContent { module, from, to } => {
            let m = index(*module, data.modules.len(), "module")?;
            let contents = &mut data.modules[m].contents;
            let from = index(*from, contents.len(), "content item")?;
            let to = index(*to, contents.len(), "content item")?;
            let item = contents.remove(from);
            contents.insert(to, item);
        }
        EditOp::SetType {
            module,
            content,
            content_type,
        } => {
            let (m, c) = content_index(data, *module, *content)?;
            data.modules[m].contents[c].content_type = *content_type;
        }
    }

    data.renormalize();
    tracing::debug!(%op, modules = data.modules.len(), "applied edit");
    Ok(())
}

pub fn run(args: EditArgs) -> anyhow::Result<()> {
    let input_path = PathBuf::from(&args.input);
    let mut data: ParsedCourseData = read_document(&input_path).context("read course")?;

    for raw in &args.ops {
        let op: EditOp = raw.parse().with_context(|| format!("parse edit op: {raw}"))?;
        apply(&mut data, &op).with_context(|| format!("apply edit op: {op}"))?;
    }
    tracing::info!(ops = args.ops.len(), "edits applied");

    write_document(&data, args.out.as_deref(), args.format, args.force).context("write course")
}

fn index(position: usize, len: usize, what: &str) -> anyhow::Result<usize> {
    if position == 0 || position > len {
        anyhow::bail!("{what} position {position} is out of range (1..={len})");
    }
    Ok(position - 1)
}

fn content_index(
    data: &ParsedCourseData,
    module: usize,
    content: usize,
) -> anyhow::Result<(usize, usize)> {
    let m = index(module, data.modules.len(), "module")?;
    let c = index(content, data.modules[m].contents.len(), "content item")?;
    Ok((m, c))
}

fn split_arg(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once(':')
        .ok_or_else(|| anyhow::anyhow!("missing ':' separator in {raw:?}"))
}

fn non_empty(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        anyhow::bail!("name must not be empty");
    }
    Ok(trimmed.to_owned())
}

fn parse_position(raw: &str) -> anyhow::Result<usize> {
    raw.trim()
        .parse()
        .with_context(|| format!("invalid position: {raw:?}"))
}

fn parse_address(raw: &str) -> anyhow::Result<(usize, usize)> {
    let (module, content) = raw
        .split_once('.')
        .ok_or_else(|| anyhow::anyhow!("content address must look like <module>.<content>: {raw:?}"))?;
    Ok((parse_position(module)?, parse_position(content)?))
}
