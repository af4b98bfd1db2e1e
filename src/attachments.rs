use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};

/// Sub-directories of the data directory that hold copied binary files.
pub const KINDS: [&str; 5] = ["photos", "submissions", "resources", "leave_docs", "notices"];

pub fn is_kind(kind: &str) -> bool {
    KINDS.contains(&kind)
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Copies `source` into `<data_dir>/<kind>/<owner>_<file name>` and returns the stored path.
/// Re-importing the same file for the same owner replaces the earlier copy.
pub fn import(data_dir: &Path, kind: &str, owner: &str, source: &Path) -> anyhow::Result<PathBuf> {
    if !is_kind(kind) {
        return Err(anyhow!("unknown attachment kind: {}", kind));
    }
    if !source.is_file() {
        return Err(anyhow!("attachment not found: {}", source.to_string_lossy()));
    }
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("attachment has no file name: {}", source.to_string_lossy()))?;

    let dir = data_dir.join(kind);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory {}", dir.to_string_lossy()))?;
    let dst = dir.join(format!("{}_{}", sanitize(owner), sanitize(file_name)));
    std::fs::copy(source, &dst).with_context(|| {
        format!(
            "failed to copy {} to {}",
            source.to_string_lossy(),
            dst.to_string_lossy()
        )
    })?;
    Ok(dst)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentCheck {
    pub exists: bool,
    pub size: Option<u64>,
}

pub fn check(path: &Path) -> AttachmentCheck {
    match std::fs::metadata(path) {
        Ok(m) if m.is_file() => AttachmentCheck {
            exists: true,
            size: Some(m.len()),
        },
        _ => AttachmentCheck {
            exists: false,
            size: None,
        },
    }
}
