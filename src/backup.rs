use anyhow::{anyhow, Context};
use serde_json::json;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DATA_PREFIX: &str = "data/";
const DATA_DIR: &str = "data";
pub const BUNDLE_FORMAT_V1: &str = "academicd-workspace-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub files_restored: usize,
}

/// Every file under `dir`, relative to it, in a stable order. Temp files are skipped.
fn collect_files(dir: &Path, rel: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.to_string_lossy()))?
        .collect::<Result<_, _>>()
        .with_context(|| format!("failed to list {}", dir.to_string_lossy()))?;
    entries.sort_by_key(|e| e.file_name());
    for ent in entries {
        let path = ent.path();
        let name = ent.file_name();
        let rel_path = rel.join(&name);
        if path.is_dir() {
            collect_files(&path, &rel_path, out)?;
        } else if path.is_file() && !name.to_string_lossy().ends_with(".tmp") {
            out.push(rel_path);
        }
    }
    Ok(())
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let data_dir = workspace_path.join(DATA_DIR);
    if !data_dir.is_dir() {
        return Err(anyhow!(
            "workspace data directory not found: {}",
            data_dir.to_string_lossy()
        ));
    }
    let mut files = Vec::new();
    collect_files(&data_dir, Path::new(""), &mut files)?;

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let entry_names: Vec<String> = files
        .iter()
        .map(|rel| {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            format!("{}{}", DATA_PREFIX, parts.join("/"))
        })
        .collect();

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "sourceWorkspace": workspace_path.to_string_lossy(),
        "files": entry_names,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (rel, entry) in files.iter().zip(&entry_names) {
        zip.start_file(entry.as_str(), opts)
            .with_context(|| format!("failed to start entry {}", entry))?;
        let src = data_dir.join(rel);
        let mut f = File::open(&src)
            .with_context(|| format!("failed to open {}", src.to_string_lossy()))?;
        std::io::copy(&mut f, &mut zip).with_context(|| format!("failed to write entry {}", entry))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: entry_names.len() + 1,
    })
}

/// Restores a bundle's data directory into `workspace_path`, replacing the current one. The
/// bundle is fully extracted to a staging directory before anything live is touched.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    if !is_zip_file(in_path)? {
        return Err(anyhow!(
            "not a workspace bundle: {}",
            in_path.to_string_lossy()
        ));
    }
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let staging = workspace_path.join("data.importing");
    if staging.exists() {
        std::fs::remove_dir_all(&staging).with_context(|| {
            format!("failed to clear staging {}", staging.to_string_lossy())
        })?;
    }
    std::fs::create_dir_all(&staging)
        .with_context(|| format!("failed to create staging {}", staging.to_string_lossy()))?;

    let mut restored = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("failed to read bundle entry")?;
        if entry.is_dir() {
            continue;
        }
        let Some(name) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(anyhow!("unsafe entry path in bundle: {}", entry.name()));
        };
        let Ok(rel) = name.strip_prefix(DATA_DIR) else {
            continue;
        };
        let dst = staging.join(rel);
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
        }
        let mut out = File::create(&dst)
            .with_context(|| format!("failed to create {}", dst.to_string_lossy()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract {}", entry.name()))?;
        out.flush().context("failed to flush extracted file")?;
        restored += 1;
    }

    let live = workspace_path.join(DATA_DIR);
    let replaced = workspace_path.join("data.replaced");
    if replaced.exists() {
        std::fs::remove_dir_all(&replaced)
            .with_context(|| format!("failed to clear {}", replaced.to_string_lossy()))?;
    }
    if live.exists() {
        std::fs::rename(&live, &replaced).with_context(|| {
            format!("failed to move aside {}", live.to_string_lossy())
        })?;
    }
    std::fs::rename(&staging, &live).with_context(|| {
        format!("failed to move restored data to {}", live.to_string_lossy())
    })?;
    if replaced.exists() {
        let _ = std::fs::remove_dir_all(&replaced);
    }

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        files_restored: restored,
    })
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
