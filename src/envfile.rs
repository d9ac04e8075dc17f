use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Set `key=value` in a dotenv file.
///
/// The first `key=` line is replaced in place, otherwise the pair is appended.
/// All other lines (comments included) are kept as they were. A missing file
/// is created.
pub fn upsert_env_var(path: &Path, key: &str, value: &str) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let updated = upsert_in_content(&existing, key, value);
    std::fs::write(path, updated)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Saved {} to {}", key, path.display());
    Ok(())
}

fn upsert_in_content(content: &str, key: &str, value: &str) -> String {
    let new_line = format!("{}={}", key, value);
    let prefix = format!("{}=", key);

    let mut replaced = false;
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            if !replaced && line.trim_start().starts_with(&prefix) {
                replaced = true;
                new_line.clone()
            } else {
                line.to_string()
            }
        })
        .collect();

    if !replaced {
        lines.push(new_line);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
