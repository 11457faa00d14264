//! Tool-output truncation and overflow spooling (§4.4).

use std::path::{Path, PathBuf};

use agentcore_types::StorageError;
use rand::distributions::Alphanumeric;
use rand::Rng;

const SPOOL_DIR: &str = "agent_cpp/tool_outputs";
const SUFFIX_LEN: usize = 8;

/// Clamp `output` to `max_lines`/`max_bytes`. If either limit is exceeded,
/// the full text is spooled to a uniquely-named file under
/// `<working_dir>/agent_cpp/tool_outputs/` and the conversation carries only
/// the prefix plus a pointer line.
pub async fn truncate_output(output: &str, working_dir: &Path, max_lines: usize, max_bytes: usize) -> Result<String, StorageError> {
    let line_count = output.lines().count();
    if line_count <= max_lines && output.len() <= max_bytes {
        return Ok(output.to_string());
    }

    let prefix: String = output.lines().take(max_lines).collect::<Vec<_>>().join("\n");
    let prefix = if prefix.len() > max_bytes { truncate_at_char_boundary(&prefix, max_bytes) } else { prefix };

    let path = spool(output, working_dir).await?;
    Ok(format!("{prefix}\n\n[output truncated; full text at {}]", path.display()))
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> String {
    let mut end = max_bytes.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

async fn spool(output: &str, working_dir: &Path) -> Result<PathBuf, StorageError> {
    let dir = working_dir.join(SPOOL_DIR);
    tokio::fs::create_dir_all(&dir).await.map_err(|e| StorageError::Io(e.to_string()))?;

    let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(SUFFIX_LEN).map(char::from).collect();
    let path = dir.join(format!("output-{suffix}.txt"));
    tokio::fs::write(&path, output).await.map_err(|e| StorageError::Io(e.to_string()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn short_output_passes_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let result = truncate_output("hello", dir.path(), 2000, 51200).await.unwrap();
        assert_eq!(result, "hello");
    }

    #[tokio::test]
    async fn long_output_is_spooled_and_pointer_appended() {
        let dir = tempfile::tempdir().unwrap();
        let long = "line\n".repeat(3000);
        let result = truncate_output(&long, dir.path(), 2000, 51200).await.unwrap();
        assert!(result.contains("[output truncated"));
        assert!(dir.path().join("agent_cpp/tool_outputs").read_dir().unwrap().next().is_some());
    }

    #[tokio::test]
    async fn spooled_file_contains_full_original_text() {
        let dir = tempfile::tempdir().unwrap();
        let long = "x".repeat(60_000);
        truncate_output(&long, dir.path(), 2000, 51200).await.unwrap();
        let entry = dir.path().join("agent_cpp/tool_outputs").read_dir().unwrap().next().unwrap().unwrap();
        let contents = tokio::fs::read_to_string(entry.path()).await.unwrap();
        assert_eq!(contents, long);
    }

    #[tokio::test]
    async fn two_spools_get_distinct_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let long = "line\n".repeat(3000);
        truncate_output(&long, dir.path(), 2000, 51200).await.unwrap();
        truncate_output(&long, dir.path(), 2000, 51200).await.unwrap();
        let count = dir.path().join("agent_cpp/tool_outputs").read_dir().unwrap().count();
        assert_eq!(count, 2);
    }
}
