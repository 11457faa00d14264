//! System-prompt assembly via an upward directory walk (§4.5).

use std::path::{Path, PathBuf};

/// Candidate instruction filenames, checked at each directory level in this
/// priority order; the first match at a level wins.
const LEVEL_CANDIDATES: &[&str] = &[
    "AGENTS.md",
    ".agent-sdk/AGENTS.md",
    ".agents/AGENTS.md",
    ".opencode/AGENTS.md",
    "CLAUDE.md",
    ".claude/CLAUDE.md",
];

/// Global candidates under the user's home directory, checked once
/// regardless of working-directory depth. Not specified verbatim by name;
/// mirrors [`LEVEL_CANDIDATES`]'s first four entries at the home root.
const GLOBAL_CANDIDATES: &[&str] = &[
    "AGENTS.md",
    ".agent-sdk/AGENTS.md",
    ".agents/AGENTS.md",
    ".claude/CLAUDE.md",
];

/// Walk from `start` upward to the nearest version-control root (a `.git`
/// directory) or the filesystem root, collecting the first matching
/// candidate at each level. Returned in specific-to-general order (nearest
/// directory first).
fn discover_upward(start: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut current = Some(start.to_path_buf());
    while let Some(dir) = current {
        for candidate in LEVEL_CANDIDATES {
            let path = dir.join(candidate);
            if path.is_file() {
                found.push(path);
                break;
            }
        }
        if dir.join(".git").exists() {
            break;
        }
        current = dir.parent().map(Path::to_path_buf);
    }
    found
}

/// The (at most four) global instruction files present under `home`.
fn discover_global(home: &Path) -> Vec<PathBuf> {
    GLOBAL_CANDIDATES.iter().map(|c| home.join(c)).filter(|p| p.is_file()).collect()
}

/// Assemble the full system prompt: `base` followed by every discovered
/// instruction file, most general first, each wrapped with an
/// `Instructions from: <path>` header (§4.5 "System-prompt assembly").
pub fn assemble(base: &str, working_dir: &Path, home_dir: Option<&Path>) -> String {
    let mut files = Vec::new();
    if let Some(home) = home_dir {
        files.extend(discover_global(home));
    }
    files.extend(discover_upward(working_dir));
    files.reverse();

    let mut prompt = base.to_string();
    for path in files {
        if let Ok(content) = std::fs::read_to_string(&path) {
            prompt.push_str(&format!("\n\nInstructions from: {}\n{content}", path.display()));
        }
    }
    prompt
}
