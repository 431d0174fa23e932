// src/word_groups.rs
//! Parser for the frequency-words file.
//!
//! Groups are separated by blank lines. Inside a group every line is one keyword:
//!
//! ```text
//! AI
//! 人工智能
//! +发布
//! !广告
//! ```
//!
//! `+` marks a required keyword, `!` an exclusion, anything else an OR keyword.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::DigestError;
use crate::types::WordGroup;

pub const DEFAULT_WORD_GROUPS_PATH: &str = "config/frequency_words.txt";
pub const ENV_WORD_GROUPS_PATH: &str = "FREQUENCY_WORDS_PATH";

enum ParseState {
    BetweenGroups,
    InGroup(WordGroup),
}

impl ParseState {
    /// Close the current group. Only non-empty groups are emitted.
    fn flush(self, out: &mut Vec<WordGroup>) -> ParseState {
        if let ParseState::InGroup(group) = self {
            if !group.is_empty() {
                out.push(group);
            }
        }
        ParseState::BetweenGroups
    }

    fn push_line(self, line: &str) -> ParseState {
        let mut group = match self {
            ParseState::BetweenGroups => WordGroup::default(),
            ParseState::InGroup(g) => g,
        };
        if let Some(rest) = line.strip_prefix('+') {
            group.must_keywords.push(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix('!') {
            group.exclude_keywords.push(rest.trim().to_string());
        } else {
            group.keywords.push(line.to_string());
        }
        ParseState::InGroup(group)
    }
}

/// Parse rule text into keyword groups, in file order.
pub fn parse(source_text: &str) -> Vec<WordGroup> {
    let mut groups = Vec::new();
    let mut state = ParseState::BetweenGroups;

    for raw in source_text.lines() {
        let line = raw.trim();
        state = if line.is_empty() {
            state.flush(&mut groups)
        } else {
            state.push_line(line)
        };
    }
    state.flush(&mut groups);

    debug!(target: "word_groups", groups = groups.len(), "parsed keyword groups");
    groups
}

/// Read and parse a frequency-words file.
pub fn load_word_groups(path: &Path) -> Result<Vec<WordGroup>, DigestError> {
    let content = fs::read_to_string(path).map_err(|e| DigestError::config(path, e))?;
    let groups = parse(&content);
    info!(
        target: "word_groups",
        path = %path.display(),
        groups = groups.len(),
        "loaded keyword groups"
    );
    Ok(groups)
}

/// Resolve the path from `FREQUENCY_WORDS_PATH`, falling back to `config/frequency_words.txt`.
pub fn default_path() -> PathBuf {
    std::env::var(ENV_WORD_GROUPS_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_WORD_GROUPS_PATH))
}

pub fn load_word_groups_default() -> Result<Vec<WordGroup>, DigestError> {
    load_word_groups(&default_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(k: &[&str], m: &[&str], x: &[&str]) -> WordGroup {
        WordGroup {
            keywords: k.iter().map(|s| s.to_string()).collect(),
            must_keywords: m.iter().map(|s| s.to_string()).collect(),
            exclude_keywords: x.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn classifies_lines_by_prefix() {
        let groups = parse("AI\n+ chip \n!rumor\n");
        assert_eq!(groups, vec![g(&["AI"], &["chip"], &["rumor"])]);
    }

    #[test]
    fn blank_lines_split_groups() {
        let text = "AI\n人工智能\n\n特斯拉\n+发布\n\n\n\n!广告\n";
        let groups = parse(text);
        assert_eq!(
            groups,
            vec![
                g(&["AI", "人工智能"], &[], &[]),
                g(&["特斯拉"], &["发布"], &[]),
                g(&[], &[], &["广告"]),
            ]
        );
    }

    #[test]
    fn whitespace_only_lines_count_as_blank() {
        let groups = parse("a\n   \t\nb");
        assert_eq!(groups, vec![g(&["a"], &[], &[]), g(&["b"], &[], &[])]);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n  \n").is_empty());
    }

    #[test]
    fn duplicates_are_kept_verbatim() {
        let groups = parse("AI\nAI\n+x\n+x");
        assert_eq!(groups, vec![g(&["AI", "AI"], &["x", "x"], &[])]);
    }

    #[test]
    fn trailing_group_without_newline_is_kept() {
        let groups = parse("\n\nlast");
        assert_eq!(groups, vec![g(&["last"], &[], &[])]);
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_word_groups(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.is_config(), "expected config error, got {err:?}");
    }
}
