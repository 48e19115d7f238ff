//! Declared glob subset for classifying untracked files (§9 "Ignore-pattern
//! contract"): comment lines, `!` negation, trailing-`/` directory-only,
//! leading-`/` root anchoring, `*`/`?` wildcards. No `**`, no bracket
//! classes — this is the entire contract, not a stand-in for Git's actual
//! `.gitignore` semantics.

use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};

#[derive(Debug, Clone)]
struct IgnorePattern {
    pattern: String,
    negated: bool,
    directory_only: bool,
    /// Anchored to the repository root (leading `/`) rather than matched
    /// at any depth via its basename.
    anchored: bool,
}

impl IgnorePattern {
    fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let (rest, negated) = match trimmed.strip_prefix('!') {
            Some(r) => (r.trim(), true),
            None => (trimmed, false),
        };
        if rest.is_empty() {
            return None;
        }

        let directory_only = rest.ends_with('/');
        let rest = if directory_only { &rest[..rest.len() - 1] } else { rest };

        let anchored = rest.starts_with('/');
        let pattern = rest.strip_prefix('/').unwrap_or(rest).to_string();

        Some(Self {
            pattern,
            negated,
            directory_only,
            anchored,
        })
    }

    fn matches(&self, path: &str, is_dir: bool) -> bool {
        if self.directory_only && !is_dir {
            return false;
        }

        if self.anchored {
            return glob_match(&self.pattern, path);
        }

        if glob_match(&self.pattern, path) {
            return true;
        }

        // Unanchored patterns without a `/` also match at any depth via the
        // path's basename.
        if !self.pattern.contains('/') {
            if let Some(basename) = Path::new(path).file_name() {
                return glob_match(&self.pattern, &basename.to_string_lossy());
            }
        }
        false
    }
}

/// Match `text` against `pattern`, where `*` matches any run of non-`/`
/// characters and `?` matches exactly one. No recursive `**`, no bracket
/// classes.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    glob_match_from(&p, &t)
}

fn glob_match_from(pattern: &[char], text: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('*') => {
            // Try consuming zero or more non-`/` characters.
            for split in 0..=text.len() {
                if text[..split].contains(&'/') {
                    break;
                }
                if glob_match_from(&pattern[1..], &text[split..]) {
                    return true;
                }
            }
            false
        }
        Some('?') => {
            match text.first() {
                Some(c) if *c != '/' => glob_match_from(&pattern[1..], &text[1..]),
                _ => false,
            }
        }
        Some(c) => matches!(text.first(), Some(t) if t == c) && glob_match_from(&pattern[1..], &text[1..]),
    }
}

/// A loaded set of ignore rules. Patterns are evaluated in file order, and
/// later matches override earlier ones — exactly the negation semantics
/// `.gitignore` itself uses.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(ignore_path: &Path) -> Result<Self> {
        if !ignore_path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(ignore_path).with_path(ignore_path)?;
        let patterns = content.lines().filter_map(IgnorePattern::parse).collect();
        Ok(Self { patterns })
    }

    pub fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        let mut ignored = false;
        for pattern in &self.patterns {
            if pattern.matches(path, is_dir) {
                ignored = !pattern.negated;
            }
        }
        ignored
    }
}

/// The name of the ignore file beneath the repository root.
pub const IGNORE_FILE_NAME: &str = ".ritignore";

pub fn load_ignore_rules(repo_root: &Path) -> Result<IgnoreRules> {
    IgnoreRules::load(&repo_root.join(IGNORE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_negation_and_directory_only() {
        let p = IgnorePattern::parse("*.log").unwrap();
        assert!(!p.negated && !p.directory_only && !p.anchored);

        let neg = IgnorePattern::parse("!important.log").unwrap();
        assert!(neg.negated);
        assert_eq!(neg.pattern, "important.log");

        let dir = IgnorePattern::parse("target/").unwrap();
        assert!(dir.directory_only);
        assert_eq!(dir.pattern, "target");
    }

    #[test]
    fn leading_slash_anchors_to_root() {
        let anchored = IgnorePattern::parse("/build").unwrap();
        assert!(anchored.anchored);
        assert!(anchored.matches("build", true));
        assert!(!anchored.matches("sub/build", true));

        let unanchored = IgnorePattern::parse("build").unwrap();
        assert!(!unanchored.anchored);
        assert!(unanchored.matches("build", true));
        assert!(unanchored.matches("sub/build", true));
    }

    #[test]
    fn star_matches_any_run_excluding_slash() {
        assert!(glob_match("*.log", "file.log"));
        assert!(!glob_match("*.log", "dir/file.log"));
        assert!(glob_match("*.log", "a.log"));
        assert!(!glob_match("*.log", "file.txt"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "ac"));
        assert!(!glob_match("a?c", "a/c"));
    }

    #[test]
    fn directory_only_pattern_skips_files() {
        let p = IgnorePattern::parse("target/").unwrap();
        assert!(p.matches("target", true));
        assert!(!p.matches("target", false));
    }

    #[test]
    fn negation_overrides_earlier_match() {
        let mut rules = IgnoreRules::new();
        rules.patterns.push(IgnorePattern::parse("*.log").unwrap());
        rules.patterns.push(IgnorePattern::parse("!important.log").unwrap());

        assert!(rules.is_ignored("file.log", false));
        assert!(!rules.is_ignored("important.log", false));
        assert!(!rules.is_ignored("file.txt", false));
    }

    #[test]
    fn loads_from_file() {
        let temp = tempdir().unwrap();
        let ignore_path = temp.path().join(".ritignore");
        fs::write(&ignore_path, "# comment\n*.log\ntarget/\n!important.log\n").unwrap();

        let rules = IgnoreRules::load(&ignore_path).unwrap();
        assert!(rules.is_ignored("file.log", false));
        assert!(rules.is_ignored("target", true));
        assert!(!rules.is_ignored("important.log", false));
    }

    #[test]
    fn missing_file_yields_empty_rules() {
        let temp = tempdir().unwrap();
        let rules = IgnoreRules::load(&temp.path().join("nope")).unwrap();
        assert!(!rules.is_ignored("anything", false));
    }
}
