//! Layered ignore-pattern rule sets
//!
//! Rules come from three sources, lowest precedence first: the global user
//! file (`$XDG_CONFIG_HOME/ves/ignore`), the repository-local
//! `info/exclude`, and `.vesignore` files staged in the index (scoped to
//! the directory holding them).
//!
//! Evaluation walks the scoped lists from the candidate's directory up to
//! the worktree root, then falls back to the absolute lists. Within a
//! single list the last matching rule wins; a leading `!` flips a rule into
//! an include. `*` matches within a path segment, `**` crosses segments,
//! and a trailing `/` restricts a rule to directories and their contents.

use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::error::VesError;
use anyhow::Context;
use globset::{GlobBuilder, GlobMatcher};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// In-repo ignore file name
pub const IGNORE_FILE: &str = ".vesignore";

/// One parsed rule
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    /// Pattern text after unescaping, for display
    pattern: String,
    /// `!`-prefixed rules include instead of ignore
    negated: bool,
    /// Trailing-`/` rules match directories and everything beneath them
    dir_only: bool,
    matcher: GlobMatcher,
}

impl IgnoreRule {
    /// Parse a single line; comments and blanks yield `None`
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let line = line.trim_end_matches(' ');
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (negated, rest) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        // \# and \! escape the literal character at the start of a pattern
        let rest = rest
            .strip_prefix("\\#")
            .map(|tail| format!("#{tail}"))
            .or_else(|| rest.strip_prefix("\\!").map(|tail| format!("!{tail}")))
            .unwrap_or_else(|| rest.to_string());

        let (dir_only, pattern) = match rest.strip_suffix('/') {
            Some(stripped) => (true, stripped.to_string()),
            None => (false, rest),
        };

        if pattern.is_empty() {
            return Ok(None);
        }

        // literal_separator keeps `*` inside one path segment while `**`
        // still crosses segments
        let matcher = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid ignore pattern: {pattern}"))?
            .compile_matcher();

        Ok(Some(IgnoreRule {
            pattern,
            negated,
            dir_only,
            matcher,
        }))
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Does this rule apply to `path` (worktree-relative, `/` separators)?
    fn matches(&self, path: &str) -> bool {
        if self.matcher.is_match(path) {
            return true;
        }

        // a directory rule also claims everything beneath the directory
        if self.dir_only {
            for (i, c) in path.char_indices() {
                if c == '/' && self.matcher.is_match(&path[..i]) {
                    return true;
                }
            }
        }

        false
    }
}

/// An ordered rule list from one source file
pub type RuleSet = Vec<IgnoreRule>;

/// Parse the lines of one ignore file
pub fn parse_rules(content: &str) -> anyhow::Result<RuleSet> {
    let mut rules = Vec::new();
    for line in content.lines() {
        if let Some(rule) = IgnoreRule::parse(line)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// Last-match-wins verdict of one rule list, `None` when nothing matched
fn check_one(rules: &RuleSet, path: &str) -> Option<bool> {
    let mut verdict = None;
    for rule in rules {
        if rule.matches(path) {
            verdict = Some(!rule.negated);
        }
    }
    verdict
}

/// All ignore rules applicable to a repository
#[derive(Debug, Default)]
pub struct IgnoreStack {
    /// Repository-local list first, then the global list
    absolute: Vec<RuleSet>,
    /// Directory (worktree-relative, `""` for the root) -> its rule list
    scoped: BTreeMap<String, RuleSet>,
}

impl IgnoreStack {
    /// Gather rules from every source for a repository
    ///
    /// Scoped `.vesignore` lists are read from the staged blobs in the
    /// index, so un-staged edits to an ignore file take effect only once
    /// the file is added.
    pub fn load(repository: &Repository) -> anyhow::Result<Self> {
        let mut stack = IgnoreStack::default();

        let exclude_path = repository.ves_dir().join("info").join("exclude");
        if exclude_path.is_file() {
            let content = std::fs::read_to_string(&exclude_path)
                .with_context(|| format!("failed to read {}", exclude_path.display()))?;
            stack.absolute.push(parse_rules(&content)?);
        }

        if let Some(global_path) = global_ignore_path() {
            if global_path.is_file() {
                let content = std::fs::read_to_string(&global_path)
                    .with_context(|| format!("failed to read {}", global_path.display()))?;
                stack.absolute.push(parse_rules(&content)?);
            }
        }

        let index = repository.load_index()?;
        for entry in index.entries() {
            let dir = match entry.name.as_str() {
                IGNORE_FILE => String::new(),
                name if name.ends_with(&format!("/{IGNORE_FILE}")) => {
                    name[..name.len() - IGNORE_FILE.len() - 1].to_string()
                }
                _ => continue,
            };

            let blob = repository
                .database()
                .parse_object_as_blob(&entry.oid)?
                .ok_or_else(|| ignore_blob_error(&entry.oid))?;
            let content = String::from_utf8_lossy(blob.content()).into_owned();
            stack.scoped.insert(dir, parse_rules(&content)?);
        }

        Ok(stack)
    }

    /// Build a stack from in-memory rule sets (tests and tooling)
    pub fn from_rules(absolute: Vec<RuleSet>, scoped: BTreeMap<String, RuleSet>) -> Self {
        IgnoreStack { absolute, scoped }
    }

    /// Is `path` ignored? Pure function of the loaded rules.
    ///
    /// `path` must be relative to the worktree root with `/` separators.
    pub fn check(&self, path: &str) -> anyhow::Result<bool> {
        if Path::new(path).is_absolute() {
            anyhow::bail!(VesError::InvalidPath(format!(
                "check-ignore requires a worktree-relative path, got {path}"
            )));
        }

        if let Some(verdict) = self.check_scoped(path) {
            return Ok(verdict);
        }

        Ok(self.check_absolute(path))
    }

    /// Walk the scoped lists from the candidate's directory to the root;
    /// the first list with a verdict decides
    fn check_scoped(&self, path: &str) -> Option<bool> {
        let mut dir = parent_dir(path);

        loop {
            if let Some(rules) = self.scoped.get(&dir) {
                if let Some(verdict) = check_one(rules, path) {
                    return Some(verdict);
                }
            }
            if dir.is_empty() {
                return None;
            }
            dir = parent_dir(&dir);
        }
    }

    /// Repository-local list first, then the global list
    fn check_absolute(&self, path: &str) -> bool {
        for rules in &self.absolute {
            if let Some(verdict) = check_one(rules, path) {
                return verdict;
            }
        }
        false
    }
}

fn ignore_blob_error(oid: &ObjectId) -> anyhow::Error {
    VesError::MalformedObject(format!("staged {IGNORE_FILE} {oid} is not a blob")).into()
}

fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(i) => path[..i].to_string(),
        None => String::new(),
    }
}

/// Location of the global user ignore file
fn global_ignore_path() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|config_home| config_home.join("ves").join("ignore"))
}
