//! Repo-scoped configuration: a minimal `key = value`, `[section]`-grouped
//! file at `<meta>/config`. Absence is not an error — every lookup falls
//! back to a hardcoded default.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};

pub const DEFAULT_BRANCH: &str = "master";

/// Parsed `[section]` / `key = value` pairs, flattened to `"section.key"`.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `config_path`, or return an empty (all-default) config if
    /// the file doesn't exist.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(config_path).with_path(config_path)?;
        Ok(Self::parse(&content))
    }

    fn parse(content: &str) -> Self {
        let mut values = HashMap::new();
        let mut section = String::new();

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                section = line[1..line.len() - 1].trim().to_string();
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();
                let full_key = if section.is_empty() {
                    key.to_string()
                } else {
                    format!("{}.{}", section, key)
                };
                values.insert(full_key, value.to_string());
            }
        }

        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| match v {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        })
    }

    /// `core.defaultBranch`, falling back to [`DEFAULT_BRANCH`].
    pub fn default_branch(&self) -> &str {
        self.get("core.defaultBranch").unwrap_or(DEFAULT_BRANCH)
    }

    /// `core.bare`, falling back to `false`.
    pub fn is_bare(&self) -> bool {
        self.get_bool("core.bare").unwrap_or(false)
    }

    pub fn write(&self, config_path: &Path) -> Result<()> {
        let mut sections: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
        for (full_key, value) in &self.values {
            match full_key.split_once('.') {
                Some((section, key)) => sections.entry(section).or_default().push((key, value)),
                None => sections.entry("").or_default().push((full_key, value)),
            }
        }

        let mut out = String::new();
        let mut section_names: Vec<&&str> = sections.keys().collect();
        section_names.sort();
        for section in section_names {
            if !section.is_empty() {
                out.push_str(&format!("[{}]\n", section));
            }
            let mut pairs = sections[section].clone();
            pairs.sort();
            for (key, value) in pairs {
                out.push_str(&format!("\t{} = {}\n", key, value));
            }
        }

        fs::write(config_path, out).with_path(config_path)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}
