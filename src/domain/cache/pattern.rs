//! Glob patterns for bulk cache invalidation.
//!
//! Only `*` is special. `prefix*`, `*suffix`, `prefix*suffix` and a bare `*`
//! are the common shapes; several wildcards are accepted too.

use std::fmt;

/// A key pattern where `*` matches any run of characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern(String);

impl KeyPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Pattern matching every key.
    pub fn all() -> Self {
        Self("*".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, key: &str) -> bool {
        let mut parts = self.0.split('*');
        // split always yields at least one item
        let first = parts.next().unwrap_or("");
        let rest: Vec<&str> = parts.collect();

        if rest.is_empty() {
            return key == first;
        }
        if !key.starts_with(first) {
            return false;
        }

        let mut remaining = &key[first.len()..];
        let (last, middle) = match rest.split_last() {
            Some(split) => split,
            None => return true,
        };

        for part in middle {
            if part.is_empty() {
                continue;
            }
            match remaining.find(part) {
                Some(idx) => remaining = &remaining[idx + part.len()..],
                None => return false,
            }
        }

        remaining.len() >= last.len() && remaining.ends_with(last)
    }

    /// Redis `MATCH` syntax under `key_prefix`, with Redis-only
    /// metacharacters escaped. The prefix is always literal.
    pub fn to_redis_glob(&self, key_prefix: &str) -> String {
        let mut glob = String::with_capacity(key_prefix.len() + self.0.len() + 4);
        for ch in key_prefix.chars() {
            push_escaped(&mut glob, ch, true);
        }
        for ch in self.0.chars() {
            push_escaped(&mut glob, ch, false);
        }
        glob
    }
}

fn push_escaped(glob: &mut String, ch: char, escape_star: bool) {
    if matches!(ch, '?' | '[' | ']' | '\\') || (escape_star && ch == '*') {
        glob.push('\\');
    }
    glob.push(ch);
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}
