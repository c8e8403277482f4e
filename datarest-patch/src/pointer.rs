//! RFC 6901 JSON Pointers.

use crate::error::{PatchError, PatchResult};
use serde_json::Value as Json;
use std::fmt;

/// A parsed JSON Pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// Parses `""` (the whole document) or `/a/b/0`.
    ///
    /// `~1` decodes to `/` and `~0` to `~`; any other escape is rejected.
    pub fn parse(pointer: &str) -> PatchResult<Self> {
        if pointer.is_empty() {
            return Ok(Self { tokens: Vec::new() });
        }
        let rest = pointer
            .strip_prefix('/')
            .ok_or_else(|| PatchError::malformed(format!("path '{pointer}' must start with '/'")))?;

        let tokens = rest
            .split('/')
            .map(|token| unescape(token).ok_or_else(|| {
                PatchError::malformed(format!("invalid escape in path '{pointer}'"))
            }))
            .collect::<PatchResult<Vec<_>>>()?;
        Ok(Self { tokens })
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The first token, naming the top-level property.
    pub fn head(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The pointer to the containing value and the final token.
    pub fn split_last(&self) -> Option<(JsonPointer, &str)> {
        let (last, parent) = self.tokens.split_last()?;
        Some((
            JsonPointer {
                tokens: parent.to_vec(),
            },
            last,
        ))
    }

    /// Whether `self` is a proper prefix of `other`.
    pub fn is_proper_prefix_of(&self, other: &JsonPointer) -> bool {
        self.tokens.len() < other.tokens.len() && other.tokens.starts_with(&self.tokens)
    }

    pub fn get<'a>(&self, document: &'a Json) -> Option<&'a Json> {
        document.pointer(&self.to_string())
    }

    pub fn get_mut<'a>(&self, document: &'a mut Json) -> Option<&'a mut Json> {
        document.pointer_mut(&self.to_string())
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

/// Parses an array index token. Leading zeros and signs are rejected.
pub(crate) fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return None,
        }
    }
    Some(out)
}
