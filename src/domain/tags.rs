use std::fmt;
use std::str::FromStr;

use crate::app::{Result, ZeitgeistError};

/// Leading marker that turns a token into a removal.
pub const REMOVE_MARKER: char = '-';

/// Parsed form of a tag mutation such as `"cats, funny, -dogs"`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagExpression {
    add: Vec<String>,
    remove: Vec<String>,
}

impl TagExpression {
    pub fn parse(expression: &str) -> Result<Self> {
        let mut parsed = Self::default();

        for token in expression.split(',').map(str::trim) {
            if token.is_empty() {
                continue;
            }
            match token.strip_prefix(REMOVE_MARKER) {
                Some(name) => {
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(ZeitgeistError::InvalidTagExpression(expression.to_string()));
                    }
                    parsed.remove.push(name.to_string());
                }
                None => parsed.add.push(token.to_string()),
            }
        }

        if parsed.is_empty() {
            return Err(ZeitgeistError::InvalidTagExpression(expression.to_string()));
        }
        Ok(parsed)
    }

    pub fn additions(&self) -> &[String] {
        &self.add
    }

    pub fn removals(&self) -> &[String] {
        &self.remove
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Apply the expression to a tag list, keeping the existing order.
    pub fn apply(&self, tags: &mut Vec<String>) {
        tags.retain(|tag| !self.remove.contains(tag));
        for tag in &self.add {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
}

impl FromStr for TagExpression {
    type Err = ZeitgeistError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TagExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self
            .add
            .iter()
            .cloned()
            .chain(self.remove.iter().map(|tag| format!("{}{}", REMOVE_MARKER, tag)))
            .collect();
        f.write_str(&tokens.join(","))
    }
}
