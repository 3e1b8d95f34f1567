//! Placeholder tokens and ordered substitution sets.

use std::fmt;

/// A literal placeholder marker of the form `{{ NAME }}`.
///
/// Tokens are exact-match, case-sensitive, and never nested.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Build the token for `name`, e.g. `TIME STAMP` → `{{ TIME STAMP }}`.
    pub fn named(name: &str) -> Self {
        Token(format!("{{{{ {name} }}}}"))
    }

    /// The literal marker text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Ordered `(token, value)` pairs, applied first to last.
///
/// Tokens must not overlap with each other or with earlier values; when they
/// do, the result depends on order and is the template author's problem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionSet {
    pairs: Vec<(Token, String)>,
}

impl SubstitutionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair. A token already present keeps its first position and
    /// takes the new value.
    pub fn push(&mut self, token: Token, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(t, _)| *t == token) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((token, value)),
        }
    }

    /// Value mapped to `token`, if any.
    pub fn get(&self, token: &Token) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Token, String)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Replace every literal occurrence of every token in `text`.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (token, value) in &self.pairs {
            if out.contains(token.as_str()) {
                out = out.replace(token.as_str(), value);
            }
        }
        out
    }

    /// Whether `text` still contains any token of this set.
    pub fn any_token_in(&self, text: &str) -> bool {
        self.pairs.iter().any(|(t, _)| text.contains(t.as_str()))
    }
}
