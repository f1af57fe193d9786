//! Qualified object names (`owner.table`).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static QUALIFIED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\.(\w+)").expect("qualified name pattern"));

/// A table, view or sequence name with an optional schema (owner).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Schema or owner, if any.
    pub schema: Option<String>,
    /// Object name.
    pub name: String,
}

impl QualifiedName {
    /// Creates an unqualified name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Creates a name qualified with `schema`.
    #[must_use]
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Parses `owner.table` or `table`. Identifier quotes are ignored.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let unquoted = input.replace(['"', '`', '[', ']'], "");
        match QUALIFIED.captures(&unquoted) {
            Some(caps) => Self::qualified(&caps[1], &caps[2]),
            None => Self::new(unquoted.trim()),
        }
    }

    /// Fills in `schema` when the name carries no owner of its own.
    #[must_use]
    pub fn or_schema(mut self, schema: Option<&str>) -> Self {
        if self.schema.is_none() {
            self.schema = schema.map(String::from);
        }
        self
    }

    /// Returns a sibling name in the same schema.
    #[must_use]
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self {
            schema: self.schema.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
