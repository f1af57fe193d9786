//! Dialect profiles.
//!
//! A [`DialectProfile`] is the data half of a dialect: DDL capabilities,
//! default type widths, pagination strategy and lexical conventions. The
//! behavior half lives in the [`Dialect`](crate::dialect::Dialect)
//! implementations, which read their profile instead of hard-coding these
//! choices.

/// How a dialect bounds a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Native `LIMIT n OFFSET m`.
    LimitOffset,
    /// Wrap the query and filter on a row-number pseudo-column.
    RowNumber,
}

/// Statement parameter placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`
    Question,
    /// `$1`, `$2`, ...
    Dollar,
    /// `:1`, `:2`, ...
    Colon,
}

impl Placeholder {
    /// Renders the placeholder for the 1-based parameter `index`.
    #[must_use]
    pub fn render(self, index: usize) -> String {
        match self {
            Self::Question => String::from("?"),
            Self::Dollar => format!("${index}"),
            Self::Colon => format!(":{index}"),
        }
    }
}

/// Schema changes a dialect can perform in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `ALTER TABLE ... DROP COLUMN`.
    pub drop_column: bool,
    /// Changing the type or nullability of an existing column.
    pub alter_column: bool,
    /// Native sequence objects.
    pub sequences: bool,
}

/// Default widths applied when a field does not declare its own size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeWidths {
    /// Text, Note and URL length.
    pub text: u32,
    /// Currency precision (scale is always 4).
    pub currency_precision: u32,
    /// Integer and Counter precision.
    pub integer_precision: u32,
    /// Long and Duration precision.
    pub long_precision: u32,
}

/// The configuration profile of a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectProfile {
    /// Profile name.
    pub name: &'static str,
    /// DDL capabilities.
    pub capabilities: Capabilities,
    /// Type width defaults.
    pub widths: TypeWidths,
    /// Pagination strategy.
    pub pagination: Pagination,
    /// Parameter placeholder style.
    pub placeholder: Placeholder,
    /// Identifier quote character.
    pub identifier_quote: char,
    /// Zero-row table for scalar selects, if the dialect requires a FROM.
    pub dummy_table: Option<&'static str>,
}

impl DialectProfile {
    /// Oracle 12c and later.
    #[must_use]
    pub const fn oracle() -> Self {
        Self {
            name: "oracle",
            capabilities: Capabilities {
                drop_column: false,
                alter_column: true,
                sequences: true,
            },
            widths: TypeWidths {
                text: 255,
                currency_precision: 19,
                integer_precision: 10,
                long_precision: 19,
            },
            pagination: Pagination::RowNumber,
            placeholder: Placeholder::Colon,
            identifier_quote: '"',
            dummy_table: Some("DUAL"),
        }
    }

    /// The earlier Oracle adapter revision: narrower longs and no in-place
    /// column changes.
    #[must_use]
    pub const fn oracle_legacy() -> Self {
        Self {
            name: "oracle-legacy",
            capabilities: Capabilities {
                drop_column: false,
                alter_column: false,
                sequences: true,
            },
            widths: TypeWidths {
                text: 255,
                currency_precision: 19,
                integer_precision: 10,
                long_precision: 10,
            },
            pagination: Pagination::RowNumber,
            placeholder: Placeholder::Colon,
            identifier_quote: '"',
            dummy_table: Some("DUAL"),
        }
    }

    /// PostgreSQL.
    #[must_use]
    pub const fn postgres() -> Self {
        Self {
            name: "postgresql",
            capabilities: Capabilities {
                drop_column: true,
                alter_column: true,
                sequences: true,
            },
            widths: TypeWidths {
                text: 255,
                currency_precision: 19,
                integer_precision: 10,
                long_precision: 19,
            },
            pagination: Pagination::LimitOffset,
            placeholder: Placeholder::Dollar,
            identifier_quote: '"',
            dummy_table: None,
        }
    }

    /// SQLite. Limited ALTER TABLE support and no sequences.
    #[must_use]
    pub const fn sqlite() -> Self {
        Self {
            name: "sqlite",
            capabilities: Capabilities {
                drop_column: false,
                alter_column: false,
                sequences: false,
            },
            widths: TypeWidths {
                text: 255,
                currency_precision: 19,
                integer_precision: 10,
                long_precision: 19,
            },
            pagination: Pagination::LimitOffset,
            placeholder: Placeholder::Question,
            identifier_quote: '"',
            dummy_table: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(Placeholder::Question.render(3), "?");
        assert_eq!(Placeholder::Dollar.render(2), "$2");
        assert_eq!(Placeholder::Colon.render(1), ":1");
    }

    #[test]
    fn test_oracle_revisions_differ_in_capabilities() {
        let current = DialectProfile::oracle();
        let legacy = DialectProfile::oracle_legacy();
        assert!(current.capabilities.alter_column);
        assert!(!legacy.capabilities.alter_column);
        assert_eq!(legacy.widths.long_precision, 10);
        assert_eq!(current.dummy_table, Some("DUAL"));
    }
}
