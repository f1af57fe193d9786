//! Abstract query expressions.
//!
//! A [`QueryExpression`] describes a select without committing to any SQL
//! dialect. The [`Formatter`](crate::formatter::Formatter) compiles it for a
//! given [`Dialect`](crate::dialect::Dialect).
//!
//! # Example
//!
//! ```rust
//! use oxide_dialect::query::{field, QueryExpression};
//!
//! let query = QueryExpression::query("person")
//!     .select([field("id"), field("name")])
//!     .where_clause(field("name").starts_with("Jo"))
//!     .order_by(field("id"))
//!     .skip(10)
//!     .take(5);
//! assert_eq!(query.take, Some(5));
//! ```

mod expr;

pub use expr::{field, value, Aggregate, BinaryOp, Expr, ScalarFunction};

/// A source entity (table or view) with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Entity name, optionally `owner.name`.
    pub name: String,
    /// Alias used to qualify fields.
    pub alias: Option<String>,
}

impl Entity {
    /// Creates an unaliased entity.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Sets the alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl From<&str> for Entity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A selected expression with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    /// The selected expression.
    pub expr: Expr,
    /// Output column name.
    pub alias: Option<String>,
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        Self { expr, alias: None }
    }
}

impl Expr {
    /// Selects this expression under `alias`.
    #[must_use]
    pub fn aliased(self, alias: impl Into<String>) -> SelectItem {
        SelectItem {
            expr: self,
            alias: Some(alias.into()),
        }
    }
}

/// Join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// A join clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join kind.
    pub kind: JoinKind,
    /// Joined entity.
    pub entity: Entity,
    /// Join condition.
    pub on: Expr,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// An ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Sorted expression.
    pub expr: Expr,
    /// Sort direction.
    pub direction: Direction,
}

/// An abstract select.
///
/// A query without a source entity is a *fixed* expression: it selects
/// constants or functions of constants.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryExpression {
    /// Source entity, `None` for fixed expressions.
    pub source: Option<Entity>,
    /// Selected items; empty means `*`.
    pub select: Vec<SelectItem>,
    /// Joins.
    pub joins: Vec<Join>,
    /// WHERE predicate.
    pub filter: Option<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// ORDER BY items.
    pub order_by: Vec<OrderBy>,
    /// SELECT DISTINCT.
    pub distinct: bool,
    /// Rows to skip.
    pub skip: Option<u64>,
    /// Rows to return.
    pub take: Option<u64>,
}

impl QueryExpression {
    /// Creates a query over `entity`.
    #[must_use]
    pub fn query(entity: impl Into<Entity>) -> Self {
        Self {
            source: Some(entity.into()),
            ..Self::default()
        }
    }

    /// Creates a fixed expression with no source entity.
    #[must_use]
    pub fn fixed() -> Self {
        Self::default()
    }

    /// Returns true if the query has no source entity.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.source.is_none()
    }

    /// Appends selected items.
    #[must_use]
    pub fn select<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SelectItem>,
    {
        self.select.extend(items.into_iter().map(Into::into));
        self
    }

    /// Adds a WHERE predicate, AND-ed with any existing one.
    #[must_use]
    pub fn where_clause(mut self, predicate: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Adds an inner join.
    #[must_use]
    pub fn join(mut self, entity: impl Into<Entity>, on: Expr) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Inner,
            entity: entity.into(),
            on,
        });
        self
    }

    /// Adds a left join.
    #[must_use]
    pub fn left_join(mut self, entity: impl Into<Entity>, on: Expr) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Left,
            entity: entity.into(),
            on,
        });
        self
    }

    /// Appends GROUP BY expressions.
    #[must_use]
    pub fn group_by(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.group_by.extend(exprs);
        self
    }

    /// Orders ascending by `expr`.
    #[must_use]
    pub fn order_by(mut self, expr: Expr) -> Self {
        self.order_by.push(OrderBy {
            expr,
            direction: Direction::Asc,
        });
        self
    }

    /// Orders descending by `expr`.
    #[must_use]
    pub fn order_by_desc(mut self, expr: Expr) -> Self {
        self.order_by.push(OrderBy {
            expr,
            direction: Direction::Desc,
        });
        self
    }

    /// Selects distinct rows.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Skips the first `n` rows.
    #[must_use]
    pub const fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    /// Returns at most `n` rows.
    #[must_use]
    pub const fn take(mut self, n: u64) -> Self {
        self.take = Some(n);
        self
    }
}

/// A statement accepted by an adapter: raw SQL passed through verbatim, or
/// a query expression compiled for the adapter's dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Literal SQL.
    Raw(String),
    /// An abstract query.
    Query(QueryExpression),
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Self::Raw(String::from(sql))
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Self::Raw(sql)
    }
}

impl From<QueryExpression> for Statement {
    fn from(query: QueryExpression) -> Self {
        Self::Query(query)
    }
}
