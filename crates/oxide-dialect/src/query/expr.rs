//! Expression nodes.

use crate::value::{SqlValue, ToSqlValue};

/// Creates a field reference. `"entity.name"` qualifies the field and `"*"`
/// selects everything.
#[must_use]
pub fn field(name: &str) -> Expr {
    match name.split_once('.') {
        Some((entity, name)) => Expr::Field {
            entity: Some(String::from(entity)),
            name: String::from(name),
        },
        None => Expr::Field {
            entity: None,
            name: String::from(name),
        },
    }
}

/// Creates a literal value.
#[must_use]
pub fn value<T: ToSqlValue>(value: T) -> Expr {
    Expr::Value(value.to_sql_value())
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Returns the precedence of the operator (higher = binds tighter).
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => 3,
            Self::Add | Self::Sub => 4,
            Self::Mul | Self::Div | Self::Mod => 5,
        }
    }

    pub(crate) const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

/// Abstract scalar functions, translated per dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunction {
    /// Zero-based position of `args[1]` in `args[0]`, -1 when absent.
    IndexOf,
    Concat,
    /// `args[1]` is a zero-based start offset, `args[2]` an optional length.
    Substring,
    Length,
    Ceiling,
    Floor,
    Round,
    ToLower,
    ToUpper,
    Trim,
    StartsWith,
    Contains,
    EndsWith,
    Day,
    Month,
    Year,
    Hour,
    Minute,
    Second,
    /// Truncates a timestamp to its date.
    DateOnly,
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Min,
    Max,
    Sum,
    Avg,
}

impl Aggregate {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }
}

/// A node of an abstract query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A field, optionally qualified with an entity name or alias.
    Field {
        /// Entity name or alias.
        entity: Option<String>,
        /// Field name.
        name: String,
    },
    /// A literal value.
    Value(SqlValue),
    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Logical negation.
    Not(Box<Expr>),
    /// `IS NULL` / `IS NOT NULL`.
    IsNull {
        /// Tested expression.
        expr: Box<Expr>,
        /// `IS NOT NULL` when true.
        negated: bool,
    },
    /// `IN (...)` / `NOT IN (...)`.
    In {
        /// Tested expression.
        expr: Box<Expr>,
        /// Candidate values.
        list: Vec<Expr>,
        /// `NOT IN` when true.
        negated: bool,
    },
    /// A scalar function call.
    Function {
        /// Function.
        function: ScalarFunction,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// An aggregate over an expression.
    Aggregate {
        /// Aggregate function.
        function: Aggregate,
        /// Aggregated expression.
        expr: Box<Expr>,
    },
    /// Raw SQL, emitted verbatim.
    ///
    /// **Warning**: Only use this for SQL fragments that don't contain user input.
    Raw(String),
}

impl Expr {
    fn binary(self, op: BinaryOp, right: impl Into<Self>) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    fn call(function: ScalarFunction, args: Vec<Self>) -> Self {
        Self::Function { function, args }
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Eq, other)
    }

    /// Creates an inequality expression.
    #[must_use]
    pub fn not_eq(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::NotEq, other)
    }

    /// Creates a less-than expression.
    #[must_use]
    pub fn lt(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    /// Creates a less-than-or-equal expression.
    #[must_use]
    pub fn lt_eq(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::LtEq, other)
    }

    /// Creates a greater-than expression.
    #[must_use]
    pub fn gt(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    /// Creates a greater-than-or-equal expression.
    #[must_use]
    pub fn gt_eq(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::GtEq, other)
    }

    /// Creates an addition.
    #[must_use]
    pub fn add(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Add, other)
    }

    /// Creates a subtraction.
    #[must_use]
    pub fn sub(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Sub, other)
    }

    /// Creates a multiplication.
    #[must_use]
    pub fn mul(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Mul, other)
    }

    /// Creates a division.
    #[must_use]
    pub fn div(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Div, other)
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::And, other)
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Or, other)
    }

    /// Negates the expression with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Creates an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// Creates an IS NOT NULL expression.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// Creates an IN expression.
    #[must_use]
    pub fn in_list<T: Into<Self>>(self, values: Vec<T>) -> Self {
        Self::In {
            expr: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// Creates a NOT IN expression.
    #[must_use]
    pub fn not_in_list<T: Into<Self>>(self, values: Vec<T>) -> Self {
        Self::In {
            expr: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// `indexOf(self, search)`.
    #[must_use]
    pub fn index_of(self, search: impl Into<Self>) -> Self {
        Self::call(ScalarFunction::IndexOf, vec![self, search.into()])
    }

    /// `concat(self, other)`.
    #[must_use]
    pub fn concat(self, other: impl Into<Self>) -> Self {
        Self::call(ScalarFunction::Concat, vec![self, other.into()])
    }

    /// `substring(self, start, length)` with a zero-based `start`.
    #[must_use]
    pub fn substring(self, start: i64, length: Option<i64>) -> Self {
        let mut args = vec![self, value(start)];
        if let Some(length) = length {
            args.push(value(length));
        }
        Self::call(ScalarFunction::Substring, args)
    }

    /// `length(self)`.
    #[must_use]
    pub fn length(self) -> Self {
        Self::call(ScalarFunction::Length, vec![self])
    }

    /// `ceiling(self)`.
    #[must_use]
    pub fn ceiling(self) -> Self {
        Self::call(ScalarFunction::Ceiling, vec![self])
    }

    /// `floor(self)`.
    #[must_use]
    pub fn floor(self) -> Self {
        Self::call(ScalarFunction::Floor, vec![self])
    }

    /// `round(self, digits)`.
    #[must_use]
    pub fn round(self, digits: Option<i64>) -> Self {
        let mut args = vec![self];
        if let Some(digits) = digits {
            args.push(value(digits));
        }
        Self::call(ScalarFunction::Round, args)
    }

    /// `toLower(self)`.
    #[must_use]
    pub fn to_lower(self) -> Self {
        Self::call(ScalarFunction::ToLower, vec![self])
    }

    /// `toUpper(self)`.
    #[must_use]
    pub fn to_upper(self) -> Self {
        Self::call(ScalarFunction::ToUpper, vec![self])
    }

    /// `trim(self)`.
    #[must_use]
    pub fn trim(self) -> Self {
        Self::call(ScalarFunction::Trim, vec![self])
    }

    /// `startsWith(self, prefix)`.
    #[must_use]
    pub fn starts_with(self, prefix: impl Into<Self>) -> Self {
        Self::call(ScalarFunction::StartsWith, vec![self, prefix.into()])
    }

    /// `contains(self, search)`.
    #[must_use]
    pub fn contains(self, search: impl Into<Self>) -> Self {
        Self::call(ScalarFunction::Contains, vec![self, search.into()])
    }

    /// `endsWith(self, suffix)`.
    #[must_use]
    pub fn ends_with(self, suffix: impl Into<Self>) -> Self {
        Self::call(ScalarFunction::EndsWith, vec![self, suffix.into()])
    }

    /// `day(self)`.
    #[must_use]
    pub fn day(self) -> Self {
        Self::call(ScalarFunction::Day, vec![self])
    }

    /// `month(self)`.
    #[must_use]
    pub fn month(self) -> Self {
        Self::call(ScalarFunction::Month, vec![self])
    }

    /// `year(self)`.
    #[must_use]
    pub fn year(self) -> Self {
        Self::call(ScalarFunction::Year, vec![self])
    }

    /// `hour(self)`.
    #[must_use]
    pub fn hour(self) -> Self {
        Self::call(ScalarFunction::Hour, vec![self])
    }

    /// `minute(self)`.
    #[must_use]
    pub fn minute(self) -> Self {
        Self::call(ScalarFunction::Minute, vec![self])
    }

    /// `second(self)`.
    #[must_use]
    pub fn second(self) -> Self {
        Self::call(ScalarFunction::Second, vec![self])
    }

    /// `date(self)`: the date part of a timestamp.
    #[must_use]
    pub fn date_only(self) -> Self {
        Self::call(ScalarFunction::DateOnly, vec![self])
    }

    fn aggregate(self, function: Aggregate) -> Self {
        Self::Aggregate {
            function,
            expr: Box::new(self),
        }
    }

    /// `COUNT(self)`.
    #[must_use]
    pub fn count(self) -> Self {
        self.aggregate(Aggregate::Count)
    }

    /// `MIN(self)`.
    #[must_use]
    pub fn min(self) -> Self {
        self.aggregate(Aggregate::Min)
    }

    /// `MAX(self)`.
    #[must_use]
    pub fn max(self) -> Self {
        self.aggregate(Aggregate::Max)
    }

    /// `SUM(self)`.
    #[must_use]
    pub fn sum(self) -> Self {
        self.aggregate(Aggregate::Sum)
    }

    /// `AVG(self)`.
    #[must_use]
    pub fn avg(self) -> Self {
        self.aggregate(Aggregate::Avg)
    }

    /// Returns the field name this expression is addressed by in a result
    /// row, if it has a natural one.
    #[must_use]
    pub fn natural_alias(&self) -> Option<&str> {
        match self {
            Self::Field { name, .. } if name != "*" => Some(name),
            Self::Aggregate { expr, .. } => expr.natural_alias(),
            _ => None,
        }
    }
}

impl From<SqlValue> for Expr {
    fn from(value: SqlValue) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Value(SqlValue::Text(String::from(value)))
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self::Value(SqlValue::Text(value))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::Value(SqlValue::Int(value))
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Self::Value(SqlValue::Int(i64::from(value)))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::Value(SqlValue::Float(value))
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Value(SqlValue::Bool(value))
    }
}
