//! Compiles query expressions into dialect SQL.

use crate::dialect::{Dialect, FunctionArg};
use crate::name::QualifiedName;
use crate::query::{BinaryOp, Direction, Entity, Expr, QueryExpression, SelectItem, Statement};
use crate::value::SqlValue;

/// Precedence of unary and postfix forms (`NOT`, `IS NULL`, `IN`).
const UNARY_PRECEDENCE: u8 = 3;

/// SQL formatter for a dialect.
///
/// With `force_alias` on, plain field selections are aliased with their own
/// name (`"t"."name" AS "name"`) so result rows can be addressed by
/// attribute name whatever the backend reports. Aggregates over a field take
/// the field name as alias in both modes.
#[derive(Clone, Copy)]
pub struct Formatter<'d> {
    dialect: &'d dyn Dialect,
    force_alias: bool,
}

impl<'d> Formatter<'d> {
    /// Creates a formatter with `force_alias` enabled.
    #[must_use]
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            force_alias: true,
        }
    }

    /// Enables or disables forced field aliases.
    #[must_use]
    pub const fn force_alias(mut self, enabled: bool) -> Self {
        self.force_alias = enabled;
        self
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Returns the SQL text of a statement.
    #[must_use]
    pub fn compile(&self, statement: &Statement) -> String {
        match statement {
            Statement::Raw(sql) => sql.clone(),
            Statement::Query(query) => self.format(query),
        }
    }

    /// Compiles a query expression.
    #[must_use]
    pub fn format(&self, query: &QueryExpression) -> String {
        let mut sql = String::from("SELECT ");
        if query.distinct {
            sql.push_str("DISTINCT ");
        }

        if query.select.is_empty() {
            sql.push('*');
        } else {
            let items: Vec<String> = query
                .select
                .iter()
                .map(|item| self.format_select_item(item))
                .collect();
            sql.push_str(&items.join(", "));
        }

        match (&query.source, self.dialect.profile().dummy_table) {
            (Some(entity), _) => {
                sql.push_str(" FROM ");
                sql.push_str(&self.format_entity(entity));
            }
            (None, Some(dummy)) => {
                sql.push_str(" FROM ");
                sql.push_str(dummy);
            }
            (None, None) => {}
        }

        for join in &query.joins {
            sql.push(' ');
            sql.push_str(join.kind.as_str());
            sql.push(' ');
            sql.push_str(&self.format_entity(&join.entity));
            let on = self.format_expr(&join.on);
            if !on.is_empty() {
                sql.push_str(" ON ");
                sql.push_str(&on);
            }
        }

        if let Some(filter) = &query.filter {
            let predicate = self.format_expr(filter);
            if !predicate.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&predicate);
            }
        }

        if !query.group_by.is_empty() {
            let groups: Vec<String> = query.group_by.iter().map(|e| self.format_expr(e)).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&groups.join(", "));
        }

        if !query.order_by.is_empty() {
            let orders: Vec<String> = query
                .order_by
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{} {dir}", self.format_expr(&o.expr))
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }

        self.dialect
            .compile_pagination(&sql, query.skip, query.take)
    }

    /// Compiles an expression. Returns an empty string for an empty
    /// predicate.
    #[must_use]
    pub fn format_expr(&self, expr: &Expr) -> String {
        self.format_with_precedence(expr, 0)
    }

    fn format_select_item(&self, item: &SelectItem) -> String {
        let sql = self.format_expr(&item.expr);
        let alias = item.alias.as_deref().or_else(|| match &item.expr {
            Expr::Field { .. } if self.force_alias => item.expr.natural_alias(),
            Expr::Aggregate { .. } => item.expr.natural_alias(),
            _ => None,
        });
        match alias {
            Some(alias) => format!("{sql} AS {}", self.dialect.escape_identifier(alias)),
            None => sql,
        }
    }

    fn format_entity(&self, entity: &Entity) -> String {
        let name = self
            .dialect
            .qualified_identifier(&QualifiedName::parse(&entity.name));
        match &entity.alias {
            Some(alias) => format!("{name} {}", self.dialect.escape_identifier(alias)),
            None => name,
        }
    }

    fn format_with_precedence(&self, expr: &Expr, parent: u8) -> String {
        match expr {
            Expr::Field { entity, name } => {
                let column = if name == "*" {
                    String::from("*")
                } else {
                    self.dialect.escape_identifier(name)
                };
                match entity {
                    Some(entity) => format!("{}.{column}", self.dialect.escape_identifier(entity)),
                    None => column,
                }
            }
            Expr::Value(value) => self.dialect.escape(value, false),
            Expr::Binary { left, op, right } => self.format_binary(left, *op, right, parent),
            Expr::Not(inner) => {
                let inner = self.format_with_precedence(inner, 0);
                if inner.is_empty() {
                    inner
                } else {
                    format!("NOT ({inner})")
                }
            }
            Expr::IsNull { expr, negated } => {
                let sql = self.format_with_precedence(expr, UNARY_PRECEDENCE + 1);
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                wrap(format!("{sql} {keyword}"), UNARY_PRECEDENCE, parent)
            }
            Expr::In {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    let never = if *negated { "1 = 1" } else { "1 = 0" };
                    return wrap(String::from(never), UNARY_PRECEDENCE, parent);
                }
                let sql = self.format_with_precedence(expr, UNARY_PRECEDENCE + 1);
                let values: Vec<String> = list.iter().map(|v| self.format_expr(v)).collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                wrap(
                    format!("{sql} {keyword} ({})", values.join(", ")),
                    UNARY_PRECEDENCE,
                    parent,
                )
            }
            Expr::Function { function, args } => {
                let compiled: Vec<String> = args.iter().map(|a| self.format_expr(a)).collect();
                let function_args: Vec<FunctionArg<'_>> = compiled
                    .iter()
                    .zip(args)
                    .map(|(sql, arg)| FunctionArg {
                        sql: sql.as_str(),
                        literal: match arg {
                            Expr::Value(value) => Some(value),
                            _ => None,
                        },
                    })
                    .collect();
                self.dialect.compile_function(*function, &function_args)
            }
            Expr::Aggregate { function, expr } => {
                format!("{}({})", function.as_str(), self.format_expr(expr))
            }
            Expr::Raw(sql) => sql.clone(),
        }
    }

    fn format_binary(&self, left: &Expr, op: BinaryOp, right: &Expr, parent: u8) -> String {
        let precedence = op.precedence();

        if op.is_logical() {
            let l = self.format_with_precedence(left, precedence);
            let r = self.format_with_precedence(right, precedence);
            return match (l.is_empty(), r.is_empty()) {
                (true, true) => String::new(),
                (true, false) => wrap(r, precedence, parent),
                (false, true) => wrap(l, precedence, parent),
                (false, false) => wrap(format!("{l} {} {r}", op.as_str()), precedence, parent),
            };
        }

        let l = self.format_with_precedence(left, precedence);
        if matches!(right, Expr::Value(SqlValue::Null)) {
            match op {
                BinaryOp::Eq => return wrap(format!("{l} IS NULL"), precedence, parent),
                BinaryOp::NotEq => return wrap(format!("{l} IS NOT NULL"), precedence, parent),
                _ => {}
            }
        }
        let r = self.format_with_precedence(right, precedence + 1);
        wrap(format!("{l} {} {r}", op.as_str()), precedence, parent)
    }
}

fn wrap(sql: String, precedence: u8, parent: u8) -> String {
    if precedence < parent {
        format!("({sql})")
    } else {
        sql
    }
}
