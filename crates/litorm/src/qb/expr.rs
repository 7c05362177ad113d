//! Predicate trees for WHERE and JOIN ... ON clauses.
//!
//! Leaves are built from typed fields (`Planet::NAME.eq("Mars")`) and combined
//! with [`Expr::and`], [`Expr::or`], [`or`] and [`not`]. Rendering numbers each
//! bound value as it is written, so the placeholder order always matches the
//! order values are pushed into the [`ParamList`].
//!
//! ```ignore
//! use litorm::qb::{self, or};
//!
//! let pred = or([
//!     Planet::NAME.eq("Mars"),
//!     Planet::NAME.eq("Venus"),
//! ])
//! .and(Planet::GALAXY_ID.eq(1i64));
//! // (Planet.name = ?1 OR Planet.name = ?2) AND Planet.galaxyID = ?3
//! ```

use crate::error::OrmError;
use crate::ident;
use crate::qb::param::ParamList;
use crate::record::{Field, Record};
use crate::row::ColumnRef;
use crate::value::{ToValue, Value, ValueError};
use std::fmt;

/// Comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "LIKE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// Bound as a parameter.
    Value(Value),
    /// Another column, e.g. in a join condition.
    Column(ColumnRef),
}

/// Predicate node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `left op right`
    Compare {
        left: ColumnRef,
        op: Op,
        right: Operand,
    },

    /// Both sides must hold.
    And(Box<Expr>, Box<Expr>),

    /// At least one must hold. Empty is always false.
    Or(Vec<Expr>),

    Not(Box<Expr>),

    /// `column IS NULL` / `column IS NOT NULL`
    NullCheck { column: ColumnRef, is_null: bool },

    /// `column IN (...)`. Empty is always false.
    InList { column: ColumnRef, values: Vec<Value> },

    /// A comparison whose value failed to encode. Builders refuse to render it.
    Unencodable { column: ColumnRef, message: String },
}

impl Expr {
    /// Conjunction of `self` and `other`.
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    /// Disjunction of `self` and `other`, flattened into an existing OR list.
    pub fn or(self, other: Expr) -> Expr {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            first => Expr::Or(vec![first, other]),
        }
    }

    /// Number of values this predicate binds.
    pub fn param_count(&self) -> usize {
        match self {
            Expr::Compare {
                right: Operand::Value(_),
                ..
            } => 1,
            Expr::Compare { .. } | Expr::NullCheck { .. } | Expr::Unencodable { .. } => 0,
            Expr::And(a, b) => a.param_count() + b.param_count(),
            Expr::Or(list) => list.iter().map(Expr::param_count).sum(),
            Expr::Not(inner) => inner.param_count(),
            Expr::InList { values, .. } => values.len(),
        }
    }

    /// The first value in this tree that failed to encode, as a builder error.
    pub fn encode_error(&self) -> Option<OrmError> {
        match self {
            Expr::Unencodable { column, message } => Some(OrmError::builder(format!(
                "cannot encode value compared with {column}: {message}"
            ))),
            Expr::And(a, b) => a.encode_error().or_else(|| b.encode_error()),
            Expr::Or(list) => list.iter().find_map(Expr::encode_error),
            Expr::Not(inner) => inner.encode_error(),
            Expr::Compare { .. } | Expr::NullCheck { .. } | Expr::InList { .. } => None,
        }
    }

    /// Render with `?N` placeholders, pushing bound values into `params`.
    pub fn build(&self, params: &mut ParamList) -> String {
        let mut sql = String::new();
        self.write(&mut sql, params);
        sql
    }

    pub(crate) fn write(&self, sql: &mut String, params: &mut ParamList) {
        match self {
            Expr::Compare { left, op, right } => {
                write_column(sql, left);
                sql.push(' ');
                sql.push_str(op.as_str());
                sql.push(' ');
                match right {
                    Operand::Value(v) => params.bind(sql, v.clone()),
                    Operand::Column(c) => write_column(sql, c),
                }
            }
            Expr::And(a, b) => {
                a.write_operand(sql, params);
                sql.push_str(" AND ");
                b.write_operand(sql, params);
            }
            Expr::Or(list) if list.is_empty() => sql.push_str("1=0"),
            Expr::Or(list) => {
                sql.push('(');
                for (i, e) in list.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" OR ");
                    }
                    e.write_operand(sql, params);
                }
                sql.push(')');
            }
            Expr::Not(inner) => {
                sql.push_str("NOT ");
                if matches!(**inner, Expr::Or(ref list) if !list.is_empty()) {
                    inner.write(sql, params);
                } else {
                    sql.push('(');
                    inner.write(sql, params);
                    sql.push(')');
                }
            }
            Expr::NullCheck { column, is_null } => {
                write_column(sql, column);
                sql.push_str(if *is_null { " IS NULL" } else { " IS NOT NULL" });
            }
            Expr::InList { values, .. } if values.is_empty() => sql.push_str("1=0"),
            Expr::Unencodable { .. } => sql.push_str("1=0"),
            Expr::InList { column, values } => {
                write_column(sql, column);
                sql.push_str(" IN (");
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    params.bind(sql, v.clone());
                }
                sql.push(')');
            }
        }
    }

    /// Render as an operand of AND/OR: nested conjunctions get parentheses.
    fn write_operand(&self, sql: &mut String, params: &mut ParamList) {
        if matches!(self, Expr::And(..)) {
            sql.push('(');
            self.write(sql, params);
            sql.push(')');
        } else {
            self.write(sql, params);
        }
    }
}

fn write_column(sql: &mut String, column: &ColumnRef) {
    ident::write_qualified(sql, column.table(), column.column());
}

/// Disjunction of all `exprs`: `(a OR b OR c)`. Empty renders `1=0`.
pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Or(exprs.into_iter().collect())
}

/// Negation: `NOT (expr)`.
pub fn not(expr: Expr) -> Expr {
    Expr::Not(Box::new(expr))
}

/// Conjunction of the predicates passed to repeated `.filter` calls.
#[derive(Clone, Debug, Default)]
pub struct ExprGroup {
    exprs: Vec<Expr>,
}

impl ExprGroup {
    pub fn new() -> Self {
        Self { exprs: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn and_expr(&mut self, expr: Expr) {
        self.exprs.push(expr);
    }

    pub(crate) fn encode_error(&self) -> Option<OrmError> {
        self.exprs.iter().find_map(Expr::encode_error)
    }

    /// Render the conjunction. A single predicate renders bare; with several,
    /// each compound predicate is parenthesized.
    pub(crate) fn write(&self, sql: &mut String, params: &mut ParamList) {
        match self.exprs.as_slice() {
            [] => {}
            [single] => single.write(sql, params),
            many => {
                for (i, e) in many.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" AND ");
                    }
                    e.write_operand(sql, params);
                }
            }
        }
    }

    /// Append ` WHERE ...` when the group is not empty.
    pub(crate) fn write_where(&self, sql: &mut String, params: &mut ParamList) {
        if !self.is_empty() {
            sql.push_str(" WHERE ");
            self.write(sql, params);
        }
    }
}

impl<R: Record, T: ToValue> Field<R, T> {
    fn compare(self, op: Op, value: Result<Value, ValueError>) -> Expr {
        match value {
            Ok(value) => Expr::Compare {
                left: self.column_ref(),
                op,
                right: Operand::Value(value),
            },
            Err(e) => Expr::Unencodable {
                column: self.column_ref(),
                message: e.to_string(),
            },
        }
    }

    /// `column = value`. A NULL value renders `column IS NULL`.
    pub fn eq(self, value: impl Into<T>) -> Expr {
        match value.into().to_value() {
            Ok(Value::Null) => self.is_null(),
            value => self.compare(Op::Eq, value),
        }
    }

    /// `column != value`. A NULL value renders `column IS NOT NULL`.
    pub fn ne(self, value: impl Into<T>) -> Expr {
        match value.into().to_value() {
            Ok(Value::Null) => self.is_not_null(),
            value => self.compare(Op::Ne, value),
        }
    }

    /// `column > value`
    pub fn gt(self, value: impl Into<T>) -> Expr {
        self.compare(Op::Gt, value.into().to_value())
    }

    /// `column >= value`
    pub fn gte(self, value: impl Into<T>) -> Expr {
        self.compare(Op::Gte, value.into().to_value())
    }

    /// `column < value`
    pub fn lt(self, value: impl Into<T>) -> Expr {
        self.compare(Op::Lt, value.into().to_value())
    }

    /// `column <= value`
    pub fn lte(self, value: impl Into<T>) -> Expr {
        self.compare(Op::Lte, value.into().to_value())
    }

    /// `column LIKE pattern`
    pub fn like(self, pattern: impl Into<String>) -> Expr {
        self.compare(Op::Like, Ok(Value::Text(pattern.into())))
    }

    pub fn is_null(self) -> Expr {
        Expr::NullCheck {
            column: self.column_ref(),
            is_null: true,
        }
    }

    pub fn is_not_null(self) -> Expr {
        Expr::NullCheck {
            column: self.column_ref(),
            is_null: false,
        }
    }

    /// `column IN (values...)`
    pub fn in_list<V: Into<T>>(self, values: impl IntoIterator<Item = V>) -> Expr {
        let values: Result<Vec<Value>, ValueError> =
            values.into_iter().map(|v| v.into().to_value()).collect();
        match values {
            Ok(values) => Expr::InList {
                column: self.column_ref(),
                values,
            },
            Err(e) => Expr::Unencodable {
                column: self.column_ref(),
                message: e.to_string(),
            },
        }
    }

    /// `column = other_column`, typically a join condition.
    ///
    /// The value types may differ in nullability (`i64` against `Option<i64>`).
    pub fn eq_field<S: Record, U>(self, other: Field<S, U>) -> Expr {
        Expr::Compare {
            left: self.column_ref(),
            op: Op::Eq,
            right: Operand::Column(other.column_ref()),
        }
    }
}
