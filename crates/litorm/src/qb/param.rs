//! Bound values collected while a statement is rendered.

use crate::value::Value;
use std::fmt::Write as _;

/// Values bound to numbered `?N` placeholders, in binding order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Value>,
}

impl ParamList {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a value and return its 1-based index.
    pub fn push(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    /// Add a value and write its placeholder into `sql`.
    pub fn bind(&mut self, sql: &mut String, value: Value) {
        let idx = self.push(value);
        let _ = write!(sql, "?{idx}");
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.params
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_in_binding_order() {
        let mut params = ParamList::new();
        let mut sql = String::new();
        params.bind(&mut sql, Value::Integer(1));
        sql.push_str(", ");
        params.bind(&mut sql, Value::Null);
        assert_eq!(sql, "?1, ?2");
        assert_eq!(params.into_vec(), vec![Value::Integer(1), Value::Null]);
    }
}
