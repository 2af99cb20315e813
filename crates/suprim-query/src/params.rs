//! Parameter accumulation for statement builds.

use crate::dialect::SqlDialect;
use suprim_core::{Result, Value};

/// Per-build accumulator assigning stable placeholder names to literal
/// values encountered during lowering.
///
/// Names are `p1, p2, ...` in registration order; the counter is monotonic
/// per build. A context is created fresh for each `build()` call and
/// discarded afterwards — it is never shared between builds.
#[derive(Debug, Default)]
pub struct ParameterContext {
    values: Vec<(String, Value)>,
    counter: usize,
}

impl ParameterContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value, returning its placeholder name (without the `:`
    /// prefix).
    pub fn register(&mut self, value: Value) -> String {
        self.counter += 1;
        let name = format!("p{}", self.counter);
        self.values.push((name.clone(), value));
        name
    }

    /// The accumulated name/value pairs, in registration order.
    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    /// Consume the context, yielding the ordered parameter map.
    pub fn into_values(self) -> Vec<(String, Value)> {
        self.values
    }

    /// Look up a registered value by placeholder name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The literal-rendering mode of one render pass: inline literals, or named
/// placeholders registered in a [`ParameterContext`].
#[derive(Debug)]
pub enum Binding<'a> {
    Inline,
    Bound(&'a mut ParameterContext),
}

impl Binding<'_> {
    /// Render one literal value in the current mode. Bound mode applies the
    /// dialect's value-type cast to the placeholder.
    pub fn literal(&mut self, dialect: &SqlDialect, value: &Value) -> Result<String> {
        match self {
            Binding::Inline => dialect.format_value(value),
            Binding::Bound(ctx) => {
                let sql_type = value.sql_type();
                let name = ctx.register(value.clone());
                Ok(dialect.cast_placeholder(&format!(":{name}"), &sql_type))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_names_are_monotonic() {
        let mut ctx = ParameterContext::new();
        assert_eq!(ctx.register(Value::Int(1)), "p1");
        assert_eq!(ctx.register(Value::Int(2)), "p2");
        assert_eq!(ctx.register(Value::Text("x".into())), "p3");
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("p2"), Some(&Value::Int(2)));
    }

    #[test]
    fn fresh_contexts_are_independent() {
        let mut first = ParameterContext::new();
        first.register(Value::Int(1));
        first.register(Value::Int(2));

        let mut second = ParameterContext::new();
        assert_eq!(second.register(Value::Int(9)), "p1");
    }

    #[test]
    fn bound_literal_registers_value() {
        let dialect = SqlDialect::postgres();
        let mut ctx = ParameterContext::new();
        let mut binding = Binding::Bound(&mut ctx);
        let sql = binding.literal(&dialect, &Value::Text("hi".into())).unwrap();
        assert_eq!(sql, ":p1");
        assert_eq!(ctx.values(), &[("p1".to_string(), Value::Text("hi".into()))]);
    }

    #[test]
    fn inline_literal_does_not_register() {
        let dialect = SqlDialect::postgres();
        let mut binding = Binding::Inline;
        let sql = binding.literal(&dialect, &Value::Int(5)).unwrap();
        assert_eq!(sql, "5");
    }
}
