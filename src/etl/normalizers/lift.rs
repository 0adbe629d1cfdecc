// src/etl/normalizers/lift.rs

use crate::etl::row::Row;

/// A listing that says nothing about a lift is taken not to have one.
pub fn normalize_lift(row: &mut Row) {
    if row.get("hasLift").is_null() {
        row.set("hasLift", false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn null_becomes_false_and_values_are_kept() {
        let mut missing = Row::new("1");
        normalize_lift(&mut missing);
        assert_eq!(missing.get("hasLift"), &Value::Bool(false));

        let mut explicit_null = Row::new("2");
        explicit_null.set("hasLift", Value::Null);
        normalize_lift(&mut explicit_null);
        assert_eq!(explicit_null.get("hasLift"), &Value::Bool(false));

        let mut with_lift = Row::new("3");
        with_lift.set("hasLift", true);
        normalize_lift(&mut with_lift);
        assert_eq!(with_lift.get("hasLift"), &Value::Bool(true));
    }
}
