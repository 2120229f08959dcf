use std::cmp::Ordering;
use std::collections::BTreeMap;

use scopegate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparators supported by grant, policy and restriction conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// Equality comparison.
    Eq,
    /// Inequality comparison.
    Neq,
    /// Membership in an array value.
    In,
    /// Non-membership in an array value.
    NotIn,
    /// Greater-than comparison.
    Gt,
    /// Greater-than-or-equal comparison.
    Gte,
    /// Less-than comparison.
    Lt,
    /// Less-than-or-equal comparison.
    Lte,
    /// Case-insensitive substring comparison.
    Contains,
    /// Key presence; the value is the expected presence flag.
    Exists,
}

/// One `key → comparator → value` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    key: NonEmptyString,
    operator: ConditionOperator,
    value: Value,
}

impl Condition {
    /// Creates a validated condition clause.
    pub fn new(key: impl Into<String>, operator: ConditionOperator, value: Value) -> AppResult<Self> {
        if matches!(operator, ConditionOperator::In | ConditionOperator::NotIn) && !value.is_array()
        {
            return Err(AppError::Validation(
                "in and not_in conditions require an array value".to_owned(),
            ));
        }

        if operator == ConditionOperator::Exists && !value.is_boolean() {
            return Err(AppError::Validation(
                "exists conditions require a boolean value".to_owned(),
            ));
        }

        Ok(Self {
            key: NonEmptyString::new(key)?,
            operator,
            value,
        })
    }

    /// Returns the context key the clause reads.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Returns the comparator.
    #[must_use]
    pub fn operator(&self) -> ConditionOperator {
        self.operator
    }

    /// Returns the comparison value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    fn matches(&self, context: &ConditionContext) -> bool {
        let actual = context.get(self.key());

        match self.operator {
            ConditionOperator::Eq => values_equal(actual, &self.value),
            ConditionOperator::Neq => !values_equal(actual, &self.value),
            ConditionOperator::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|item| values_equal(actual, item))),
            ConditionOperator::NotIn => self
                .value
                .as_array()
                .is_some_and(|candidates| !candidates.iter().any(|item| values_equal(actual, item))),
            ConditionOperator::Gt => compare_values(actual, &self.value).is_some_and(Ordering::is_gt),
            ConditionOperator::Gte => {
                compare_values(actual, &self.value).is_some_and(Ordering::is_ge)
            }
            ConditionOperator::Lt => compare_values(actual, &self.value).is_some_and(Ordering::is_lt),
            ConditionOperator::Lte => {
                compare_values(actual, &self.value).is_some_and(Ordering::is_le)
            }
            ConditionOperator::Contains => {
                let needle = self.value.as_str().unwrap_or_default().to_lowercase();
                match actual {
                    Value::String(text) => text.to_lowercase().contains(needle.as_str()),
                    Value::Array(items) => items.iter().any(|item| values_equal(item, &self.value)),
                    _ => false,
                }
            }
            ConditionOperator::Exists => {
                let expected = self.value.as_bool().unwrap_or(true);
                (!actual.is_null()) == expected
            }
        }
    }
}

/// Conjunction of condition clauses. An empty set always holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet(Vec<Condition>);

impl ConditionSet {
    /// Creates a set from already validated clauses.
    #[must_use]
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self(conditions)
    }

    /// Returns a set with no clauses.
    #[must_use]
    pub fn always() -> Self {
        Self(Vec::new())
    }

    /// Parses a stored JSON blob.
    ///
    /// Accepts `null`, an array of `{key, operator, value}` clauses, or a
    /// legacy object whose entries are read as equality clauses.
    pub fn from_json(value: &Value) -> AppResult<Self> {
        match value {
            Value::Null => Ok(Self::always()),
            Value::Array(_) => {
                let clauses: Vec<Condition> =
                    serde_json::from_value(value.clone()).map_err(|error| {
                        AppError::Validation(format!("invalid condition list: {error}"))
                    })?;
                clauses
                    .into_iter()
                    .map(|clause| Condition::new(clause.key, clause.operator, clause.value))
                    .collect::<AppResult<Vec<_>>>()
                    .map(Self)
            }
            Value::Object(entries) => entries
                .iter()
                .map(|(key, expected)| {
                    let operator = if expected.is_array() {
                        ConditionOperator::In
                    } else {
                        ConditionOperator::Eq
                    };
                    Condition::new(key.as_str(), operator, expected.clone())
                })
                .collect::<AppResult<Vec<_>>>()
                .map(Self),
            _ => Err(AppError::Validation(
                "conditions must be null, an array, or an object".to_owned(),
            )),
        }
    }

    /// Serializes the set into its canonical array form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Returns the clauses.
    #[must_use]
    pub fn clauses(&self) -> &[Condition] {
        &self.0
    }

    /// Returns whether the set has no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluates every clause against the context.
    #[must_use]
    pub fn evaluate(&self, context: &ConditionContext) -> bool {
        self.0.iter().all(|condition| condition.matches(context))
    }
}

/// Flat key/value view of the principal, request, and resource used by conditions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionContext {
    values: BTreeMap<String, Value>,
}

impl ConditionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Sets an optional value; `None` leaves the key unset.
    pub fn insert_optional<T: Into<Value>>(&mut self, key: impl Into<String>, value: Option<T>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Returns the value for a key, or `null` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&Value::Null)
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Some(left_number), Some(right_number)) = (value_as_f64(left), value_as_f64(right)) {
        return (left_number - right_number).abs() < f64::EPSILON;
    }

    match (left, right) {
        (Value::String(left_text), Value::String(right_text)) => {
            left_text.eq_ignore_ascii_case(right_text)
        }
        _ => left == right,
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(left_number), Some(right_number)) = (value_as_f64(left), value_as_f64(right)) {
        return left_number.partial_cmp(&right_number);
    }

    if let (Some(left_text), Some(right_text)) = (left.as_str(), right.as_str()) {
        return Some(left_text.cmp(right_text));
    }

    None
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Condition, ConditionContext, ConditionOperator, ConditionSet};

    fn context() -> ConditionContext {
        let mut context = ConditionContext::new();
        context.insert("principal.role", "CONSULTANT");
        context.insert("time.hour", 14);
        context.insert("request.ip_address", "10.0.0.7");
        context
    }

    #[test]
    fn empty_set_always_holds() {
        assert!(ConditionSet::always().evaluate(&ConditionContext::new()));
    }

    #[test]
    fn array_form_evaluates_every_clause() {
        let set = ConditionSet::from_json(&json!([
            {"key": "time.hour", "operator": "gte", "value": 9},
            {"key": "time.hour", "operator": "lt", "value": 17}
        ]));
        assert!(set.is_ok());
        assert!(set.unwrap_or_default().evaluate(&context()));
    }

    #[test]
    fn legacy_object_form_reads_as_equality() {
        let set = ConditionSet::from_json(&json!({"principal.role": "consultant"}))
            .unwrap_or_default();
        assert_eq!(set.clauses().len(), 1);
        assert!(set.evaluate(&context()));
    }

    #[test]
    fn missing_key_compares_as_null() {
        let set = ConditionSet::new(vec![
            Condition::new("resource.id", ConditionOperator::Exists, json!(true))
                .unwrap_or_else(|_| unreachable!()),
        ]);
        assert!(!set.evaluate(&context()));
    }

    #[test]
    fn in_operator_requires_array_value() {
        let condition = Condition::new("principal.role", ConditionOperator::In, json!("x"));
        assert!(condition.is_err());
    }

    #[test]
    fn not_in_excludes_listed_values() {
        let set = ConditionSet::from_json(&json!([
            {"key": "principal.role", "operator": "not_in", "value": ["STUDENT", "RECEPTIONIST"]}
        ]))
        .unwrap_or_default();
        assert!(set.evaluate(&context()));
    }

    #[test]
    fn scalar_blob_is_rejected() {
        assert!(ConditionSet::from_json(&json!(42)).is_err());
    }
}
