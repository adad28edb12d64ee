//! Filter predicates built from per-entity whitelists.
//!
//! A predicate never carries user text as a column. Columns come from a
//! `FilterField` implementation, which is a closed enumeration declared next
//! to each model.

use chrono::NaiveDate;
use thiserror::Error;

/// Comparison operator of a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    In,
    NotIn,
    Like,
    ILike,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
        }
    }

    /// `IN` and `NOT IN` take a sequence, everything else a scalar.
    pub fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

/// How a predicate joins the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    /// SQL `NULL` for nullable write columns. Filters use `PredicateValue::Absent` instead.
    Null,
}

impl SqlValue {
    /// Text form used when building `%value%` patterns.
    pub fn to_pattern_text(&self) -> String {
        match self {
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Text(v) => v.clone(),
            SqlValue::Bool(v) => v.to_string(),
            SqlValue::Date(v) => v.format("%Y-%m-%d").to_string(),
            SqlValue::Null => String::new(),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<Option<NaiveDate>> for SqlValue {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::Date)
    }
}

/// The right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    /// Not supplied. The predicate is left out of the query entirely.
    Absent,
    Scalar(SqlValue),
    List(Vec<SqlValue>),
}

impl PredicateValue {
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        PredicateValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PredicateValue::Absent)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for PredicateValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => PredicateValue::Scalar(v.into()),
            None => PredicateValue::Absent,
        }
    }
}

impl From<SqlValue> for PredicateValue {
    fn from(value: SqlValue) -> Self {
        PredicateValue::Scalar(value)
    }
}

/// A filter key an entity exposes to callers.
pub trait FilterField: Copy {
    /// External key, as it appears in query strings.
    fn key(self) -> &'static str;
    /// Trusted column reference rendered into SQL.
    fn column(self) -> &'static str;
    fn allowed_operators(self) -> &'static [Operator];
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredicateError {
    #[error("operator {operator} is not allowed for filter '{field}'")]
    OperatorNotAllowed {
        field: &'static str,
        operator: &'static str,
    },

    #[error("filter '{field}' with operator {operator} expects a {expected} value")]
    ValueShape {
        field: &'static str,
        operator: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterPredicate {
    column: &'static str,
    operator: Operator,
    value: PredicateValue,
    conjunction: Conjunction,
}

impl FilterPredicate {
    /// Build a predicate on a whitelisted field, checking the operator and value shape.
    pub fn new<F: FilterField>(
        field: F,
        operator: Operator,
        value: impl Into<PredicateValue>,
    ) -> Result<Self, PredicateError> {
        if !field.allowed_operators().contains(&operator) {
            return Err(PredicateError::OperatorNotAllowed {
                field: field.key(),
                operator: operator.as_sql(),
            });
        }

        // A NULL filter value means the caller supplied nothing.
        let value = match value.into() {
            PredicateValue::Scalar(SqlValue::Null) => PredicateValue::Absent,
            other => other,
        };
        match (&value, operator.takes_list()) {
            (PredicateValue::Scalar(_), true) => {
                return Err(PredicateError::ValueShape {
                    field: field.key(),
                    operator: operator.as_sql(),
                    expected: "list",
                });
            }
            (PredicateValue::List(_), false) => {
                return Err(PredicateError::ValueShape {
                    field: field.key(),
                    operator: operator.as_sql(),
                    expected: "scalar",
                });
            }
            _ => {}
        }

        Ok(Self::on_column(field.column(), operator, value))
    }

    /// Predicate on a column chosen by the service itself, such as a scope or key column.
    pub(crate) fn on_column(
        column: &'static str,
        operator: Operator,
        value: PredicateValue,
    ) -> Self {
        Self {
            column,
            operator,
            value,
            conjunction: Conjunction::And,
        }
    }

    /// Join this predicate to the previous one with `OR`.
    pub fn or(mut self) -> Self {
        self.conjunction = Conjunction::Or;
        self
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &PredicateValue {
        &self.value
    }

    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }
}

/// Caller predicates plus the predicates the service forces on top of them.
///
/// Enforced predicates are always rendered last and joined with `AND`, outside
/// any grouping of the caller's predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    caller: Vec<FilterPredicate>,
    enforced: Vec<FilterPredicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: FilterPredicate) {
        self.caller.push(predicate);
    }

    pub fn with(mut self, predicate: FilterPredicate) -> Self {
        self.push(predicate);
        self
    }

    /// Add a predicate the caller cannot remove or widen.
    pub fn enforce(&mut self, predicate: FilterPredicate) {
        self.enforced.push(predicate);
    }

    /// Drop every caller predicate on `column`.
    pub fn discard_caller_column(&mut self, column: &str) {
        self.caller.retain(|p| p.column != column);
    }

    pub fn caller(&self) -> &[FilterPredicate] {
        &self.caller
    }

    pub fn enforced(&self) -> &[FilterPredicate] {
        &self.enforced
    }

    pub fn is_empty(&self) -> bool {
        self.caller.is_empty() && self.enforced.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    pub(crate) enum TestFilter {
        Name,
        Year,
        Owner,
    }

    impl FilterField for TestFilter {
        fn key(self) -> &'static str {
            match self {
                TestFilter::Name => "name",
                TestFilter::Year => "year",
                TestFilter::Owner => "owner_id",
            }
        }

        fn column(self) -> &'static str {
            match self {
                TestFilter::Name => "t.name",
                TestFilter::Year => "t.year",
                TestFilter::Owner => "t.owner_id",
            }
        }

        fn allowed_operators(self) -> &'static [Operator] {
            match self {
                TestFilter::Name => &[Operator::ILike, Operator::Eq],
                TestFilter::Year => &[
                    Operator::Eq,
                    Operator::Gte,
                    Operator::Lte,
                    Operator::In,
                    Operator::NotIn,
                ],
                TestFilter::Owner => &[Operator::Eq],
            }
        }
    }

    #[test]
    fn test_operator_outside_whitelist_is_rejected() {
        let err = FilterPredicate::new(TestFilter::Owner, Operator::ILike, Some("x")).unwrap_err();
        assert_eq!(
            err,
            PredicateError::OperatorNotAllowed {
                field: "owner_id",
                operator: "ILIKE"
            }
        );
    }

    #[test]
    fn test_list_operator_requires_list_value() {
        let err = FilterPredicate::new(TestFilter::Year, Operator::In, Some(2024_i64)).unwrap_err();
        assert!(matches!(err, PredicateError::ValueShape { expected: "list", .. }));

        let err = FilterPredicate::new(
            TestFilter::Year,
            Operator::Eq,
            PredicateValue::list([2023_i64, 2024]),
        )
        .unwrap_err();
        assert!(matches!(err, PredicateError::ValueShape { expected: "scalar", .. }));
    }

    #[test]
    fn test_absent_value_is_accepted_for_any_operator() {
        let predicate =
            FilterPredicate::new(TestFilter::Year, Operator::In, None::<i64>).unwrap();
        assert!(predicate.value().is_absent());
        assert_eq!(predicate.column(), "t.year");
    }

    #[test]
    fn test_null_value_is_treated_as_absent() {
        let predicate =
            FilterPredicate::new(TestFilter::Name, Operator::ILike, SqlValue::Null).unwrap();
        assert!(predicate.value().is_absent());
    }

    #[test]
    fn test_discard_caller_column_keeps_enforced() {
        let mut set = PredicateSet::new()
            .with(FilterPredicate::new(TestFilter::Owner, Operator::Eq, Some(3_i64)).unwrap())
            .with(FilterPredicate::new(TestFilter::Name, Operator::ILike, Some("a")).unwrap());
        set.enforce(FilterPredicate::on_column(
            "t.owner_id",
            Operator::Eq,
            PredicateValue::Scalar(SqlValue::Int(7)),
        ));

        set.discard_caller_column("t.owner_id");

        assert_eq!(set.caller().len(), 1);
        assert_eq!(set.caller()[0].column(), "t.name");
        assert_eq!(set.enforced().len(), 1);
    }
}
