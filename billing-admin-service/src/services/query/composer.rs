//! Parameterised SQL composition.
//!
//! Values are always bound through `$n` placeholders, numbered in the order
//! they appear in the rendered text. Columns and operators come from the
//! predicate whitelist and are trusted as-is.

use super::page::{PageRequest, SortDirection};
use super::predicate::{Conjunction, FilterPredicate, Operator, PredicateSet, PredicateValue, SqlValue};

/// Base statements and default ordering for one entity.
#[derive(Debug, Clone, Copy)]
pub struct QueryTemplate {
    /// `SELECT ... FROM ...` without a `WHERE` clause.
    pub select: &'static str,
    /// `SELECT COUNT(*) FROM ...` over the same joins as `select`.
    pub count: &'static str,
    pub default_sort: &'static str,
    pub default_direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

pub struct QueryComposer;

impl QueryComposer {
    /// Append a `WHERE` clause for `predicates` to `base`.
    ///
    /// Absent predicates are skipped. Caller predicates come first in their
    /// original order; enforced predicates follow, joined with `AND`. When the
    /// caller group contains an `OR` and enforced predicates exist, the caller
    /// group is parenthesised.
    pub fn compose(base: &str, predicates: &PredicateSet) -> ComposedQuery {
        let mut params = Vec::new();

        let caller = Self::render_group(predicates.caller(), &mut params);
        let enforced = Self::render_group(predicates.enforced(), &mut params);

        let mut sql = base.trim_end().to_string();
        let clause = match (caller, enforced) {
            (None, None) => None,
            (Some((caller, _)), None) => Some(caller),
            (None, Some((enforced, _))) => Some(enforced),
            (Some((caller, has_or)), Some((enforced, _))) => {
                if has_or {
                    Some(format!("({}) AND {}", caller, enforced))
                } else {
                    Some(format!("{} AND {}", caller, enforced))
                }
            }
        };

        if let Some(clause) = clause {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }

        ComposedQuery { sql, params }
    }

    /// Count statement. Paging never applies here.
    pub fn count(template: &QueryTemplate, predicates: &PredicateSet) -> ComposedQuery {
        Self::compose(template.count, predicates)
    }

    /// Data statement with ordering and the page window.
    pub fn page(
        template: &QueryTemplate,
        predicates: &PredicateSet,
        request: &PageRequest,
    ) -> ComposedQuery {
        let mut query = Self::compose(template.select, predicates);
        Self::push_order_by(&mut query, template, request.sort, request.direction);
        query
            .sql
            .push_str(&format!(" LIMIT {} OFFSET {}", request.limit(), request.offset()));
        query
    }

    /// Every matching row in the template's default order.
    pub fn all(template: &QueryTemplate, predicates: &PredicateSet) -> ComposedQuery {
        let mut query = Self::compose(template.select, predicates);
        Self::push_order_by(&mut query, template, None, None);
        query
    }

    /// At most one matching row.
    pub fn single(template: &QueryTemplate, predicates: &PredicateSet) -> ComposedQuery {
        let mut query = Self::compose(template.select, predicates);
        query.sql.push_str(" LIMIT 1");
        query
    }

    fn push_order_by(
        query: &mut ComposedQuery,
        template: &QueryTemplate,
        sort: Option<&'static str>,
        direction: Option<SortDirection>,
    ) {
        let column = sort.unwrap_or(template.default_sort);
        let direction = direction.unwrap_or(template.default_direction);
        query
            .sql
            .push_str(&format!(" ORDER BY {} {}", column, direction.as_sql()));
    }

    /// Render one group, returning its text and whether any join inside it is `OR`.
    fn render_group(
        predicates: &[FilterPredicate],
        params: &mut Vec<SqlValue>,
    ) -> Option<(String, bool)> {
        let mut text = String::new();
        let mut has_or = false;

        for predicate in predicates {
            let Some(condition) = Self::render_condition(predicate, params) else {
                continue;
            };
            if text.is_empty() {
                text.push_str(&condition);
            } else {
                has_or |= predicate.conjunction() == Conjunction::Or;
                text.push(' ');
                text.push_str(predicate.conjunction().as_sql());
                text.push(' ');
                text.push_str(&condition);
            }
        }

        (!text.is_empty()).then_some((text, has_or))
    }

    /// `None` for an absent value.
    fn render_condition(
        predicate: &FilterPredicate,
        params: &mut Vec<SqlValue>,
    ) -> Option<String> {
        let column = predicate.column();
        let operator = predicate.operator();

        let condition = match predicate.value() {
            PredicateValue::Absent => return None,
            PredicateValue::List(values) if values.is_empty() => match operator {
                Operator::NotIn => "1 = 1".to_string(),
                _ => "1 = 0".to_string(),
            },
            PredicateValue::List(values) => {
                let placeholders = values
                    .iter()
                    .map(|value| Self::bind(params, value.clone()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} {} ({})", column, operator.as_sql(), placeholders)
            }
            PredicateValue::Scalar(value) => {
                let value = match operator {
                    Operator::ILike => SqlValue::Text(format!("%{}%", value.to_pattern_text())),
                    _ => value.clone(),
                };
                let placeholder = Self::bind(params, value);
                format!("{} {} {}", column, operator.as_sql(), placeholder)
            }
        };

        Some(condition)
    }

    fn bind(params: &mut Vec<SqlValue>, value: SqlValue) -> String {
        params.push(value);
        format!("${}", params.len())
    }
}
