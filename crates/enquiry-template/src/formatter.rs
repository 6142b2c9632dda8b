/*
 * formatter.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Evaluation of formatter chains such as `{{ROUND;SUM;6;total}}`.
//!
//! Operations run right to left: the last one listed sees the raw column,
//! each one to its left sees the running result.
//!
//! Only two operations exist. `SUM` is accepted and does nothing. `ROUND`
//! rounds the running result when it is nonzero; otherwise it takes the
//! first integer value of the column. Neither aggregates over rows.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::store::{QueryId, QueryResultStore};
use crate::value::Scalar;

/// A formatter operation name, compared case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Sum,
    Round,
}

impl Operation {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "SUM" => Some(Operation::Sum),
            "ROUND" => Some(Operation::Round),
            _ => None,
        }
    }
}

/// Evaluate a formatter chain against the rows bound to `query_id`.
///
/// Returns the text `"0"` when the query has no rows, and a decimal otherwise.
pub fn evaluate(
    operations: &[String],
    query_id: QueryId,
    column: &str,
    store: &QueryResultStore,
) -> Scalar {
    let Some(set) = store.bound(query_id) else {
        debug!(query_id, column, "no data for formatter");
        return Scalar::text("0");
    };

    let mut current = Decimal::ZERO;
    for name in operations.iter().rev() {
        match Operation::parse(name) {
            Some(Operation::Sum) => {
                debug!(query_id, column, "SUM leaves the value unchanged");
            }
            Some(Operation::Round) => {
                if !current.is_zero() {
                    current =
                        current.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
                } else if let Some(first) = set.rows().iter().find_map(|row| match row.get(column)
                {
                    Some(Scalar::Integer(n)) => Some(*n),
                    _ => None,
                }) {
                    current = Decimal::from(first);
                }
            }
            None => {
                debug!(query_id, operation = %name, "unknown formatter operation ignored");
            }
        }
    }

    Scalar::Decimal(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{QueryResultSet, Row};
    use std::str::FromStr;

    fn ops(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn store_with(values: Vec<Scalar>) -> QueryResultStore {
        let set: QueryResultSet = values
            .into_iter()
            .map(|v| {
                let mut row = Row::new();
                row.insert("total".to_string(), v);
                row
            })
            .collect();
        [(6, set)].into_iter().collect()
    }

    #[test]
    fn test_round_without_data_is_zero_text() {
        let store = QueryResultStore::new();
        assert_eq!(evaluate(&ops(&["ROUND"]), 6, "total", &store), Scalar::text("0"));
    }

    #[test]
    fn test_round_takes_first_integer() {
        let store = store_with(vec![
            Scalar::Decimal(Decimal::from_str("55.66").unwrap()),
            Scalar::Integer(7),
            Scalar::Integer(9),
        ]);
        assert_eq!(
            evaluate(&ops(&["ROUND"]), 6, "total", &store),
            Scalar::Decimal(Decimal::from(7))
        );
    }

    #[test]
    fn test_round_without_integers_stays_zero() {
        let store = store_with(vec![Scalar::Decimal(Decimal::from_str("55.66").unwrap())]);
        assert_eq!(
            evaluate(&ops(&["ROUND"]), 6, "total", &store),
            Scalar::Decimal(Decimal::ZERO)
        );
    }

    #[test]
    fn test_sum_is_a_no_op() {
        let store = store_with(vec![Scalar::Integer(2), Scalar::Integer(3)]);
        assert_eq!(
            evaluate(&ops(&["SUM"]), 6, "total", &store),
            Scalar::Decimal(Decimal::ZERO)
        );
        assert_eq!(
            evaluate(&ops(&["ROUND", "SUM"]), 6, "total", &store),
            Scalar::Decimal(Decimal::from(2))
        );
    }

    #[test]
    fn test_operation_names_ignore_case() {
        assert_eq!(Operation::parse("round"), Some(Operation::Round));
        assert_eq!(Operation::parse("AVG"), None);
    }
}
