//! Compiles a [`PropertyQuery`] to parameterised SQL.
//!
//! Predicates map one-to-one onto `WHERE` conditions. SQL comparisons with
//! `NULL` are never true, which is exactly the in-memory rule that a missing
//! value fails every comparison.

use estate_core::{
  page::PageRequest,
  query::{Predicate, PropertyQuery, View},
};
use rusqlite::types::Value;

use crate::encode::COLUMNS;

/// One row per property: the latest dated observation, otherwise the latest
/// undated one, with the highest id breaking ties.
const LATEST: &str = "(
  SELECT o.*,
         ROW_NUMBER() OVER (
           PARTITION BY o.property_id
           ORDER BY o.observed_at IS NULL, o.observed_at DESC, o.id DESC
         ) AS latest_rank
  FROM observations o
)";

/// A statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
  pub sql:    String,
  pub params: Vec<Value>,
}

fn condition(p: &Predicate, params: &mut Vec<Value>) -> String {
  match p {
    Predicate::AtLeast(f, v) => {
      params.push(Value::Real(*v));
      format!("{} >= ?", f.name())
    }
    Predicate::AtMost(f, v) => {
      params.push(Value::Real(*v));
      format!("{} <= ?", f.name())
    }
    Predicate::Equals(f, v) => {
      params.push(Value::Real(*v));
      format!("{} = ?", f.name())
    }
    Predicate::Positive(f) => format!("{} > 0", f.name()),
    Predicate::Present(f) => format!("{} IS NOT NULL", f.name()),
    Predicate::TextEquals(f, v) => {
      params.push(Value::Text(v.clone()));
      format!("{} = ?", f.name())
    }
    Predicate::Dated => "observed_at IS NOT NULL".to_owned(),
  }
}

/// `FROM … WHERE …` for `query`.
fn source(query: &PropertyQuery) -> Statement {
  let mut params = Vec::new();
  let mut conds: Vec<String> = Vec::new();

  let from = match query.view {
    View::Latest => {
      conds.push("latest_rank = 1".to_owned());
      LATEST
    }
    View::History => "observations",
  };
  conds.extend(query.predicates.iter().map(|p| condition(p, &mut params)));

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", conds.join(" AND "))
  };

  Statement { sql: format!("FROM {from}{where_clause}"), params }
}

pub fn count(query: &PropertyQuery) -> Statement {
  let Statement { sql, params } = source(query);
  Statement { sql: format!("SELECT COUNT(*) {sql}"), params }
}

pub fn select(query: &PropertyQuery, page: Option<PageRequest>) -> Statement {
  let Statement { sql, mut params } = source(query);
  let mut sql = format!("SELECT {COLUMNS} {sql} ORDER BY property_id, id");
  if let Some(page) = page {
    sql.push_str(" LIMIT ? OFFSET ?");
    params.push(Value::Integer(page.limit() as i64));
    params.push(Value::Integer(page.offset() as i64));
  }
  Statement { sql, params }
}
