//! Scripted executor for tests.
//!
//! [`MockExecutor`] records every statement it receives (SQL and bound values)
//! and answers from rules matched by SQL fragment, so relation loading and
//! mutation can be exercised without a database.
//!
//! ```
//! use lifeline::test_helpers::MockExecutor;
//! use lifeline::{LifeExecutor, Row};
//! use sea_query::{Value, Values};
//!
//! let executor = MockExecutor::new()
//!     .on_query(r#"FROM "users""#, vec![Row::new().with("id", Value::Int(Some(1)))])
//!     .on_execute("DELETE", 3);
//!
//! let rows = executor.query_all(r#"SELECT * FROM "users""#, &Values(Vec::new())).unwrap();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(executor.execute(r#"DELETE FROM "users""#, &Values(Vec::new())).unwrap(), 3);
//! assert_eq!(executor.statements().len(), 2);
//! ```

use crate::executor::{LifeError, LifeExecutor};
use crate::row::Row;
use sea_query::{Value, Values};
use std::sync::{Mutex, MutexGuard};

/// One statement as received by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    Query,
    Execute,
    Any,
}

#[derive(Debug, Clone)]
enum Reply {
    Rows(Vec<Row>),
    Affected(u64),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Rule {
    fragment: String,
    target: Target,
    reply: Reply,
}

/// Records statements and replies from rules; the first matching rule wins.
///
/// Unmatched queries return no rows; unmatched statements report 0 affected rows.
#[derive(Debug, Default)]
pub struct MockExecutor {
    rules: Vec<Rule>,
    log: Mutex<Vec<Statement>>,
    queries: Mutex<usize>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries whose SQL contains `fragment` return `rows`.
    pub fn on_query(mut self, fragment: &str, rows: Vec<Row>) -> Self {
        self.rules.push(Rule {
            fragment: fragment.to_string(),
            target: Target::Query,
            reply: Reply::Rows(rows),
        });
        self
    }

    /// Statements whose SQL contains `fragment` report `affected` rows.
    pub fn on_execute(mut self, fragment: &str, affected: u64) -> Self {
        self.rules.push(Rule {
            fragment: fragment.to_string(),
            target: Target::Execute,
            reply: Reply::Affected(affected),
        });
        self
    }

    /// Queries and statements whose SQL contains `fragment` fail with
    /// `LifeError::QueryError(message)`. They are still recorded.
    pub fn fail_on(mut self, fragment: &str, message: &str) -> Self {
        self.rules.push(Rule {
            fragment: fragment.to_string(),
            target: Target::Any,
            reply: Reply::Fail(message.to_string()),
        });
        self
    }

    /// Everything received so far, in order.
    pub fn statements(&self) -> Vec<Statement> {
        lock(&self.log).clone()
    }

    /// Number of `query_all` calls (SELECTs and `RETURNING` statements).
    pub fn query_count(&self) -> usize {
        *lock(&self.queries)
    }

    pub fn clear(&self) {
        lock(&self.log).clear();
        *lock(&self.queries) = 0;
    }

    fn record(&self, sql: &str, values: &Values) {
        lock(&self.log).push(Statement {
            sql: sql.to_string(),
            values: values.0.clone(),
        });
    }

    fn reply_for(&self, sql: &str, target: Target) -> Option<&Reply> {
        self.rules
            .iter()
            .find(|rule| (rule.target == target || rule.target == Target::Any) && sql.contains(&rule.fragment))
            .map(|rule| &rule.reply)
    }
}

// A panicking test must not poison the log for later assertions.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LifeExecutor for MockExecutor {
    fn execute(&self, query: &str, values: &Values) -> Result<u64, LifeError> {
        self.record(query, values);
        match self.reply_for(query, Target::Execute) {
            Some(Reply::Affected(n)) => Ok(*n),
            Some(Reply::Fail(message)) => Err(LifeError::QueryError(message.clone())),
            Some(Reply::Rows(rows)) => Ok(rows.len() as u64),
            None => Ok(0),
        }
    }

    fn query_all(&self, query: &str, values: &Values) -> Result<Vec<Row>, LifeError> {
        self.record(query, values);
        *lock(&self.queries) += 1;
        match self.reply_for(query, Target::Query) {
            Some(Reply::Rows(rows)) => Ok(rows.clone()),
            Some(Reply::Fail(message)) => Err(LifeError::QueryError(message.clone())),
            Some(Reply::Affected(_)) | None => Ok(Vec::new()),
        }
    }
}
