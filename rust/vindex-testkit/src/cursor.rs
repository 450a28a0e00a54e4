use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use vindex_common::{Result, error::Error};
use vindex_core::{BindVars, CommitOrder, QueryResult, VCursor};

/// A statement received by a [`RecordingCursor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub method: String,
    pub query: String,
    pub bind_vars: BindVars,
    pub is_dml: bool,
    pub commit_order: CommitOrder,
}

#[derive(Default)]
struct CursorState {
    statements: Vec<Statement>,
    results: VecDeque<QueryResult>,
    failure: Option<String>,
}

/// A cursor that records every statement and answers with queued results.
///
/// When the queue is empty an empty result is returned. Clones share state.
#[derive(Clone, Default)]
pub struct RecordingCursor {
    state: Arc<Mutex<CursorState>>,
}

impl RecordingCursor {
    pub fn new() -> RecordingCursor {
        RecordingCursor::default()
    }

    /// Queues the result of the next unanswered statement.
    pub fn push_result(&self, result: QueryResult) {
        self.state.lock().unwrap().results.push_back(result);
    }

    /// Makes every subsequent statement fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.state.lock().unwrap().failure = Some(message.into());
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn statement_count(&self) -> usize {
        self.state.lock().unwrap().statements.len()
    }
}

impl VCursor for RecordingCursor {
    fn execute(
        &self,
        method: &str,
        query: &str,
        bind_vars: &BindVars,
        is_dml: bool,
        commit_order: CommitOrder,
    ) -> Result<QueryResult> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(Statement {
            method: method.to_string(),
            query: query.to_string(),
            bind_vars: bind_vars.clone(),
            is_dml,
            commit_order,
        });
        if let Some(message) = &state.failure {
            return Err(Error::invalid_operation(message.clone()));
        }
        Ok(state.results.pop_front().unwrap_or_default())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
