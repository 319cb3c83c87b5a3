//! Mock listers for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::ExecutionRecord;
use crate::errors::ApiAccessError;
use crate::lister::ExecutionLister;

type ListResult = Result<Vec<ExecutionRecord>, ApiAccessError>;

/// A lister that replays a fixed script of responses.
///
/// Once the script runs out the final response repeats. An empty script
/// answers with an empty list.
#[derive(Debug, Default)]
pub struct ScriptedLister {
    script: Mutex<VecDeque<ListResult>>,
    last: Mutex<Option<ListResult>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedLister {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a successful response.
    #[must_use]
    pub fn then_ok(self, records: Vec<ExecutionRecord>) -> Self {
        self.script.lock().push_back(Ok(records));
        self
    }

    /// Appends a failed response.
    #[must_use]
    pub fn then_err(self, error: ApiAccessError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Returns a shared call counter that outlives the lister.
    #[must_use]
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Returns the number of responses not yet replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl ExecutionLister for ScriptedLister {
    async fn list_executions(&self) -> ListResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().pop_front();
        let mut last = self.last.lock();
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last.clone().unwrap_or_else(|| Ok(Vec::new())),
        }
    }
}
