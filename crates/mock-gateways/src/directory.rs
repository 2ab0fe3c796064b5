//! Fixed manager directory.

use async_trait::async_trait;
use meeting_core::{ManagerDirectory, ManagerEntry, Result};

use crate::failures::{Failures, Operation};
use crate::log::CallLog;

/// Directory returning a fixed list.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    managers: Vec<ManagerEntry>,
    failures: Failures,
    log: CallLog,
}

impl StaticDirectory {
    pub fn new(managers: Vec<ManagerEntry>) -> Self {
        Self {
            managers,
            ..Default::default()
        }
    }

    /// Record calls into a shared log.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn fail_next(&self) {
        self.failures.fail_next(Operation::DirectoryList);
    }
}

#[async_trait]
impl ManagerDirectory for StaticDirectory {
    async fn list(&self) -> Result<Vec<ManagerEntry>> {
        if let Err(err) = self.failures.check(Operation::DirectoryList) {
            self.log.record(Operation::DirectoryList, None, false);
            return Err(err);
        }
        self.log.record(Operation::DirectoryList, None, true);
        Ok(self.managers.clone())
    }
}
