//! Transaction nesting state.
//!
//! There are no savepoints: nested `begin`/`commit` calls only move the
//! depth counter, and only the outermost transitions reach the server.

use serde::Serialize;
use tracing::debug;

use crate::dialect::TxnCommand;

/// Per-connection transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransactionState {
    /// Transactions are enabled for the connection.
    pub enabled: bool,
    /// Current nesting depth.
    pub depth: u32,
    /// The outermost transaction always rolls back.
    pub test_mode: bool,
    /// A statement failed inside the current transaction.
    pub failure: bool,
}

impl Default for TransactionState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TransactionState {
    /// Idle state.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            depth: 0,
            test_mode: false,
            failure: false,
        }
    }

    /// Returns true inside a transaction.
    #[must_use]
    pub const fn active(&self) -> bool {
        self.depth > 0
    }

    /// Enters a transaction; returns `Begin` only for the outermost one.
    pub fn begin(&mut self, test_mode: bool) -> Option<TxnCommand> {
        if !self.enabled {
            return None;
        }
        self.depth += 1;
        if self.depth > 1 {
            debug!(depth = self.depth, "nested begin");
            return None;
        }
        self.test_mode = test_mode;
        self.failure = false;
        debug!(test_mode, "transaction begin");
        Some(TxnCommand::Begin)
    }

    /// Leaves a transaction; the outermost one commits, or rolls back in
    /// test mode or after a failure.
    pub fn commit(&mut self) -> Option<TxnCommand> {
        if self.failure || self.test_mode {
            return self.rollback();
        }
        self.leave(TxnCommand::Commit)
    }

    /// Leaves a transaction; the outermost one rolls back.
    pub fn rollback(&mut self) -> Option<TxnCommand> {
        self.leave(TxnCommand::Rollback)
    }

    /// Commits or rolls back depending on [`TransactionState::status`].
    pub fn complete(&mut self) -> Option<TxnCommand> {
        if self.status() {
            self.commit()
        } else {
            self.rollback()
        }
    }

    /// Records a failed statement; no-op outside a transaction.
    pub fn fail(&mut self) {
        if self.active() {
            self.failure = true;
        }
    }

    /// False once a statement failed in the current transaction.
    #[must_use]
    pub const fn status(&self) -> bool {
        !self.failure
    }

    fn leave(&mut self, command: TxnCommand) -> Option<TxnCommand> {
        if !self.enabled || self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        if self.depth > 0 {
            debug!(depth = self.depth, "nested {command:?} ignored");
            return None;
        }
        debug!(?command, "transaction end");
        self.test_mode = false;
        Some(command)
    }
}
