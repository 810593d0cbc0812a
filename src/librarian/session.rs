use std::fmt;

use smallvec::SmallVec;

use crate::error::{LibrarianError, Result};

/// Where an `execute` call ended up.
///
/// ```text
/// Idle ──► Compiling ──► Running ──┬──► Committed
///   │      (miss only)     ▲       ├──► RolledBack
///   └──────────────────────┘       └──► Completed (no commit issued)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    Compiling,
    Running,
    Committed,
    RolledBack,
    Completed,
}

impl Stage {
    fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Idle, Compiling)
                | (Idle, Running)
                | (Compiling, Running)
                | (Running, Committed)
                | (Running, RolledBack)
                | (Running, Completed)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Compiling => "compiling",
            Stage::Running => "running",
            Stage::Committed => "committed",
            Stage::RolledBack => "rolled back",
            Stage::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// State of one top-level `execute` call, shared by every chain it walks.
#[derive(Debug)]
pub struct ExecutionSession {
    stage: Stage,
    affected: usize,
    stack: SmallVec<[String; 4]>,
    depth_limit: usize,
}

impl ExecutionSession {
    pub fn new(depth_limit: usize) -> Self {
        Self {
            stage: Stage::Idle,
            affected: 0,
            stack: SmallVec::new(),
            depth_limit,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal session transition {} -> {}",
            self.stage,
            next
        );
        self.stage = next;
    }

    /// Rows affected by mutations so far, across all included chains.
    pub fn affected(&self) -> usize {
        self.affected
    }

    pub(crate) fn add_affected(&mut self, rows: usize) {
        self.affected += rows;
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Tags of the chains being walked, outermost first.
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    /// Pushes `tag` onto the include stack.
    pub(crate) fn enter(&mut self, tag: &str) -> Result<()> {
        if self.stack.iter().any(|t| t == tag) {
            let mut path: Vec<String> = self.stack.to_vec();
            path.push(tag.to_string());
            return Err(LibrarianError::IncludeCycle { path });
        }
        if self.stack.len() >= self.depth_limit {
            return Err(LibrarianError::IncludeDepth {
                tag: tag.to_string(),
                limit: self.depth_limit,
            });
        }
        self.stack.push(tag.to_string());
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.stack.pop();
    }
}
