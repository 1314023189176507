use colored::Colorize;

/// Width of the indent preceding long-format labels
const LABEL_WIDTH: usize = 8;

/// Difference between the index and the working tree (unstaged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkspaceChange {
    Modified,
    Deleted,
}

impl WorkspaceChange {
    /// Single-letter porcelain code (worktree column)
    pub fn code(&self) -> char {
        match self {
            WorkspaceChange::Modified => 'M',
            WorkspaceChange::Deleted => 'D',
        }
    }

    /// Long-format label, colored for the terminal
    pub fn label(&self) -> String {
        let label = match self {
            WorkspaceChange::Modified => "modified:   ".red(),
            WorkspaceChange::Deleted => "deleted:    ".red(),
        };
        format!("{:>width$}{}", "", label, width = LABEL_WIDTH)
    }
}

/// Difference between HEAD and the index (staged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexChange {
    Added,
    Modified,
    Deleted,
}

impl IndexChange {
    /// Single-letter porcelain code (index column)
    pub fn code(&self) -> char {
        match self {
            IndexChange::Added => 'A',
            IndexChange::Modified => 'M',
            IndexChange::Deleted => 'D',
        }
    }

    pub fn label(&self) -> String {
        let label = match self {
            IndexChange::Added => "new file:   ".green(),
            IndexChange::Modified => "modified:   ".green(),
            IndexChange::Deleted => "deleted:    ".green(),
        };
        format!("{:>width$}{}", "", label, width = LABEL_WIDTH)
    }
}
