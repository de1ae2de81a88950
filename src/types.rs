use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Merge status of a branch relative to the mainline.
///
/// `PointerMerged` covers the ambiguous case: the branch tip is not an
/// ancestor of mainline, yet no commits remain outside it (typically a
/// squash merge or a moved branch pointer). It is a legitimate third
/// outcome and is never collapsed into `Merged` or `Unmerged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeState {
    Merged,
    Unmerged,
    PointerMerged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleClass {
    High,
    Mid,
    Low,
}

impl StaleClass {
    #[must_use]
    pub fn from_age_days(age_days: u64) -> Self {
        if age_days >= 90 {
            Self::High
        } else if age_days >= 30 {
            Self::Mid
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::High => "stale-high",
            Self::Mid => "stale-mid",
            Self::Low => "stale-low",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchRecord {
    /// Branch name as listed (remote-tracking names keep their prefix).
    pub name: String,
    /// Branch name with any remote-tracking prefix stripped.
    pub short_name: String,
    pub last_commit: DateTime<FixedOffset>,
    pub age_days: u64,
    pub author: String,
    /// Last commit subject, sanitized and truncated for display.
    pub message: String,
    pub commits_ahead: u64,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub net_change: i64,
    pub merge_state: MergeState,
    pub has_open_pr: bool,
}

impl BranchRecord {
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        match (self.merge_state, self.has_open_pr) {
            (MergeState::Unmerged, true) => "PR Open",
            (MergeState::Unmerged, false) => "Unmerged",
            (MergeState::PointerMerged, true) => "Pointer Merged + PR Open",
            (MergeState::PointerMerged, false) => "Pointer Merged",
            (MergeState::Merged, _) => "Merged",
        }
    }

    #[must_use]
    pub fn stale_class(&self) -> StaleClass {
        StaleClass::from_age_days(self.age_days)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorSummary {
    pub author: String,
    pub branches: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub repo: std::path::PathBuf,
    pub mainline: Option<String>,
    pub older_than_days: u64,
    pub remote: bool,
    pub limit: usize,
    pub debug: bool,
}
