mod hub;
mod queries;
mod runner;

pub use runner::{CommandRunner, DefaultCommandRunner, ensure_git, hub_available};

pub use hub::{has_merged_pr, has_open_pr};
pub use queries::{
    GitQuerier, detect_mainline, last_commit_info, list_unmerged_branches, merge_base,
    merge_state, remote_url, stats,
};
