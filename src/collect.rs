use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cache::QueryCache;
use crate::git::{
    CommandRunner, GitQuerier, detect_mainline, has_merged_pr, has_open_pr, last_commit_info,
    list_unmerged_branches, merge_base, merge_state, remote_url, stats,
};
use crate::identity::RepoIdentity;
use crate::system::Clock;
use crate::types::{AuthorSummary, BranchRecord, MergeState, Options};

const MESSAGE_LIMIT: usize = 80;

/// Enumerate candidate branches, inspect each in listing order, and
/// return the surviving records sorted by last-commit timestamp, most
/// recent first. Failures are contained: the affected branch (or, for a
/// failed listing, the whole candidate set) is skipped with a warning
/// and the run still completes.
#[must_use]
pub fn collect_branch_records(
    opts: &Options,
    runner: &dyn CommandRunner,
    cache: &QueryCache<'_>,
    clock: &dyn Clock,
    hub_enabled: bool,
) -> Vec<BranchRecord> {
    let q = GitQuerier::new(runner, cache, clock, &opts.repo);
    let mainline = opts.mainline.clone().unwrap_or_else(|| detect_mainline(&q));
    let mainline_ref = if opts.remote {
        format!("origin/{mainline}")
    } else {
        mainline.clone()
    };

    let mut branches = match list_unmerged_branches(&q, &mainline_ref, opts.remote) {
        Ok(branches) => branches,
        Err(err) => {
            eprintln!("[warn] could not list branches: {err}");
            Vec::new()
        }
    };
    if opts.debug {
        eprintln!(
            "[debug] mainline={mainline_ref} candidates={}",
            branches.len()
        );
    }
    if opts.limit > 0 && branches.len() > opts.limit {
        branches.truncate(opts.limit);
    }

    let now_utc: DateTime<Utc> = clock.now().into();
    let progress = ProgressBar::new(branches.len() as u64);
    let style =
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(style);
    progress.set_message("inspecting branches");

    let mut records = Vec::new();
    for name in &branches {
        progress.inc(1);
        let Some(info) = last_commit_info(&q, name) else {
            continue;
        };
        let age_days = whole_days_between(info.timestamp.with_timezone(&Utc), now_utc);
        if opts.older_than_days > 0 && age_days < opts.older_than_days {
            continue;
        }
        let short_name = short_branch_name(name, opts.remote);
        let state = match merge_state(&q, name, &mainline_ref, || {
            hub_enabled && has_merged_pr(&q, short_name, &mainline)
        }) {
            Ok(state) => state,
            Err(err) => {
                eprintln!("[warn] could not determine merge status of {name}: {err}");
                continue;
            }
        };
        if state == MergeState::Merged {
            // A merged branch is not stale; it never reaches the output.
            continue;
        }
        let has_pr = hub_enabled && has_open_pr(&q, short_name, &mainline);
        let base = match merge_base(&q, name, &mainline_ref) {
            Ok(base) => base,
            Err(err) => {
                eprintln!("[warn] no merge base for {name}: {err}");
                continue;
            }
        };
        let diff = match stats(&q, name, &base) {
            Ok(diff) => diff,
            Err(err) => {
                eprintln!("[warn] could not compute stats for {name}: {err}");
                continue;
            }
        };
        records.push(BranchRecord {
            name: name.clone(),
            short_name: short_name.to_string(),
            last_commit: info.timestamp,
            age_days,
            author: info.author,
            message: sanitize_message(&info.subject),
            commits_ahead: diff.commits_ahead,
            files_changed: diff.files_changed,
            lines_added: diff.lines_added,
            lines_deleted: diff.lines_deleted,
            net_change: net_change(diff.lines_added, diff.lines_deleted),
            merge_state: state,
            has_open_pr: has_pr,
        });
    }
    progress.finish_with_message("branch inspection complete");

    records.sort_by(|a, b| b.last_commit.cmp(&a.last_commit));
    records
}

/// Author name plus count of collected branches, most branches first,
/// name order on ties.
#[must_use]
pub fn summarize_authors(records: &[BranchRecord]) -> Vec<AuthorSummary> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for record in records {
        *counts.entry(record.author.as_str()).or_insert(0) += 1;
    }
    let mut authors: Vec<AuthorSummary> = counts
        .into_iter()
        .map(|(author, branches)| AuthorSummary {
            author: author.to_string(),
            branches,
        })
        .collect();
    authors.sort_by(|a, b| {
        b.branches
            .cmp(&a.branches)
            .then_with(|| a.author.cmp(&b.author))
    });
    authors
}

/// Owner/name of the audited repository, from the primary remote URL.
/// Parse failures and missing remotes degrade to the unknown placeholder
/// with a warning; the report still renders.
#[must_use]
pub fn resolve_repo_identity(
    opts: &Options,
    runner: &dyn CommandRunner,
    cache: &QueryCache<'_>,
    clock: &dyn Clock,
) -> RepoIdentity {
    let q = GitQuerier::new(runner, cache, clock, &opts.repo);
    match remote_url(&q) {
        Some(url) => RepoIdentity::from_remote_url(&url).unwrap_or_else(|| {
            eprintln!("[warn] unrecognized remote url '{url}'; links will use a placeholder");
            RepoIdentity::unknown()
        }),
        None => {
            eprintln!("[warn] no remote url configured; links will use a placeholder");
            RepoIdentity::unknown()
        }
    }
}

fn whole_days_between(earlier: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from(now.signed_duration_since(earlier).num_days().max(0)).unwrap_or(0)
}

fn short_branch_name(name: &str, remote: bool) -> &str {
    if remote {
        name.split_once('/').map_or(name, |(_, rest)| rest)
    } else {
        name
    }
}

fn net_change(added: u64, deleted: u64) -> i64 {
    let added = i64::try_from(added).unwrap_or(i64::MAX);
    let deleted = i64::try_from(deleted).unwrap_or(i64::MAX);
    added.saturating_sub(deleted)
}

/// Collapse whitespace, replace pipes so the subject cannot collide with
/// delimiter-based parsing, and truncate to 80 characters with an
/// ellipsis marker.
fn sanitize_message(subject: &str) -> String {
    let flat = subject
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "/");
    if flat.chars().count() > MESSAGE_LIMIT {
        let head: String = flat.chars().take(MESSAGE_LIMIT - 3).collect();
        format!("{head}...")
    } else {
        flat
    }
}
