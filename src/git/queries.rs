use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex_lite::Regex;

use crate::cache::QueryCache;
use crate::error::AuditError;
use crate::system::Clock;
use crate::types::MergeState;

use super::runner::CommandRunner;

// Shortstat clauses are independent: a diff with no insertions omits the
// insertions clause entirely, so each pattern defaults to zero.
static FILES_CHANGED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) files? changed").expect("valid regex"));
static INSERTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) insertions?\(\+\)").expect("valid regex"));
static DELETIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) deletions?\(-\)").expect("valid regex"));

/// Narrow seam for all external queries: runs a command in the repository,
/// returns its text output, memoized through the command cache.
pub struct GitQuerier<'a> {
    runner: &'a dyn CommandRunner,
    cache: &'a QueryCache<'a>,
    clock: &'a dyn Clock,
    repo: &'a Path,
}

impl<'a> GitQuerier<'a> {
    #[must_use]
    pub fn new(
        runner: &'a dyn CommandRunner,
        cache: &'a QueryCache<'a>,
        clock: &'a dyn Clock,
        repo: &'a Path,
    ) -> Self {
        Self {
            runner,
            cache,
            clock,
            repo,
        }
    }

    /// # Errors
    /// Fails when the command cannot be launched or exits non-zero.
    pub fn git(&self, args: &[&str]) -> Result<String, AuditError> {
        self.query("git", args)
    }

    /// # Errors
    /// Fails when the command cannot be launched or exits non-zero.
    pub fn gh(&self, args: &[&str]) -> Result<String, AuditError> {
        self.query("gh", args)
    }

    fn query(&self, program: &str, args: &[&str]) -> Result<String, AuditError> {
        let command = render_command(program, args);
        self.cache.get(self.clock, &command, || {
            let out = self
                .runner
                .run(self.repo, program, args)
                .map_err(|source| AuditError::CommandIo {
                    command: command.clone(),
                    source,
                })?;
            if !out.status.success() {
                return Err(AuditError::CommandFailure {
                    command: command.clone(),
                    status: out.status,
                    stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
                });
            }
            Ok(String::from_utf8_lossy(&out.stdout).to_string())
        })
    }
}

pub(crate) fn render_command(program: &str, args: &[&str]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(program);
    parts.extend_from_slice(args);
    parts.join(" ")
}

#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub timestamp: DateTime<FixedOffset>,
    pub author: String,
    pub subject: String,
}

/// Last-commit metadata for the branch tip, or `None` (with a warning)
/// when the branch has no commits or the log line is malformed. Callers
/// skip the branch on `None` rather than fail the run.
#[must_use]
pub fn last_commit_info(q: &GitQuerier<'_>, branch: &str) -> Option<CommitInfo> {
    let text = match q.git(&["log", "-1", "--format=%ci|%an|%s", branch, "--"]) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("[warn] could not read last commit of {branch}: {err}");
            return None;
        }
    };
    let line = text.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        eprintln!("[warn] no commits found for {branch}; skipping");
        return None;
    }
    // The subject keeps any further pipes; it is sanitized at record
    // assembly, not here.
    let parts: Vec<&str> = line.splitn(3, '|').collect();
    if parts.len() != 3 {
        eprintln!("[warn] unexpected log line for {branch}: '{line}'");
        return None;
    }
    let timestamp = match DateTime::parse_from_str(parts[0].trim(), "%Y-%m-%d %H:%M:%S %z") {
        Ok(timestamp) => timestamp,
        Err(err) => {
            eprintln!("[warn] unparseable commit date for {branch}: {err}");
            return None;
        }
    };
    Some(CommitInfo {
        timestamp,
        author: parts[1].trim().to_string(),
        subject: parts[2].trim().to_string(),
    })
}

/// Three-step merge decision for a branch against the mainline ref.
///
/// 1. Tip equals the merge base: the tip is an ancestor, so `Merged`.
/// 2. Commits exist on the branch that mainline cannot reach: `Unmerged`.
/// 3. Neither: history rewriting (e.g. a squash merge) has detached the
///    tip while leaving no unique commits. `merged_pr_probe` decides
///    between `Merged` and `PointerMerged`.
///
/// # Errors
/// Propagates git command failures; the caller skips the branch.
pub fn merge_state(
    q: &GitQuerier<'_>,
    branch: &str,
    mainline_ref: &str,
    merged_pr_probe: impl FnOnce() -> bool,
) -> Result<MergeState, AuditError> {
    let tip = q.git(&["rev-parse", branch])?.trim().to_string();
    let base = merge_base(q, branch, mainline_ref)?;
    if tip == base {
        return Ok(MergeState::Merged);
    }
    let unique = q.git(&["rev-list", "--count", &format!("{mainline_ref}..{branch}")])?;
    if unique.trim().parse::<u64>().unwrap_or(0) > 0 {
        return Ok(MergeState::Unmerged);
    }
    if merged_pr_probe() {
        Ok(MergeState::Merged)
    } else {
        Ok(MergeState::PointerMerged)
    }
}

/// # Errors
/// Fails when the refs share no common ancestor.
pub fn merge_base(
    q: &GitQuerier<'_>,
    branch: &str,
    mainline_ref: &str,
) -> Result<String, AuditError> {
    Ok(q.git(&["merge-base", branch, mainline_ref])?
        .trim()
        .to_string())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DiffStats {
    pub commits_ahead: u64,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

/// Commit count ahead of `base_ref` plus shortstat diff numbers.
///
/// The rename limit is lifted so large renames stay detected and do not
/// distort the added/deleted counts.
///
/// # Errors
/// Propagates git command failures; the caller skips the branch.
pub fn stats(q: &GitQuerier<'_>, branch: &str, base_ref: &str) -> Result<DiffStats, AuditError> {
    let count = q.git(&["rev-list", "--count", &format!("{base_ref}..{branch}")])?;
    let shortstat = q.git(&[
        "-c",
        "diff.renameLimit=0",
        "diff",
        "--shortstat",
        "--find-renames",
        base_ref,
        branch,
    ])?;
    Ok(DiffStats {
        commits_ahead: count.trim().parse::<u64>().unwrap_or(0),
        files_changed: capture_number(&FILES_CHANGED, &shortstat),
        lines_added: capture_number(&INSERTIONS, &shortstat),
        lines_deleted: capture_number(&DELETIONS, &shortstat),
    })
}

fn capture_number(re: &Regex, text: &str) -> u64 {
    re.captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Branches not merged into `mainline_ref`, in listing order, excluding
/// the symbolic remote HEAD entry.
///
/// # Errors
/// Fails when the listing command fails, which aborts the run.
pub fn list_unmerged_branches(
    q: &GitQuerier<'_>,
    mainline_ref: &str,
    remote: bool,
) -> Result<Vec<String>, AuditError> {
    let text = if remote {
        q.git(&[
            "branch",
            "-r",
            "--format=%(refname:short)",
            "--no-merged",
            mainline_ref,
        ])?
    } else {
        q.git(&[
            "branch",
            "--format=%(refname:short)",
            "--no-merged",
            mainline_ref,
        ])?
    };
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_symbolic_head(line))
        .map(ToString::to_string)
        .collect())
}

fn is_symbolic_head(line: &str) -> bool {
    line.contains("->") || line == "HEAD" || line.ends_with("/HEAD")
}

/// Mainline branch name, read from the remote HEAD symref when present.
#[must_use]
pub fn detect_mainline(q: &GitQuerier<'_>) -> String {
    if let Ok(text) = q.git(&["symbolic-ref", "refs/remotes/origin/HEAD"]) {
        let tail = text.trim().rsplit('/').next().unwrap_or_default();
        if !tail.is_empty() {
            return tail.to_string();
        }
    }
    "main".to_string()
}

/// Configured URL of the primary remote, if any.
#[must_use]
pub fn remote_url(q: &GitQuerier<'_>) -> Option<String> {
    let text = q.git(&["config", "--get", "remote.origin.url"]).ok()?;
    let url = text.trim();
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::os::unix::process::ExitStatusExt;
    use std::process::{ExitStatus, Output};
    use std::time::Duration;

    use super::*;
    use crate::cache::MemoryStore;
    use crate::system::DefaultClock;

    struct FakeRunner {
        responses: HashMap<String, String>,
    }

    impl FakeRunner {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                responses: pairs
                    .iter()
                    .map(|(command, text)| ((*command).to_string(), (*text).to_string()))
                    .collect(),
            }
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, _dir: &Path, program: &str, args: &[&str]) -> std::io::Result<Output> {
            let command = render_command(program, args);
            match self.responses.get(&command) {
                Some(text) => Ok(Output {
                    status: ExitStatus::from_raw(0),
                    stdout: text.clone().into_bytes(),
                    stderr: Vec::new(),
                }),
                None => Ok(Output {
                    status: ExitStatus::from_raw(256),
                    stdout: Vec::new(),
                    stderr: format!("unexpected command: {command}").into_bytes(),
                }),
            }
        }
    }

    fn with_querier<T>(
        pairs: &[(&str, &str)],
        body: impl FnOnce(&GitQuerier<'_>) -> T,
    ) -> T {
        let runner = FakeRunner::new(pairs);
        let store = MemoryStore::new();
        let cache = QueryCache::new(&store, Duration::from_secs(3600));
        let clock = DefaultClock;
        let q = GitQuerier::new(&runner, &cache, &clock, Path::new("/repo"));
        body(&q)
    }

    #[test]
    fn last_commit_info_parses_three_fields() {
        let info = with_querier(
            &[(
                "git log -1 --format=%ci|%an|%s feature/x --",
                "2026-01-02 12:30:00 +0100|Alice Smith|fix: handle empty input\n",
            )],
            |q| last_commit_info(q, "feature/x"),
        )
        .unwrap();
        assert_eq!(info.author, "Alice Smith");
        assert_eq!(info.subject, "fix: handle empty input");
        assert_eq!(info.timestamp.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn last_commit_info_keeps_pipes_in_subject() {
        let info = with_querier(
            &[(
                "git log -1 --format=%ci|%an|%s feature/x --",
                "2026-01-02 12:30:00 +0000|Alice|one | two | three\n",
            )],
            |q| last_commit_info(q, "feature/x"),
        )
        .unwrap();
        assert_eq!(info.subject, "one | two | three");
    }

    #[test]
    fn last_commit_info_rejects_short_lines_and_empty_output() {
        let short = with_querier(
            &[(
                "git log -1 --format=%ci|%an|%s feature/x --",
                "2026-01-02 12:30:00 +0000|only-two-fields\n",
            )],
            |q| last_commit_info(q, "feature/x"),
        );
        assert!(short.is_none());

        let empty = with_querier(
            &[("git log -1 --format=%ci|%an|%s feature/x --", "")],
            |q| last_commit_info(q, "feature/x"),
        );
        assert!(empty.is_none());
    }

    #[test]
    fn merge_state_detects_ancestor_tip() {
        let state = with_querier(
            &[
                ("git rev-parse feature/x", "aaa111\n"),
                ("git merge-base feature/x main", "aaa111\n"),
            ],
            |q| merge_state(q, "feature/x", "main", || false),
        )
        .unwrap();
        assert_eq!(state, MergeState::Merged);
    }

    #[test]
    fn merge_state_detects_unique_commits() {
        let state = with_querier(
            &[
                ("git rev-parse feature/x", "aaa111\n"),
                ("git merge-base feature/x main", "bbb222\n"),
                ("git rev-list --count main..feature/x", "2\n"),
            ],
            |q| merge_state(q, "feature/x", "main", || false),
        )
        .unwrap();
        assert_eq!(state, MergeState::Unmerged);
    }

    #[test]
    fn merge_state_falls_back_to_pr_probe() {
        let pairs: &[(&str, &str)] = &[
            ("git rev-parse feature/x", "aaa111\n"),
            ("git merge-base feature/x main", "bbb222\n"),
            ("git rev-list --count main..feature/x", "0\n"),
        ];
        let merged = with_querier(pairs, |q| merge_state(q, "feature/x", "main", || true)).unwrap();
        assert_eq!(merged, MergeState::Merged);

        let pointer =
            with_querier(pairs, |q| merge_state(q, "feature/x", "main", || false)).unwrap();
        assert_eq!(pointer, MergeState::PointerMerged);
    }

    #[test]
    fn stats_parses_all_three_clauses() {
        let stats = with_querier(
            &[
                ("git rev-list --count bbb222..feature/x", "3\n"),
                (
                    "git -c diff.renameLimit=0 diff --shortstat --find-renames bbb222 feature/x",
                    " 4 files changed, 120 insertions(+), 30 deletions(-)\n",
                ),
            ],
            |q| stats(q, "feature/x", "bbb222"),
        )
        .unwrap();
        assert_eq!(stats.commits_ahead, 3);
        assert_eq!(stats.files_changed, 4);
        assert_eq!(stats.lines_added, 120);
        assert_eq!(stats.lines_deleted, 30);
    }

    #[test]
    fn stats_defaults_missing_clauses_to_zero() {
        let stats = with_querier(
            &[
                ("git rev-list --count bbb222..feature/x", "1\n"),
                (
                    "git -c diff.renameLimit=0 diff --shortstat --find-renames bbb222 feature/x",
                    " 1 file changed, 5 deletions(-)\n",
                ),
            ],
            |q| stats(q, "feature/x", "bbb222"),
        )
        .unwrap();
        assert_eq!(stats.files_changed, 1);
        assert_eq!(stats.lines_added, 0);
        assert_eq!(stats.lines_deleted, 5);
    }

    #[test]
    fn list_unmerged_branches_drops_symbolic_head() {
        let branches = with_querier(
            &[(
                "git branch -r --format=%(refname:short) --no-merged origin/main",
                "origin/HEAD\norigin/feature/x\norigin/hotfix/y\n",
            )],
            |q| list_unmerged_branches(q, "origin/main", true),
        )
        .unwrap();
        assert_eq!(branches, vec!["origin/feature/x", "origin/hotfix/y"]);
    }

    #[test]
    fn detect_mainline_reads_remote_head_symref() {
        let detected = with_querier(
            &[(
                "git symbolic-ref refs/remotes/origin/HEAD",
                "refs/remotes/origin/trunk\n",
            )],
            |q| detect_mainline(q),
        );
        assert_eq!(detected, "trunk");
    }

    #[test]
    fn detect_mainline_defaults_to_main() {
        let detected = with_querier(&[], |q| detect_mainline(q));
        assert_eq!(detected, "main");
    }

    #[test]
    fn remote_url_is_none_when_unset() {
        assert!(with_querier(&[], |q| remote_url(q)).is_none());
        let url = with_querier(
            &[(
                "git config --get remote.origin.url",
                "git@example.com:acme/widgets.git\n",
            )],
            |q| remote_url(q),
        );
        assert_eq!(url.as_deref(), Some("git@example.com:acme/widgets.git"));
    }
}
