use crate::error::AuditError;

use super::queries::GitQuerier;

/// Whether an open pull request targets `mainline` from `branch`.
/// Lookup failures downgrade to `false` with a warning; PR status is
/// best-effort and never aborts branch processing.
#[must_use]
pub fn has_open_pr(q: &GitQuerier<'_>, branch: &str, mainline: &str) -> bool {
    match pr_exists(q, branch, mainline, "open") {
        Ok(found) => found,
        Err(err) => {
            eprintln!("[warn] open PR lookup failed for {branch}: {err}");
            false
        }
    }
}

/// Whether a merged pull request targeted `mainline` from `branch`.
/// Used as the fallback for the ambiguous merge case; failures downgrade
/// to `false` with a warning.
#[must_use]
pub fn has_merged_pr(q: &GitQuerier<'_>, branch: &str, mainline: &str) -> bool {
    match pr_exists(q, branch, mainline, "merged") {
        Ok(found) => found,
        Err(err) => {
            eprintln!("[warn] merged PR lookup failed for {branch}: {err}");
            false
        }
    }
}

fn pr_exists(
    q: &GitQuerier<'_>,
    branch: &str,
    mainline: &str,
    state: &str,
) -> Result<bool, AuditError> {
    let args = [
        "pr", "list", "--head", branch, "--base", mainline, "--state", state, "--json", "number",
    ];
    let text = q.gh(&args)?;
    let values: Vec<serde_json::Value> =
        serde_json::from_str(text.trim()).map_err(|source| AuditError::Json {
            command: format!("gh {}", args.join(" ")),
            source,
        })?;
    Ok(!values.is_empty())
}
