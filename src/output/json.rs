use serde::Serialize;

use crate::types::{AuthorSummary, BranchRecord};

#[derive(Serialize)]
struct JsonReport<'a> {
    branches: &'a [BranchRecord],
    authors: &'a [AuthorSummary],
}

#[must_use]
pub fn to_json(records: &[BranchRecord], authors: &[AuthorSummary]) -> String {
    serde_json::to_string_pretty(&JsonReport {
        branches: records,
        authors,
    })
    .unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::types::MergeState;

    #[test]
    fn to_json_includes_record_and_author_fields() {
        let records = vec![BranchRecord {
            name: "feature/x".to_string(),
            short_name: "feature/x".to_string(),
            last_commit: DateTime::parse_from_str(
                "2026-01-02 12:00:00 +0000",
                "%Y-%m-%d %H:%M:%S %z",
            )
            .unwrap(),
            age_days: 42,
            author: "Alice".to_string(),
            message: "wip".to_string(),
            commits_ahead: 2,
            files_changed: 3,
            lines_added: 40,
            lines_deleted: 10,
            net_change: 30,
            merge_state: MergeState::PointerMerged,
            has_open_pr: false,
        }];
        let authors = vec![AuthorSummary {
            author: "Alice".to_string(),
            branches: 1,
        }];

        let json = to_json(&records, &authors);
        assert!(json.contains("\"name\": \"feature/x\""));
        assert!(json.contains("\"merge_state\": \"pointer_merged\""));
        assert!(json.contains("\"branches\""));
        assert!(json.contains("\"authors\""));
    }
}
