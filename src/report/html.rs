//! HTML report generation.
//!
//! Emits one self-contained document with embedded CSS and JavaScript;
//! sorting and filtering run client-side and work offline.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::AuditError;
use crate::identity::RepoIdentity;
use crate::types::{AuthorSummary, BranchRecord, StaleClass};

/// Render the full report document.
#[must_use]
pub fn render_report(
    records: &[BranchRecord],
    authors: &[AuthorSummary],
    identity: &RepoIdentity,
    generated: DateTime<Utc>,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Stale Branch Report - {repo}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        {header}
        {summary}
        {filters}
        {author_table}
        {branch_table}
        {footer}
    </div>
    <script>{js}</script>
</body>
</html>"#,
        repo = html_escape(&format!("{}/{}", identity.owner, identity.name)),
        css = inline_css(),
        js = inline_javascript(),
        header = render_header(identity, generated),
        summary = render_summary(records, authors),
        filters = render_filters(),
        author_table = render_author_table(authors),
        branch_table = render_branch_table(records, identity),
        footer = render_footer(),
    )
}

/// Full overwrite of the destination path.
///
/// # Errors
/// Fails when the file cannot be written.
pub fn write_report(path: &Path, html: &str) -> Result<(), AuditError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let _ = fs::create_dir_all(parent);
    }
    fs::write(path, html).map_err(|source| AuditError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn render_header(identity: &RepoIdentity, generated: DateTime<Utc>) -> String {
    format!(
        r#"<header>
    <h1>Stale Branch Report</h1>
    <div class="meta">
        <span>Repository: <strong>{repo}</strong></span> &middot;
        <span>Generated: {generated}</span>
    </div>
</header>"#,
        repo = html_escape(&format!("{}/{}", identity.owner, identity.name)),
        generated = generated.format("%Y-%m-%d %H:%M UTC"),
    )
}

fn render_summary(records: &[BranchRecord], authors: &[AuthorSummary]) -> String {
    let high = records
        .iter()
        .filter(|r| r.stale_class() == StaleClass::High)
        .count();
    format!(
        r#"<div class="summary">
    <div class="summary-card">
        <h3>Stale Branches</h3>
        <div class="value" id="visible-count">{total}</div>
    </div>
    <div class="summary-card">
        <h3>Authors</h3>
        <div class="value">{authors}</div>
    </div>
    <div class="summary-card">
        <h3>High Severity</h3>
        <div class="value severity-high">{high}</div>
    </div>
</div>"#,
        total = records.len(),
        authors = authors.len(),
        high = high,
    )
}

fn render_filters() -> &'static str {
    r#"<div class="filters">
    <div class="filter-group">
        <label for="branch-filter">Branch</label>
        <input type="text" id="branch-filter" placeholder="Filter by branch name...">
    </div>
    <div class="filter-group">
        <label for="author-filter">Author</label>
        <input type="text" id="author-filter" placeholder="Filter by author...">
    </div>
</div>"#
}

fn render_author_table(authors: &[AuthorSummary]) -> String {
    let mut rows = String::new();
    for entry in authors {
        let _ = write!(
            rows,
            r#"<tr data-author="{author}" data-count="{count}">
    <td>{author}</td>
    <td class="author-count">{count}</td>
</tr>
"#,
            author = html_escape(&entry.author),
            count = entry.branches,
        );
    }
    format!(
        r#"<div class="section">
    <h2>Branches per Author</h2>
    <table id="author-table">
        <thead>
            <tr>
                <th class="sortable" data-table="author-table" data-column="author">Author</th>
                <th class="sortable" data-table="author-table" data-column="count">Branches</th>
            </tr>
        </thead>
        <tbody>
{rows}        </tbody>
    </table>
</div>"#
    )
}

fn render_branch_table(records: &[BranchRecord], identity: &RepoIdentity) -> String {
    let mut rows = String::new();
    for record in records {
        let _ = write!(
            rows,
            r#"<tr class="{class}" data-branch="{branch}" data-author="{author}" data-age="{age}" data-date="{date}" data-status="{status}" data-commits="{commits}" data-files="{files}" data-added="{added}" data-deleted="{deleted}" data-net="{net}">
    <td class="monospace"><a href="{url}">{branch}</a></td>
    <td>{age}</td>
    <td>{date}</td>
    <td>{author}</td>
    <td>{status}</td>
    <td>{commits}</td>
    <td>{files}</td>
    <td>{added}</td>
    <td>{deleted}</td>
    <td>{net_display}</td>
    <td>{message}</td>
</tr>
"#,
            class = record.stale_class().css_class(),
            branch = html_escape(&record.name),
            author = html_escape(&record.author),
            age = record.age_days,
            date = record.last_commit.format("%Y-%m-%d"),
            status = record.status_label(),
            commits = record.commits_ahead,
            files = record.files_changed,
            added = record.lines_added,
            deleted = record.lines_deleted,
            net = record.net_change,
            net_display = format_net(record.net_change),
            url = html_escape(&identity.branch_url(&record.short_name)),
            message = html_escape(&record.message),
        );
    }
    format!(
        r#"<div class="section">
    <h2>Stale Branches</h2>
    <table id="branch-table">
        <thead>
            <tr>
                <th class="sortable" data-table="branch-table" data-column="branch">Branch</th>
                <th class="sortable" data-table="branch-table" data-column="age">Age (days)</th>
                <th class="sortable" data-table="branch-table" data-column="date">Last Commit</th>
                <th class="sortable" data-table="branch-table" data-column="author">Author</th>
                <th class="sortable" data-table="branch-table" data-column="status">Status</th>
                <th class="sortable" data-table="branch-table" data-column="commits">Commits</th>
                <th class="sortable" data-table="branch-table" data-column="files">Files</th>
                <th class="sortable" data-table="branch-table" data-column="added">Added</th>
                <th class="sortable" data-table="branch-table" data-column="deleted">Deleted</th>
                <th class="sortable" data-table="branch-table" data-column="net">Net</th>
                <th>Message</th>
            </tr>
        </thead>
        <tbody>
{rows}        </tbody>
    </table>
</div>"#
    )
}

fn render_footer() -> &'static str {
    r#"<footer>
    Generated by unmerged &mdash; merged branches are excluded; pointer-merged entries need manual review.
</footer>"#
}

fn format_net(net: i64) -> String {
    if net > 0 {
        format!("+{net}")
    } else {
        net.to_string()
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn inline_css() -> &'static str {
    r"
* {
    box-sizing: border-box;
    margin: 0;
    padding: 0;
}

body {
    font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
    line-height: 1.6;
    color: #111827;
    background: #ffffff;
}

.container {
    max-width: 1400px;
    margin: 0 auto;
    padding: 2rem;
}

header {
    margin-bottom: 2rem;
    padding-bottom: 1rem;
    border-bottom: 2px solid #e5e7eb;
}

header h1 {
    font-size: 2rem;
    font-weight: 700;
    margin-bottom: 0.5rem;
}

header .meta {
    color: #6b7280;
    font-size: 0.875rem;
}

.summary {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
    gap: 1rem;
    margin-bottom: 2rem;
}

.summary-card {
    background: #f9fafb;
    padding: 1rem;
    border-radius: 0.5rem;
    border-left: 4px solid #3b82f6;
}

.summary-card h3 {
    font-size: 0.875rem;
    font-weight: 600;
    color: #6b7280;
    margin-bottom: 0.5rem;
}

.summary-card .value {
    font-size: 1.5rem;
    font-weight: 700;
}

.severity-high {
    color: #ef4444;
}

.section {
    margin-bottom: 2rem;
}

.section h2 {
    font-size: 1.5rem;
    font-weight: 700;
    margin-bottom: 1rem;
}

.filters {
    display: flex;
    gap: 1rem;
    margin-bottom: 1rem;
    flex-wrap: wrap;
}

.filter-group {
    display: flex;
    flex-direction: column;
    gap: 0.25rem;
}

.filter-group label {
    font-size: 0.75rem;
    font-weight: 600;
    color: #6b7280;
}

.filter-group input {
    padding: 0.5rem;
    border: 1px solid #d1d5db;
    border-radius: 0.375rem;
    font-size: 0.875rem;
}

.filter-group input:focus {
    outline: none;
    border-color: #3b82f6;
}

table {
    width: 100%;
    border-collapse: collapse;
    background: #ffffff;
}

thead {
    background: #f9fafb;
}

th {
    padding: 0.75rem;
    text-align: left;
    font-weight: 600;
    font-size: 0.875rem;
    color: #374151;
    border-bottom: 2px solid #e5e7eb;
}

td {
    padding: 0.75rem;
    border-bottom: 1px solid #e5e7eb;
    font-size: 0.875rem;
}

tr:last-child td {
    border-bottom: none;
}

tr.stale-high td {
    background: #fee2e2;
}

tr.stale-mid td {
    background: #ffedd5;
}

tr.stale-low td {
    background: #f0fdf4;
}

.monospace {
    font-family: 'Monaco', 'Courier New', monospace;
    font-size: 0.875rem;
}

a {
    color: #2563eb;
    text-decoration: none;
}

a:hover {
    text-decoration: underline;
}

th.sortable {
    cursor: pointer;
    user-select: none;
}

th.sortable:hover {
    background: #e5e7eb;
}

th.sortable.asc::after {
    content: ' \2191';
}

th.sortable.desc::after {
    content: ' \2193';
}

footer {
    margin-top: 3rem;
    padding-top: 1rem;
    border-top: 1px solid #e5e7eb;
    text-align: center;
    color: #6b7280;
    font-size: 0.875rem;
}

@media (max-width: 768px) {
    .container {
        padding: 1rem;
    }

    table {
        font-size: 0.75rem;
    }

    th, td {
        padding: 0.5rem;
    }
}
"
}

fn inline_javascript() -> &'static str {
    r#"
(function() {
    const sortState = {};

    function sortTable(tableId, column, th) {
        const tbody = document.querySelector('#' + tableId + ' tbody');
        if (!tbody) { return; }
        const rows = Array.from(tbody.querySelectorAll('tr'));
        const current = sortState[tableId];
        let direction = 'desc';
        if (current && current.column === column) {
            direction = current.direction === 'desc' ? 'asc' : 'desc';
        }
        sortState[tableId] = { column: column, direction: direction };

        document.querySelectorAll('#' + tableId + ' th.sortable').forEach(el => {
            el.classList.remove('asc', 'desc');
        });
        th.classList.add(direction);

        rows.sort((a, b) => {
            const aVal = a.dataset[column] || '';
            const bVal = b.dataset[column] || '';
            const aNum = parseFloat(aVal);
            const bNum = parseFloat(bVal);
            let cmp;
            if (!isNaN(aNum) && !isNaN(bNum)) {
                cmp = aNum - bNum;
            } else {
                cmp = aVal.localeCompare(bVal);
            }
            return direction === 'asc' ? cmp : -cmp;
        });
        rows.forEach(row => tbody.appendChild(row));
    }

    // Filtering keeps the two tables consistent: hiding branch rows also
    // hides authors with no visible branches and rewrites their counts.
    function applyFilters() {
        const branchNeedle = (document.getElementById('branch-filter').value || '').toLowerCase();
        const authorNeedle = (document.getElementById('author-filter').value || '').toLowerCase();

        const branchRows = document.querySelectorAll('#branch-table tbody tr');
        const visibleByAuthor = {};
        let visibleTotal = 0;
        branchRows.forEach(row => {
            const branch = (row.dataset.branch || '').toLowerCase();
            const author = (row.dataset.author || '').toLowerCase();
            const visible = branch.indexOf(branchNeedle) !== -1 &&
                author.indexOf(authorNeedle) !== -1;
            row.style.display = visible ? '' : 'none';
            if (visible) {
                visibleTotal += 1;
                visibleByAuthor[row.dataset.author] =
                    (visibleByAuthor[row.dataset.author] || 0) + 1;
            }
        });

        document.querySelectorAll('#author-table tbody tr').forEach(row => {
            const count = visibleByAuthor[row.dataset.author] || 0;
            const cell = row.querySelector('.author-count');
            if (cell) { cell.textContent = count; }
            row.dataset.count = count;
            row.style.display = count > 0 ? '' : 'none';
        });

        const totalEl = document.getElementById('visible-count');
        if (totalEl) { totalEl.textContent = visibleTotal; }
    }

    document.addEventListener('DOMContentLoaded', function() {
        document.querySelectorAll('th.sortable').forEach(th => {
            th.addEventListener('click', function() {
                sortTable(this.dataset.table, this.dataset.column, this);
            });
        });
        ['branch-filter', 'author-filter'].forEach(id => {
            const input = document.getElementById(id);
            if (input) { input.addEventListener('input', applyFilters); }
        });
    });
})();
"#
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::MergeState;

    fn record(name: &str, age_days: u64) -> BranchRecord {
        BranchRecord {
            name: name.to_string(),
            short_name: name.to_string(),
            last_commit: chrono::DateTime::parse_from_str(
                "2026-01-02 12:00:00 +0000",
                "%Y-%m-%d %H:%M:%S %z",
            )
            .unwrap(),
            age_days,
            author: "Alice".to_string(),
            message: "work in progress".to_string(),
            commits_ahead: 2,
            files_changed: 3,
            lines_added: 40,
            lines_deleted: 10,
            net_change: 30,
            merge_state: MergeState::Unmerged,
            has_open_pr: false,
        }
    }

    fn generated() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn renders_branch_links_from_identity() {
        let identity = RepoIdentity {
            owner: "acme".to_string(),
            name: "widgets".to_string(),
        };
        let records = vec![record("feature/x", 10)];
        let authors = vec![AuthorSummary {
            author: "Alice".to_string(),
            branches: 1,
        }];
        let html = render_report(&records, &authors, &identity, generated());
        assert!(html.contains("https://github.com/acme/widgets/tree/feature/x"));
        assert!(html.contains("feature/x"));
        assert!(html.contains("Unmerged"));
    }

    #[test]
    fn placeholder_identity_still_renders_links() {
        let records = vec![record("feature/x", 10)];
        let html = render_report(&records, &[], &RepoIdentity::unknown(), generated());
        assert!(html.contains("https://github.com/unknown/unknown/tree/feature/x"));
    }

    #[test]
    fn row_class_reflects_stale_severity() {
        let records = vec![record("old", 120), record("middling", 45), record("new", 3)];
        let html = render_report(&records, &[], &RepoIdentity::unknown(), generated());
        assert!(html.contains(r#"<tr class="stale-high""#));
        assert!(html.contains(r#"<tr class="stale-mid""#));
        assert!(html.contains(r#"<tr class="stale-low""#));
    }

    #[test]
    fn escapes_interpolated_text() {
        let mut rec = record("feature/x", 10);
        rec.message = "<script>alert('x')</script>".to_string();
        rec.author = "A & B".to_string();
        let html = render_report(&[rec], &[], &RepoIdentity::unknown(), generated());
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("A &amp; B"));
    }

    #[test]
    fn zero_results_render_without_failing() {
        let html = render_report(&[], &[], &RepoIdentity::unknown(), generated());
        assert!(html.contains("Stale Branch Report"));
        assert!(html.contains(r#"<div class="value" id="visible-count">0</div>"#));
    }

    #[test]
    fn write_report_overwrites_destination() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("report.html");
        write_report(&path, "first").unwrap();
        write_report(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
