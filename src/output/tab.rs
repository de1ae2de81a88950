use clap::ValueEnum;
use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Modify, Panel, Style, object::{Columns, Rows}, style::LineText},
};

use crate::types::BranchRecord;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TabStyle {
    Rounded,
    Modern,
    Ascii,
    Psql,
    Markdown,
    Blank,
    Empty,
}

#[must_use]
pub fn format_tab(records: &[BranchRecord], style: TabStyle) -> String {
    if records.is_empty() {
        return render_empty(style);
    }

    let mut builder = Builder::default();
    builder.push_record([
        "Branch", "Age (days)", "Author", "Status", "Commits", "Files", "Added", "Deleted", "Net",
    ]);
    for record in records {
        builder.push_record([
            record.name.clone(),
            record.age_days.to_string(),
            record.author.clone(),
            record.status_label().to_string(),
            record.commits_ahead.to_string(),
            record.files_changed.to_string(),
            record.lines_added.to_string(),
            record.lines_deleted.to_string(),
            record.net_change.to_string(),
        ]);
    }

    let mut table = builder.build();
    apply_style(&mut table, style);
    // Columns: 0 Branch, 1 Age, 2 Author, 3 Status, 4..9 numeric
    table.with(Modify::new(Columns::new(4..9)).with(Alignment::right()));
    apply_title_line(&mut table, "Stale Branches");
    table.to_string()
}

fn render_empty(style: TabStyle) -> String {
    let mut builder = Builder::default();
    builder.push_record(["(none)"]);
    let mut table = builder.build();
    apply_style(&mut table, style);
    table.with(Panel::header(" Stale Branches "));
    table.to_string()
}

fn apply_style(table: &mut Table, style: TabStyle) {
    match style {
        TabStyle::Rounded => table.with(Style::rounded()),
        TabStyle::Modern => table.with(Style::modern()),
        TabStyle::Ascii => table.with(Style::ascii()),
        TabStyle::Psql => table.with(Style::psql()),
        TabStyle::Markdown => table.with(Style::markdown()),
        TabStyle::Blank => table.with(Style::blank()),
        TabStyle::Empty => table.with(Style::empty()),
    };
}

fn apply_title_line(table: &mut Table, title: &str) {
    table.with(LineText::new(format!(" {title} "), Rows::first()).offset(1));
}
