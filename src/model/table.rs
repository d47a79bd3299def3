// File: ./src/model/table.rs
// Markdown table rendering for list notes.
use crate::model::display::DisplayRow;
use unicode_width::UnicodeWidthStr;

pub const COLUMNS: [&str; 8] = [
    "id",
    "order",
    "name",
    "status",
    "date_created",
    "creator",
    "assignees",
    "priority",
];

/// Escapes a value so it stays inside one table cell.
pub fn escape_cell(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("<br>");
            }
            '\n' => out.push_str("<br>"),
            _ => out.push(c),
        }
    }
    out
}

fn row_cells(row: &DisplayRow) -> [String; 8] {
    [
        escape_cell(&row.id),
        row.order.to_string(),
        escape_cell(&row.name),
        escape_cell(&row.status),
        escape_cell(&row.date_created),
        escape_cell(&row.creator),
        escape_cell(&row.assignees.join(", ")),
        escape_cell(&row.priority.join(", ")),
    ]
}

fn push_line<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        let cell = cell.as_ref();
        let pad = width.saturating_sub(cell.width());
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(pad));
        out.push_str(" |");
    }
    out.push('\n');
}

/// Renders rows as a GitHub-flavoured Markdown table, columns padded to the
/// widest cell. An empty slice yields the header and separator only.
pub fn render_table(rows: &[DisplayRow]) -> String {
    let body: Vec<[String; 8]> = rows.iter().map(row_cells).collect();

    let mut widths: Vec<usize> = COLUMNS.iter().map(|h| h.width().max(3)).collect();
    for cells in &body {
        for (w, cell) in widths.iter_mut().zip(cells.iter()) {
            *w = (*w).max(cell.width());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &COLUMNS[..], &widths);
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, separator.as_slice(), &widths);
    for cells in &body {
        push_line(&mut out, &cells[..], &widths);
    }
    out
}
