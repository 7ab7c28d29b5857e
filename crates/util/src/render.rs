//! Plain-text rendering of engine view models for terminal output.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use xcs_types::view::DetailValue;
use xcs_types::{Banner, Cell, Dialog, DialogBody, ErrorModal, Table};

/// Widest a single column may grow before its cells are truncated.
const MAX_COLUMN_WIDTH: usize = 48;
const COLUMN_GAP: &str = "  ";

/// Text shown for a single cell.
pub fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text { text } => single_line(text),
        Cell::Toggle { checked, disabled } => {
            let mark = if *checked { "[x]" } else { "[ ]" };
            if *disabled { format!("{mark} (locked)") } else { mark.to_string() }
        }
        Cell::Action { label, disabled, .. } => {
            if *disabled {
                format!("({label})")
            } else {
                label.clone()
            }
        }
        Cell::List { items } => single_line(&items.join(", ")),
    }
}

/// Render a table with padded columns. Hidden rows are skipped and the
/// empty message replaces the body when nothing is visible.
pub fn render_table(table: &Table) -> String {
    let mut out = String::new();
    if let Some(title) = &table.title {
        out.push_str(title);
        out.push('\n');
    }

    let rows: Vec<Vec<String>> = table
        .visible_rows()
        .map(|row| row.cells.iter().map(render_cell).collect())
        .collect();
    if rows.is_empty() {
        out.push_str(&table.empty_message);
        out.push('\n');
        return out;
    }

    let mut widths: Vec<usize> = table.columns.iter().map(|column| column.width()).collect();
    for row in &rows {
        for (index, text) in row.iter().enumerate() {
            if index >= widths.len() {
                widths.push(0);
            }
            widths[index] = widths[index].max(text.width());
        }
    }
    for width in widths.iter_mut() {
        *width = (*width).min(MAX_COLUMN_WIDTH);
    }

    out.push_str(&format_line(&table.columns, &widths));
    let rule_width = widths.iter().sum::<usize>() + COLUMN_GAP.len() * widths.len().saturating_sub(1);
    out.push_str(&"─".repeat(rule_width));
    out.push('\n');
    for row in &rows {
        out.push_str(&format_line(row, &widths));
    }
    out
}

/// Render a dialog: title, body blocks, then the offered buttons.
pub fn render_dialog(dialog: &Dialog, width: usize) -> String {
    let mut out = String::new();
    if !dialog.title.is_empty() {
        out.push_str(&format!("== {} ==\n", dialog.title));
    }
    for block in &dialog.body {
        match block {
            DialogBody::Paragraph { text } => {
                for line in textwrap::wrap(text, width.max(20)) {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            DialogBody::Lines { lines } => {
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
            DialogBody::Bullets { items } => {
                for item in items {
                    out.push_str(&format!("  • {item}\n"));
                }
            }
            DialogBody::Details { rows } => {
                let key_width = rows.iter().map(|(key, _)| key.width()).max().unwrap_or(0);
                for (key, value) in rows {
                    let padding = " ".repeat(key_width.saturating_sub(key.width()));
                    match value {
                        DetailValue::Code(text) => out.push_str(&format!("{key}{padding}  {text}\n")),
                        DetailValue::List(items) if items.is_empty() => out.push_str(&format!("{key}{padding}  []\n")),
                        DetailValue::List(items) => {
                            out.push_str(&format!("{key}{padding}\n"));
                            for item in items {
                                out.push_str(&format!("{}  - {item}\n", " ".repeat(key_width)));
                            }
                        }
                    }
                }
            }
            DialogBody::Table { table } => out.push_str(&render_table(table)),
        }
        out.push('\n');
    }
    if !dialog.buttons.is_empty() {
        let labels: Vec<String> = dialog
            .buttons
            .iter()
            .map(|button| match &button.target {
                Some(target) => format!("[{}: {}]", button.label, target),
                None => format!("[{}]", button.label),
            })
            .collect();
        out.push_str(&labels.join(" "));
        out.push('\n');
    }
    out
}

pub fn render_banner(banner: &Banner) -> String {
    format!("✓ {}", banner.message)
}

pub fn render_error(modal: &ErrorModal) -> String {
    format!("✗ {}\n{}", modal.title, modal.message)
}

fn format_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let mut parts = Vec::with_capacity(widths.len());
    for (index, width) in widths.iter().enumerate() {
        let text = cells.get(index).map(|cell| cell.as_ref()).unwrap_or("");
        parts.push(pad_to_width(&fit_to_width(text, *width), *width));
    }
    let mut line = parts.join(COLUMN_GAP).trim_end().to_string();
    line.push('\n');
    line
}

/// Cut `text` to at most `width` display columns, ending in `…` when cut.
pub fn fit_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('…');
    out
}

fn pad_to_width(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(padding))
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcs_types::{DialogButton, TableRow};

    fn sample_table() -> Table {
        let mut table = Table::new(["Command", "Enabled"]).with_title("Commands");
        table.push(TableRow::new("1", vec![Cell::text("Run dcm2niix"), Cell::toggle(true)]));
        table.push(TableRow::new(
            "2",
            vec![Cell::text("Debug"), Cell::Toggle { checked: false, disabled: true }],
        ));
        table
    }

    #[test]
    fn table_pads_columns_and_marks_toggles() {
        let text = render_table(&sample_table());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Commands");
        assert_eq!(lines[1], "Command       Enabled");
        assert_eq!(lines[3], "Run dcm2niix  [x]");
        assert_eq!(lines[4], "Debug         [ ] (locked)");
    }

    #[test]
    fn empty_table_prints_message() {
        let table = Table::new(["ID"]).with_empty_message("No command event mappings exist for this project.");
        assert_eq!(render_table(&table), "No command event mappings exist for this project.\n");
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(fit_to_width("abcdefgh", 5), "abcd…");
        assert_eq!(fit_to_width("abc", 5), "abc");
    }

    #[test]
    fn dialog_lists_buttons_with_targets() {
        let mut dialog = Dialog::new("View stdout").with_body(DialogBody::Lines {
            lines: vec!["line one".into(), "line two".into()],
        });
        dialog.buttons.push(DialogButton::new("OK"));
        dialog.buttons.push(DialogButton::with_target("View Parent Container", "4"));
        let text = render_dialog(&dialog, 80);
        assert!(text.starts_with("== View stdout ==\nline one\nline two\n"));
        assert!(text.ends_with("[OK] [View Parent Container: 4]\n"));
    }
}
