//! View models produced by the engine and rendered by the front end.
//!
//! They carry text and control state only. Rendering (terminal tables,
//! JSON output) lives in `xcs-util` and the CLI.

use serde::Serialize;

/// A rendered listing. `empty_message` is shown in place of rows when the
/// listing has none.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Table {
    pub title: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub empty_message: String,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn push(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows not hidden by a client-side filter.
    pub fn visible_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(|row| !row.hidden)
    }

    pub fn row(&self, key: &str) -> Option<&TableRow> {
        self.rows.iter().find(|row| row.key == key)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TableRow {
    /// Stable identifier for the row (wrapper id, hub id, history id).
    pub key: String,
    pub cells: Vec<Cell>,
    pub hidden: bool,
}

impl TableRow {
    pub fn new(key: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            key: key.into(),
            cells,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    Text { text: String },
    Toggle { checked: bool, disabled: bool },
    Action { label: String, disabled: bool, title: Option<String> },
    List { items: Vec<String> },
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Cell::Text { text: text.into() }
    }

    pub fn toggle(checked: bool) -> Self {
        Cell::Toggle { checked, disabled: false }
    }

    pub fn action(label: impl Into<String>) -> Self {
        Cell::Action {
            label: label.into(),
            disabled: false,
            title: None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Modal content: a titled body plus the buttons offered.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Dialog {
    pub title: String,
    pub body: Vec<DialogBody>,
    pub buttons: Vec<DialogButton>,
}

impl Dialog {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: DialogBody) -> Self {
        self.body.push(body);
        self
    }

    pub fn with_button(mut self, button: DialogButton) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn button_labels(&self) -> Vec<&str> {
        self.buttons.iter().map(|button| button.label.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DialogBody {
    Paragraph { text: String },
    /// Preformatted lines, one block per line.
    Lines { lines: Vec<String> },
    Bullets { items: Vec<String> },
    Details { rows: Vec<(String, DetailValue)> },
    Table { table: Table },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DetailValue {
    Code(String),
    List(Vec<String>),
}

/// A follow-up action offered by a dialog. `target` names the record the
/// action opens (a history id, a log file).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DialogButton {
    pub label: String,
    pub target: Option<String>,
}

impl DialogButton {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: None,
        }
    }

    pub fn with_target(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: Some(target.into()),
        }
    }
}

/// A transient success notice.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
}

impl Banner {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// A blocking failure notice.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorModal {
    pub title: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_rows_are_skipped_by_visible_rows() {
        let mut table = Table::new(["ID", "Name"]).with_empty_message("nothing");
        table.push(TableRow::new("1", vec![Cell::text("1"), Cell::text("a")]));
        let mut hidden = TableRow::new("2", vec![Cell::text("2"), Cell::text("b")]);
        hidden.hidden = true;
        table.push(hidden);
        assert_eq!(table.visible_rows().count(), 1);
        assert_eq!(table.row("2").and_then(|row| row.cells[1].as_text()), Some("b"));
    }
}
