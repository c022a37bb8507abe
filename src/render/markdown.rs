//! Append-only Markdown accumulation.

use crate::model::ConversionUnit;

/// Accumulates classified, ordered units into Markdown text.
///
/// The sink never reorders: callers must push units in final document
/// order. Block-level units (headings, paragraphs, tables, figures) are
/// preceded by a blank line when prior content exists; list items and
/// table rows attach directly. Table rows are buffered and written as one
/// normalized table when the next non-table unit arrives or the sink is
/// finished.
#[derive(Debug, Default)]
pub struct MarkdownSink {
    out: String,
    table: Vec<Vec<String>>,
}

impl MarkdownSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one unit.
    pub fn push(&mut self, unit: ConversionUnit) {
        match unit {
            ConversionUnit::TableHeader(cells) => {
                // A header row while a table is buffered starts a new table.
                self.flush_table();
                self.table.push(cells);
                return;
            }
            ConversionUnit::TableRow(cells) => {
                self.table.push(cells);
                return;
            }
            _ => {}
        }

        self.flush_table();
        if unit.is_block_level() {
            self.separator();
        }
        match unit {
            ConversionUnit::Heading(level, text) => {
                let level = level.clamp(1, 6);
                self.out.push_str(&"#".repeat(level as usize));
                self.out.push(' ');
                self.out.push_str(&text);
                self.out.push('\n');
            }
            ConversionUnit::Paragraph(text) => {
                self.out.push_str(&text);
                self.out.push('\n');
            }
            ConversionUnit::BulletItem(text) => {
                self.out.push_str("- ");
                self.out.push_str(&text);
                self.out.push('\n');
            }
            ConversionUnit::NumberedItem(index, text) => {
                self.out.push_str(&format!("{}. {}\n", index, text));
            }
            ConversionUnit::FigurePlaceholder(caption) => {
                if caption.is_empty() {
                    self.out.push_str("*[Figure]*\n");
                } else {
                    self.out.push_str(&format!("*[Figure: {}]*\n", caption));
                }
            }
            ConversionUnit::TableHeader(_) | ConversionUnit::TableRow(_) => unreachable!(),
        }
    }

    /// Finalize and return the accumulated Markdown.
    pub fn finish(mut self) -> String {
        self.flush_table();
        self.out
    }

    /// Blank line before the next block-level unit, if content exists.
    fn separator(&mut self) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
    }

    /// Write the buffered table, normalized to its widest row.
    ///
    /// The first row always renders as the header; when no explicit
    /// header was pushed, the first data row is consumed as the header
    /// and excluded from the body.
    fn flush_table(&mut self) {
        if self.table.is_empty() {
            return;
        }
        let rows = std::mem::take(&mut self.table);
        let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        if cols == 0 {
            return;
        }

        self.separator();
        for (i, row) in rows.iter().enumerate() {
            self.out.push('|');
            for c in 0..cols {
                let cell = row.get(c).map(String::as_str).unwrap_or("");
                self.out.push(' ');
                self.out.push_str(&escape_cell(cell));
                self.out.push_str(" |");
            }
            self.out.push('\n');
            if i == 0 {
                self.out.push('|');
                for _ in 0..cols {
                    self.out.push_str(" --- |");
                }
                self.out.push('\n');
            }
        }
    }
}

/// Table cells cannot carry raw pipes or newlines.
fn escape_cell(cell: &str) -> String {
    cell.replace('\n', " ").replace('|', "\\|")
}
