//! Classified output units consumed by the Markdown sink.

/// One classified, ordered piece of document content.
///
/// Callers must emit units in final document order; the sink never
/// reorders them.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionUnit {
    /// A heading with level 1-6.
    Heading(u8, String),
    /// A body paragraph.
    Paragraph(String),
    /// An unordered list item (marker already stripped).
    BulletItem(String),
    /// An ordered list item with its sequential 1-based index.
    NumberedItem(u32, String),
    /// A table header row.
    TableHeader(Vec<String>),
    /// A table body row.
    TableRow(Vec<String>),
    /// A placeholder for non-text content, with caption text.
    FigurePlaceholder(String),
}

impl ConversionUnit {
    /// Whether this unit demands a blank-line separator before it when
    /// prior content exists. List items and table rows attach to the
    /// preceding unit instead.
    pub fn is_block_level(&self) -> bool {
        !matches!(
            self,
            ConversionUnit::BulletItem(_)
                | ConversionUnit::NumberedItem(_, _)
                | ConversionUnit::TableRow(_)
        )
    }
}
