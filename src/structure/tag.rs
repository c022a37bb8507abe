//! Structure tag classification with role-map alias resolution.

use std::collections::HashMap;

/// Semantic role of a structure node, after alias remapping.
///
/// A closed set so call sites pattern-match exhaustively instead of
/// re-deriving string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Heading with level 1-6.
    Heading(u8),
    /// Body paragraph.
    Paragraph,
    /// List container (`L`).
    List,
    /// List item (`LI`).
    ListItem,
    /// List item label (`Lbl`), the bullet or number marker.
    Label,
    /// List item body (`LBody`).
    ListBody,
    /// Table container.
    Table,
    /// Table row (`TR`).
    TableRow,
    /// Table header cell (`TH`).
    TableHeaderCell,
    /// Table data cell (`TD`).
    TableCell,
    /// Figure or formula.
    Figure,
    /// Caption attached to a figure or table.
    Caption,
    /// Grouping element with no text role of its own.
    Container,
    /// Tag not in the canonical vocabulary even after remapping.
    Unknown,
}

impl Tag {
    /// Classify a raw tag name, applying the role-map alias table once
    /// (aliases are not re-resolved recursively).
    pub fn classify(raw: &str, role_map: &HashMap<String, String>) -> Tag {
        let canonical = role_map.get(raw).map(String::as_str).unwrap_or(raw);
        match canonical {
            "H" | "H1" | "Title" => Tag::Heading(1),
            "H2" => Tag::Heading(2),
            "H3" => Tag::Heading(3),
            "H4" => Tag::Heading(4),
            "H5" => Tag::Heading(5),
            "H6" => Tag::Heading(6),
            "P" => Tag::Paragraph,
            "L" => Tag::List,
            "LI" => Tag::ListItem,
            "Lbl" => Tag::Label,
            "LBody" => Tag::ListBody,
            "Table" => Tag::Table,
            "TR" => Tag::TableRow,
            "TH" => Tag::TableHeaderCell,
            "TD" => Tag::TableCell,
            "THead" | "TBody" | "TFoot" => Tag::Container,
            "Figure" | "Formula" => Tag::Figure,
            "Caption" => Tag::Caption,
            "Document" | "Part" | "Art" | "Sect" | "Div" | "BlockQuote" | "TOC" | "TOCI"
            | "Index" | "NonStruct" | "Private" | "Span" | "Quote" | "Note" | "Reference"
            | "BibEntry" | "Code" | "Link" | "Annot" | "Ruby" | "Warichu" => Tag::Container,
            _ => Tag::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_tags() {
        let empty = HashMap::new();
        assert_eq!(Tag::classify("H1", &empty), Tag::Heading(1));
        assert_eq!(Tag::classify("H6", &empty), Tag::Heading(6));
        assert_eq!(Tag::classify("P", &empty), Tag::Paragraph);
        assert_eq!(Tag::classify("L", &empty), Tag::List);
        assert_eq!(Tag::classify("TD", &empty), Tag::TableCell);
        assert_eq!(Tag::classify("Figure", &empty), Tag::Figure);
        assert_eq!(Tag::classify("Sect", &empty), Tag::Container);
        assert_eq!(Tag::classify("MyCustomTag", &empty), Tag::Unknown);
    }

    #[test]
    fn test_role_map_alias() {
        let mut map = HashMap::new();
        map.insert("Heading1".to_string(), "H1".to_string());
        assert_eq!(Tag::classify("Heading1", &map), Tag::Heading(1));
        // Untouched names still classify directly.
        assert_eq!(Tag::classify("P", &map), Tag::Paragraph);
    }

    #[test]
    fn test_role_map_applied_once_not_recursively() {
        let mut map = HashMap::new();
        map.insert("A".to_string(), "B".to_string());
        map.insert("B".to_string(), "P".to_string());
        // A maps to B, which is not canonical; no second hop to P.
        assert_eq!(Tag::classify("A", &map), Tag::Unknown);
    }

    #[test]
    fn test_bare_h_is_level_one() {
        let empty = HashMap::new();
        assert_eq!(Tag::classify("H", &empty), Tag::Heading(1));
    }
}
