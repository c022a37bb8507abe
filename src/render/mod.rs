//! Output rendering.

mod markdown;

pub use markdown::MarkdownSink;
