mod notion;
mod pdf;
mod text;
mod url;

pub use self::notion::NotionExtractor;
pub use self::pdf::extract_pdf;
pub use self::text::extract_text_file;
pub use self::url::UrlExtractor;

/// Title and plain-text body pulled out of an external document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub title: String,
    pub content: String,
}
