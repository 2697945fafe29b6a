pub mod assemble;
pub mod document;
pub mod image_page;

pub use document::PdfDocument;
