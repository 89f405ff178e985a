use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::render::SerializationError;

pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> Result<String, SerializationError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdConverter;

impl Converter for Html2MdConverter {
    fn to_markdown(&self, html: &str) -> Result<String, SerializationError> {
        // html2md panics on some malformed tables.
        catch_unwind(AssertUnwindSafe(|| html2md::parse_html(html)))
            .map_err(|_| SerializationError::Converter("html2md panicked".to_string()))
    }
}
