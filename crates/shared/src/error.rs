use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("page numbers start at 1")]
    ZeroPage,
    #[error("page {page} is out of range for a document with {page_count} pages")]
    PageOutOfRange { page: u32, page_count: u32 },
}
