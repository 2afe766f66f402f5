use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

pub const PDF_EXTENSION: &str = "pdf";

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(RequestTicket);
id_newtype!(UtteranceId);

/// Identifies one session: the lifetime of one selected document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Page selection: every page, or a single 1-based page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageToken {
    #[default]
    All,
    Page(u32),
}

impl PageToken {
    pub fn page(self) -> Option<u32> {
        match self {
            PageToken::All => None,
            PageToken::Page(page) => Some(page),
        }
    }

    /// Checks the token against a page count. `All` is always valid.
    pub fn validate(self, page_count: u32) -> Result<Self, DomainError> {
        match self {
            PageToken::All => Ok(self),
            PageToken::Page(0) => Err(DomainError::ZeroPage),
            PageToken::Page(page) if page > page_count => {
                Err(DomainError::PageOutOfRange { page, page_count })
            }
            PageToken::Page(_) => Ok(self),
        }
    }

    pub fn label(self) -> String {
        match self {
            PageToken::All => "All Pages".to_string(),
            PageToken::Page(page) => format!("Page {page}"),
        }
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageToken::All => f.write_str("all"),
            PageToken::Page(page) => write!(f, "{page}"),
        }
    }
}

/// Every selectable token for a document with `page_count` pages, `All` first.
pub fn page_options(page_count: u32) -> Vec<PageToken> {
    std::iter::once(PageToken::All)
        .chain((1..=page_count).map(PageToken::Page))
        .collect()
}

pub fn page_count_label(page_count: u32) -> String {
    let noun = if page_count == 1 { "page" } else { "pages" };
    format!("{page_count} {noun} detected")
}

/// Extension filter applied by the pickers. Content is never inspected.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
        .unwrap_or(false)
}
