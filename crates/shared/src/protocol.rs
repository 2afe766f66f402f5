//! Wire format of the extraction service.

use serde::{Deserialize, Serialize};

pub const GET_PAGES_PATH: &str = "get-pages";
pub const READ_PREVIEW_PATH: &str = "read-preview";

pub const FILE_FIELD: &str = "file";
pub const PAGE_FIELD: &str = "page";
pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCountResponse {
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_uses_camel_case_field() {
        let parsed: PageCountResponse =
            serde_json::from_str(r#"{"totalPages": 5}"#).expect("decode");
        assert_eq!(parsed.total_pages, 5);
    }

    #[test]
    fn page_count_rejects_negative_totals() {
        assert!(serde_json::from_str::<PageCountResponse>(r#"{"totalPages": -1}"#).is_err());
    }

    #[test]
    fn preview_ignores_extra_fields() {
        let parsed: PreviewResponse =
            serde_json::from_str(r#"{"text": "Hello", "page": 3}"#).expect("decode");
        assert_eq!(parsed.text, "Hello");
    }
}
