use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dynamo::{item, n, number_attr, opt_string_attr, s, Item};

/// Metadata row for an uploaded object, keyed by its storage path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub file_key: String,
    pub file_name: String,
    #[serde(rename = "fileURL")]
    pub file_url: String,
    pub file_size: u64,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl FileMetadata {
    pub fn to_item(&self) -> Item {
        item([
            ("fileKey", s(&self.file_key)),
            ("fileName", s(&self.file_name)),
            ("fileURL", s(&self.file_url)),
            ("fileSize", n(self.file_size)),
            ("fileType", s(&self.file_type)),
            ("uploadedAt", s(self.uploaded_at.to_rfc3339())),
        ])
    }
}

/// A metadata row formatted for the file management table.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    pub file_key: Option<String>,
    pub file_name: Option<String>,
    #[serde(rename = "fileURL")]
    pub file_url: Option<String>,
    pub file_size: Option<String>,
    pub file_type: Option<String>,
    pub uploaded_at: Option<String>,
}

impl FileListing {
    pub fn from_item(record: &Item) -> Self {
        Self {
            file_key: opt_string_attr(record, "fileKey"),
            file_name: opt_string_attr(record, "fileName"),
            file_url: opt_string_attr(record, "fileURL"),
            file_size: number_attr(record, "fileSize").and_then(format_file_size),
            file_type: opt_string_attr(record, "fileType").map(|t| format_file_type(&t)),
            uploaded_at: opt_string_attr(record, "uploadedAt").and_then(|t| format_time(&t)),
        }
    }
}

/// Whole kilobytes, e.g. `"12 KB"`. Zero or missing sizes have no label.
pub fn format_file_size(bytes: f64) -> Option<String> {
    if bytes <= 0.0 || !bytes.is_finite() {
        return None;
    }
    Some(format!("{} KB", (bytes / 1024.0).round() as u64))
}

/// Short extension for a MIME type, or the MIME type itself when unrecognised.
pub fn format_file_type(mime: &str) -> String {
    let ext = match mime.trim().to_lowercase().as_str() {
        "application/pdf" => "pdf",
        "text/csv" => "csv",
        "text/plain" => "txt",
        "application/json" => "json",
        "image/png" => "png",
        "image/jpeg" => "jpeg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        _ => return mime.to_string(),
    };
    ext.to_string()
}

/// `yyyy-MM-dd hh:mm AM` in UTC; unparseable timestamps are dropped.
pub fn format_time(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc).format("%Y-%m-%d %I:%M %p").to_string())
}

/// Last path segment of an object key.
pub fn file_name_from_key(key: &str) -> &str {
    key.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or(key)
}
