//! Per-handler configuration read from environment variables.
//!
//! Every handler reads its config at invocation time, so a missing variable fails that
//! invocation with a 500 instead of preventing the function from starting.

use std::env;
use std::time::Duration;

use crate::classify::ReportCategory;
use crate::error::{AppError, AppResult};

pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";
const UPLOAD_URL_TTL_SECS: u64 = 60;
const OCR_POLL_INTERVAL_SECS: u64 = 5;
const OCR_POLL_ATTEMPTS: u32 = 50;

fn required(name: &'static str) -> AppResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::MissingConfig(name)),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    optional(name)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub bucket: String,
    pub metadata_table: String,
    pub processing_queue_url: String,
    pub url_ttl: Duration,
}

impl UploadConfig {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            bucket: required("BUCKET_NAME")?,
            metadata_table: required("FILE_METADATA_TABLE_NAME")?,
            processing_queue_url: required("PROCESSING_QUEUE_URL")?,
            url_ttl: Duration::from_secs(parsed_or("UPLOAD_URL_TTL_SECS", UPLOAD_URL_TTL_SECS)),
        })
    }
}

#[derive(Clone, Debug)]
pub struct FileConfig {
    pub bucket: String,
    pub metadata_table: String,
}

impl FileConfig {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            bucket: required("BUCKET_NAME")?,
            metadata_table: required("FILE_METADATA_TABLE_NAME")?,
        })
    }

    /// The metadata event handlers never touch the bucket.
    pub fn table_only_from_env() -> AppResult<Self> {
        Ok(Self {
            bucket: String::new(),
            metadata_table: required("FILE_METADATA_TABLE_NAME")?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(OCR_POLL_INTERVAL_SECS),
            max_attempts: OCR_POLL_ATTEMPTS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExtractionConfig {
    pub extract_metadata_queue_url: String,
    pub poll: PollPolicy,
}

impl ExtractionConfig {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            extract_metadata_queue_url: required("EXTRACT_METADATA_QUEUE_URL")?,
            poll: PollPolicy {
                interval: Duration::from_secs(parsed_or(
                    "OCR_POLL_INTERVAL_SECS",
                    OCR_POLL_INTERVAL_SECS,
                )),
                max_attempts: parsed_or("OCR_POLL_ATTEMPTS", OCR_POLL_ATTEMPTS).max(1),
            },
        })
    }
}

/// Downstream function per report category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTable {
    pub school: String,
    pub university: String,
    pub programme: String,
    pub vocational_centre: String,
}

impl RouteTable {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            school: required("SCHOOL_LAMBDA_FUNCTION_NAME")?,
            university: required("UNIVERSITY_LAMBDA_FUNCTION_NAME")?,
            programme: required("PROGRAM_LAMBDA_FUNCTION_NAME")?,
            vocational_centre: required("VOCATIONAL_LAMBDA_FUNCTION_NAME")?,
        })
    }

    /// `None` only for `Unknown`: every known category has a function.
    pub fn function_for(&self, category: ReportCategory) -> Option<&str> {
        match category {
            ReportCategory::School => Some(&self.school),
            ReportCategory::University => Some(&self.university),
            ReportCategory::Programme => Some(&self.programme),
            ReportCategory::VocationalCentre => Some(&self.vocational_centre),
            ReportCategory::Unknown => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    pub model_id: String,
    pub metadata_table: String,
    pub bucket: Option<String>,
}

impl ExtractorConfig {
    pub fn from_env(category: ReportCategory) -> AppResult<Self> {
        let table_var = match category {
            ReportCategory::School => "INSTITUTE_METADATA_TABLE_NAME",
            ReportCategory::University => "UNIVERSITY_METADATA_TABLE_NAME",
            ReportCategory::Programme => "PROGRAM_METADATA_TABLE_NAME",
            ReportCategory::VocationalCentre => "VOCATIONAL_CENTER_METADATA_TABLE_NAME",
            ReportCategory::Unknown => {
                return Err(AppError::invalid("no extractor exists for unknown reports"))
            }
        };
        Ok(Self {
            model_id: optional("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            metadata_table: required(table_var)?,
            bucket: optional("BUCKET_NAME"),
        })
    }
}

#[derive(Clone, Debug)]
pub struct ReviewTableConfig {
    pub table: String,
}

impl ReviewTableConfig {
    pub fn schools() -> AppResult<Self> {
        Ok(Self {
            table: required("SCHOOL_REVIEWS_TABLE_NAME")?,
        })
    }

    pub fn universities() -> AppResult<Self> {
        Ok(Self {
            table: required("UNIVERSITY_REVIEWS_TABLE_NAME")?,
        })
    }

    pub fn vocational() -> AppResult<Self> {
        Ok(Self {
            table: required("VOCATIONAL_REVIEWS_TABLE_NAME")?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub school_table: Option<String>,
    pub university_table: Option<String>,
    pub vocational_table: Option<String>,
}

impl IngestConfig {
    /// Tables are checked when a dataset actually needs one.
    pub fn from_env() -> Self {
        Self {
            school_table: optional("SCHOOL_REVIEWS_TABLE_NAME"),
            university_table: optional("UNIVERSITY_REVIEWS_TABLE_NAME"),
            vocational_table: optional("VOCATIONAL_REVIEWS_TABLE_NAME"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UserPoolConfig {
    pub user_pool_id: String,
}

impl UserPoolConfig {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            user_pool_id: required("USER_POOL_ID")?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct BotConfig {
    pub bot_id: String,
    pub bot_alias_id: String,
    pub locale_id: String,
}

impl BotConfig {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            bot_id: required("BOT_ID")?,
            bot_alias_id: required("BOT_ALIAS_ID")?,
            locale_id: optional("LOCALE_ID").unwrap_or_else(|| "en_US".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> RouteTable {
        RouteTable {
            school: "school-fn".into(),
            university: "university-fn".into(),
            programme: "programme-fn".into(),
            vocational_centre: "vocational-fn".into(),
        }
    }

    #[test]
    fn every_known_category_has_a_route() {
        let table = routes();
        assert_eq!(table.function_for(ReportCategory::School), Some("school-fn"));
        assert_eq!(
            table.function_for(ReportCategory::University),
            Some("university-fn")
        );
        assert_eq!(
            table.function_for(ReportCategory::Programme),
            Some("programme-fn")
        );
        assert_eq!(
            table.function_for(ReportCategory::VocationalCentre),
            Some("vocational-fn")
        );
        assert_eq!(table.function_for(ReportCategory::Unknown), None);
    }

    #[test]
    fn default_poll_policy_is_bounded() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, 50);
    }
}
