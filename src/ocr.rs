//! Text extraction from PDF reports through an asynchronous OCR job.
//!
//! A report is read twice: once for plain text lines and once for table structure. Each
//! job is polled at a fixed interval until it finishes or the attempt budget runs out,
//! then every result page is flattened into plain text.

use std::collections::{BTreeMap, HashMap};

use tokio::time::sleep;
use tracing::{debug, info};

use crate::clients::OcrService;
use crate::config::PollPolicy;
use crate::error::{AppError, AppResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OcrJobKind {
    TextDetection,
    TableAnalysis,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OcrStatus {
    InProgress,
    Succeeded,
    PartialSuccess,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Line,
    Word,
    Table,
    Cell,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcrBlock {
    pub id: String,
    pub kind: BlockKind,
    pub text: Option<String>,
    pub row: Option<u32>,
    pub column: Option<u32>,
    /// Ids from the block's `CHILD` relationships.
    pub children: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OcrPage {
    pub status: OcrStatus,
    pub status_message: Option<String>,
    pub blocks: Vec<OcrBlock>,
    pub next_token: Option<String>,
}

/// Runs both jobs against `bucket/key` and joins their flattened text.
pub async fn extract_text(
    ocr: &dyn OcrService,
    poll: PollPolicy,
    bucket: &str,
    key: &str,
) -> AppResult<String> {
    let detection_job = ocr.start_job(OcrJobKind::TextDetection, bucket, key).await?;
    let analysis_job = ocr.start_job(OcrJobKind::TableAnalysis, bucket, key).await?;
    info!(file_key = %key, %detection_job, %analysis_job, "started text extraction jobs");

    let lines = wait_for_blocks(ocr, poll, OcrJobKind::TextDetection, &detection_job).await?;
    let tables = wait_for_blocks(ocr, poll, OcrJobKind::TableAnalysis, &analysis_job).await?;

    let mut text = flatten_blocks(&lines);
    let table_text = flatten_blocks(&tables);
    if !table_text.is_empty() {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(&table_text);
    }
    Ok(text)
}

/// Polls until the job is terminal, then collects the blocks from every page.
pub async fn wait_for_blocks(
    ocr: &dyn OcrService,
    poll: PollPolicy,
    kind: OcrJobKind,
    job_id: &str,
) -> AppResult<Vec<OcrBlock>> {
    let mut attempt = 0;
    let first = loop {
        attempt += 1;
        let page = ocr.job_page(kind, job_id, None).await?;
        match page.status {
            OcrStatus::Succeeded | OcrStatus::PartialSuccess => break page,
            OcrStatus::Failed => {
                return Err(AppError::OcrFailed {
                    job_id: job_id.to_string(),
                    reason: page
                        .status_message
                        .unwrap_or_else(|| "no reason given".to_string()),
                })
            }
            OcrStatus::InProgress if attempt >= poll.max_attempts => {
                return Err(AppError::OcrTimeout {
                    job_id: job_id.to_string(),
                    attempts: attempt,
                })
            }
            OcrStatus::InProgress => {
                debug!(%job_id, attempt, "text extraction job still running");
                sleep(poll.interval).await;
            }
        }
    };

    let mut blocks = first.blocks;
    let mut next_token = first.next_token;
    while let Some(token) = next_token.take() {
        let page = ocr.job_page(kind, job_id, Some(token)).await?;
        blocks.extend(page.blocks);
        next_token = page.next_token;
    }
    Ok(blocks)
}

/// Non-empty lines first, then each table with cells joined by ` | ` and rows by newlines.
/// Every line and table is separated by a blank line.
pub fn flatten_blocks(blocks: &[OcrBlock]) -> String {
    let by_id: HashMap<&str, &OcrBlock> = blocks.iter().map(|b| (b.id.as_str(), b)).collect();

    let lines = blocks
        .iter()
        .filter(|b| b.kind == BlockKind::Line)
        .filter_map(|b| b.text.as_deref().map(str::trim))
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    let tables = blocks
        .iter()
        .filter(|b| b.kind == BlockKind::Table)
        .map(|table| flatten_table(table, &by_id))
        .filter(|text| !text.is_empty());

    lines.chain(tables).collect::<Vec<_>>().join("\n\n")
}

fn flatten_table(table: &OcrBlock, by_id: &HashMap<&str, &OcrBlock>) -> String {
    let mut rows: BTreeMap<u32, BTreeMap<u32, String>> = BTreeMap::new();
    for cell in children(table, by_id).filter(|b| b.kind == BlockKind::Cell) {
        let (Some(row), Some(column)) = (cell.row, cell.column) else {
            continue;
        };
        rows.entry(row).or_default().insert(column, cell_text(cell, by_id));
    }

    rows.into_values()
        .map(|cells| {
            cells
                .into_values()
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .filter(|row| !row.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn cell_text(cell: &OcrBlock, by_id: &HashMap<&str, &OcrBlock>) -> String {
    if let Some(text) = cell.text.as_deref() {
        return text.trim().to_string();
    }
    children(cell, by_id)
        .filter(|b| b.kind == BlockKind::Word)
        .filter_map(|b| b.text.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn children<'a>(
    block: &'a OcrBlock,
    by_id: &'a HashMap<&'a str, &'a OcrBlock>,
) -> impl Iterator<Item = &'a OcrBlock> + 'a {
    block
        .children
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).copied())
}
