use async_trait::async_trait;
use aws_sdk_textract::types::{
    Block, BlockType, DocumentLocation, FeatureType, JobStatus, RelationshipType, S3Object,
};
use aws_sdk_textract::Client;

use super::OcrService;
use crate::error::{AppError, AppResult};
use crate::ocr::{BlockKind, OcrBlock, OcrJobKind, OcrPage, OcrStatus};

#[derive(Clone, Debug)]
pub struct TextractOcr {
    client: Client,
}

impl TextractOcr {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn location(bucket: &str, key: &str) -> DocumentLocation {
    DocumentLocation::builder()
        .s3_object(S3Object::builder().bucket(bucket).name(key).build())
        .build()
}

fn status(status: Option<&JobStatus>) -> OcrStatus {
    match status {
        Some(JobStatus::Succeeded) => OcrStatus::Succeeded,
        Some(JobStatus::PartialSuccess) => OcrStatus::PartialSuccess,
        Some(JobStatus::Failed) => OcrStatus::Failed,
        _ => OcrStatus::InProgress,
    }
}

fn convert_block(block: &Block) -> OcrBlock {
    let kind = match block.block_type() {
        Some(BlockType::Line) => BlockKind::Line,
        Some(BlockType::Word) => BlockKind::Word,
        Some(BlockType::Table) => BlockKind::Table,
        Some(BlockType::Cell) => BlockKind::Cell,
        _ => BlockKind::Other,
    };
    let children = block
        .relationships()
        .iter()
        .filter(|rel| rel.r#type() == Some(&RelationshipType::Child))
        .flat_map(|rel| rel.ids().iter().cloned())
        .collect();

    OcrBlock {
        id: block.id().unwrap_or_default().to_string(),
        kind,
        text: block.text().map(str::to_string),
        row: block.row_index().and_then(|i| u32::try_from(i).ok()),
        column: block.column_index().and_then(|i| u32::try_from(i).ok()),
        children,
    }
}

#[async_trait]
impl OcrService for TextractOcr {
    async fn start_job(&self, kind: OcrJobKind, bucket: &str, key: &str) -> AppResult<String> {
        let job_id = match kind {
            OcrJobKind::TextDetection => self
                .client
                .start_document_text_detection()
                .document_location(location(bucket, key))
                .send()
                .await
                .map_err(|e| AppError::service("textract.start_document_text_detection", e))?
                .job_id,
            OcrJobKind::TableAnalysis => self
                .client
                .start_document_analysis()
                .document_location(location(bucket, key))
                .feature_types(FeatureType::Tables)
                .send()
                .await
                .map_err(|e| AppError::service("textract.start_document_analysis", e))?
                .job_id,
        };

        job_id.ok_or_else(|| AppError::Service {
            operation: "textract.start_job",
            message: format!("no job id returned for {key}"),
        })
    }

    async fn job_page(
        &self,
        kind: OcrJobKind,
        job_id: &str,
        next_token: Option<String>,
    ) -> AppResult<OcrPage> {
        let page = match kind {
            OcrJobKind::TextDetection => {
                let output = self
                    .client
                    .get_document_text_detection()
                    .job_id(job_id)
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(|e| AppError::service("textract.get_document_text_detection", e))?;
                OcrPage {
                    status: status(output.job_status()),
                    status_message: output.status_message().map(str::to_string),
                    blocks: output.blocks().iter().map(convert_block).collect(),
                    next_token: output.next_token().map(str::to_string),
                }
            }
            OcrJobKind::TableAnalysis => {
                let output = self
                    .client
                    .get_document_analysis()
                    .job_id(job_id)
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(|e| AppError::service("textract.get_document_analysis", e))?;
                OcrPage {
                    status: status(output.job_status()),
                    status_message: output.status_message().map(str::to_string),
                    blocks: output.blocks().iter().map(convert_block).collect(),
                    next_token: output.next_token().map(str::to_string),
                }
            }
        };
        Ok(page)
    }
}
