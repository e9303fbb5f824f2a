//! Records stored in the tables and messages passed between functions.

pub mod file;
pub mod institution;
pub mod message;

pub use file::{FileListing, FileMetadata};
pub use institution::{
    grade_number, latest_review, Institute, InstituteKind, LatestReview, ProgrammeReview, Review,
    ReviewList, ReviewRecord, School, University, VocationalInstitute,
};
pub use message::{BatchResponse, ExtractionMessage, ObjectRef, ProcessingMessage, QueueRecord};
