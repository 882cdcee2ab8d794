use thiserror::Error;

use crate::common::types::RecordId;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Not enough space in page: {needed} bytes needed, {available} available")]
    InsufficientSpace { needed: usize, available: usize },
    #[error("No record at {0}")]
    RecordNotFound(RecordId),
    #[error("Record ID {0} is out of range for this page")]
    InvalidRecordId(RecordId),
}
