pub mod request;
pub mod result;
pub mod status;

pub use request::{TransitionPayload, VideoMetadata, VideoProcessingRequest, VideoRequestResponse};
pub use result::{
    ProcessingResultMessage, ResultOutcome, StatusUpdateResponse, METADATA_ORIGINAL_FILENAME,
};
pub use status::ProcessingStatus;
