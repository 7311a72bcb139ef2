pub mod dvr;
pub mod lifecycle;
pub mod report;
pub mod transcription;
