pub mod search;
pub mod store;
pub mod summarizer;
pub mod transcripts;
