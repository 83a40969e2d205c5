use serde::{Deserialize, Serialize};

// -- Ingestion --

/// Summary returned by the HTTP ingestion endpoints after a batch ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Updates that decoded into a chat message and went through the engine
    pub processed: usize,
    /// Updates without a usable message (edits, callbacks, garbage)
    pub skipped: usize,
    /// Replies handed to the transport successfully
    pub delivered: usize,
    /// Replies the transport rejected
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
