//! Data models shared across the store, orchestrators and HTTP API.
//!
//! Field names match the JSON wire format (snake_case), so most models derive
//! `Serialize`/`Deserialize` without renames.

mod inputs;
mod outputs;
mod paper;

pub use inputs::{
    PaperIdsRequest, QuestionRequest, RelatedQuery, ReviewRequest, SearchRequest, StoreSearchQuery,
};
pub use outputs::{
    Answer, FutureWork, ImprovementPlan, PaperList, RelatedList, Review, SearchResponse, Source,
};
pub use paper::{ImageKey, Paper, PaperImage, PaperSummary, RelatedPaper};
