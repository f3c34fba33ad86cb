pub mod engine;
pub mod fetcher;

pub use engine::{StepPipeline, StepRun};
pub use fetcher::{extract_signals, FetchError, HttpFetcher, WebFetcher};
