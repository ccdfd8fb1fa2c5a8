pub mod cache;
pub mod dispatcher;
pub mod intent;
pub mod mode;
pub mod preprocess;
pub mod responder;
pub mod runtime;
pub mod scoring;

pub use cache::{cache_key, CacheManager};
pub use dispatcher::ToolDispatcher;
pub use intent::{IntentClassifier, PatternRegistry};
pub use mode::PerformanceModeController;
pub use preprocess::TextPreprocessor;
pub use responder::GeneralResponder;
pub use runtime::Agent;
pub use scoring::ScoringStrategy;
