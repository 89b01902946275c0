//! Intent classification with a breaker-guarded primary model and an
//! unguarded fallback.

pub mod classifier;
pub mod router;
pub mod types;


pub use classifier::{IntentClassifier, ModelClassifier};
pub use router::IntentRouter;
pub use types::*;
