pub mod model_record;
pub mod outcome;
pub mod prompt;

pub use model_record::{ModelRecord, NewModel, ProviderKind, UpdateModelRequest};
pub use outcome::Outcome;
pub use prompt::{PromptRecord, ResultRecord, SavedResult};
