//! Database table modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod models;   // models (registry read by the dispatcher)
mod prompts;  // prompts
mod results;  // results (saved responses)
mod settings; // settings (key/value)
