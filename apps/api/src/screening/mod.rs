// Candidate intake and technical screening.
// Flow: stage validators → tracker (question sets via llm_client, fallback bank)
//       → finalizer (hash PII, append to the record store).

pub mod conversation;
pub mod finalizer;
pub mod handlers;
pub mod models;
pub mod questions;
pub mod registry;
pub mod session;
pub mod stage;
pub mod store;
pub mod tracker;
pub mod validators;
