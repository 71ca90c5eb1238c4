//! Session finalization — anonymize the profile and append the record to the store.

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::screening::models::{CompletionStatus, ScreeningRecord};
use crate::screening::session::Session;
use crate::screening::stage::Stage;
use crate::screening::store::RecordStore;

/// SHA-256 of the exact string, lowercase hex.
pub fn hash_pii(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Builds the persisted record. Raw name, email and phone do not survive this call.
pub fn anonymize(session: &Session, status: CompletionStatus, timestamp: String) -> ScreeningRecord {
    let profile = &session.profile;
    ScreeningRecord {
        name_hash: profile.name.as_deref().map(hash_pii),
        email_hash: profile.email.as_deref().map(hash_pii),
        phone_hash: profile.phone.as_deref().map(hash_pii),
        experience: profile.experience,
        position: profile.position.clone(),
        location: profile.location.clone(),
        tech_stack: profile.tech_stack.clone(),
        answers: session.answers.clone(),
        completion_status: status,
        timestamp,
    }
}

/// Ends the session and persists it. Runs at most once per session; later calls are
/// no-ops. Store failures are logged and swallowed.
pub async fn finalize(session: &mut Session, status: CompletionStatus, store: &RecordStore) {
    if session.is_finalized() {
        return;
    }

    session.stage = Stage::Ended;
    session.ended = true;
    session.completion_status = Some(status);

    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    let record = anonymize(session, status, timestamp);

    match store.append(&record).await {
        Ok(count) => info!(
            "Session {} finalized as {:?} with {} answers ({} records stored)",
            session.id,
            status,
            record.answers.len(),
            count
        ),
        Err(e) => error!("Failed to persist screening for session {}: {e}", session.id),
    }
}
