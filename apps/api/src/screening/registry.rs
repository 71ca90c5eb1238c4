use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::screening::session::Session;

pub type SessionHandle = Arc<Mutex<Session>>;

/// In-memory map of live sessions.
///
/// The map lock is held only to look a handle up; a turn then locks its own session,
/// so a slow generation call never blocks other candidates.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) -> Uuid {
        let id = session.id;
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drops sessions idle longer than `idle_ttl`, and ended sessions idle longer than
    /// `ended_grace`. Sessions locked by an in-flight turn are skipped. Returns how many
    /// were removed. Nothing is persisted.
    pub async fn evict_stale(&self, idle_ttl: Duration, ended_grace: Duration) -> usize {
        let stale: Vec<Uuid> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .filter(|(_, handle)| match handle.try_lock() {
                    Ok(session) => {
                        let limit = if session.ended { ended_grace } else { idle_ttl };
                        session.idle_for() >= limit
                    }
                    Err(_) => false,
                })
                .map(|(id, _)| *id)
                .collect()
        };

        if stale.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        for id in &stale {
            sessions.remove(id);
        }
        info!("Evicted {} stale sessions ({} live)", stale.len(), sessions.len());
        stale.len()
    }

    /// Runs `evict_stale` every `every` until the runtime shuts down.
    pub fn spawn_sweeper(
        &self,
        every: Duration,
        idle_ttl: Duration,
        ended_grace: Duration,
    ) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                registry.evict_stale(idle_ttl, ended_grace).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = SessionRegistry::new();
        let id = registry.insert(Session::new(10)).await;

        let handle = registry.get(id).await.unwrap();
        assert_eq!(handle.lock().await.id, id);

        assert!(registry.remove(id).await);
        assert!(!registry.remove(id).await);
        assert!(registry.get(id).await.is_none());
    }

    const IDLE_TTL: Duration = Duration::from_secs(1800);
    const ENDED_GRACE: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn test_ended_sessions_evicted_after_grace() {
        let registry = SessionRegistry::new();
        let live = registry.insert(Session::new(10)).await;
        let mut ended = Session::new(10);
        ended.ended = true;
        let ended = registry.insert(ended).await;

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(registry.evict_stale(IDLE_TTL, ENDED_GRACE).await, 0);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(registry.evict_stale(IDLE_TTL, ENDED_GRACE).await, 1);
        assert!(registry.get(ended).await.is_none());
        assert!(registry.get(live).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_evicted_after_ttl() {
        let registry = SessionRegistry::new();
        let idle = registry.insert(Session::new(10)).await;
        let active = registry.insert(Session::new(10)).await;

        tokio::time::advance(Duration::from_secs(1000)).await;
        registry.get(active).await.unwrap().lock().await.touch();
        tokio::time::advance(Duration::from_secs(800)).await;

        assert_eq!(registry.evict_stale(IDLE_TTL, ENDED_GRACE).await, 1);
        assert!(registry.get(idle).await.is_none());
        assert!(registry.get(active).await.is_some());
        assert_eq!(registry.sessions.read().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_session_is_not_evicted() {
        let registry = SessionRegistry::new();
        let id = registry.insert(Session::new(10)).await;
        let handle = registry.get(id).await.unwrap();
        let _turn = handle.lock().await;

        tokio::time::advance(IDLE_TTL * 2).await;
        assert_eq!(registry.evict_stale(IDLE_TTL, ENDED_GRACE).await, 0);
        assert!(registry.get(id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_in_background() {
        let registry = SessionRegistry::new();
        registry.insert(Session::new(10)).await;
        let sweeper = registry.spawn_sweeper(Duration::from_secs(60), IDLE_TTL, ENDED_GRACE);

        tokio::time::sleep(IDLE_TTL + Duration::from_secs(120)).await;
        assert_eq!(registry.sessions.read().await.len(), 0);
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let registry = SessionRegistry::new();
        let a = registry.insert(Session::new(10)).await;
        let b = registry.insert(Session::new(10)).await;

        registry.get(a).await.unwrap().lock().await.profile.name = Some("A".to_string());

        let other = registry.get(b).await.unwrap();
        assert!(other.lock().await.profile.name.is_none());
    }
}
