//! Live sessions keyed by id, each behind its own lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::session::Session;

/// Exclusive handle to one session. Holding the lock serializes steps.
pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) -> SessionHandle {
        let id = *session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drops terminal sessions whose last change is at least `retention`
    /// before `now`. Active sessions always stay. A session whose lock is
    /// held is left for the next sweep.
    pub async fn evict_terminal(&self, retention: Duration, now: Timestamp) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !(session.is_terminal() && expired(&session, retention, &now)),
            Err(_) => true,
        });
        before - sessions.len()
    }

    /// Runs [`Self::evict_terminal`] every `every` until the task is aborted.
    pub fn spawn_sweeper(registry: Arc<Self>, retention: Duration, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let evicted = registry.evict_terminal(retention, Timestamp::now()).await;
                if evicted > 0 {
                    let remaining = registry.len().await;
                    tracing::debug!(
                        evicted,
                        remaining,
                        "terminal sessions evicted"
                    );
                }
            }
        })
    }
}

fn expired(session: &Session, retention: Duration, now: &Timestamp) -> bool {
    now.duration_since(session.updated_at())
        .to_std()
        .is_ok_and(|age| age >= retention)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::AbortSessionCommand;
    use crate::application::test_support::{input, Harness};

    const HOUR: Duration = Duration::from_secs(3600);

    async fn aborted(h: &Harness) -> SessionId {
        let id = *h.start().await.unwrap().session.id();
        h.abort_handler
            .handle(AbortSessionCommand {
                session_id: id,
                reason: "closed the tab".to_string(),
            })
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn only_expired_terminal_sessions_are_evicted() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        let done = aborted(&h).await;
        let active = *h.start().await.unwrap().session.id();

        assert_eq!(h.registry.evict_terminal(HOUR, Timestamp::now()).await, 0);
        assert_eq!(h.registry.len().await, 2);

        assert_eq!(h.registry.evict_terminal(Duration::ZERO, Timestamp::now()).await, 1);
        assert!(h.registry.get(&done).await.is_none());
        assert!(h.registry.get(&active).await.is_some());
    }

    #[tokio::test]
    async fn completed_session_stays_while_outcome_can_still_be_reported() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        let id = *h.start().await.unwrap().session.id();
        h.submit(id, input(3, &["impulsive-urge", "time-available=short"]))
            .await
            .unwrap();
        assert!(h.registry.get(&id).await.unwrap().lock().await.is_terminal());

        assert_eq!(h.registry.evict_terminal(HOUR, Timestamp::now()).await, 0);
        assert!(h.registry.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn locked_session_is_skipped() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        let id = aborted(&h).await;

        let handle = h.registry.get(&id).await.unwrap();
        let guard = handle.lock().await;
        assert_eq!(h.registry.evict_terminal(Duration::ZERO, Timestamp::now()).await, 0);
        drop(guard);
        assert_eq!(h.registry.evict_terminal(Duration::ZERO, Timestamp::now()).await, 1);
    }

    #[tokio::test]
    async fn sweeper_evicts_in_the_background() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        aborted(&h).await;

        let sweeper = SessionRegistry::spawn_sweeper(
            Arc::clone(&h.registry),
            Duration::ZERO,
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(h.registry.is_empty().await);
        sweeper.abort();
    }
}
