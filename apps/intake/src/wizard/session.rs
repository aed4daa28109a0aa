use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use super::cascade::{fetch, LocationRequest};
use super::machine::{WizardDeps, WizardMachine};
use crate::backend::LocationResolver;

/// A mounted wizard plus the machinery to run its location fetches in the
/// background. Cloning shares the same wizard.
#[derive(Clone)]
pub struct WizardSession {
    id: Uuid,
    machine: Arc<Mutex<WizardMachine>>,
    locations: Arc<dyn LocationResolver>,
}

impl WizardSession {
    pub async fn mount(deps: WizardDeps, org_id: Option<i64>) -> Self {
        let locations = deps.locations.clone();
        let (machine, requests) = WizardMachine::mount(deps, org_id).await;
        let session = Self {
            id: Uuid::new_v4(),
            machine: Arc::new(Mutex::new(machine)),
            locations,
        };
        session.dispatch(requests);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn lock(&self) -> MutexGuard<'_, WizardMachine> {
        self.machine.lock().await
    }

    /// Runs each fetch on its own task; results land whenever they complete.
    /// Call this after releasing the wizard lock.
    pub fn dispatch(&self, requests: impl IntoIterator<Item = LocationRequest>) {
        for request in requests {
            let machine = self.machine.clone();
            let locations = self.locations.clone();
            let session_id = self.id;
            tokio::spawn(async move {
                let response = fetch(locations.as_ref(), request).await;
                let accepted = machine.lock().await.on_locations(response);
                debug!(
                    "Session {}: {:?} {}",
                    session_id,
                    request,
                    if accepted { "applied" } else { "dropped as stale" }
                );
            });
        }
    }
}

struct Entry {
    session: WizardSession,
    last_used: Instant,
}

/// Live wizard sessions by id. Sessions nobody touched for longer than the
/// idle TTL are evicted by [`SessionRegistry::spawn_sweeper`].
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Entry>>,
}

impl SessionRegistry {
    pub async fn insert(&self, session: WizardSession) {
        let entry = Entry {
            session,
            last_used: Instant::now(),
        };
        self.sessions.write().await.insert(entry.session.id(), entry);
    }

    /// Looks a session up and marks it as used.
    pub async fn get(&self, id: Uuid) -> Option<WizardSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_used = Instant::now();
        Some(entry.session.clone())
    }

    pub async fn remove(&self, id: Uuid) -> Option<WizardSession> {
        self.sessions.write().await.remove(&id).map(|e| e.session)
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions idle for longer than `ttl`; returns how many went.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_used.elapsed() <= ttl);
        before - sessions.len()
    }

    /// Sweeps idle sessions every `ttl / 4` (at least once a second).
    pub fn spawn_sweeper(self: Arc<Self>, ttl: Duration) -> JoinHandle<()> {
        let period = (ttl / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = self.evict_idle(ttl).await;
                if evicted > 0 {
                    info!("Evicted {evicted} idle wizard session(s)");
                }
            }
        })
    }
}
