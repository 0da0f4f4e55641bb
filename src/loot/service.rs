//! Loot request dispatcher
//!
//! Clients never touch a session directly. Requests arrive as
//! [`LootRequest`] messages, are routed to the corpse's session by id, and
//! the answer goes back to the requester alone as a [`LootResponse`].

use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, CorpseId};
use crate::loot::session::{CorpseLootSession, LootEntry, Looter, TakeResult};
use crate::spawn::scene::SceneRules;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LootRequest {
    Snapshot {
        requester: ActorId,
        corpse: CorpseId,
    },
    Take {
        requester: ActorId,
        corpse: CorpseId,
        instance_id: String,
    },
}

impl LootRequest {
    pub fn requester(&self) -> ActorId {
        match self {
            LootRequest::Snapshot { requester, .. } | LootRequest::Take { requester, .. } => *requester,
        }
    }

    pub fn corpse(&self) -> CorpseId {
        match self {
            LootRequest::Snapshot { corpse, .. } | LootRequest::Take { corpse, .. } => *corpse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LootResponse {
    Snapshot {
        corpse_id: CorpseId,
        entries: Vec<LootEntry>,
    },
    TakeResult {
        corpse_id: CorpseId,
        instance_id: String,
        result: TakeResult,
        snapshot: Option<Vec<LootEntry>>,
        corpse_destroyed: bool,
    },
    /// The request was refused before reaching a session
    Denied { corpse_id: CorpseId, code: TakeResult },
    /// Snapshot asked for a corpse that no longer exists
    CorpseClosed { corpse_id: CorpseId },
}

/// Resolves requester ids to whatever can receive loot
pub trait LooterDirectory {
    fn looter_mut(&mut self, id: ActorId) -> Option<&mut dyn Looter>;
}

impl<L: Looter> LooterDirectory for AHashMap<ActorId, L> {
    fn looter_mut(&mut self, id: ActorId) -> Option<&mut dyn Looter> {
        self.get_mut(&id).map(|l| l as &mut dyn Looter)
    }
}

#[derive(Debug, Default)]
pub struct LootService {
    sessions: AHashMap<CorpseId, Arc<CorpseLootSession>>,
}

impl LootService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly generated session. Empty sessions are never
    /// registered, so an empty corpse is not interactable.
    pub fn open_corpse(&mut self, session: CorpseLootSession) -> Option<Arc<CorpseLootSession>> {
        let corpse_id = session.corpse_id();
        if session.is_destroyed() {
            tracing::debug!("{} has no loot; not opened", corpse_id);
            return None;
        }
        let session = Arc::new(session);
        self.sessions.insert(corpse_id, Arc::clone(&session));
        tracing::debug!("{} opened with {} entries", corpse_id, session.len());
        Some(session)
    }

    pub fn session(&self, corpse: CorpseId) -> Option<Arc<CorpseLootSession>> {
        self.sessions.get(&corpse).cloned()
    }

    pub fn is_open(&self, corpse: CorpseId) -> bool {
        self.sessions.contains_key(&corpse)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Open corpse ids in ascending order
    pub fn corpses(&self) -> Vec<CorpseId> {
        let mut ids: Vec<CorpseId> = self.sessions.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Drop a corpse regardless of its contents (decay, scene unload)
    pub fn close_corpse(&mut self, corpse: CorpseId) -> bool {
        self.sessions.remove(&corpse).is_some()
    }

    /// Remove every session that has been emptied; returns their ids
    pub fn sweep_destroyed(&mut self) -> Vec<CorpseId> {
        let mut destroyed: Vec<CorpseId> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.is_destroyed())
            .map(|(id, _)| *id)
            .collect();
        destroyed.sort();
        for id in &destroyed {
            self.sessions.remove(id);
            tracing::info!("{} emptied and destroyed", id);
        }
        destroyed
    }

    pub fn handle<D, S>(&mut self, request: LootRequest, players: &mut D, scene: &S) -> LootResponse
    where
        D: LooterDirectory + ?Sized,
        S: SceneRules + ?Sized,
    {
        let corpse_id = request.corpse();
        let Some(looter) = players.looter_mut(request.requester()) else {
            tracing::debug!("Loot request from unknown {}", request.requester());
            return LootResponse::Denied {
                corpse_id,
                code: TakeResult::InvalidPlayer,
            };
        };

        match request {
            LootRequest::Snapshot { .. } => match self.sessions.get(&corpse_id) {
                Some(session) => LootResponse::Snapshot {
                    corpse_id,
                    entries: session.snapshot(),
                },
                None => LootResponse::CorpseClosed { corpse_id },
            },
            LootRequest::Take { instance_id, .. } => {
                let Some(session) = self.sessions.get(&corpse_id).cloned() else {
                    return LootResponse::TakeResult {
                        corpse_id,
                        instance_id,
                        result: TakeResult::ItemNotFound,
                        snapshot: None,
                        corpse_destroyed: false,
                    };
                };

                let outcome = session.take(looter, scene, &instance_id);
                if outcome.emptied {
                    self.sessions.remove(&corpse_id);
                    tracing::info!("{} emptied and destroyed", corpse_id);
                }

                LootResponse::TakeResult {
                    corpse_id,
                    instance_id,
                    result: outcome.result,
                    snapshot: outcome.snapshot,
                    corpse_destroyed: outcome.emptied,
                }
            }
        }
    }
}
