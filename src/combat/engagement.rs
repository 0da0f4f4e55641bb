//! Engagement loop
//!
//! One engagement per attacker, driven by the simulation tick. Each
//! engagement stores the tick it next wants to run instead of yielding, so
//! cancellation and ordering are visible to tests without a runtime.
//!
//! Idle -> Engaged -> (wind up -> swing)* -> Idle
//!
//! Only death (attacker or target), an explicit stop, or a despawn end an
//! engagement. Being out of range or blocked by an action gate just parks
//! the attacker on the re-poll interval; target intent is never range-gated.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::actor::{CombatActor, CombatArena};
use crate::combat::resolution::{execute_swing, swing_seed, SwingOutcome, SwingResolver};
use crate::core::config::SimulationConfig;
use crate::core::types::{ActorId, Tick};

/// Where an engaged attacker is within its swing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingPhase {
    /// Next valid wake starts a wind-up
    Ready,
    /// Wind-up in progress; the swing lands at `next_wake` if still valid
    WindingUp,
}

/// A live attacker -> target relationship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engagement {
    pub attacker: ActorId,
    pub target: ActorId,
    pub phase: SwingPhase,
    pub next_wake: Tick,
    pub started_at: Tick,
    pub swings: u32,
}

/// Why an engagement ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    AttackerDead,
    TargetLost,
    Cancelled,
    Despawned,
}

/// Why a swing that was due did not happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngagementEvent {
    Started {
        attacker: ActorId,
        target: ActorId,
        tick: Tick,
    },
    Retargeted {
        attacker: ActorId,
        from: ActorId,
        to: ActorId,
        tick: Tick,
    },
    SwingResolved(SwingOutcome),
    SwingDenied {
        attacker: ActorId,
        target: ActorId,
        reason: DenyReason,
        tick: Tick,
    },
    /// Loop-stopped notification; fires exactly once per engagement
    Stopped {
        attacker: ActorId,
        target: ActorId,
        reason: StopReason,
        tick: Tick,
    },
}

/// Timing knobs pulled from config once
#[derive(Debug, Clone, Copy)]
pub struct EngagementTiming {
    pub tick_ms: u32,
    pub repoll_ticks: Tick,
    pub stamina_cost: Option<f32>,
}

impl EngagementTiming {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            tick_ms: config.tick_ms,
            repoll_ticks: config.repoll_ticks(),
            stamina_cost: config.combat.stamina_cost_per_swing,
        }
    }

    pub fn swing_ticks(&self, swing_secs: f32) -> Tick {
        let ticks = (swing_secs.max(0.0) * 1000.0 / self.tick_ms.max(1) as f32).ceil() as Tick;
        ticks.max(1)
    }
}

/// All live engagements, keyed by attacker
#[derive(Debug, Clone)]
pub struct EngagementRegistry {
    engagements: AHashMap<ActorId, Engagement>,
    timing: EngagementTiming,
}

impl EngagementRegistry {
    pub fn new(timing: EngagementTiming) -> Self {
        Self {
            engagements: AHashMap::new(),
            timing,
        }
    }

    pub fn timing(&self) -> EngagementTiming {
        self.timing
    }

    pub fn get(&self, attacker: ActorId) -> Option<&Engagement> {
        self.engagements.get(&attacker)
    }

    pub fn is_engaged(&self, attacker: ActorId) -> bool {
        self.engagements.contains_key(&attacker)
    }

    pub fn target_of(&self, attacker: ActorId) -> Option<ActorId> {
        self.engagements.get(&attacker).map(|e| e.target)
    }

    pub fn len(&self) -> usize {
        self.engagements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engagements.is_empty()
    }

    /// Attackers currently engaged, in id order
    pub fn attackers(&self) -> Vec<ActorId> {
        let mut ids: Vec<ActorId> = self.engagements.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Begin an engagement, or retarget the attacker's existing one in place.
    ///
    /// Retargeting keeps the current swing timer so switching targets never
    /// shortens a wind-up. Returns `None` when nothing changed.
    pub fn start(&mut self, attacker: ActorId, target: ActorId, now: Tick) -> Option<EngagementEvent> {
        if attacker == target {
            tracing::debug!("{} tried to engage itself", attacker);
            return None;
        }

        if let Some(existing) = self.engagements.get_mut(&attacker) {
            if existing.target == target {
                return None;
            }
            let from = existing.target;
            existing.target = target;
            tracing::debug!("{} retargeted {} -> {}", attacker, from, target);
            return Some(EngagementEvent::Retargeted {
                attacker,
                from,
                to: target,
                tick: now,
            });
        }

        self.engagements.insert(
            attacker,
            Engagement {
                attacker,
                target,
                phase: SwingPhase::Ready,
                next_wake: now,
                started_at: now,
                swings: 0,
            },
        );
        tracing::debug!("{} engaged {}", attacker, target);
        Some(EngagementEvent::Started {
            attacker,
            target,
            tick: now,
        })
    }

    /// Cancel an attacker's engagement. Idempotent: stopping an idle
    /// attacker returns `None` and fires nothing.
    pub fn stop(&mut self, attacker: ActorId, now: Tick) -> Option<EngagementEvent> {
        self.terminate(attacker, StopReason::Cancelled, now)
    }

    /// Tear down everything an actor takes part in (despawn or removal)
    pub fn stop_involving(&mut self, actor: ActorId, now: Tick) -> Vec<EngagementEvent> {
        let mut events = Vec::new();
        if let Some(event) = self.terminate(actor, StopReason::Despawned, now) {
            events.push(event);
        }

        let mut pursuers: Vec<ActorId> = self
            .engagements
            .values()
            .filter(|e| e.target == actor)
            .map(|e| e.attacker)
            .collect();
        pursuers.sort_unstable();
        for attacker in pursuers {
            if let Some(event) = self.terminate(attacker, StopReason::TargetLost, now) {
                events.push(event);
            }
        }
        events
    }

    fn terminate(&mut self, attacker: ActorId, reason: StopReason, now: Tick) -> Option<EngagementEvent> {
        let engagement = self.engagements.remove(&attacker)?;
        tracing::debug!(
            "{} stopped engaging {} ({:?}) after {} swings",
            attacker,
            engagement.target,
            reason,
            engagement.swings
        );
        Some(EngagementEvent::Stopped {
            attacker,
            target: engagement.target,
            reason,
            tick: now,
        })
    }

    /// Run every engagement whose wake time has arrived, in attacker id order
    pub fn step_due<A, R>(&mut self, now: Tick, arena: &mut A, resolver: &R) -> Vec<EngagementEvent>
    where
        A: CombatArena,
        R: SwingResolver + ?Sized,
    {
        let mut due: Vec<ActorId> = self
            .engagements
            .values()
            .filter(|e| e.next_wake <= now)
            .map(|e| e.attacker)
            .collect();
        due.sort_unstable();

        let mut events = Vec::new();
        for attacker in due {
            let Some(engagement) = self.engagements.get_mut(&attacker) else {
                continue;
            };
            if let Some(reason) = advance(&self.timing, engagement, now, arena, resolver, &mut events) {
                if let Some(event) = self.terminate(attacker, reason, now) {
                    events.push(event);
                }
            }
        }
        events
    }
}

/// Drive one engagement until it suspends or terminates
fn advance<A, R>(
    timing: &EngagementTiming,
    engagement: &mut Engagement,
    now: Tick,
    arena: &mut A,
    resolver: &R,
    events: &mut Vec<EngagementEvent>,
) -> Option<StopReason>
where
    A: CombatArena,
    R: SwingResolver + ?Sized,
{
    loop {
        let (attacker_pos, range, gates, swing_time) = match arena.actor(engagement.attacker) {
            Some(a) if a.is_alive() => (a.position(), a.engage_range(), a.gates(), a.swing_time()),
            _ => return Some(StopReason::AttackerDead),
        };
        let target_pos = match arena.actor(engagement.target) {
            Some(t) if t.is_alive() => t.position(),
            _ => return Some(StopReason::TargetLost),
        };

        if !gates.can_attack {
            engagement.phase = SwingPhase::Ready;
            engagement.next_wake = now + timing.repoll_ticks;
            return None;
        }

        if attacker_pos.distance(&target_pos) > range {
            // Out of reach: drop any wind-up and wait for movement to close in
            engagement.phase = SwingPhase::Ready;
            engagement.next_wake = now + timing.repoll_ticks;
            return None;
        }

        match engagement.phase {
            SwingPhase::Ready => {
                engagement.phase = SwingPhase::WindingUp;
                engagement.next_wake = now + timing.swing_ticks(swing_time);
                return None;
            }
            SwingPhase::WindingUp => {
                if let Some(cost) = timing.stamina_cost {
                    let paid = arena
                        .actor_mut(engagement.attacker)
                        .map(|a| a.try_spend_stamina(cost))
                        .unwrap_or(false);
                    if !paid {
                        events.push(EngagementEvent::SwingDenied {
                            attacker: engagement.attacker,
                            target: engagement.target,
                            reason: DenyReason::Exhausted,
                            tick: now,
                        });
                        // Stay wound up; retry the payment after the re-poll wait
                        engagement.next_wake = now + timing.repoll_ticks;
                        return None;
                    }
                }

                let Some(attack) = arena.actor(engagement.attacker).map(|a| a.attack_profile()) else {
                    return Some(StopReason::AttackerDead);
                };
                let seed = swing_seed(engagement.attacker, engagement.target, now, engagement.swings);
                let Some(target) = arena.actor_mut(engagement.target) else {
                    return Some(StopReason::TargetLost);
                };
                let outcome = execute_swing(resolver, &attack, target, seed, now);

                engagement.swings += 1;
                engagement.phase = SwingPhase::Ready;
                events.push(EngagementEvent::SwingResolved(outcome));
                // Loop: re-validate and begin the next wind-up (or terminate)
            }
        }
    }
}
