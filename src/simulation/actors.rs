//! Actors living in the world
//!
//! Players and monsters share one [`Actor`] type so the combat systems can
//! treat them uniformly; the role-specific state hangs off [`ActorKind`].

use serde::{Deserialize, Serialize};

use crate::catalog::{MonsterTemplate, SkillCatalog};
use crate::combat::{CombatActor, CombatActorState};
use crate::core::types::{ActorId, SpawnerId, Vec2};
use crate::loot::{Backpack, Inventory, Looter};
use crate::progression::{BaseStats, DerivedVitals, PlayerSkillBook};

/// Slots in a fresh player's backpack
pub const DEFAULT_BACKPACK_SLOTS: usize = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    pub backpack: Backpack,
    pub skills: PlayerSkillBook,
    pub stats: BaseStats,
    pub vitals: DerivedVitals,
}

impl PlayerState {
    pub fn new(name: &str, skills: &SkillCatalog) -> Self {
        let stats = BaseStats::default();
        Self {
            name: name.into(),
            backpack: Backpack::new(DEFAULT_BACKPACK_SLOTS),
            skills: PlayerSkillBook::from_catalog(skills),
            stats,
            vitals: DerivedVitals::from_stats(&stats),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterState {
    pub template_id: String,
    /// World units per second
    pub move_speed: f32,
    /// Table handed to the corpse on death, overriding the template's
    pub loot_override: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActorKind {
    Player(PlayerState),
    Monster(MonsterState),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub combat: CombatActorState,
    pub kind: ActorKind,
    /// Spawner that owns this actor, if any
    pub spawner: Option<SpawnerId>,
}

impl Actor {
    pub fn player(id: ActorId, name: &str, position: Vec2, skills: &SkillCatalog) -> Self {
        let player = PlayerState::new(name, skills);
        let mut combat = CombatActorState::at(position);
        combat.max_health = player.vitals.max_health;
        combat.health = player.vitals.max_health;
        combat.max_stamina = player.vitals.max_stamina;
        combat.stamina = player.vitals.max_stamina;

        Self {
            id,
            combat,
            kind: ActorKind::Player(player),
            spawner: None,
        }
    }

    pub fn monster(id: ActorId, template: &MonsterTemplate, position: Vec2) -> Self {
        let combat = CombatActorState {
            position,
            health: template.max_health,
            max_health: template.max_health,
            stamina: template.max_stamina,
            max_stamina: template.max_stamina,
            base_swing_time: template.swing_time,
            engage_range: template.engage_range,
            damage_min: template.damage_min,
            damage_max: template.damage_max,
            armor: template.armor,
            ..CombatActorState::default()
        };

        Self {
            id,
            combat,
            kind: ActorKind::Monster(MonsterState {
                template_id: template.id.clone(),
                move_speed: template.move_speed,
                loot_override: None,
            }),
            spawner: None,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, ActorKind::Player(_))
    }

    pub fn is_monster(&self) -> bool {
        matches!(self.kind, ActorKind::Monster(_))
    }

    pub fn as_player(&self) -> Option<&PlayerState> {
        match &self.kind {
            ActorKind::Player(player) => Some(player),
            ActorKind::Monster(_) => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            ActorKind::Player(player) => Some(player),
            ActorKind::Monster(_) => None,
        }
    }

    pub fn as_monster(&self) -> Option<&MonsterState> {
        match &self.kind {
            ActorKind::Monster(monster) => Some(monster),
            ActorKind::Player(_) => None,
        }
    }

    pub fn as_monster_mut(&mut self) -> Option<&mut MonsterState> {
        match &mut self.kind {
            ActorKind::Monster(monster) => Some(monster),
            ActorKind::Player(_) => None,
        }
    }

    /// Push recomputed vitals into the combat pools, keeping current fill ratios
    pub fn apply_vitals(&mut self, vitals: DerivedVitals) {
        let state = &mut self.combat;
        let health_ratio = if state.max_health > 0.0 { state.health / state.max_health } else { 1.0 };
        let stamina_ratio = if state.max_stamina > 0.0 { state.stamina / state.max_stamina } else { 1.0 };

        state.max_health = vitals.max_health;
        state.max_stamina = vitals.max_stamina;
        if state.alive {
            state.health = (vitals.max_health * health_ratio).max(1.0);
        }
        state.stamina = vitals.max_stamina * stamina_ratio;

        if let Some(player) = self.as_player_mut() {
            player.vitals = vitals;
        }
    }
}

impl CombatActor for Actor {
    fn actor_id(&self) -> ActorId {
        self.id
    }

    fn combat_state(&self) -> &CombatActorState {
        &self.combat
    }

    fn combat_state_mut(&mut self) -> &mut CombatActorState {
        &mut self.combat
    }
}

impl Looter for Actor {
    fn looter_id(&self) -> ActorId {
        self.id
    }

    fn looter_position(&self) -> Vec2 {
        self.combat.position
    }

    /// Dead players and monsters have no live inventory
    fn inventory_mut(&mut self) -> Option<&mut dyn Inventory> {
        if !self.combat.alive {
            return None;
        }
        match &mut self.kind {
            ActorKind::Player(player) => Some(&mut player.backpack),
            ActorKind::Monster(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalogs;

    #[test]
    fn test_player_pools_follow_vitals() {
        let catalogs = Catalogs::with_defaults();
        let actor = Actor::player(ActorId(1), "Ayla", Vec2::default(), &catalogs.skills);
        let vitals = actor.as_player().unwrap().vitals;
        assert_eq!(actor.combat.max_health, vitals.max_health);
        assert_eq!(actor.combat.health, vitals.max_health);
    }

    #[test]
    fn test_monster_copies_template() {
        let catalogs = Catalogs::with_defaults();
        let template = catalogs.monsters.get("giant_rat").unwrap();
        let actor = Actor::monster(ActorId(2), template, Vec2::new(1.0, 1.0));
        assert_eq!(actor.combat.max_health, template.max_health);
        assert_eq!(actor.swing_time(), template.swing_time);
        assert_eq!(actor.as_monster().unwrap().template_id, "giant_rat");
    }

    #[test]
    fn test_only_living_players_can_loot() {
        let catalogs = Catalogs::with_defaults();
        let mut player = Actor::player(ActorId(1), "Ayla", Vec2::default(), &catalogs.skills);
        assert!(player.inventory_mut().is_some());

        player.combat.alive = false;
        assert!(player.inventory_mut().is_none());

        let template = catalogs.monsters.get("goblin").unwrap();
        let mut monster = Actor::monster(ActorId(2), template, Vec2::default());
        assert!(monster.inventory_mut().is_none());
    }

    #[test]
    fn test_apply_vitals_keeps_ratio() {
        let catalogs = Catalogs::with_defaults();
        let mut actor = Actor::player(ActorId(1), "Ayla", Vec2::default(), &catalogs.skills);
        actor.combat.health = actor.combat.max_health / 2.0;

        let bigger = DerivedVitals {
            max_health: actor.combat.max_health * 2.0,
            max_stamina: actor.combat.max_stamina,
            max_mana: 10.0,
        };
        actor.apply_vitals(bigger);
        assert!((actor.combat.health - bigger.max_health / 2.0).abs() < 1e-3);
        assert_eq!(actor.as_player().unwrap().vitals, bigger);
    }
}
