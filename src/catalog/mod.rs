//! Read-only authored catalogs
//!
//! Items, drop tables, skills and monster templates are loaded once (from
//! TOML or the built-in defaults) and shared immutably through `Arc`. The
//! simulation never writes to a catalog after construction.

pub mod drop_tables;
pub mod items;
pub mod monsters;
pub mod skills;

use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;

use crate::core::error::{DelveError, Result};

pub use drop_tables::{DropEntry, DropTableDef};
pub use items::ItemDef;
pub use monsters::MonsterTemplate;
pub use skills::SkillDef;

/// Anything stored in a catalog is keyed by a stable string id
pub trait CatalogEntry {
    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

/// Immutable id -> definition map
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    entries: AHashMap<String, T>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }
}

impl<T: CatalogEntry> Catalog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, rejecting duplicate ids
    pub fn from_entries(entries: Vec<T>) -> Result<Self> {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    /// Stored under its trimmed id, which also replaces the entry's own
    fn insert(&mut self, mut entry: T) -> Result<()> {
        let id = entry.id().trim().to_string();
        if id.is_empty() {
            return Err(DelveError::Catalog("entry with empty id".into()));
        }
        if self.entries.contains_key(&id) {
            return Err(DelveError::Catalog(format!("duplicate id '{}'", id)));
        }
        if id != entry.id() {
            entry.set_id(id.clone());
        }
        self.entries.insert(id, entry);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// All ids, sorted so callers iterate in a stable order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }
}

pub type ItemCatalog = Catalog<ItemDef>;
pub type DropTableCatalog = Catalog<DropTableDef>;
pub type SkillCatalog = Catalog<SkillDef>;
pub type MonsterCatalog = Catalog<MonsterTemplate>;

/// Every catalog the core consumes
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub items: ItemCatalog,
    pub drop_tables: DropTableCatalog,
    pub skills: SkillCatalog,
    pub monsters: MonsterCatalog,
}

/// On-disk layout of a catalog file
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<ItemDef>,
    #[serde(default)]
    drop_tables: Vec<DropTableDef>,
    #[serde(default)]
    skills: Vec<SkillDef>,
    #[serde(default)]
    monsters: Vec<MonsterTemplate>,
}

fn trim_in_place(id: &mut String) {
    let trimmed = id.trim();
    if trimmed.len() != id.len() {
        *id = trimmed.to_string();
    }
}

impl CatalogFile {
    /// Authored ids and every cross-reference to them, without surrounding whitespace
    fn trim_ids(&mut self) {
        for item in &mut self.items {
            trim_in_place(&mut item.id);
        }
        for table in &mut self.drop_tables {
            trim_in_place(&mut table.id);
            for entry in &mut table.entries {
                trim_in_place(&mut entry.item_id);
            }
        }
        for skill in &mut self.skills {
            trim_in_place(&mut skill.id);
        }
        for monster in &mut self.monsters {
            trim_in_place(&mut monster.id);
            if let Some(table) = monster.loot_table.as_mut() {
                trim_in_place(table);
            }
            for item in &mut monster.legacy_loot {
                trim_in_place(item);
            }
        }
    }
}

impl Catalogs {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut file: CatalogFile = toml::from_str(content)?;
        file.trim_ids();
        for item in file.items.iter_mut().filter(|i| i.icon.is_empty()) {
            item.icon = format!("icons/{}", item.id);
        }
        let catalogs = Self {
            items: Catalog::from_entries(file.items)?,
            drop_tables: Catalog::from_entries(file.drop_tables)?,
            skills: Catalog::from_entries(file.skills)?,
            monsters: Catalog::from_entries(file.monsters)?,
        };
        catalogs.check_references();
        Ok(catalogs)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Dangling ids are authoring mistakes, not load failures. Loot
    /// generation skips what it cannot resolve, so only warn here.
    fn check_references(&self) {
        for table in self.drop_tables.values() {
            for entry in &table.entries {
                if !self.items.contains(&entry.item_id) {
                    tracing::warn!(
                        "Drop table '{}' references unknown item '{}'",
                        table.id,
                        entry.item_id
                    );
                }
            }
        }
        for monster in self.monsters.values() {
            if let Some(table) = &monster.loot_table {
                if !self.drop_tables.contains(table) {
                    tracing::warn!(
                        "Monster '{}' references unknown drop table '{}'",
                        monster.id,
                        table
                    );
                }
            }
        }
    }

    /// Built-in starter content
    pub fn with_defaults() -> Self {
        let items = vec![
            ItemDef::new("gold_coin", "Gold Coin"),
            ItemDef::new("goblin_ear", "Goblin Ear"),
            ItemDef::new("rat_tail", "Rat Tail"),
            ItemDef::new("bone", "Bone"),
            ItemDef::new("healing_potion", "Healing Potion"),
            ItemDef::new("copper_ore", "Copper Ore"),
            ItemDef::new("iron_ore", "Iron Ore"),
            ItemDef::new("iron_sword", "Iron Sword")
                .with_durability(60)
                .with_affixes(&["keen", "sturdy", "vicious"], 2),
            ItemDef::new("leather_cap", "Leather Cap")
                .with_durability(30)
                .with_affixes(&["padded", "lucky"], 1),
        ];

        let drop_tables = vec![
            DropTableDef::new(
                "goblin_common",
                vec![
                    DropEntry::new("gold_coin", 5).with_quantity(1, 3),
                    DropEntry::new("goblin_ear", 3),
                    DropEntry::new("healing_potion", 1),
                    DropEntry::new("iron_sword", 1),
                    DropEntry::new("leather_cap", 1),
                ],
            )
            .with_nothing_weight(2),
            DropTableDef::new(
                "rat_common",
                vec![DropEntry::new("rat_tail", 4), DropEntry::new("bone", 2)],
            )
            .with_nothing_weight(2),
            DropTableDef::new(
                "mining_vein",
                vec![
                    DropEntry::new("copper_ore", 5).with_quantity(1, 2),
                    DropEntry::new("iron_ore", 2).with_min_quality(30.0),
                ],
            ),
        ];

        let skills = [
            ("swordsmanship", "Swordsmanship"),
            ("archery", "Archery"),
            ("tactics", "Tactics"),
            ("parrying", "Parrying"),
            ("magery", "Magery"),
            ("meditation", "Meditation"),
            ("healing", "Healing"),
            ("mining", "Mining"),
            ("lumberjacking", "Lumberjacking"),
            ("stealth", "Stealth"),
        ]
        .iter()
        .map(|(id, name)| SkillDef::new(id, name))
        .collect();

        let mut goblin = MonsterTemplate::new("goblin", "Goblin").with_loot_table("goblin_common");
        goblin.max_health = 25.0;

        let mut rat = MonsterTemplate::new("giant_rat", "Giant Rat").with_loot_table("rat_common");
        rat.max_health = 12.0;
        rat.swing_time = 1.5;
        rat.damage_min = 1.0;
        rat.damage_max = 3.0;
        rat.move_speed = 3.0;

        let mut skeleton = MonsterTemplate::new("skeleton", "Skeleton")
            .with_legacy_loot(&["bone", "bone", "gold_coin", "iron_sword"]);
        skeleton.max_health = 35.0;
        skeleton.armor = 1.0;
        skeleton.move_speed = 1.5;

        // Ids above are unique
        Self {
            items: catalog_from_known(items),
            drop_tables: catalog_from_known(drop_tables),
            skills: catalog_from_known(skills),
            monsters: catalog_from_known(vec![goblin, rat, skeleton]),
        }
    }
}

fn catalog_from_known<T: CatalogEntry>(entries: Vec<T>) -> Catalog<T> {
    let mut catalog = Catalog::new();
    for entry in entries {
        let id = entry.id().to_string();
        catalog.entries.insert(id, entry);
    }
    catalog
}
