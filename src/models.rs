//! Data models for badge tiers and crafting requests

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub const TIER_COUNT: usize = 7;

/// Most badges a single tier may consume. Walk cost grows as this to the
/// power of the tree depth.
pub const MAX_COMPONENTS: usize = 10;

/// Badge rarity tier, declared in rank order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tier {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
    Celestial,
}

impl Tier {
    pub const ALL: [Tier; TIER_COUNT] = [
        Tier::Common,
        Tier::Uncommon,
        Tier::Rare,
        Tier::Epic,
        Tier::Legendary,
        Tier::Mythic,
        Tier::Celestial,
    ];

    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Common => "Common",
            Tier::Uncommon => "Uncommon",
            Tier::Rare => "Rare",
            Tier::Epic => "Epic",
            Tier::Legendary => "Legendary",
            Tier::Mythic => "Mythic",
            Tier::Celestial => "Celestial",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tier '{0}'")]
pub struct UnknownTier(pub String);

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tier::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTier(wanted.to_string()))
    }
}

/// Parse a starting tier, where "none" means nothing is owned yet
pub fn parse_start_tier(s: &str) -> Result<Option<Tier>, UnknownTier> {
    if s.trim().eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        s.parse().map(Some)
    }
}

/// Rank with the "owns nothing" sentinel below every real tier
pub fn start_rank(start: Option<Tier>) -> i32 {
    start.map_or(-1, |t| t.rank() as i32)
}

/// Static crafting data for a single tier
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TierCraftSpec {
    pub primary_cost: u64,
    pub secondary_cost: u64,
    pub component_tiers: Vec<Tier>, // one entry per consumed item
    pub craft_duration_hours: f64,
}

impl TierCraftSpec {
    /// All-zero costs mark a tier whose data is not available yet
    pub fn is_incomplete(&self) -> bool {
        self.primary_cost == 0 && self.secondary_cost == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("no crafting data for tier {0}")]
    MissingTier(Tier),
    #[error("tier {0} is defined more than once")]
    DuplicateTier(Tier),
    #[error("tier {tier} lists component {component}, which is not below it")]
    ComponentNotBelow { tier: Tier, component: Tier },
    #[error("tier {tier} lists {count} components, at most {MAX_COMPONENTS} are allowed")]
    TooManyComponents { tier: Tier, count: usize },
    #[error("crafting {0} from scratch costs more than can be counted")]
    CostOverflow(Tier),
}

/// Validated lookup table holding one spec per tier.
///
/// Every component ranks strictly below its parent, so walking the
/// component lists always terminates within `TIER_COUNT` levels. The
/// from-scratch cost of every tier fits in a `u64`, and no resolution can
/// cost more than that.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTable {
    specs: Vec<TierCraftSpec>,
}

impl SpecTable {
    pub fn from_entries<I>(entries: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (Tier, TierCraftSpec)>,
    {
        let mut slots: [Option<TierCraftSpec>; TIER_COUNT] = Default::default();

        for (tier, spec) in entries {
            if spec.component_tiers.len() > MAX_COMPONENTS {
                return Err(TableError::TooManyComponents {
                    tier,
                    count: spec.component_tiers.len(),
                });
            }
            if let Some(component) = spec.component_tiers.iter().find(|c| **c >= tier) {
                return Err(TableError::ComponentNotBelow {
                    tier,
                    component: *component,
                });
            }
            if slots[tier.rank()].replace(spec).is_some() {
                return Err(TableError::DuplicateTier(tier));
            }
        }

        let mut specs = Vec::with_capacity(TIER_COUNT);
        for (tier, slot) in Tier::ALL.into_iter().zip(slots) {
            specs.push(slot.ok_or(TableError::MissingTier(tier))?);
        }

        check_full_costs(&specs)?;
        Ok(SpecTable { specs })
    }

    pub fn get(&self, tier: Tier) -> &TierCraftSpec {
        &self.specs[tier.rank()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &TierCraftSpec)> {
        Tier::ALL.into_iter().zip(self.specs.iter())
    }
}

/// Total cost of crafting each tier with nothing owned, in rank order
fn check_full_costs(specs: &[TierCraftSpec]) -> Result<(), TableError> {
    let mut full: Vec<(u64, u64)> = Vec::with_capacity(TIER_COUNT);

    for (tier, spec) in Tier::ALL.into_iter().zip(specs) {
        let overflow = || TableError::CostOverflow(tier);
        let (mut primary, mut secondary) = (spec.primary_cost, spec.secondary_cost);
        // Components rank lower, so their totals are already known
        for component in &spec.component_tiers {
            let (p, s) = full[component.rank()];
            primary = primary.checked_add(p).ok_or_else(overflow)?;
            secondary = secondary.checked_add(s).ok_or_else(overflow)?;
        }
        full.push((primary, secondary));
    }

    Ok(())
}

/// A single calculation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CraftRequest {
    pub target_tier: Tier,
    pub start_tier: Option<Tier>, // None = nothing owned
    pub parallelism_factor: f64,
}

/// Result of a crafting calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CraftResult {
    pub required_item_counts: BTreeMap<Tier, u64>,
    pub total_primary_cost: u64,
    pub total_secondary_cost: u64,
    pub total_duration_hours: f64,
    pub adjusted_duration_hours: f64,
    pub has_incomplete_data: bool,
}

impl CraftResult {
    pub fn duration(&self) -> CraftDuration {
        CraftDuration::from_hours(self.adjusted_duration_hours)
    }
}

/// Wall-clock crafting time split into whole days and remaining hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CraftDuration {
    pub days: u64,
    pub hours: f64,
}

impl CraftDuration {
    pub fn from_hours(total: f64) -> Self {
        // Round first so 47.96 becomes 2 days rather than 1 day, 24.0 hours
        let total = (total * 10.0).round() / 10.0;
        CraftDuration {
            days: (total / 24.0).floor() as u64,
            hours: total % 24.0,
        }
    }
}

impl fmt::Display for CraftDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day_unit = if self.days == 1 { "day" } else { "days" };
        let hour_unit = if self.hours == 1.0 { "hour" } else { "hours" };
        if self.hours.fract() == 0.0 {
            write!(f, "{} {}, {:.0} {}", self.days, day_unit, self.hours, hour_unit)
        } else {
            write!(f, "{} {}, {:.1} {}", self.days, day_unit, self.hours, hour_unit)
        }
    }
}
