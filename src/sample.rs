//! Built-in badge tier table

use crate::models::{Tier, TierCraftSpec};

/// The guild's published crafting costs. Mythic and Celestial have no
/// confirmed numbers yet and are left at zero.
pub fn sample_specs() -> Vec<(Tier, TierCraftSpec)> {
    use Tier::*;

    let entry = |tier, primary, secondary, hours, components: &[Tier]| {
        (
            tier,
            TierCraftSpec {
                primary_cost: primary,
                secondary_cost: secondary,
                component_tiers: components.to_vec(),
                craft_duration_hours: hours,
            },
        )
    };

    vec![
        entry(Common, 1347, 0, 12.0, &[]),
        entry(Uncommon, 475, 113, 24.0, &[Common, Common]),
        entry(Rare, 1403, 226, 48.0, &[Uncommon, Uncommon]),
        entry(Epic, 3120, 480, 96.0, &[Rare, Rare, Rare]),
        entry(Legendary, 7450, 1150, 168.0, &[Epic, Epic, Epic]),
        entry(Mythic, 0, 0, 0.0, &[Legendary, Legendary, Legendary]),
        entry(Celestial, 0, 0, 0.0, &[Mythic, Mythic, Mythic]),
    ]
}
