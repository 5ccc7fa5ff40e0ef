//! Badge crafting calculator for the ClockWork Gamers guild.
//!
//! Works out what it takes to craft a badge of a given tier: the badges
//! consumed at each lower tier, both currency costs and the crafting time.

pub mod calculator;
pub mod config;
pub mod db;
pub mod extract;
pub mod models;
pub mod sample;

pub use calculator::{resolve, CraftError, InvalidRequest};
pub use models::{CraftRequest, CraftResult, SpecTable, Tier, TierCraftSpec};
