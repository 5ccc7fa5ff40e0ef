//! Tier sheet import
//!
//! Reads `*.tier` sheets, plain `key = value` text maintained by the guild
//! officers, and loads the crafting data they describe into the database.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use rusqlite::Connection;
use walkdir::WalkDir;

use crate::db;
use crate::models::{MAX_COMPONENTS, Tier, TierCraftSpec};

/// Tier data parsed from a single sheet
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTier {
    pub tier: Tier,
    pub spec: TierCraftSpec,
}

/// Find all tier sheets under a directory
pub fn find_tier_sheets(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sheets = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "tier") {
            sheets.push(path.to_path_buf());
        }
    }

    Ok(sheets)
}

/// Parse a whole number, allowing `,` and `_` as separators
fn parse_amount(raw: &str) -> Result<u64> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ',' | '_')).collect();
    cleaned
        .parse()
        .with_context(|| format!("invalid amount '{}'", raw))
}

/// Parse a component list such as `Uncommon x2, Common`
fn parse_components(raw: &str) -> Result<Vec<Tier>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }

    let item_re = Regex::new(r"^(\w+)(?:\s*[xX]\s*(\d+))?$")?;
    let mut components = Vec::new();
    for item in raw.split(',') {
        let item = item.trim();
        let Some(cap) = item_re.captures(item) else {
            bail!("invalid component entry '{}'", item);
        };
        let tier: Tier = cap[1].parse()?;
        let count = match cap.get(2) {
            Some(n) => n.as_str().parse::<usize>()?,
            None => 1,
        };
        if count > MAX_COMPONENTS - components.len() {
            bail!("more than {} components listed", MAX_COMPONENTS);
        }
        components.extend(std::iter::repeat_n(tier, count));
    }
    Ok(components)
}

/// Parse the contents of a tier sheet
///
/// Returns `None` when the sheet does not name a tier.
pub fn parse_tier_sheet(content: &str) -> Result<Option<ExtractedTier>> {
    let line_re = Regex::new(r"(?m)^\s*(\w+)\s*=\s*(.*?)\s*$")?;

    let mut tier = None;
    let mut spec = TierCraftSpec::default();

    for cap in line_re.captures_iter(content) {
        let value = &cap[2];
        match cap[1].to_ascii_lowercase().as_str() {
            "tier" => tier = Some(value.parse::<Tier>()?),
            "primary_cost" => spec.primary_cost = parse_amount(value)?,
            "secondary_cost" => spec.secondary_cost = parse_amount(value)?,
            "craft_hours" => {
                spec.craft_duration_hours = value
                    .parse()
                    .with_context(|| format!("invalid craft_hours '{}'", value))?;
                if !(spec.craft_duration_hours >= 0.0) {
                    bail!("craft_hours must not be negative");
                }
            }
            "components" => spec.component_tiers = parse_components(value)?,
            other => tracing::debug!(key = other, "ignoring unknown sheet key"),
        }
    }

    Ok(tier.map(|tier| ExtractedTier { tier, spec }))
}

fn parse_sheet_file(path: &Path) -> Result<Option<ExtractedTier>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_tier_sheet(&content)
}

/// Import all tier sheets from a directory into the database
pub fn extract_to_database(conn: &Connection, dir: &Path) -> Result<ExtractStats> {
    let mut stats = ExtractStats::default();

    tracing::info!("Scanning {} for tier sheets", dir.display());
    let sheets = find_tier_sheets(dir)?;
    tracing::info!("Found {} tier sheets", sheets.len());

    for path in &sheets {
        match parse_sheet_file(path) {
            Ok(Some(extracted)) => {
                db::upsert_tier_spec(conn, extracted.tier, &extracted.spec)?;

                stats.tiers += 1;
                stats.components += extracted.spec.component_tiers.len();

                tracing::info!(
                    "  Parsed: {} (cost: {}/{}, components: {})",
                    extracted.tier,
                    extracted.spec.primary_cost,
                    extracted.spec.secondary_cost,
                    extracted.spec.component_tiers.len()
                );
            }
            Ok(None) => {
                tracing::warn!("Skipping {}: no tier named", path.display());
                stats.skipped += 1;
            }
            Err(e) => {
                tracing::warn!("Error parsing {}: {:#}", path.display(), e);
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ExtractStats {
    pub tiers: usize,
    pub components: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} tiers ({} components). Skipped: {}, Errors: {}",
            self.tiers, self.components, self.skipped, self.errors
        )
    }
}
