//! Badge crafting calculator logic

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::models::{
    start_rank, CraftDuration, CraftRequest, CraftResult, SpecTable, Tier,
};

/// Why a request was refused before any calculation ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidRequest {
    #[error("same tier")]
    SameTier,
    #[error("start must be strictly below target")]
    StartNotBelowTarget,
    #[error("parallelism factor must be positive")]
    NonPositiveParallelism,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CraftError {
    #[error("invalid request: {0}")]
    InvalidRequest(InvalidRequest),
    #[error("crafting data for {0} is not available yet")]
    DataUnavailable(Tier),
}

impl From<InvalidRequest> for CraftError {
    fn from(reason: InvalidRequest) -> Self {
        CraftError::InvalidRequest(reason)
    }
}

/// Running totals threaded through the component walk
struct Accumulator<'a> {
    specs: &'a SpecTable,
    start_rank: i32,
    counts: BTreeMap<Tier, u64>,
    primary: u64,
    secondary: u64,
    hours: f64,
    incomplete: bool,
    deepest: usize,
}

impl<'a> Accumulator<'a> {
    fn new(specs: &'a SpecTable, start: Option<Tier>) -> Self {
        Accumulator {
            specs,
            start_rank: start_rank(start),
            counts: Tier::ALL.into_iter().map(|t| (t, 0)).collect(),
            primary: 0,
            secondary: 0,
            hours: 0.0,
            incomplete: false,
            deepest: 0,
        }
    }

    fn accumulate(&mut self, tier: Tier, multiplicity: u64, depth: usize) {
        self.deepest = self.deepest.max(depth);
        *self.counts.entry(tier).or_default() += multiplicity;

        // Already owned at this tier or above it
        if tier.rank() as i32 <= self.start_rank {
            return;
        }

        let spec = self.specs.get(tier);
        if spec.is_incomplete() {
            self.incomplete = true;
        }
        // Bounded by the from-scratch totals SpecTable checked for overflow
        self.primary += spec.primary_cost * multiplicity;
        self.secondary += spec.secondary_cost * multiplicity;
        self.hours += spec.craft_duration_hours * multiplicity as f64;

        for &component in &spec.component_tiers {
            self.accumulate(component, multiplicity, depth + 1);
        }
    }
}

/// Calculate what it takes to craft one badge of the target tier
///
/// Tiers at or below `start_tier` are treated as already in hand and cost
/// nothing. A target with no cost data is refused outright, while missing
/// data further down the tree only raises `has_incomplete_data`.
pub fn resolve(request: &CraftRequest, specs: &SpecTable) -> Result<CraftResult, CraftError> {
    let target = request.target_tier;

    if request.start_tier == Some(target) {
        return Err(InvalidRequest::SameTier.into());
    }
    if start_rank(request.start_tier) >= target.rank() as i32 {
        return Err(InvalidRequest::StartNotBelowTarget.into());
    }
    // Also catches NaN
    if !(request.parallelism_factor > 0.0) {
        return Err(InvalidRequest::NonPositiveParallelism.into());
    }
    if specs.get(target).is_incomplete() {
        return Err(CraftError::DataUnavailable(target));
    }

    let mut acc = Accumulator::new(specs, request.start_tier);
    acc.accumulate(target, 1, 1);

    tracing::debug!(
        target_tier = %target,
        start_tier = ?request.start_tier,
        depth = acc.deepest,
        incomplete = acc.incomplete,
        "resolved crafting request"
    );

    Ok(CraftResult {
        required_item_counts: acc.counts,
        total_primary_cost: acc.primary,
        total_secondary_cost: acc.secondary,
        total_duration_hours: acc.hours,
        adjusted_duration_hours: acc.hours / request.parallelism_factor,
        has_incomplete_data: acc.incomplete,
    })
}

/// Format an amount with thousands separators
pub fn format_currency(amount: u64) -> String {
    let digits = amount.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            output.push(',');
        }
        output.push(ch);
    }
    output
}

/// Format the bill of materials for a target as an indented tree
pub fn format_craft_tree(specs: &SpecTable, target: Tier, start: Option<Tier>) -> String {
    let mut output = String::new();
    write_tree_node(&mut output, specs, target, start_rank(start), 0);
    output
}

fn write_tree_node(output: &mut String, specs: &SpecTable, tier: Tier, owned_rank: i32, indent: usize) {
    let prefix = "  ".repeat(indent);

    if tier.rank() as i32 <= owned_rank {
        output.push_str(&format!("{}1x {} (owned)\n", prefix, tier));
        return;
    }

    let spec = specs.get(tier);
    if spec.is_incomplete() {
        output.push_str(&format!("{}1x {} (no data)\n", prefix, tier));
    } else {
        output.push_str(&format!(
            "{}1x {} ({} / {}, {}h)\n",
            prefix,
            tier,
            format_currency(spec.primary_cost),
            format_currency(spec.secondary_cost),
            spec.craft_duration_hours
        ));
    }

    for &component in &spec.component_tiers {
        write_tree_node(output, specs, component, owned_rank, indent + 1);
    }
}

/// Summary of a crafting calculation, ready for display
#[derive(Debug)]
pub struct CraftSummary<'a> {
    pub request: CraftRequest,
    pub result: &'a CraftResult,
    pub primary_label: &'a str,
    pub secondary_label: &'a str,
}

impl fmt::Display for CraftSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let start = self
            .request
            .start_tier
            .map_or_else(|| "nothing".to_string(), |t| t.to_string());

        writeln!(f, "=== Crafting Summary ===")?;
        writeln!(f, "Target: {} (starting from {})", self.request.target_tier, start)?;
        writeln!(f)?;

        writeln!(f, "Badges required:")?;
        for (tier, count) in result.required_item_counts.iter().filter(|(_, c)| **c > 0) {
            writeln!(f, "  {}x {}", count, tier)?;
        }
        writeln!(f)?;

        writeln!(f, "Cost:")?;
        writeln!(f, "  {}: {}", self.primary_label, format_currency(result.total_primary_cost))?;
        writeln!(f, "  {}: {}", self.secondary_label, format_currency(result.total_secondary_cost))?;
        writeln!(f)?;

        writeln!(f, "Time:")?;
        writeln!(f, "  Total:    {}", CraftDuration::from_hours(result.total_duration_hours))?;
        writeln!(
            f,
            "  Parallel: {} (x{})",
            result.duration(),
            self.request.parallelism_factor
        )?;

        if result.has_incomplete_data {
            writeln!(f)?;
            writeln!(f, "Note: some tiers have no cost data yet; totals are incomplete.")?;
        }

        Ok(())
    }
}
