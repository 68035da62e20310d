//! Fastq naming prefix assignment
//!
//! Builds a unique `{sample}_S{tag}_L{lane:03}` prefix per record following
//! the CellRanger fastq naming convention. Prefixes are positional: the lane
//! number is the ordinal of the distinct (run_id, lane) key and the sample
//! tag is the ordinal of the record within that lane, both taken over the
//! record sequence sorted by (run_id, lane, tag_index) so that re-running on
//! a shuffled copy of the same input reproduces identical prefixes.

use crate::{ColumnConfig, MetaRecord};
use anyhow::{bail, Result};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};

/// Diagnostic trace of one collision resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixSubstitution {
    pub cram_path: String,
    pub colliding_prefix: String,
    pub assigned_prefix: String,
}

/// Assign a unique naming prefix to every record, writing it into the
/// configured prefix column.
///
/// Records sharing a (run_id, lane, tag_index) tuple (duplicate tags across
/// merged catalog exports) would compute identical prefixes; the loser draws
/// a replacement tag number from a `1..=record_count` pool instead. Pool
/// exhaustion means the record count was mis-estimated and is fatal.
pub fn assign_prefixes(
    records: &mut [MetaRecord],
    columns: &ColumnConfig,
) -> Result<Vec<PrefixSubstitution>> {
    let pool_size = records.len();
    assign_prefixes_with_pool(records, columns, pool_size)
}

fn assign_prefixes_with_pool(
    records: &mut [MetaRecord],
    columns: &ColumnConfig,
    pool_size: usize,
) -> Result<Vec<PrefixSubstitution>> {
    // Sorted processing order pins lane ordinals, tag ordinals and the
    // collision substitution order regardless of input enumeration order.
    let mut order: Vec<usize> = (0..records.len()).collect();
    let keys: Vec<(String, String, (u64, String), String)> = records
        .iter()
        .map(|record| {
            Ok((
                record.require("run_id")?.to_string(),
                record.get("lane").unwrap_or("1").to_string(),
                tag_sort_key(record.require("tag_index")?),
                record.require(&columns.sample)?.to_string(),
            ))
        })
        .collect::<Result<_>>()?;
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let mut lane_ordinals: IndexMap<(String, String), usize> = IndexMap::new();
    let mut tag_ranks: IndexMap<(String, String), IndexMap<String, usize>> = IndexMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut pool: BTreeSet<usize> = (1..=pool_size).collect();
    let mut substitutions = Vec::new();

    for &index in &order {
        let (run_id, lane, tag_key, sample) = &keys[index];
        let lane_key = (run_id.clone(), lane.clone());
        let next_ordinal = lane_ordinals.len() + 1;
        let lane_ordinal = *lane_ordinals.entry(lane_key.clone()).or_insert(next_ordinal);
        // The tag number is the rank of the record's tag_index value among
        // the distinct tags of its lane. Records carrying a duplicate tag
        // (merged catalog exports with overlapping numbering) therefore
        // compute the same prefix and fall through to pool substitution.
        let ranks = tag_ranks.entry(lane_key).or_default();
        let next_rank = ranks.len() + 1;
        let tag = *ranks.entry(format!("{}:{}", tag_key.0, tag_key.1)).or_insert(next_rank);

        let mut prefix = format_prefix(sample, tag, lane_ordinal);
        if used.contains(&prefix) {
            let replacement = pool
                .iter()
                .copied()
                .find(|&tag| !used.contains(&format_prefix(sample, tag, lane_ordinal)));
            let Some(replacement) = replacement else {
                bail!(
                    "naming prefix pool exhausted while resolving a collision on '{prefix}' \
                     (pool size {pool_size})"
                );
            };
            pool.remove(&replacement);
            let assigned = format_prefix(sample, replacement, lane_ordinal);
            substitutions.push(PrefixSubstitution {
                cram_path: records[index].get_or_na(&columns.cram).to_string(),
                colliding_prefix: prefix,
                assigned_prefix: assigned.clone(),
            });
            prefix = assigned;
        }
        used.insert(prefix.clone());
        records[index].insert(&columns.prefix, prefix);
    }

    Ok(substitutions)
}

fn format_prefix(sample: &str, tag: usize, lane_ordinal: usize) -> String {
    format!("{sample}_S{tag}_L{lane_ordinal:03}")
}

/// Tags are usually small integers; sort them numerically when they parse,
/// lexicographically otherwise.
fn tag_sort_key(tag: &str) -> (u64, String) {
    match tag.parse::<u64>() {
        Ok(n) => (n, String::new()),
        Err(_) => (u64::MAX, tag.to_string()),
    }
}
