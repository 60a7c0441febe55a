//! Nearest-neighbour matching of binary descriptors.

use crate::brief::Descriptor;
use crate::config::{LshParams, MatcherKind};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Best train descriptor found for one query descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub query: usize,
    pub train: usize,
    pub distance: u32,
}

pub trait DescriptorMatcher: Send {
    /// At most one match per query descriptor, ordered by query index.
    fn match_best(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Match>;
}

pub fn create_matcher(kind: MatcherKind, lsh: &LshParams) -> Box<dyn DescriptorMatcher> {
    match kind {
        MatcherKind::Lsh => Box::new(LshMatcher::new(lsh)),
        MatcherKind::BruteForce => Box::new(BruteForceMatcher),
    }
}

/// Keep matches with distance at most `max(2 * min_distance, floor)`.
///
/// Binary descriptors of an unchanged region match at distance 0, so the
/// floor keeps a relative threshold from rejecting everything else.
pub fn good_matches(matches: &[Match], floor: u32) -> Vec<Match> {
    let Some(min) = matches.iter().map(|m| m.distance).min() else {
        return Vec::new();
    };
    let threshold = (2 * min).max(floor);
    matches
        .iter()
        .filter(|m| m.distance <= threshold)
        .copied()
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher;

impl DescriptorMatcher for BruteForceMatcher {
    fn match_best(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Match> {
        query
            .iter()
            .enumerate()
            .filter_map(|(qi, q)| {
                train
                    .iter()
                    .enumerate()
                    .map(|(ti, t)| Match {
                        query: qi,
                        train: ti,
                        distance: q.distance(t),
                    })
                    .min_by_key(|m| (m.distance, m.train))
            })
            .collect()
    }
}

/// Approximate matcher: each table hashes a fixed random subset of
/// descriptor bits, and only train descriptors sharing a bucket with the
/// query in some table are compared.
#[derive(Debug, Clone)]
pub struct LshMatcher {
    tables: Vec<SmallVec<[u16; 24]>>,
}

impl LshMatcher {
    pub fn new(params: &LshParams) -> Self {
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next_bit = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 256) as u16
        };
        let key_bits = params.key_bits.min(24) as usize;
        let tables = (0..params.tables)
            .map(|_| {
                let mut bits: SmallVec<[u16; 24]> = SmallVec::new();
                while bits.len() < key_bits {
                    let bit = next_bit();
                    if !bits.contains(&bit) {
                        bits.push(bit);
                    }
                }
                bits
            })
            .collect();
        Self { tables }
    }

    fn key(bits: &[u16], descriptor: &Descriptor) -> u32 {
        bits.iter()
            .enumerate()
            .filter(|&(_, &b)| descriptor.bit(usize::from(b)))
            .fold(0u32, |key, (i, _)| key | (1u32 << i))
    }
}

impl DescriptorMatcher for LshMatcher {
    fn match_best(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Match> {
        let index: Vec<HashMap<u32, Vec<usize>>> = self
            .tables
            .iter()
            .map(|bits| {
                let mut buckets: HashMap<u32, Vec<usize>> = HashMap::new();
                for (ti, t) in train.iter().enumerate() {
                    buckets.entry(Self::key(bits, t)).or_default().push(ti);
                }
                buckets
            })
            .collect();

        // Per-query visit stamps avoid comparing a candidate twice.
        let mut stamp = vec![usize::MAX; train.len()];
        let mut matches = Vec::new();
        for (qi, q) in query.iter().enumerate() {
            let mut best: Option<Match> = None;
            for (bits, buckets) in self.tables.iter().zip(&index) {
                let Some(bucket) = buckets.get(&Self::key(bits, q)) else {
                    continue;
                };
                for &ti in bucket {
                    if stamp[ti] == qi {
                        continue;
                    }
                    stamp[ti] = qi;
                    let candidate = Match {
                        query: qi,
                        train: ti,
                        distance: q.distance(&train[ti]),
                    };
                    if best.map_or(true, |b| {
                        (candidate.distance, candidate.train) < (b.distance, b.train)
                    }) {
                        best = Some(candidate);
                    }
                }
            }
            matches.extend(best);
        }
        matches
    }
}
