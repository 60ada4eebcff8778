//! Seeded genetic search with a bounded evaluation memo.
//!
//! mu+lambda generational loop over gene vectors indexing into the
//! per-parameter value grids: rank selection of the top fraction,
//! two-point crossover, per-gene resample mutation. All randomness comes
//! from one seeded `StdRng`, and repeated candidates are served from a
//! bounded FIFO memo keyed by a blake3 hash of the canonical parameter
//! set. Each generation evaluates only uncached candidates on the rayon
//! pool and inserts results serially, so a given seed always produces
//! the same search.

use super::{evaluate, resolve_target, sort_descending};
use super::{OptimizationResult, OptimizationSetting, OptimizeError, ParamSet};
use backlab_core::domain::Bar;
use backlab_core::engine::EngineConfig;
use backlab_core::strategy::Strategy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    pub crossover_prob: f64,
    pub mutation_prob: f64,
    /// Fraction of the ranked population kept as parents.
    pub parent_fraction: f64,
    pub seed: u64,
    pub cache_capacity: usize,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 30,
            crossover_prob: 0.95,
            mutation_prob: 0.05,
            parent_fraction: 0.8,
            seed: 0,
            cache_capacity: 4096,
        }
    }
}

// ── Evaluation memo ────────────────────────────────────────────────────

/// Bounded FIFO memo of completed evaluations, keyed by a blake3 hash of
/// the canonical parameter set.
pub struct EvalCache {
    map: HashMap<blake3::Hash, OptimizationResult>,
    order: VecDeque<blake3::Hash>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl EvalCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn key(params: &ParamSet) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for (name, value) in params {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
            hasher.update(&value.to_bits().to_le_bytes());
        }
        hasher.finalize()
    }

    pub fn get(&mut self, key: &blake3::Hash) -> Option<&OptimizationResult> {
        let result = self.map.get(key);
        if result.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        result
    }

    pub fn contains(&self, key: &blake3::Hash) -> bool {
        self.map.contains_key(key)
    }

    pub fn insert(&mut self, key: blake3::Hash, result: OptimizationResult) {
        if self.map.insert(key, result).is_none() {
            self.order.push_back(key);
            while self.order.len() > self.capacity {
                if let Some(evicted) = self.order.pop_front() {
                    self.map.remove(&evicted);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

// ── Search ─────────────────────────────────────────────────────────────

type Individual = Vec<usize>;

fn decode(individual: &Individual, grids: &[(String, Vec<f64>)]) -> ParamSet {
    individual
        .iter()
        .zip(grids)
        .map(|(&gene, (name, values))| (name.clone(), values[gene]))
        .collect()
}

fn random_individual(rng: &mut StdRng, grids: &[(String, Vec<f64>)]) -> Individual {
    grids.iter().map(|(_, v)| rng.gen_range(0..v.len())).collect()
}

fn two_point_crossover(rng: &mut StdRng, a: &mut Individual, b: &mut Individual) {
    let len = a.len();
    if len < 2 {
        return;
    }
    let mut lo = rng.gen_range(0..len);
    let mut hi = rng.gen_range(0..len);
    if lo > hi {
        std::mem::swap(&mut lo, &mut hi);
    }
    for i in lo..=hi {
        std::mem::swap(&mut a[i], &mut b[i]);
    }
}

fn mutate(
    rng: &mut StdRng,
    individual: &mut Individual,
    grids: &[(String, Vec<f64>)],
    prob: f64,
) {
    for (gene, (_, values)) in individual.iter_mut().zip(grids) {
        if rng.gen_bool(prob) {
            *gene = rng.gen_range(0..values.len());
        }
    }
}

/// Run the genetic search and return the running best candidates sorted
/// descending by target. The returned front is capped at one population
/// of unique parameter sets.
pub fn genetic_search<F>(
    config: &EngineConfig,
    bars: &[Bar],
    setting: &OptimizationSetting,
    factory: &F,
    ga: &GeneticConfig,
) -> Result<Vec<OptimizationResult>, OptimizeError>
where
    F: Fn(&ParamSet) -> Box<dyn Strategy + Send> + Sync,
{
    let target = resolve_target(setting)?;
    let grids = setting.grids();
    if grids.is_empty() || grids.iter().any(|(_, v)| v.is_empty()) {
        return Err(OptimizeError::EmptyGrid);
    }

    let pop_size = ga.population_size.max(2);
    // within-generation uniques must never evict each other
    let mut cache = EvalCache::new(ga.cache_capacity.max(pop_size * 2));
    let mut rng = StdRng::seed_from_u64(ga.seed);
    let mut population: Vec<Individual> = (0..pop_size)
        .map(|_| random_individual(&mut rng, grids))
        .collect();

    info!(
        population = pop_size,
        generations = ga.generations,
        target = %target,
        "starting genetic search"
    );

    let mut front: Vec<OptimizationResult> = Vec::new();

    for generation in 0..ga.generations.max(1) {
        // decode and evaluate only candidates the memo has not seen
        let decoded: Vec<(blake3::Hash, ParamSet)> = population
            .iter()
            .map(|ind| {
                let params = decode(ind, grids);
                (EvalCache::key(&params), params)
            })
            .collect();

        let mut pending: Vec<(blake3::Hash, ParamSet)> = Vec::new();
        for (key, params) in &decoded {
            if !cache.contains(key) && !pending.iter().any(|(k, _)| k == key) {
                pending.push((*key, params.clone()));
            }
        }

        let fresh: Vec<(blake3::Hash, OptimizationResult)> = pending
            .par_iter()
            .map(|(key, params)| (*key, evaluate(config, bars, factory, params, &target)))
            .collect();
        for (key, result) in fresh {
            cache.insert(key, result);
        }

        let mut ranked: Vec<(f64, Individual)> = Vec::with_capacity(pop_size);
        for ((key, _), individual) in decoded.iter().zip(&population) {
            let fitness = cache
                .get(key)
                .map(|r| r.target)
                .unwrap_or(f64::NEG_INFINITY);
            ranked.push((fitness, individual.clone()));
        }
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        // fold this generation's uniques into the running front
        for (key, params) in &decoded {
            if front.iter().any(|r| &r.params == params) {
                continue;
            }
            if let Some(result) = cache.get(key) {
                front.push(OptimizationResult {
                    params: params.clone(),
                    target: result.target,
                    statistics: result.statistics.clone(),
                });
            }
        }
        sort_descending(&mut front);
        front.truncate(pop_size);

        debug!(
            generation,
            best = ranked.first().map(|(f, _)| *f).unwrap_or(f64::NEG_INFINITY),
            cache_size = cache.len(),
            "generation complete"
        );

        if generation + 1 == ga.generations.max(1) {
            break;
        }

        // rank selection, then breed the next generation
        let parent_count = ((pop_size as f64 * ga.parent_fraction) as usize).max(2);
        let parents: Vec<Individual> = ranked
            .into_iter()
            .take(parent_count)
            .map(|(_, ind)| ind)
            .collect();

        let mut offspring: Vec<Individual> = Vec::with_capacity(pop_size);
        while offspring.len() < pop_size {
            let mut a = parents[rng.gen_range(0..parents.len())].clone();
            let mut b = parents[rng.gen_range(0..parents.len())].clone();
            if rng.gen_bool(ga.crossover_prob) {
                two_point_crossover(&mut rng, &mut a, &mut b);
            }
            mutate(&mut rng, &mut a, grids, ga.mutation_prob);
            mutate(&mut rng, &mut b, grids, ga.mutation_prob);
            offspring.push(a);
            if offspring.len() < pop_size {
                offspring.push(b);
            }
        }
        population = offspring;
    }

    Ok(front)
}
