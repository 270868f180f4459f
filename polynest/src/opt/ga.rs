//! Genetic search over placement orderings and rotations.
//!
//! Fitness is never computed here. The scheduler assigns it from evaluator
//! responses; this module only consumes it for selection and elitism.

use std::cmp::Reverse;

use itertools::Itertools;
use log::debug;
use ordered_float::OrderedFloat;
use rand::Rng;
use rand::rngs::SmallRng;

use crate::config::NestConfig;
use crate::entities::PartInstance;

/// One candidate solution: an insertion order over all part instances and a
/// rotation per entry.
#[derive(Clone, Debug)]
pub struct Individual {
    pub placement: Vec<PartInstance>,
    /// Degrees, one entry per placement entry.
    pub rotation: Vec<f64>,
    /// Assigned by the scheduler once the evaluator responds.
    pub fitness: Option<f64>,
    /// An evaluation of this individual is in flight.
    pub processing: bool,
}

impl Individual {
    fn new(placement: Vec<PartInstance>, rotation: Vec<f64>) -> Self {
        Individual {
            placement,
            rotation,
            fitness: None,
            processing: false,
        }
    }
}

pub struct GeneticOptimizer {
    pub population: Vec<Individual>,
    config: NestConfig,
}

impl GeneticOptimizer {
    /// Seeds the population. The first individual places the instances in
    /// decreasing area order with random rotations, the rest are mutants
    /// of it.
    pub fn new(instances: Vec<PartInstance>, config: NestConfig, rng: &mut SmallRng) -> Self {
        let adam = instances
            .into_iter()
            .sorted_by_cached_key(|p| Reverse(OrderedFloat(p.tree.root().contour.area())))
            .collect_vec();
        let rotation = adam
            .iter()
            .map(|_| random_angle(rng, config.rotations))
            .collect_vec();

        let seed = Individual::new(adam, rotation);
        let mut population = vec![seed.clone()];
        while population.len() < config.population_size {
            population.push(mutate(rng, &config, &seed));
        }
        GeneticOptimizer { population, config }
    }

    /// `true` once every individual has a fitness, i.e. the generation is
    /// fully evaluated.
    pub fn complete(&self) -> bool {
        self.population.iter().all(|i| i.fitness.is_some())
    }

    /// Replaces the population. The best individual survives unchanged,
    /// the rest are mutated children of rank-weighted parent pairs.
    pub fn generation(&mut self, rng: &mut SmallRng) {
        self.population
            .sort_by_cached_key(|i| OrderedFloat(i.fitness.unwrap_or(f64::INFINITY)));

        let target = self.population.len();
        let mut next = vec![self.population[0].clone()];
        while next.len() < target {
            let male = self.random_weighted(rng, None);
            let female = self.random_weighted(rng, Some(male));
            let (boy, girl) = mate(rng, &self.population[male], &self.population[female]);
            next.push(mutate(rng, &self.config, &boy));
            if next.len() < target {
                next.push(mutate(rng, &self.config, &girl));
            }
        }
        self.population = next;
        debug!("[GA] new generation of {target}");
    }

    /// Rank-weighted draw over the population (sorted best first), heavier
    /// towards the front. Returns the index of the drawn individual;
    /// floating rounding can leave the draw unassigned, in which case the
    /// best individual is returned.
    fn random_weighted(&self, rng: &mut SmallRng, exclude: Option<usize>) -> usize {
        let pool = (0..self.population.len())
            .filter(|&i| Some(i) != exclude)
            .collect_vec();

        let draw = rng.random::<f64>();
        let n = pool.len();
        let weight = 1.0 / n as f64;
        let mut lower = 0.0;
        let mut upper = weight;
        for (rank, &i) in pool.iter().enumerate() {
            if draw > lower && draw < upper {
                return i;
            }
            lower = upper;
            upper += 2.0 * weight * ((n - rank) as f64 / n as f64);
        }
        pool[0]
    }
}

fn random_angle(rng: &mut SmallRng, rotations: u32) -> f64 {
    f64::from(rng.random_range(0..rotations)) * (360.0 / f64::from(rotations))
}

/// Returns a mutated copy: each position may swap with its immediate
/// successor and may redraw its rotation, each independently with
/// probability `mutation_rate` percent. The input is never touched and the
/// copy starts unevaluated.
fn mutate(rng: &mut SmallRng, config: &NestConfig, individual: &Individual) -> Individual {
    let mut clone = Individual::new(individual.placement.clone(), individual.rotation.clone());
    let rate = f64::from(config.mutation_rate) / 100.0;
    for i in 0..clone.placement.len() {
        if rng.random::<f64>() < rate && i + 1 < clone.placement.len() {
            clone.placement.swap(i, i + 1);
        }
        if rng.random::<f64>() < rate {
            clone.rotation[i] = random_angle(rng, config.rotations);
        }
    }
    clone
}

/// Order-preserving single-point crossover: each child takes one parent's
/// prefix up to the cut, then the other parent's remaining entries in that
/// parent's order, rotations following their entries.
fn mate(rng: &mut SmallRng, male: &Individual, female: &Individual) -> (Individual, Individual) {
    let len = male.placement.len();
    let cut = (rng.random::<f64>().clamp(0.1, 0.9) * (len.saturating_sub(1)) as f64).round() as usize;

    let boy = cross(&male.placement[..cut], &male.rotation[..cut], female);
    let girl = cross(&female.placement[..cut], &female.rotation[..cut], male);
    return (boy, girl);

    fn cross(prefix: &[PartInstance], prefix_rot: &[f64], other: &Individual) -> Individual {
        let mut placement = prefix.to_vec();
        let mut rotation = prefix_rot.to_vec();
        for (entry, &rot) in other.placement.iter().zip(&other.rotation) {
            if !placement.iter().any(|p| p.id == entry.id) {
                placement.push(entry.clone());
                rotation.push(rot);
            }
        }
        Individual::new(placement, rotation)
    }
}
