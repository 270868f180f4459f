mod common;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc::channel;
    use std::time::{Duration, Instant};

    use anyhow::Result;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use polynest::config::NestConfig;
    use polynest::entities::PolyTree;
    use polynest::geometry::primitives::Contour;
    use polynest::geometry::simplification::SimplifyConfig;
    use polynest::io::ext_repr::{EvalRequest, EvalResponse};
    use polynest::opt::eval::{SheetSet, build_request, spawn_worker};
    use polynest::opt::ga::GeneticOptimizer;
    use polynest::opt::scheduler::{EVAL_TIMEOUT, OptState};
    use polynest::opt::spacing;

    use crate::common::{init_logger, square, square_at, square_instances};

    const CT: f64 = 0.3;

    fn simplify_cfg() -> SimplifyConfig {
        SimplifyConfig {
            curve_tolerance: CT,
            hull_only: false,
        }
    }

    fn holed_square() -> PolyTree {
        let mut tree = PolyTree::new(Contour::new(square(10.0)), Some(0), Some(0));
        tree.add_child(
            PolyTree::ROOT,
            Contour::new(square_at(3.0, 3.0, 4.0)),
            Some(1),
            Some(1),
        );
        tree
    }

    fn config(population_size: usize) -> NestConfig {
        NestConfig {
            population_size,
            prng_seed: Some(0),
            ..NestConfig::default()
        }
    }

    #[test]
    fn spacing_grows_parts_and_shrinks_their_holes() {
        init_logger();
        let spaced = spacing::apply(&holed_square(), 1.0, false, &simplify_cfg());
        assert_eq!(spaced.len(), 2);
        assert_eq!(spaced.root().id, Some(0));
        assert!((spaced.root().contour.area() - 144.0).abs() < 1e-3);

        let hole = spaced.node(spaced.root().children()[0]);
        assert_eq!(hole.id, Some(1));
        assert!((hole.contour.area() - 4.0).abs() < 1e-3);
    }

    #[test]
    fn spacing_shrinks_sheets_and_grows_their_holes() {
        init_logger();
        let spaced = spacing::apply(&holed_square(), 1.0, true, &simplify_cfg());
        assert!((spaced.root().contour.area() - 64.0).abs() < 1e-3);

        let hole = spaced.node(spaced.root().children()[0]);
        assert!((hole.contour.area() - 36.0).abs() < 1e-3);
    }

    #[test]
    fn spacing_zero_keeps_geometry() {
        init_logger();
        let spaced = spacing::apply(&holed_square(), 0.0, false, &simplify_cfg());
        assert!((spaced.root().contour.area() - 100.0).abs() < 1e-3);
        let hole = spaced.node(spaced.root().children()[0]);
        assert!((hole.contour.area() - 16.0).abs() < 1e-3);
    }

    #[test]
    fn scheduler_keeps_a_single_evaluation_in_flight() {
        init_logger();
        let mut state = OptState::default();
        state.instances = square_instances(4);
        let config = config(5);
        let mut rng = SmallRng::seed_from_u64(0);
        let (tx, rx) = channel();

        state.tick(&config, &mut rng, &tx);
        let ga = state.ga.as_ref().unwrap();
        assert_eq!(ga.population.len(), 5);
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(state.pending.unwrap().index, 0);
        assert!(ga.population[0].processing);

        // nothing else may be dispatched while the first is in flight
        state.tick(&config, &mut rng, &tx);
        assert_eq!(rx.try_iter().count(), 0);
        assert_eq!(state.pending.unwrap().index, 0);
    }

    #[test]
    fn scheduler_requeues_a_timed_out_evaluation() {
        init_logger();
        let mut state = OptState::default();
        state.instances = square_instances(4);
        let config = config(5);
        let mut rng = SmallRng::seed_from_u64(0);
        let (tx, rx) = channel();

        state.tick(&config, &mut rng, &tx);
        let first = rx.try_recv().unwrap();
        assert_eq!(first.index, 0);

        // backdate the dispatch beyond the timeout; the next tick abandons
        // it and hands the same individual out again
        let stale = Instant::now() - EVAL_TIMEOUT;
        state.pending.as_mut().unwrap().since = stale;
        state.tick(&config, &mut rng, &tx);

        let second = rx.try_recv().unwrap();
        assert_eq!(second.index, 0);
        let pending = state.pending.unwrap();
        assert_eq!(pending.index, 0);
        assert!(pending.since > stale);
        assert!(state.ga.as_ref().unwrap().population[0].processing);
        assert_eq!(state.ga.as_ref().unwrap().population[0].fitness, None);
    }

    #[test]
    fn scheduler_records_fitness_and_best_results() {
        init_logger();
        let mut state = OptState::default();
        state.instances = square_instances(4);
        let config = config(5);
        let mut rng = SmallRng::seed_from_u64(0);
        let (tx, _rx) = channel();

        state.tick(&config, &mut rng, &tx);
        let improved = state.on_response(EvalResponse {
            index: 0,
            fitness: 42.0,
            placements: vec![],
        });
        assert!(improved.is_some());
        assert_eq!(state.best.len(), 1);
        assert!(state.pending.is_none());
        assert_eq!(state.ga.as_ref().unwrap().population[0].fitness, Some(42.0));
        assert!((state.progress() - 0.2).abs() < 1e-12);

        // a worse result is recorded on the individual but not in the list
        state.tick(&config, &mut rng, &tx);
        assert_eq!(state.pending.unwrap().index, 1);
        let improved = state.on_response(EvalResponse {
            index: 1,
            fitness: 50.0,
            placements: vec![],
        });
        assert!(improved.is_none());
        assert_eq!(state.best.len(), 1);
        assert_eq!(state.best[0].fitness, 42.0);

        // a response for an index that was never dispatched is stale
        let improved = state.on_response(EvalResponse {
            index: 3,
            fitness: 1.0,
            placements: vec![],
        });
        assert!(improved.is_none());
        assert_eq!(state.ga.as_ref().unwrap().population[3].fitness, None);
    }

    #[test]
    fn scheduler_drops_responses_after_optimizer_reset() {
        init_logger();
        let mut state = OptState::default();
        state.instances = square_instances(2);
        let config = config(3);
        let mut rng = SmallRng::seed_from_u64(0);
        let (tx, _rx) = channel();

        state.tick(&config, &mut rng, &tx);
        state.clear_optimizer();
        let improved = state.on_response(EvalResponse {
            index: 0,
            fitness: 1.0,
            placements: vec![],
        });
        assert!(improved.is_none());
        assert!(state.best.is_empty());
    }

    #[test]
    fn completed_generation_advances_and_keeps_the_best() {
        init_logger();
        let config = config(5);
        let mut rng = SmallRng::seed_from_u64(0);
        let mut state = OptState::default();
        let mut ga = GeneticOptimizer::new(square_instances(4), config.clone(), &mut rng);
        for (individual, fitness) in ga.population.iter_mut().zip([5.0, 3.0, 9.0, 1.0, 7.0]) {
            individual.fitness = Some(fitness);
        }
        state.ga = Some(ga);

        let (tx, rx) = channel();
        state.tick(&config, &mut rng, &tx);

        let ga = state.ga.as_ref().unwrap();
        assert_eq!(ga.population.len(), 5);
        assert_eq!(ga.population[0].fitness, Some(1.0));
        assert!(ga.population[1..].iter().all(|i| i.fitness.is_none()));
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(state.pending.unwrap().index, 1);
    }

    #[test]
    fn eval_request_flattens_the_individual_and_sheets() {
        init_logger();
        let config = config(3);
        let mut rng = SmallRng::seed_from_u64(0);
        let ga = GeneticOptimizer::new(square_instances(3), config.clone(), &mut rng);

        let mut sheet_set = SheetSet::default();
        let sheet = PolyTree::new(Contour::new(square(20.0)), Some(9), Some(9));
        sheet_set.push(&sheet, 0);
        sheet_set.push(&sheet, 0);
        assert_eq!(sheet_set.ids, vec![0, 1]);

        let request = build_request(0, &ga.population[0], &sheet_set, &config);
        assert_eq!(request.index, 0);
        assert_eq!(request.sheets.len(), 2);
        assert_eq!(request.sheet_sources, vec![0, 0]);
        // the seed individual is ordered by decreasing area
        assert_eq!(request.ids, vec![0, 1, 2]);
        assert_eq!(request.sources, vec![0, 1, 2]);
        assert_eq!(request.individual.placement[0], square(3.0));
        assert_eq!(request.individual.rotation.len(), 3);
        assert!(request.children.iter().all(|c| c.is_empty()));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["ids"], serde_json::json!([0, 1, 2]));
        assert_eq!(json["sheet_ids"], serde_json::json!([0, 1]));
    }

    #[test]
    fn eval_response_parses_from_json() {
        let response: EvalResponse = serde_json::from_str(
            r#"{
                "index": 2,
                "fitness": 12.5,
                "placements": [{
                    "sheet": 0,
                    "sheet_source": 0,
                    "placements": [{"id": 0, "source": 1, "x": 1.0, "y": 2.0, "rotation": 90.0}]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(response.index, 2);
        assert_eq!(response.placements[0].placements[0].source, 1);
    }

    #[test]
    fn worker_round_trips_requests() {
        init_logger();
        let evaluator = Arc::new(|request: EvalRequest| -> Result<EvalResponse> {
            Ok(EvalResponse {
                index: request.index,
                fitness: 7.0,
                placements: vec![],
            })
        });
        let (tx, rx) = spawn_worker(evaluator).unwrap();

        let config = config(3);
        let mut rng = SmallRng::seed_from_u64(0);
        let ga = GeneticOptimizer::new(square_instances(2), config.clone(), &mut rng);
        let request = build_request(1, &ga.population[1], &SheetSet::default(), &config);
        tx.send(request).unwrap();

        let response = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(response.index, 1);
        assert_eq!(response.fitness, 7.0);
    }
}
