//! End-to-end planner tests on small 2D worlds.

use approx::assert_relative_eq;

use marga_plan::config::BitStarConfig;
use marga_plan::objective::PathLengthObjective;
use marga_plan::planner::{BitStar, ProblemDefinition};
use marga_plan::termination::TerminationCondition;
use marga_space::{AlwaysValid, Bounds, FnValidityChecker, RealVectorSpace, SpaceInformation};

fn free_space() -> SpaceInformation<2> {
    SpaceInformation::new(RealVectorSpace::new(Bounds::unit()), Box::new(AlwaysValid))
}

/// A vertical wall at 0.4 < x < 0.6 below y = 0.8.
fn wall_space() -> SpaceInformation<2> {
    SpaceInformation::new(
        RealVectorSpace::new(Bounds::unit()),
        Box::new(FnValidityChecker(|s: &[f64; 2]| {
            !(s[0] > 0.4 && s[0] < 0.6 && s[1] < 0.8)
        })),
    )
}

fn seeded_config(samples_per_batch: usize, seed: u64) -> BitStarConfig {
    let mut config = BitStarConfig::default();
    config.samples_per_batch = samples_per_batch;
    config.rng_seed = Some(seed);
    config
}

fn planner(si: SpaceInformation<2>, config: BitStarConfig) -> BitStar<2> {
    BitStar::new(si, PathLengthObjective::new(), config).unwrap()
}

fn euclidean(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt()
}

fn path_length(path: &[[f64; 2]]) -> f64 {
    path.windows(2).map(|w| euclidean(&w[0], &w[1])).sum()
}

#[test]
fn test_start_equals_goal() {
    let mut planner = planner(free_space(), seeded_config(10, 1));
    planner
        .setup(&ProblemDefinition::single([0.5, 0.5], [0.5, 0.5]))
        .unwrap();

    let result = planner.solve(TerminationCondition::never()).unwrap();
    assert!(result.solution_found);
    assert!(!result.approximate);
    assert_relative_eq!(planner.best_cost().value(), 0.0);
    assert_eq!(planner.stats().iterations, 1);
    assert_eq!(planner.best_path().unwrap(), vec![[0.5, 0.5]]);
}

#[test]
fn test_direct_line_converges_to_diagonal() {
    let mut planner = planner(free_space(), seeded_config(50, 7));
    planner
        .setup(&ProblemDefinition::single([0.0, 0.0], [1.0, 1.0]))
        .unwrap();

    let result = planner
        .solve(TerminationCondition::after_iterations(5000))
        .unwrap();
    assert!(result.solution_found);

    let optimum = 2.0_f64.sqrt();
    let cost = planner.best_cost().value();
    assert!(cost >= optimum - 1e-9, "cost {} beats the optimum", cost);
    assert!(cost < 1.5, "cost {} did not converge", cost);

    // The reported path is consistent with the reported cost.
    let path = planner.best_path().unwrap();
    assert_eq!(path.first(), Some(&[0.0, 0.0]));
    assert_eq!(path.last(), Some(&[1.0, 1.0]));
    assert_relative_eq!(path_length(&path), cost, epsilon = 1e-9);
}

#[test]
fn test_solution_cost_is_monotone_across_improvements() {
    let mut planner = planner(free_space(), seeded_config(50, 11));
    planner
        .setup(&ProblemDefinition::single([0.0, 0.0], [1.0, 1.0]))
        .unwrap();
    planner.set_stop_on_each_solution_improvement(true);

    let mut costs = Vec::new();
    for _ in 0..12 {
        let result = planner
            .solve(TerminationCondition::after_iterations(
                planner.stats().iterations + 1500,
            ))
            .unwrap();
        if !result.solution_found {
            break;
        }
        costs.push(planner.best_cost().value());
    }

    assert!(costs.len() >= 2, "expected repeated improvements");
    assert!(costs.windows(2).all(|w| w[1] < w[0] + 1e-12));
}

#[test]
fn test_wall_detour() {
    let mut planner = planner(wall_space(), seeded_config(100, 3));
    planner
        .setup(&ProblemDefinition::single([0.0, 0.0], [1.0, 0.0]))
        .unwrap();

    let result = planner
        .solve(TerminationCondition::after_iterations(20000))
        .unwrap();
    assert!(result.solution_found);

    let cost = planner.best_cost().value();
    // The detour over the wall: through (0.4, 0.8) and (0.6, 0.8).
    let optimum = 2.0 * (0.4_f64.powi(2) + 0.8_f64.powi(2)).sqrt() + 0.2;
    assert!(cost > 1.0, "a straight path through the wall is impossible");
    assert!(cost >= optimum - 1e-9, "cost {} beats the optimum", cost);
    assert!(
        cost <= optimum * 1.05,
        "cost {} not within 5% of the optimum {}",
        cost,
        optimum
    );

    // Every segment of the reported path must be collision-free.
    let si = wall_space();
    let path = planner.best_path().unwrap();
    for w in path.windows(2) {
        assert!(si.check_motion(&w[0], &w[1]));
    }
}

#[test]
fn test_pruning_discards_hopeless_samples() {
    let mut planner = planner(free_space(), seeded_config(50, 19));
    planner
        .setup(&ProblemDefinition::single([0.1, 0.5], [0.9, 0.5]))
        .unwrap();
    planner.set_stop_on_each_solution_improvement(true);

    // First solution.
    let result = planner
        .solve(TerminationCondition::after_iterations(3000))
        .unwrap();
    assert!(result.solution_found);
    let first_cost = planner.best_cost().value();

    // Keep improving; batches after the improvement prune the graph.
    planner.set_stop_on_each_solution_improvement(false);
    planner
        .solve(TerminationCondition::after_iterations(
            planner.stats().iterations + 4000,
        ))
        .unwrap();

    let stats = planner.stats();
    assert!(stats.prunings >= 1, "no pruning took place");
    assert!(stats.states_pruned > 0);

    // Everything still held must be able to beat the first solution.
    let data = planner.planner_data().unwrap();
    for sample in &data.samples {
        let f_hat = euclidean(&[0.1, 0.5], sample) + euclidean(sample, &[0.9, 0.5]);
        assert!(
            f_hat < first_cost + 1e-9,
            "surviving sample with admissible estimate {} vs {}",
            f_hat,
            first_cost
        );
    }
}

#[test]
fn test_strict_and_relaxed_ordering_agree() {
    let optimum = 2.0 * (0.4_f64.powi(2) + 0.8_f64.powi(2)).sqrt() + 0.2;
    let mut costs = Vec::new();
    let mut resorts = Vec::new();

    for strict in [false, true] {
        let mut config = seeded_config(100, 5);
        config.use_strict_queue_ordering = strict;
        let mut planner = planner(wall_space(), config);
        planner
            .setup(&ProblemDefinition::single([0.0, 0.0], [1.0, 0.0]))
            .unwrap();
        let result = planner
            .solve(TerminationCondition::after_iterations(8000))
            .unwrap();
        assert!(result.solution_found);
        costs.push(planner.best_cost().value());
        resorts.push(planner.stats().resorts);
    }

    for cost in &costs {
        assert!(*cost >= optimum - 1e-9 && *cost <= optimum * 1.1);
    }
    // Strict ordering resorts on every stale pop; relaxed ordering only
    // when an inversion would end the batch early.
    assert!(
        resorts[1] >= resorts[0],
        "strict mode resorted less ({}) than relaxed mode ({})",
        resorts[1],
        resorts[0]
    );
}

#[test]
fn test_solve_without_setup_is_a_config_error() {
    let mut planner = planner(free_space(), BitStarConfig::default());
    assert!(planner.solve(TerminationCondition::never()).is_err());
}

#[test]
fn test_setup_rejects_wrong_start_count() {
    let mut planner = planner(free_space(), BitStarConfig::default());

    let empty = ProblemDefinition::new([0.9, 0.9]);
    assert!(planner.setup(&empty).is_err());

    let mut two = ProblemDefinition::single([0.1, 0.1], [0.9, 0.9]);
    two.add_start([0.2, 0.2]);
    assert!(planner.setup(&two).is_err());
}

#[test]
fn test_setup_rejects_invalid_start() {
    let mut planner = planner(wall_space(), BitStarConfig::default());
    let problem = ProblemDefinition::single([0.5, 0.5], [0.9, 0.9]);
    assert!(planner.setup(&problem).is_err());
}

#[test]
fn test_nearest_neighbors_are_fixed_after_setup() {
    use marga_space::KdTreeIndex;

    let mut planner = planner(free_space(), BitStarConfig::default());
    planner
        .set_nearest_neighbors(
            Box::new(KdTreeIndex::new()),
            Box::new(KdTreeIndex::new()),
        )
        .unwrap();
    planner
        .setup(&ProblemDefinition::single([0.1, 0.1], [0.9, 0.9]))
        .unwrap();
    assert!(planner
        .set_nearest_neighbors(Box::new(KdTreeIndex::new()), Box::new(KdTreeIndex::new()))
        .is_err());
}

#[test]
fn test_rng_seed_requires_setup() {
    let mut planner = planner(free_space(), BitStarConfig::default());
    assert!(planner.rng_local_seed().is_err());
    assert!(planner.set_rng_local_seed(9).is_err());

    planner
        .setup(&ProblemDefinition::single([0.1, 0.1], [0.9, 0.9]))
        .unwrap();
    planner.set_rng_local_seed(9).unwrap();
    assert_eq!(planner.rng_local_seed().unwrap(), 9);
}

#[test]
fn test_clear_keeps_configuration() {
    let mut config = seeded_config(25, 2);
    config.use_k_nearest = true;
    let mut planner = planner(free_space(), config);
    planner
        .setup(&ProblemDefinition::single([0.1, 0.1], [0.9, 0.9]))
        .unwrap();
    planner
        .solve(TerminationCondition::after_iterations(50))
        .unwrap();

    planner.clear();
    assert!(!planner.is_setup());
    assert!(planner.config().use_k_nearest);
    assert_eq!(planner.stats().iterations, 0);

    // The planner is reusable after a clear.
    planner
        .setup(&ProblemDefinition::single([0.2, 0.2], [0.8, 0.8]))
        .unwrap();
    let result = planner
        .solve(TerminationCondition::after_iterations(2000))
        .unwrap();
    assert!(result.solution_found);
}

#[test]
fn test_k_nearest_mode_finds_solutions() {
    let mut config = seeded_config(50, 31);
    config.use_k_nearest = true;
    let mut planner = planner(free_space(), config);
    planner
        .setup(&ProblemDefinition::single([0.0, 0.0], [1.0, 1.0]))
        .unwrap();
    let result = planner
        .solve(TerminationCondition::after_iterations(4000))
        .unwrap();
    assert!(result.solution_found);
    assert!(planner.best_cost().value() < 1.6);
}

#[test]
fn test_planner_data_reports_graph() {
    let mut planner = planner(free_space(), seeded_config(40, 13));
    planner
        .setup(&ProblemDefinition::single([0.0, 0.0], [1.0, 1.0]))
        .unwrap();
    planner
        .solve(TerminationCondition::after_iterations(500))
        .unwrap();

    let data = planner.planner_data().unwrap();
    let roots = data.vertices.iter().filter(|v| v.is_root).count();
    assert_eq!(roots, 1);
    // Exactly the root has no incoming edge.
    assert!(data
        .vertices
        .iter()
        .all(|v| v.is_root == v.parent.is_none()));
    if planner.has_solution() {
        assert_eq!(data.goal, Some([1.0, 1.0]));
    }

    let progress = planner.progress().unwrap();
    assert_eq!(progress.tree_vertices, data.vertices.len());
    assert_eq!(progress.free_states, data.samples.len());
}

#[test]
fn test_iteration_termination_bounds_work() {
    let mut planner = planner(free_space(), seeded_config(50, 17));
    planner
        .setup(&ProblemDefinition::single([0.0, 0.0], [1.0, 1.0]))
        .unwrap();
    planner
        .solve(TerminationCondition::after_iterations(100))
        .unwrap();
    assert!(planner.stats().iterations <= 100);
}
