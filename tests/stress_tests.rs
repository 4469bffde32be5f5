//! Stress tests for the hashclust library.
//!
//! These tests verify correctness on larger seeded random data and print
//! rough timings.

use hashclust::prelude::*;
use rand::prelude::*;
use std::collections::HashSet;
use std::time::Instant;

/// Generate a random collection in the unit cube.
fn generate_random_collection(n: usize, dim: usize, seed: u64) -> RecordCollection {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let data: Vec<Vec<f32>> = (0..n)
        .map(|_| (0..dim).map(|_| rng.gen::<f32>()).collect())
        .collect();
    RecordCollection::from_vecs(data).unwrap()
}

/// Generate `groups` Gaussian blobs with `per_group` points each.
fn generate_blobs(groups: usize, per_group: usize, dim: usize, seed: u64) -> RecordCollection {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let centers: Vec<Vec<f32>> = (0..groups)
        .map(|_| (0..dim).map(|_| rng.gen::<f32>() * 100.0).collect())
        .collect();
    let normal = rand_distr::Normal::new(0.0f32, 1.0).unwrap();
    let data: Vec<Vec<f32>> = (0..groups * per_group)
        .map(|i| {
            centers[i % groups]
                .iter()
                .map(|&c| c + rng.sample(normal))
                .collect()
        })
        .collect();
    RecordCollection::from_vecs(data).unwrap()
}

/// Verify that every record is in exactly one cluster.
fn verify_partition(result: &ClusteringResult, n: usize, k: usize) {
    assert!(result.num_clusters() <= k);
    let mut seen = HashSet::with_capacity(n);
    for cluster in &result.clusters {
        for &id in &cluster.members {
            assert!(seen.insert(id), "record {id} assigned twice");
        }
    }
    assert_eq!(seen.len(), n);
}

#[test]
fn stress_test_lsh_nearest_neighbor() {
    const N: usize = 5000;
    const DIM: usize = 32;
    const NUM_QUERIES: usize = 200;

    let collection = generate_random_collection(N, DIM, 42);
    let queries = generate_random_collection(NUM_QUERIES, DIM, 123);

    let start = Instant::now();
    let index = AmplifiedHashIndex::build(&collection, LshConfig::new(4, 8)).unwrap();
    let build_time = start.elapsed();

    let exact = BruteForceSearcher::new(&collection);
    let mut answered = 0;
    let mut ratio_sum = 0.0f64;

    let start = Instant::now();
    for query in &queries {
        let truth = exact.nearest(query.coordinates()).unwrap().unwrap();
        if let Some(approx) = index.nearest_neighbor(query.coordinates(), 500).unwrap() {
            assert!(approx.distance >= truth.distance);
            answered += 1;
            ratio_sum += approx.distance as f64 / truth.distance as f64;
        }
    }
    let query_time = start.elapsed();

    println!(
        "LSH: build {:?}, {} queries in {:?}, {} answered, mean ratio {:.3}",
        build_time,
        NUM_QUERIES,
        query_time,
        answered,
        ratio_sum / answered.max(1) as f64
    );
}

#[test]
fn stress_test_hypercube_range_queries() {
    const N: usize = 5000;
    const DIM: usize = 16;
    const NUM_QUERIES: usize = 200;

    let collection = generate_random_collection(N, DIM, 7);
    let queries = generate_random_collection(NUM_QUERIES, DIM, 8);
    let config = HypercubeConfig::new(10).with_max_points(200).with_max_probes(20);
    let index = HypercubeIndex::build(&collection, config).unwrap();

    let start = Instant::now();
    for query in &queries {
        let results = index.range_query_default(query.coordinates(), 1.0, &HashSet::new()).unwrap();
        assert!(results.len() <= 200);
        assert!(results.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(results.iter().all(|&(_, d)| d <= 1.0));
    }
    println!("Hypercube: {} range queries in {:?}", NUM_QUERIES, start.elapsed());
}

#[test]
fn stress_test_clustering_strategies() {
    const GROUPS: usize = 10;
    const PER_GROUP: usize = 200;
    const DIM: usize = 8;

    let collection = generate_blobs(GROUPS, PER_GROUP, DIM, 42);
    let n = collection.len();

    for assignment in [AssignmentMethod::Lloyd, AssignmentMethod::Lsh, AssignmentMethod::Hypercube] {
        let config = ClusteringConfig::new(GROUPS)
            .with_assignment(assignment)
            .with_max_iterations(30)
            .with_seed(42);

        let start = Instant::now();
        let result = ClusteringEngine::new(&collection, config).unwrap().run().unwrap();
        let elapsed = start.elapsed();

        verify_partition(&result, n, GROUPS);
        let evaluation = Evaluator::new(&collection).evaluate(&result).unwrap();
        assert!(evaluation.silhouette.overall >= -1.0 && evaluation.silhouette.overall <= 1.0);

        println!(
            "{:?}: {} points, {} iterations in {:?}, silhouette {:.3}, objective {:.1}",
            assignment,
            n,
            result.iterations,
            elapsed,
            evaluation.silhouette.overall,
            evaluation.objective
        );
    }
}

#[test]
fn stress_test_lloyd_monotone_on_blobs() {
    let collection = generate_blobs(6, 150, 4, 3);
    let config = ClusteringConfig::new(6).with_epsilon(0.0).with_seed(3);
    let result = ClusteringEngine::new(&collection, config).unwrap().run().unwrap();

    for w in result.objective_history.windows(2) {
        assert!(w[1] <= w[0] * (1.0 + 1e-6));
    }
}

#[test]
fn stress_test_cross_space_search() {
    const N: usize = 2000;
    const DIM: usize = 24;
    const NUM_QUERIES: usize = 50;

    let original = generate_random_collection(N, DIM, 11);
    let queries = generate_random_collection(NUM_QUERIES, DIM, 12);

    // Keep the first quarter of the coordinates as the reduced space.
    let reduce = |c: &RecordCollection| {
        RecordCollection::from_vecs(c.iter().map(|r| r.coordinates()[..DIM / 4].to_vec()).collect()).unwrap()
    };
    let reduced = reduce(&original);
    let reduced_queries = reduce(&queries);

    let searcher = CrossSpaceSearcher::new(&original, &reduced, SearchConfig::new(4, 6)).unwrap();
    let report = searcher.run(&queries, &reduced_queries).unwrap();

    assert_eq!(report.queries.len(), NUM_QUERIES);
    for q in &report.queries {
        let exact = q.exact.unwrap();
        assert!(q.reduced.unwrap().distance >= exact.distance);
        if let Some(lsh) = q.lsh {
            assert!(lsh.distance >= exact.distance);
        }
    }
    if let Some(f) = report.mean_reduced_factor {
        assert!(f >= 1.0);
    }
    println!(
        "Search: lsh factor {:?}, reduced factor {:?}",
        report.mean_lsh_factor, report.mean_reduced_factor
    );
}

#[test]
fn stress_test_silhouette_parallel_matches_range() {
    let collection = generate_blobs(5, 100, 6, 21);
    let result = ClusteringEngine::new(&collection, ClusteringConfig::new(5).with_seed(21))
        .unwrap()
        .run()
        .unwrap();

    let start = Instant::now();
    let report = silhouette(&collection, &result.clusters).unwrap();
    println!("Silhouette over {} records in {:?}", collection.len(), start.elapsed());

    assert_eq!(report.per_record.len(), collection.len());
    assert!(report.per_record.iter().all(|&(_, s)| (-1.0..=1.0).contains(&s)));
}
