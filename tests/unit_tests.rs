//! Integration tests for the hashclust library.

use hashclust::prelude::*;
use rand::prelude::*;
use std::collections::HashSet;

/// Points spread over a few loose groups.
fn random_collection(n: usize, dim: usize, seed: u64) -> RecordCollection {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<Vec<f32>> = (0..n)
        .map(|i| {
            let offset = (i % 4) as f32 * 5.0;
            (0..dim).map(|_| offset + rng.gen::<f32>() * 3.0).collect()
        })
        .collect();
    RecordCollection::from_vecs(data).unwrap()
}

/// Two unit squares far apart: ids 0..4 and 4..8.
fn two_squares() -> RecordCollection {
    RecordCollection::from_vecs(vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![10.0, 10.0],
        vec![10.0, 11.0],
        vec![11.0, 10.0],
        vec![11.0, 11.0],
    ])
    .unwrap()
}

/// `groups` tight Gaussian blobs with random centers in `[0, 100)^dim`.
fn gaussian_blobs(groups: usize, per_group: usize, dim: usize, seed: u64) -> RecordCollection {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers: Vec<Vec<f32>> = (0..groups)
        .map(|_| (0..dim).map(|_| rng.gen::<f32>() * 100.0).collect())
        .collect();
    let normal = rand_distr::Normal::new(0.0f32, 1.0).unwrap();
    let data: Vec<Vec<f32>> = (0..groups * per_group)
        .map(|i| centers[i % groups].iter().map(|&c| c + rng.sample(normal)).collect())
        .collect();
    RecordCollection::from_vecs(data).unwrap()
}

/// Every `stride`-th record nudged by a little noise, so its nearest
/// neighbor is known to be (almost surely) that record.
fn nudged_queries(collection: &RecordCollection, stride: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = rand_distr::Normal::new(0.0f32, 0.05).unwrap();
    collection
        .iter()
        .step_by(stride)
        .map(|r| r.coordinates().iter().map(|&x| x + rng.sample(noise)).collect())
        .collect()
}

/// Fraction of queries whose approximate answer is as close as the exact one.
fn exact_match_rate<F>(collection: &RecordCollection, queries: &[Vec<f32>], mut approx: F) -> f64
where
    F: FnMut(&[f32]) -> Option<Neighbor>,
{
    let exact = BruteForceSearcher::new(collection);
    let hits = queries
        .iter()
        .filter(|q| {
            let truth = exact.nearest(q).unwrap().unwrap();
            approx(q).map_or(false, |a| (a.distance - truth.distance).abs() <= 1e-5)
        })
        .count();
    hits as f64 / queries.len() as f64
}

fn assert_partitions_collection(result: &ClusteringResult, collection: &RecordCollection, k: usize) {
    assert!(result.num_clusters() <= k);
    let mut seen = HashSet::new();
    for cluster in &result.clusters {
        for &id in &cluster.members {
            assert!(seen.insert(id), "record {id} is in two clusters");
        }
    }
    assert_eq!(seen.len(), collection.len());
    assert!(collection.ids().all(|id| seen.contains(&id)));
}

mod collection_tests {
    use super::*;

    #[test]
    fn test_parallel_collections_share_ids() {
        let mut counter = RecordIdCounter::new();
        let a = RecordCollection::from_vecs_with_counter(vec![vec![1.0, 2.0], vec![3.0, 4.0]], &mut counter).unwrap();
        counter.reset();
        let b = RecordCollection::from_vecs_with_counter(vec![vec![9.0], vec![8.0]], &mut counter).unwrap();

        assert_eq!(a.ids().collect::<Vec<_>>(), b.ids().collect::<Vec<_>>());
        assert!(a.check_correspondence(&b).is_ok());
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let err = RecordCollection::from_vecs(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DimensionMismatch);
    }
}

mod lsh_tests {
    use super::*;

    #[test]
    fn test_nearest_neighbor_never_beats_exact() {
        let collection = random_collection(300, 8, 1);
        let queries = random_collection(50, 8, 2);
        let index = AmplifiedHashIndex::build(&collection, LshConfig::new(3, 6)).unwrap();
        let exact = BruteForceSearcher::new(&collection);

        for query in &queries {
            let truth = exact.nearest(query.coordinates()).unwrap().unwrap();
            if let Some(approx) = index.nearest_neighbor(query.coordinates(), 100).unwrap() {
                assert!(approx.distance >= truth.distance);
            }
        }
    }

    #[test]
    fn test_indexed_record_finds_itself() {
        let collection = random_collection(200, 6, 3);
        let index = AmplifiedHashIndex::build(&collection, LshConfig::new(4, 5)).unwrap();

        for record in collection.iter().take(40) {
            let nn = index
                .nearest_neighbor(record.coordinates(), collection.len())
                .unwrap()
                .unwrap();
            assert_eq!(nn.distance, 0.0);
        }
    }

    #[test]
    fn test_range_query_is_exact_filtered() {
        let collection = random_collection(200, 4, 4);
        let index = AmplifiedHashIndex::build(&collection, LshConfig::new(2, 8)).unwrap();
        let query = collection.get(10).unwrap().coordinates().to_vec();

        let results = index.range_query(&query, 2.0, &HashSet::new()).unwrap();
        for &(id, d) in &results {
            let true_d = l2(&query, collection.get(id).unwrap().coordinates());
            assert!((d - true_d).abs() < 1e-6);
            assert!(d <= 2.0);
        }
        assert!(results.iter().any(|&(id, _)| id == 10));

        let exclude: HashSet<RecordId> = [10].into_iter().collect();
        let results = index.range_query(&query, 2.0, &exclude).unwrap();
        assert!(results.iter().all(|&(id, _)| id != 10));
    }

    #[test]
    fn test_exact_match_rate_grows_with_tables_and_budget() {
        let collection = gaussian_blobs(20, 50, 8, 12);
        let queries = nudged_queries(&collection, 10, 13);

        // Same seed, so the smaller indices' tables are prefixes of the larger ones.
        let rate = |tables: usize, budget: usize| {
            let index = AmplifiedHashIndex::build(&collection, LshConfig::new(4, tables).with_seed(21)).unwrap();
            exact_match_rate(&collection, &queries, |q| index.nearest_neighbor(q, budget).unwrap())
        };
        let low = rate(1, 2);
        let mid = rate(5, 50);
        let high = rate(20, collection.len());

        assert!(mid >= low, "mid {mid} < low {low}");
        assert!(high >= mid, "high {high} < mid {mid}");
        assert!(high >= 0.95, "high {high}");
    }

    #[test]
    fn test_same_seed_same_index() {
        let collection = random_collection(100, 4, 5);
        let a = AmplifiedHashIndex::build(&collection, LshConfig::new(3, 3).with_seed(9)).unwrap();
        let b = AmplifiedHashIndex::build(&collection, LshConfig::new(3, 3).with_seed(9)).unwrap();
        let query = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(a.candidates(&query).unwrap(), b.candidates(&query).unwrap());
    }
}

mod hypercube_tests {
    use super::*;

    #[test]
    fn test_indexed_record_finds_itself() {
        let collection = random_collection(200, 6, 6);
        let index = HypercubeIndex::build(&collection, HypercubeConfig::new(5)).unwrap();

        for record in collection.iter().take(40) {
            let nn = index
                .nearest_neighbor(record.coordinates(), collection.len(), 1)
                .unwrap()
                .unwrap();
            assert_eq!(nn.distance, 0.0);
        }
    }

    #[test]
    fn test_exact_match_rate_grows_with_vertex_and_point_budgets() {
        let collection = gaussian_blobs(20, 50, 8, 14);
        let queries = nudged_queries(&collection, 10, 15);
        let index = HypercubeIndex::build(&collection, HypercubeConfig::new(6)).unwrap();

        let rate = |max_points: usize, vertices: usize| {
            exact_match_rate(&collection, &queries, |q| {
                index.nearest_neighbor(q, max_points, vertices).unwrap()
            })
        };
        let low = rate(2, 1);
        let mid = rate(200, 7);
        // Every vertex and every record: exhaustive.
        let high = rate(collection.len(), 64);

        assert!(mid >= low, "mid {mid} < low {low}");
        assert!(high >= mid, "high {high} < mid {mid}");
        assert_eq!(high, 1.0);
    }

    #[test]
    fn test_budgets_bound_results() {
        let collection = random_collection(200, 6, 7);
        let index = HypercubeIndex::build(&collection, HypercubeConfig::new(4)).unwrap();
        let query = collection.get(0).unwrap().coordinates().to_vec();

        let results = index.range_query(&query, f32::MAX, 15, 16, &HashSet::new()).unwrap();
        assert_eq!(results.len(), 15);

        let all = index.range_query(&query, f32::MAX, 1000, 16, &HashSet::new()).unwrap();
        assert_eq!(all.len(), 200);
    }
}

mod clustering_tests {
    use super::*;

    #[test]
    fn test_every_record_in_exactly_one_cluster() {
        let collection = random_collection(120, 5, 8);
        for assignment in [AssignmentMethod::Lloyd, AssignmentMethod::Lsh, AssignmentMethod::Hypercube] {
            for k in [1, 3, 7] {
                let config = ClusteringConfig::new(k).with_assignment(assignment).with_seed(k as u64);
                let result = ClusteringEngine::new(&collection, config).unwrap().run().unwrap();
                assert_partitions_collection(&result, &collection, k);
            }
        }
    }

    #[test]
    fn test_two_squares_from_every_seed_pair() {
        let collection = two_squares();
        let points: Vec<Vec<f32>> = collection.iter().map(|r| r.coordinates().to_vec()).collect();

        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let config = ClusteringConfig::new(2).with_max_iterations(10);
                let result = ClusteringEngine::new(&collection, config)
                    .unwrap()
                    .with_centroids(vec![points[i].clone(), points[j].clone()])
                    .unwrap()
                    .run()
                    .unwrap();

                assert!(result.converged, "seeds {i}, {j}");
                let left = result.cluster_of(0).unwrap();
                let right = result.cluster_of(4).unwrap();
                assert_ne!(left, right);
                assert!((0..4).all(|id| result.cluster_of(id) == Some(left)));
                assert!((4..8).all(|id| result.cluster_of(id) == Some(right)));
                assert!((result.final_objective().unwrap() - 4.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_lloyd_objective_never_increases() {
        let collection = random_collection(400, 4, 9);
        for seed in 0..5 {
            let config = ClusteringConfig::new(6)
                .with_init(InitPolicy::Random)
                .with_epsilon(0.0)
                .with_seed(seed);
            let result = ClusteringEngine::new(&collection, config).unwrap().run().unwrap();

            for w in result.objective_history.windows(2) {
                assert!(w[1] <= w[0] * (1.0 + 1e-6), "{} -> {}", w[0], w[1]);
            }
        }
    }

    /// Centroids sitting off the data, none of them within `1e-6` of any record.
    fn off_data_centroids(dim: usize) -> Vec<Vec<f32>> {
        (0..4)
            .map(|g| {
                let mut c = vec![g as f32 * 5.0 + 1.5; dim];
                c[0] += 50.0;
                c
            })
            .collect()
    }

    #[test]
    fn test_empty_range_queries_fall_back() {
        let collection = random_collection(150, 6, 10);
        let centroids = off_data_centroids(6);
        let range = RangeSearchConfig {
            initial_radius: Some(1e-6),
            max_doublings: 0,
        };
        let expected: Vec<usize> = collection
            .iter()
            .map(|r| nearest_centroid(r.coordinates(), &centroids).unwrap().0)
            .collect();

        let lsh = LshAssigner::lsh(&collection, LshConfig::new(4, 2), range.clone()).unwrap();
        let cube = HypercubeAssigner::hypercube(&collection, HypercubeConfig::new(3), range.clone()).unwrap();
        let assigners: [&dyn Assigner; 2] = [&lsh, &cube];
        for assigner in assigners {
            let pass = assigner.assign(&centroids).unwrap();
            assert_eq!(pass.claimed, 0, "{}", assigner.name());
            assert_eq!(pass.fallback, collection.len(), "{}", assigner.name());
            assert_eq!(pass.labels, expected, "{}", assigner.name());
        }

        for assignment in [AssignmentMethod::Lsh, AssignmentMethod::Hypercube] {
            let config = ClusteringConfig::new(4)
                .with_assignment(assignment)
                .with_range_search(range.clone());
            let mut engine = ClusteringEngine::new(&collection, config)
                .unwrap()
                .with_centroids(centroids.clone())
                .unwrap();

            assert_eq!(engine.step().unwrap(), Phase::Update);
            let snapshot = engine.snapshot();
            assert_eq!(snapshot.num_records(), collection.len());
            for (record, &label) in collection.iter().zip(&expected) {
                assert_eq!(snapshot.cluster_of(record.id()), Some(label));
            }
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let collection = random_collection(100, 3, 11);
        let config = ClusteringConfig::new(4).with_assignment(AssignmentMethod::Hypercube).with_seed(3);
        let a = ClusteringEngine::new(&collection, config.clone()).unwrap().run().unwrap();
        let b = ClusteringEngine::new(&collection, config).unwrap().run().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_points_reseed_without_cycling() {
        let mut data = vec![vec![0.0, 0.0]; 10];
        data.push(vec![5.0, 5.0]);
        data.push(vec![6.0, 6.0]);
        let collection = RecordCollection::from_vecs(data).unwrap();

        let config = ClusteringConfig::new(3).with_max_iterations(20);
        let result = ClusteringEngine::new(&collection, config).unwrap().run().unwrap();
        assert_partitions_collection(&result, &collection, 3);
        assert!(result.iterations <= 20);
    }
}

mod evaluation_tests {
    use super::*;

    #[test]
    fn test_evaluation_is_idempotent() {
        let collection = random_collection(100, 4, 12);
        let result = ClusteringEngine::new(&collection, ClusteringConfig::new(4)).unwrap().run().unwrap();
        let evaluator = Evaluator::new(&collection);

        assert_eq!(evaluator.evaluate(&result).unwrap(), evaluator.evaluate(&result).unwrap());
    }

    #[test]
    fn test_silhouette_in_range() {
        let collection = random_collection(150, 3, 13);
        for k in [2, 5, 9] {
            let result = ClusteringEngine::new(&collection, ClusteringConfig::new(k)).unwrap().run().unwrap();
            let report = silhouette(&collection, &result.clusters).unwrap();
            assert_eq!(report.per_record.len(), 150);
            assert!(report.per_record.iter().all(|&(_, s)| (-1.0..=1.0).contains(&s)));
            assert_eq!(report.as_sequence().len(), k + 1);
        }
    }

    #[test]
    fn test_objective_matches_engine() {
        let collection = random_collection(80, 3, 14);
        let result = ClusteringEngine::new(&collection, ClusteringConfig::new(3)).unwrap().run().unwrap();
        let objective = objective_function(&collection, &result.clusters).unwrap();
        assert!((objective - result.final_objective().unwrap()).abs() < 1e-3 * objective.max(1.0));
    }

    #[test]
    fn test_cross_space_scores_in_scoring_space() {
        let mut counter = RecordIdCounter::new();
        // Clustered space: {0, 1} and {2, 3} are tight pairs.
        let clustered = RecordCollection::from_vecs_with_counter(
            vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![10.0, 0.0], vec![10.0, 1.0]],
            &mut counter,
        )
        .unwrap();
        counter.reset();
        // Scoring space: the pairs are {0, 2} and {1, 3} instead.
        let scoring = RecordCollection::from_vecs_with_counter(
            vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![0.0, 1.0], vec![10.0, 1.0]],
            &mut counter,
        )
        .unwrap();

        let result = ClusteringEngine::new(&clustered, ClusteringConfig::new(2))
            .unwrap()
            .with_centroids(vec![vec![0.0, 0.0], vec![10.0, 0.0]])
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(result.cluster_of(0), result.cluster_of(1));
        assert_ne!(result.cluster_of(0), result.cluster_of(2));

        let own = Evaluator::new(&clustered).evaluate(&result).unwrap();
        let cross = Evaluator::new(&scoring).evaluate_cross_space(&result, &clustered).unwrap();

        assert!(own.silhouette.overall > 0.0);
        assert!(cross.silhouette.overall < 0.0);
        // Centroids (5, 0) and (5, 1) in the scoring space.
        assert!((cross.objective - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_partition_scoring() {
        let collection = two_squares();
        let partition = Partition::new(vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]).unwrap();
        let evaluation = Evaluator::new(&collection).evaluate_partition(&partition).unwrap();
        assert!((evaluation.objective - 4.0).abs() < 1e-6);
        assert!(evaluation.silhouette.overall > 0.8);

        let bad = Partition::new(vec![vec![0, 42]]).unwrap();
        let err = Evaluator::new(&collection).evaluate_partition(&bad).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownIdentifier);
    }
}

mod io_tests {
    use super::*;
    use hashclust::io::{load_idx, load_partition, write_idx, write_partition};

    #[test]
    fn test_idx_and_partition_files() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("data.idx");
        let partition_path = dir.path().join("classes.txt");

        let collection = RecordCollection::from_vecs(vec![vec![0.0, 1.0], vec![2.0, 3.0], vec![250.0, 251.0]]).unwrap();
        write_idx(std::fs::File::create(&data_path).unwrap(), &collection).unwrap();
        let loaded = load_idx(&data_path, &mut RecordIdCounter::new()).unwrap();
        assert!(loaded.check_correspondence(&collection).is_ok());
        assert_eq!(loaded.get(2).unwrap().coordinates(), &[250.0, 251.0]);

        let partition = Partition::new(vec![vec![0, 1], vec![2]]).unwrap();
        write_partition(std::fs::File::create(&partition_path).unwrap(), partition.clusters()).unwrap();
        let read_back = load_partition(&partition_path, &loaded).unwrap();
        assert_eq!(read_back, partition);
    }
}

mod metric_comparison_tests {
    use super::*;
    use hashclust::io::{load_idx_with_header, load_labels, write_comparison_report, write_idx, write_labels};

    /// 8x8 image with a bright 2x2 block whose top-left pixel is `(x, y)`.
    fn block_image(x: usize, y: usize) -> Vec<f32> {
        let mut image = vec![0.0f32; 64];
        for row in y..y + 2 {
            for col in x..x + 2 {
                image[row * 8 + col] = 200.0;
            }
        }
        image
    }

    #[test]
    fn test_labelled_files_compare_both_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("data.idx");
        let labels_path = dir.path().join("labels.idx");

        // Label 0 blocks sit in the top-left quadrant, label 1 blocks in the
        // bottom-right one.
        let mut images = Vec::new();
        let mut labels = Vec::new();
        for (x, y, label) in [(0, 0, 0), (1, 0, 0), (0, 1, 0), (5, 5, 1), (6, 5, 1), (5, 6, 1)] {
            images.push(block_image(x, y));
            labels.push(label);
        }
        let collection = RecordCollection::from_vecs(images).unwrap();
        write_idx(std::fs::File::create(&data_path).unwrap(), &collection).unwrap();
        write_labels(std::fs::File::create(&labels_path).unwrap(), &labels).unwrap();

        // `write_idx` stores one row per record; the comparison only needs
        // the dimensionality to match the configured grid.
        let (header, loaded) = load_idx_with_header(&data_path, &mut RecordIdCounter::new()).unwrap();
        assert_eq!(header.dimensionality(), 64);
        let loaded_labels = load_labels(&labels_path).unwrap();
        assert_eq!(loaded_labels, labels);

        let config = EmdSearchConfig::new()
            .with_image_size(8, 8)
            .with_window_size(2, 2)
            .with_neighbors(3);
        let comparison = MetricComparison::new(&loaded, &loaded_labels, config).unwrap();

        let queries = RecordCollection::from_vecs(vec![block_image(1, 1), block_image(6, 6)]).unwrap();
        let report = comparison.run(&queries, &[0, 1]).unwrap();

        assert_eq!(report.mean_emd_correct, Some(1.0));
        for q in &report.queries {
            assert_eq!(q.emd_neighbors.len(), 3);
            assert!((0.0..=1.0).contains(&q.manhattan_correct));
        }

        let mut out = Vec::new();
        write_comparison_report(&mut out, &report).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Average Correct Search Results EMD: 1\n"));
        assert!(text.contains("Average Correct Search Results Manhattan: "));
    }
}

mod config_tests {
    use super::*;
    use hashclust::config::ClusterFileConfig;

    #[test]
    fn test_cluster_file_config() {
        let text = "number_of_clusters = 10\nnumber_of_vector_hash_tables = 3\nmax_number_M_hypercube = 12\n";
        let config = ClusterFileConfig::from_toml_str(text).unwrap().into_clustering_config();
        assert_eq!(config.num_clusters, 10);
        assert_eq!(config.lsh.num_tables, 3);
        assert_eq!(config.lsh.hashes_per_table, LshConfig::default().hashes_per_table);
        assert_eq!(config.hypercube.max_points, 12);
    }

    #[test]
    fn test_invalid_cluster_count() {
        let collection = two_squares();
        for k in [0, 9] {
            let err = ClusteringEngine::new(&collection, ClusteringConfig::new(k)).err().unwrap();
            assert_eq!(err.code(), ErrorCode::Configuration);
        }
    }
}
