// Integration tests for Metallo
use metallo_core::retrieval::{nearest_neighbors, top_by_topic};
use metallo_core::{
    divergences, export, Corpus, ExportOptions, MetalloConfig, Metric, Record, Vector,
};
use metallo_storage::{ShardDirectory, StorageManager};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use std::path::Path;

fn random_corpus(n: usize, dim: usize, seed: u64) -> Corpus {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..n)
        .map(|i| {
            let raw: Vec<f64> = (0..dim).map(|_| rng.random_range(0.01..1.0)).collect();
            let total: f64 = raw.iter().sum();
            let weights = raw.into_iter().map(|w| w / total).collect();
            Record::new(format!("urn:doc:{}", i), format!("passage {}", i), Vector::new(weights))
        })
        .collect();
    Corpus::from_records(records).unwrap()
}

fn options(threshold: f64, capacity: usize, workers: usize) -> ExportOptions {
    ExportOptions {
        metric: Metric::Jsd,
        threshold,
        shard_capacity: NonZeroUsize::new(capacity).unwrap(),
        workers,
    }
}

/// Every file of `dir`, by name
fn read_dir(dir: &Path) -> BTreeMap<String, String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            (name, std::fs::read_to_string(&path).unwrap())
        })
        .collect()
}

/// (source, target) pairs of every shard file, 1-based as written
fn shard_pairs(files: &BTreeMap<String, String>) -> Vec<(usize, usize)> {
    files
        .iter()
        .filter(|(name, _)| name.starts_with("fromRow"))
        .flat_map(|(_, content)| {
            content.lines().skip(1).map(|line| {
                let mut fields = line.split(',');
                let source = fields.next().unwrap().parse().unwrap();
                let target = fields.next().unwrap().parse().unwrap();
                (source, target)
            })
        })
        .collect()
}

#[test]
fn test_export_covers_every_pair_once() {
    let corpus = random_corpus(40, 8, 7);
    let dir = tempfile::tempdir().unwrap();
    let output = ShardDirectory::new(dir.path()).unwrap();

    let summary = export(&corpus, &output, &options(f64::INFINITY, 50, 3)).unwrap();
    assert!(summary.is_complete());
    assert_eq!(summary.rows, 40);
    assert_eq!(summary.total_edges(), 40 * 39 / 2);

    let files = read_dir(dir.path());
    assert_eq!(files.len(), summary.total_shards() + 1);

    let pairs = shard_pairs(&files);
    assert_eq!(pairs.len(), 40 * 39 / 2);
    let unique: HashSet<_> = pairs.iter().copied().collect();
    assert_eq!(unique.len(), pairs.len());
    assert!(pairs.iter().all(|&(s, t)| 1 <= s && s < t && t <= 40));

    let id_map = &files["mapID.csv"];
    assert_eq!(id_map.lines().count(), 41);
    assert_eq!(id_map.lines().nth(1), Some("1,urn:doc:0"));
}

#[test]
fn test_export_is_deterministic() {
    let corpus = random_corpus(25, 5, 11);
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    for dir in [&first, &second] {
        let output = ShardDirectory::new(dir.path()).unwrap();
        let summary = export(&corpus, &output, &options(0.2, 17, 4)).unwrap();
        assert!(summary.is_complete());
    }

    assert_eq!(read_dir(first.path()), read_dir(second.path()));
}

#[test]
fn test_export_matches_divergence_list() {
    let corpus = random_corpus(30, 6, 3);
    let dir = tempfile::tempdir().unwrap();
    let output = ShardDirectory::new(dir.path()).unwrap();
    let summary = export(&corpus, &output, &options(0.1, 10, 2)).unwrap();

    let listed: HashSet<(String, String)> = divergences(&corpus, &Metric::Jsd, 0.1)
        .into_iter()
        .map(|edge| (edge.source, edge.target))
        .collect();
    let exported: HashSet<(String, String)> = shard_pairs(&read_dir(dir.path()))
        .into_iter()
        .map(|(s, t)| {
            (
                corpus.row(s - 1).unwrap().id.clone(),
                corpus.row(t - 1).unwrap().id.clone(),
            )
        })
        .collect();

    assert_eq!(summary.total_edges(), listed.len());
    assert_eq!(listed, exported);
}

#[test]
fn test_worker_count_does_not_change_edges() {
    let corpus = random_corpus(20, 4, 5);
    let mut seen = Vec::new();
    for workers in [1, 2, 7, 32] {
        let dir = tempfile::tempdir().unwrap();
        let output = ShardDirectory::new(dir.path()).unwrap();
        export(&corpus, &output, &options(0.15, 8, workers)).unwrap();
        let mut pairs = shard_pairs(&read_dir(dir.path()));
        pairs.sort_unstable();
        seen.push(pairs);
    }
    assert!(seen.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_nearest_neighbors_against_brute_force() {
    let corpus = random_corpus(60, 10, 42);
    let query = corpus.row(17).unwrap().clone();

    let hood = nearest_neighbors(&corpus, &query.id, 5, &Metric::Manhattan).unwrap();
    assert_eq!(hood.neighbors.len(), 6);
    assert_eq!(hood.neighbors[0].record.id, query.id);
    assert_eq!(hood.neighbors[0].score, 0.0);

    let mut brute: Vec<(f64, String)> = corpus
        .iter()
        .map(|r| (Metric::Manhattan.distance(query.vector.as_slice(), r.vector.as_slice()), r.id.clone()))
        .collect();
    brute.sort_by(|a, b| a.0.total_cmp(&b.0));
    let expected: Vec<String> = brute.into_iter().take(6).map(|(_, id)| id).collect();
    let actual: Vec<String> = hood.neighbors.iter().map(|s| s.record.id.clone()).collect();
    assert_eq!(actual, expected);
}

const SOURCE: &str = "\
,id,text,war,peace,travel
1,urn:a,alpha,0.5,0.3,0.2
2,urn:b,beta,0.4,0.4,0.2
3,urn:c,gamma,0.1,0.1,0.8
4,urn:d,delta,0.7,0.1,0.2
5,urn:e,epsilon,0.2,0.7,0.1
";

fn config(dir: &Path, db: bool) -> MetalloConfig {
    let source = dir.join("theta.csv");
    std::fs::write(&source, SOURCE).unwrap();
    MetalloConfig {
        csv_source: source.to_string_lossy().into_owned(),
        db,
        data_dir: dir.join("data"),
        output_dir: dir.join("processed"),
        ..MetalloConfig::default()
    }
}

#[tokio::test]
async fn test_lmdb_and_memory_backings_agree() {
    let dir = tempfile::tempdir().unwrap();
    let memory = StorageManager::open(&config(dir.path(), false), false)
        .await
        .unwrap();
    let lmdb = StorageManager::open(&config(dir.path(), true), true)
        .await
        .unwrap();

    for manager in [&memory, &lmdb] {
        let store = manager.store();
        let hood = nearest_neighbors(store.as_ref(), "urn:a", 2, &Metric::Manhattan).unwrap();
        let ids: Vec<&str> = hood.neighbors.iter().map(|s| s.record.id.as_str()).collect();
        assert_eq!(ids, vec!["urn:a", "urn:b", "urn:d"]);

        let top = top_by_topic(store.as_ref(), 3, 1).unwrap();
        assert_eq!(top[0].record.id, "urn:c");
        assert_eq!(manager.topics()[2], "travel");
    }
}

#[tokio::test]
async fn test_export_through_storage_manager() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), true);
    let manager = StorageManager::open(&config, true).await.unwrap();

    let corpus = manager.corpus().unwrap();
    let output = manager.shard_directory(&config).unwrap();
    let options = ExportOptions {
        workers: 2,
        ..ExportOptions::from_config(&config, corpus.len())
    };
    let summary = export(&corpus, &output, &options).unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.total_edges(), 10);
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["rows"], 5);
    assert!(config.output_dir.join("mapID.csv").exists());
}
