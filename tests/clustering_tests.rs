use phrase_clustering::{
    Cluster, ClusterError, ClusteringEngine, ModelConfig, SuggestionFactory, WordClusterFactory,
    WordVector, WordVectorModel,
};

fn build_test_model() -> WordVectorModel {
    let vocab = "\
apple 1.0,0.1,0.0,0.0
pie 0.9,0.2,0.0,0.1
tart 0.95,0.15,0.05,0.0
banana 0.0,1.0,0.1,0.0
split 0.1,1.0,0.0,0.1
car 0.0,0.0,1.0,0.1
automobile 0.0,0.05,0.98,0.12
ocean 0.0,0.0,0.1,1.0
";
    WordVectorModel::from_reader(vocab.as_bytes(), ModelConfig::default())
        .unwrap()
}

fn vector(word: &str, values: &[f64]) -> WordVector {
    WordVector::new(word, values.to_vec()).unwrap()
}

#[test]
fn test_add_on_empty_engine_creates_one_cluster() {
    let model = build_test_model();
    let mut engine = ClusteringEngine::new(&model, SuggestionFactory);

    let cluster = engine.add("banana split").unwrap();
    assert!(cluster.is_some(), "Known words should found a cluster");
    assert_eq!(engine.size(), 1);
    assert_eq!(engine.as_list().len(), 1);
}

#[test]
fn test_order_sensitivity() {
    let model = build_test_model();
    let phrases = ["apple pie", "apple tart", "banana split"];
    let engine = ClusteringEngine::suggestions(&model, phrases).unwrap();

    assert_eq!(engine.size(), 2);
    let list = engine.as_list();
    assert_eq!(list[0].response(), "apple pie", "Founder is the label");
    assert_eq!(list[0].score(), 0);
    assert_eq!(list[1].response(), "banana split");
    assert_eq!(list[1].score(), 1);
}

#[test]
fn test_founder_depends_on_insertion_order() {
    let model = build_test_model();
    let phrases = ["apple tart", "apple pie", "banana split"];
    let engine = ClusteringEngine::suggestions(&model, phrases).unwrap();
    assert_eq!(engine.size(), 2);
    assert_eq!(engine.as_list()[0].response(), "apple tart");
}

#[test]
fn test_merge_returns_updated_cluster() {
    let model = build_test_model();
    let mut engine = ClusteringEngine::new(&model, SuggestionFactory);
    engine.add("car").unwrap();

    let merged = engine.add("automobile").unwrap().unwrap();
    assert_eq!(merged.response(), "car");
    assert_eq!(merged.vectors().len(), 2);
    assert_eq!(engine.size(), 1);
}

#[test]
fn test_all_stopword_phrase_returns_none() {
    let model = build_test_model();
    let phrases = ["apple pie", "ocean"];
    let mut engine = ClusteringEngine::suggestions(&model, phrases).unwrap();
    let before = engine.size();

    assert!(engine.add("the a of").unwrap().is_none());
    let unknown = engine.add("zyzzyva quux").unwrap();
    assert!(unknown.is_none(), "Unknown words behave like stopwords");
    assert_eq!(engine.size(), before);
    assert_eq!(engine.as_list().len(), before);
}

#[test]
fn test_stopword_phrase_on_empty_engine() {
    let model = build_test_model();
    let mut engine = ClusteringEngine::new(&model, SuggestionFactory);
    assert!(engine.add("the").unwrap().is_none());
    assert_eq!(engine.size(), 0);
    assert!(engine.is_empty());
}

#[test]
fn test_cluster_of_is_read_only() {
    let model = build_test_model();
    let phrases = ["apple pie", "banana split", "car"];
    let engine = ClusteringEngine::suggestions(&model, phrases).unwrap();
    let snapshot = engine.responses();
    let vector_counts: Vec<usize> = engine.as_list().iter().map(|c| c.len()).collect();

    for _ in 0..3 {
        let hit = engine.cluster_of("automobile").unwrap().unwrap();
        assert_eq!(hit.response(), "car");
        assert!(engine.cluster_of("ocean").unwrap().is_none());
        assert!(engine.cluster_of("of the").unwrap().is_none());
    }

    assert_eq!(engine.size(), 3);
    assert_eq!(engine.responses(), snapshot);
    let after: Vec<usize> = engine.as_list().iter().map(|c| c.len()).collect();
    assert_eq!(after, vector_counts);
}

#[test]
fn test_cluster_of_on_empty_engine() {
    let model = build_test_model();
    let engine = ClusteringEngine::new(&model, SuggestionFactory);
    assert!(engine.cluster_of("apple pie").unwrap().is_none());
}

#[test]
fn test_existing_clusters_are_not_reclustered() {
    let model = build_test_model();
    let rows = vec![
        ("apple pie".to_string(), 40),
        ("apple tart".to_string(), 30),
        ("apple".to_string(), 20),
        ("the".to_string(), 10),
    ];
    let engine = ClusteringEngine::existing_suggestions(&model, rows.clone());

    assert_eq!(engine.size(), rows.len());
    assert_eq!(engine.as_list().len(), rows.len());
    let restored: Vec<(String, usize)> = engine
        .responses()
        .into_iter()
        .map(|(response, score)| (response.to_string(), score))
        .collect();
    assert_eq!(restored, rows);
}

#[test]
fn test_existing_clusters_still_score_guesses() {
    let model = build_test_model();
    let rows = [("car", 12), ("banana split", 7)];
    let engine = ClusteringEngine::existing_suggestions(&model, rows);
    let hit = engine.cluster_of("automobile").unwrap().unwrap();
    assert_eq!(hit.score(), 12);
}

#[test]
fn test_word_cluster_variant_through_same_engine() {
    let model = build_test_model();
    let engine = ClusteringEngine::from_phrases(
        &model,
        WordClusterFactory,
        ["car", "automobile", "apple pie", "pie"],
    )
    .unwrap();

    // Exact-token matching ignores that car and automobile are close in vector space.
    assert_eq!(engine.size(), 3);
    let apple = &engine.as_list()[2];
    assert_eq!(apple.phrase(), "apple pie");
    assert_eq!(apple.rank(), 2);
    assert!(apple.contains("pie"));
    assert!(!apple.contains("car"));
}

#[test]
fn test_pretokenized_entry_points() {
    let model = build_test_model();
    let mut engine = ClusteringEngine::new(&model, SuggestionFactory);
    let vectors = vec![vector("custom", &[1.0, 0.0, 0.0, 0.0])];

    let created = engine.add_vectors(vectors.clone(), "custom").unwrap();
    assert_eq!(created.unwrap().response(), "custom");
    let hit = engine.cluster_of_vectors(&vectors).unwrap();
    assert!(hit.is_some());
    assert!(engine.cluster_of("apple").unwrap().is_some());
}

#[test]
fn test_mixed_dimension_phrase_founds_nothing() {
    let model = build_test_model();
    let mut engine = ClusteringEngine::new(&model, SuggestionFactory);
    let mixed = vec![
        vector("short", &[1.0, 0.0]),
        vector("long", &[1.0, 0.0, 0.0, 0.0]),
    ];

    let err = engine.add_vectors(mixed, "short long").unwrap_err();
    assert!(matches!(err, ClusterError::DimensionMismatch { .. }));
    assert!(engine.is_empty());

    // The next well-formed phrase still founds rank 0.
    let created = engine.add("apple").unwrap().unwrap();
    assert_eq!(created.score(), 0);
}
