use interactome::{
    Agreement, ConsistencyAnalyzer, ConsistencyReport, GraphStore, IdentityMapper, Ingestor,
    InteractionRecord, PipelineConfig, SourceAdapter, Split, StaticAdapter,
};

fn directed(a: &str, b: &str, source: &str) -> InteractionRecord {
    InteractionRecord::new(a, b, source).directed(true)
}

/// Three resources over three edges:
///
/// - `A-B`: s1 and s3 say A→B, s2 says B→A
/// - `C-D`: s1 and s2 both say C→D stimulates
/// - `E-F`: s1 says E→F stimulates, s2 and s3 say it inhibits
fn network() -> GraphStore {
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(StaticAdapter::new(
            "s1",
            vec![
                directed("A", "B", "s1"),
                directed("C", "D", "s1").stimulation(true),
                directed("E", "F", "s1").stimulation(true),
            ],
        )),
        Box::new(StaticAdapter::new(
            "s2",
            vec![
                directed("B", "A", "s2"),
                directed("C", "D", "s2").stimulation(true),
                directed("E", "F", "s2").inhibition(true),
            ],
        )),
        Box::new(StaticAdapter::new(
            "s3",
            vec![
                directed("A", "B", "s3"),
                directed("E", "F", "s3").inhibition(true),
                InteractionRecord::new("G", "H", "s3"),
            ],
        )),
    ];
    let ingestor = Ingestor::new(PipelineConfig::default(), IdentityMapper).unwrap();
    let mut graph = ingestor.new_graph();
    let report = ingestor.run(&mut graph, adapters);
    assert_eq!(report.records_ingested(), 9);
    graph
}

#[test]
fn pairwise_statistics_over_ingested_network() {
    let graph = network();
    let report = ConsistencyAnalyzer::new().analyze(&graph);

    assert_eq!(report.edges_analyzed, 3, "G-H is undirected");
    assert_eq!(report.sources().collect::<Vec<_>>(), vec!["s1", "s2", "s3"]);

    let s1s2 = report.pair("s1", "s2").unwrap();
    assert_eq!(s1s2.direction_consistency, Agreement { total: 2, edges: 2 });
    assert_eq!(s1s2.direction_inconsistency.total, Split { all: 1, major: 1, minor: 0 });
    assert_eq!(s1s2.sign_consistency, Agreement { total: 1, edges: 1 });
    assert_eq!(s1s2.sign_inconsistency.total, Split { all: 1, major: 0, minor: 1 });

    let s2s1 = report.pair("s2", "s1").unwrap();
    assert_eq!(s2s1.direction_inconsistency.total, Split { all: 1, major: 0, minor: 1 });
    assert_eq!(s2s1.sign_inconsistency.total, Split { all: 1, major: 1, minor: 0 });

    let s1s3 = report.pair("s1", "s3").unwrap();
    assert_eq!(s1s3.direction_consistency, Agreement { total: 2, edges: 2 });
    assert_eq!(s1s3.sign_inconsistency.edges, Split { all: 1, major: 0, minor: 1 });
}

#[test]
fn source_scores_favour_the_majority() {
    let scores = ConsistencyAnalyzer::new().analyze(&network()).source_scores();

    // s1: 5 agreements, 1 majority disagreement, 2 minority disagreements.
    let s1 = &scores["s1"];
    assert_eq!((s1.consistent, s1.major, s1.minor), (5, 1, 2));
    assert!((s1.score - 0.75).abs() < 1e-9);

    assert!(scores["s3"].score > scores["s2"].score);
}

#[test]
fn analysis_does_not_touch_the_graph() {
    let graph = network();
    let before = graph.digest().unwrap();
    let report = ConsistencyAnalyzer::new().analyze(&graph);
    assert_eq!(graph.digest().unwrap(), before);

    let ledgers = ConsistencyAnalyzer::new().analyze_ledgers(graph.edges().map(|(_, e)| &e.ledger));
    assert_eq!(ledgers, report);
}

#[test]
fn report_survives_json() {
    let report = ConsistencyAnalyzer::new().analyze(&network());
    let json = serde_json::to_string_pretty(&report).unwrap();
    let back: ConsistencyReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn merged_duplicates_are_analyzed_as_one_edge() {
    let mut graph = network();
    let before = ConsistencyAnalyzer::new().analyze(&graph);
    assert!(before.pair("s2", "s3").is_some());

    // B and D are the same entity; the A-B claims move onto A-D.
    let b = graph.resolve_identifier("B").unwrap();
    let d = graph.resolve_identifier("D").unwrap();
    graph.merge_nodes(&[b, d], Some(d)).unwrap();

    let after = ConsistencyAnalyzer::new().analyze(&graph);
    assert_eq!(after.edges_analyzed, 3);
    let s1s2 = after.pair("s1", "s2").unwrap();
    assert_eq!(s1s2.direction_inconsistency.total.major, 1);
}
