use builder_schedule::graph::ActivityDag;
use builder_schedule::{Activity, ActivityTable, ScheduleError};

#[test]
fn dag_builds_edges_from_known_predecessors() {
    // Excavation -> {Foundation, Fencing}; Permits is unknown
    let table = ActivityTable::from_activities(vec![
        Activity::new("Excavation", 5),
        Activity::new("Foundation", 10).with_predecessors(["Excavation"]),
        Activity::new("Fencing", 2).with_predecessors(["Excavation", "Permits"]),
    ]);
    let dag = ActivityDag::build(&table);

    assert_eq!(dag.graph.node_count(), 3);
    assert_eq!(dag.graph.edge_count(), 2);
    assert!(dag.name_to_index.contains_key("Fencing"));
    assert!(!dag.name_to_index.contains_key("Permits"));
}

#[test]
fn repeated_predecessor_adds_a_single_edge() {
    let table = ActivityTable::from_activities(vec![
        Activity::new("Walls", 8),
        Activity::new("Roofing", 6).with_predecessors(["Walls", "Walls"]),
    ]);
    let dag = ActivityDag::build(&table);
    assert_eq!(dag.graph.edge_count(), 1);
}

#[test]
fn resolution_order_puts_predecessors_first() {
    let table = ActivityTable::from_activities(vec![
        Activity::new("Finishing", 10).with_predecessors(["Roofing"]),
        Activity::new("Roofing", 6).with_predecessors(["Walls"]),
        Activity::new("Walls", 8),
    ]);
    let order = ActivityDag::build(&table).resolution_order(&table).unwrap();
    assert_eq!(order, vec![2, 1, 0]);
}

#[test]
fn resolution_order_fails_on_cycles() {
    let table = ActivityTable::from_activities(vec![
        Activity::new("A", 1).with_predecessors(["C"]),
        Activity::new("B", 1).with_predecessors(["A"]),
        Activity::new("C", 1).with_predecessors(["B"]),
    ]);
    let err = ActivityDag::build(&table)
        .resolution_order(&table)
        .unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::CycleDetected(ref members) if members == &["A", "B", "C"]
    ));
}

#[test]
fn depends_on_follows_chains() {
    let table = ActivityTable::from_activities(vec![
        Activity::new("Utilities", 12),
        Activity::new("Roofing", 6).with_predecessors(["Utilities"]),
        Activity::new("Walls", 8).with_predecessors(["Roofing"]),
    ]);
    let dag = ActivityDag::build(&table);

    assert!(dag.depends_on("Walls", "Utilities"));
    assert!(dag.depends_on("Roofing", "Utilities"));
    assert!(!dag.depends_on("Utilities", "Walls"));
    assert!(!dag.depends_on("Walls", "Walls"));
    assert!(!dag.depends_on("Walls", "Permits"));
}
