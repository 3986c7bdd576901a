use builder_schedule::ingest::default_project;
use builder_schedule::query::HELP_MESSAGE;
use builder_schedule::{
    Activity, ActivityTable, ForwardPass, OptimizerConfig, PassOrder, QueryResponder, Schedule,
};
use chrono::NaiveDate;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn scenario_a() -> Schedule {
    let table = ActivityTable::from_activities(vec![
        Activity::new("Excavation", 5),
        Activity::new("Foundation", 10).with_predecessor_list("Excavation"),
        Activity::new("Structure", 15).with_predecessor_list("Foundation"),
    ]);
    ForwardPass::new(&table, PassOrder::Topological)
        .execute(d(2025, 1, 15))
        .unwrap()
}

#[test]
fn duration_question_reports_total_and_boundaries() {
    let config = OptimizerConfig::default();
    let responder = QueryResponder::new(&config);
    let answer = responder.answer("¿Cuánto dura el proyecto? Quiero saber la duración", &scenario_a());

    assert!(answer.contains("30"), "{answer}");
    assert!(answer.contains("15/01/2025"), "{answer}");
    assert!(answer.contains("14/02/2025"), "{answer}");
}

#[test]
fn listing_question_names_every_activity() {
    let config = OptimizerConfig::default();
    let answer = QueryResponder::new(&config).answer("What activities are there?", &scenario_a());
    for line in ["Excavation: 5 days", "Foundation: 10 days", "Structure: 15 days"] {
        assert!(answer.contains(line), "missing {line} in {answer}");
    }
}

#[test]
fn parallel_question_lists_configured_pairs() {
    let config = OptimizerConfig::default();
    let schedule = ForwardPass::new(&default_project(), PassOrder::Topological)
        .execute(d(2025, 1, 15))
        .unwrap();
    let answer = QueryResponder::new(&config).answer("Which work can run in parallel?", &schedule);
    assert!(answer.contains("Walls and Utilities"), "{answer}");
    assert!(answer.contains("Utilities and Finishing"), "{answer}");

    let sequential = QueryResponder::new(&config).answer("Anything in parallel?", &scenario_a());
    assert!(sequential.contains("depends on the one before"), "{sequential}");
}

#[test]
fn unmatched_question_gets_help() {
    let config = OptimizerConfig::default();
    let answer = QueryResponder::new(&config).answer("hola", &scenario_a());
    assert_eq!(answer, HELP_MESSAGE);
}
