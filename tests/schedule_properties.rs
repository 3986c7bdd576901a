use builder_schedule::{
    Activity, ActivityTable, ForwardPass, OptimizerConfig, Optimizer, PassOrder, Schedule,
};
use chrono::NaiveDate;
use proptest::prelude::*;
use proptest::sample::Index;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

/// Row names, including the activities the optimizer pairs up.
const NAMES: [&str; 8] = [
    "Excavation",
    "Structure",
    "Walls",
    "Roofing",
    "Utilities",
    "Finishing",
    "Muros",
    "Instalaciones",
];

/// Acyclic tables: every predecessor refers to an earlier row.
fn table_strategy() -> impl Strategy<Value = ActivityTable> {
    prop::collection::vec(
        (1i64..30, prop::collection::vec(any::<Index>(), 0..3)),
        1..8,
    )
    .prop_map(|rows| {
        rows.iter()
            .enumerate()
            .map(|(row, (duration, preds))| {
                let names: Vec<String> = if row == 0 {
                    Vec::new()
                } else {
                    preds.iter().map(|ix| NAMES[ix.index(row)].to_string()).collect()
                };
                Activity::new(NAMES[row], *duration).with_predecessors(names)
            })
            .collect()
    })
}

fn schedule(table: &ActivityTable) -> Schedule {
    ForwardPass::new(table, PassOrder::Topological)
        .execute(start())
        .unwrap()
}

proptest! {
    #[test]
    fn forward_pass_is_idempotent(table in table_strategy()) {
        prop_assert_eq!(schedule(&table), schedule(&table));
    }

    #[test]
    fn start_is_latest_predecessor_end(table in table_strategy()) {
        let schedule = schedule(&table);
        for scheduled in schedule.activities() {
            let expected = scheduled
                .activity
                .named_predecessors()
                .filter_map(|p| schedule.find(p))
                .map(|p| p.end_date)
                .max()
                .unwrap_or(start());
            prop_assert_eq!(scheduled.start_date, expected);
            prop_assert_eq!(
                (scheduled.end_date - scheduled.start_date).num_days(),
                scheduled.duration_days()
            );
        }
    }

    #[test]
    fn longer_activity_never_moves_finish_earlier(
        table in table_strategy(),
        pick in any::<Index>(),
        extra in 1i64..20,
    ) {
        let before = schedule(&table).project_end_date();

        let mut longer = table.clone();
        let row = pick.index(longer.len());
        longer.activities_mut()[row].duration_days += extra;
        let after = schedule(&longer).project_end_date();

        prop_assert!(after >= before);
    }

    #[test]
    fn optimizer_never_lengthens_the_project(table in table_strategy()) {
        let original = schedule(&table);
        let config = OptimizerConfig::default();
        let outcome = Optimizer::new(&config, PassOrder::Topological)
            .optimize(&original)
            .unwrap();
        prop_assert!(outcome.report.optimized_duration <= outcome.report.original_duration);
        prop_assert!(outcome.report.days_saved >= 0);
    }

    #[test]
    fn table_order_matches_topological_when_rows_are_sorted(table in table_strategy()) {
        let legacy = ForwardPass::new(&table, PassOrder::TableOrder)
            .execute(start())
            .unwrap();
        prop_assert_eq!(legacy, schedule(&table));
    }
}
