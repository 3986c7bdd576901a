use builder_schedule::{Activity, ActivityTable, ForwardPass, PassOrder, ScheduleError};
use chrono::NaiveDate;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn scenario_a() -> ActivityTable {
    ActivityTable::from_activities(vec![
        Activity::new("Excavation", 5),
        Activity::new("Foundation", 10).with_predecessor_list("Excavation"),
        Activity::new("Structure", 15).with_predecessor_list("Foundation"),
    ])
}

#[test]
fn chained_activities_start_when_predecessor_ends() {
    let table = scenario_a();
    for order in [PassOrder::Topological, PassOrder::TableOrder] {
        let schedule = ForwardPass::new(&table, order).execute(d(2025, 1, 15)).unwrap();

        let dates: Vec<(NaiveDate, NaiveDate)> = schedule
            .activities()
            .iter()
            .map(|a| (a.start_date, a.end_date))
            .collect();
        assert_eq!(
            dates,
            vec![
                (d(2025, 1, 15), d(2025, 1, 20)),
                (d(2025, 1, 20), d(2025, 1, 30)),
                (d(2025, 1, 30), d(2025, 2, 14)),
            ],
            "order {order:?}"
        );
        assert_eq!(schedule.total_duration_days(), 30);
        assert_eq!(schedule.project_end_date(), d(2025, 2, 14));
    }
}

#[test]
fn start_is_latest_predecessor_finish() {
    // A(2) -> {B(3), C(1)} -> D(2)
    let table = ActivityTable::from_activities(vec![
        Activity::new("A", 2),
        Activity::new("B", 3).with_predecessors(["A"]),
        Activity::new("C", 1).with_predecessors(["A"]),
        Activity::new("D", 2).with_predecessors(["B", "C"]),
    ]);
    let schedule = ForwardPass::new(&table, PassOrder::Topological)
        .execute(d(2025, 1, 6))
        .unwrap();

    let dd = schedule.find("D").unwrap();
    assert_eq!(dd.start_date, d(2025, 1, 11));
    assert_eq!(dd.end_date, d(2025, 1, 13));
    assert_eq!(schedule.find("C").unwrap().end_date, d(2025, 1, 9));
}

#[test]
fn unknown_and_blank_predecessors_anchor_to_project_start() {
    let table = ActivityTable::from_activities(vec![
        Activity::new("Survey", 3).with_predecessors(["Permits", " "]),
        Activity::new("Fencing", 2).with_predecessor_list("nan"),
    ]);
    let schedule = ForwardPass::new(&table, PassOrder::Topological)
        .execute(d(2025, 3, 1))
        .unwrap();
    for activity in schedule.activities() {
        assert_eq!(activity.start_date, d(2025, 3, 1));
    }
}

#[test]
fn table_order_misses_predecessors_listed_later() {
    let table = ActivityTable::from_activities(vec![
        Activity::new("Foundation", 10).with_predecessors(["Excavation"]),
        Activity::new("Excavation", 5),
    ]);

    let legacy = ForwardPass::new(&table, PassOrder::TableOrder)
        .execute(d(2025, 1, 15))
        .unwrap();
    assert_eq!(legacy.find("Foundation").unwrap().start_date, d(2025, 1, 15));
    assert_eq!(legacy.total_duration_days(), 10);

    let sorted = ForwardPass::new(&table, PassOrder::Topological)
        .execute(d(2025, 1, 15))
        .unwrap();
    assert_eq!(sorted.find("Foundation").unwrap().start_date, d(2025, 1, 20));
    assert_eq!(sorted.total_duration_days(), 15);
    // rows keep table order
    assert_eq!(sorted.activities()[0].name(), "Foundation");
}

#[test]
fn cycles_are_reported_with_their_members() {
    let table = ActivityTable::from_activities(vec![
        Activity::new("Walls", 8).with_predecessors(["Roofing"]),
        Activity::new("Roofing", 6).with_predecessors(["Walls"]),
        Activity::new("Finishing", 10).with_predecessors(["Roofing"]),
    ]);
    let err = ForwardPass::new(&table, PassOrder::Topological)
        .execute(d(2025, 1, 15))
        .unwrap_err();
    match err {
        ScheduleError::CycleDetected(members) => {
            assert!(members.contains(&"Walls".to_string()));
            assert!(members.contains(&"Roofing".to_string()));
            assert!(!members.contains(&"Finishing".to_string()));
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn duplicate_names_are_rejected_before_scheduling() {
    let table = ActivityTable::from_activities(vec![
        Activity::new("Walls", 8),
        Activity::new("Walls", 4),
    ]);
    assert!(matches!(
        ForwardPass::new(&table, PassOrder::Topological).execute(d(2025, 1, 15)),
        Err(ScheduleError::DuplicateActivity(_))
    ));
}

#[test]
fn dataframe_exposes_dates() {
    let table = scenario_a();
    let schedule = ForwardPass::new(&table, PassOrder::Topological)
        .execute(d(2025, 1, 15))
        .unwrap();
    let df = schedule.to_dataframe().unwrap();
    assert_eq!(df.height(), 3);

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let to_days = |dt: NaiveDate| (dt - epoch).num_days() as i32;
    let ends = df.column("end_date").unwrap().date().unwrap();
    assert_eq!(ends.get(2), Some(to_days(d(2025, 2, 14))));
}

#[test]
fn duration_past_the_calendar_is_an_error() {
    let table = ActivityTable::from_activities(vec![
        Activity::new("Excavation", 5),
        Activity::new("Foundation", 999_999_999).with_predecessors(["Excavation"]),
    ]);
    for order in [PassOrder::Topological, PassOrder::TableOrder] {
        let err = ForwardPass::new(&table, order)
            .execute(d(2025, 1, 15))
            .unwrap_err();
        assert!(
            matches!(&err, ScheduleError::InvalidDuration { name, .. } if name == "Foundation"),
            "order {order:?}: {err:?}"
        );
    }

    let saturated = ActivityTable::from_activities(vec![Activity::new("Walls", i64::MAX)]);
    assert!(matches!(
        ForwardPass::new(&saturated, PassOrder::TableOrder).execute(d(2025, 1, 15)),
        Err(ScheduleError::InvalidDuration { .. })
    ));
}
