//! Time scale construction, queries and edits

use chrono::{NaiveDate, TimeDelta};
use proptest::prelude::*;
use roadmap::timescale::calendar::infer_prime_year;
use roadmap::{
    DisplayEntry, PrimeDateMap, ScaleDescriptor, ScaleError, TimeScales, Timestamp, parse_time,
};
use serde_json::json;

fn at(y: i32, m: u32, d: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Twelve months of 2024, quarters as groups
fn months_2024(scale_size: f64) -> TimeScales {
    let names = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let descriptors: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let month = i as u32 + 1;
            let mut d = ScaleDescriptor::new(format!("Q{}-{name}", i / 3 + 1))
                .start(format!("2024-{month:02}-01"))
                .label(*name);
            if month == 12 {
                d = d.end("2025-01-01");
            }
            d
        })
        .collect();
    TimeScales::build(&descriptors, scale_size).unwrap()
}

fn layout_table(scales: &TimeScales) -> String {
    scales
        .items()
        .iter()
        .map(|item| {
            format!(
                "{} .. {}  [{} .. {}]",
                item.start_time().date(),
                item.end_time().date(),
                item.layout_start(),
                item.layout_end()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn weighted_leaves_partition_the_extent() {
    let descriptors: Vec<ScaleDescriptor> = serde_json::from_value(json!([
        { "pathKey": "2024-H1", "unitWeight": 1, "start": "2024-01-01" },
        { "pathKey": "2024-Q3", "unitWeight": 2, "start": "2024-07-01" },
        { "pathKey": "2024-Q4", "start": "2024-10-01", "end": "2025-01-01" }
    ]))
    .unwrap();
    let scales = TimeScales::build(&descriptors, 400.0).unwrap();
    let sizes: Vec<_> = scales.items().iter().map(|i| i.layout_size()).collect();
    assert_eq!(sizes, vec![100.0, 200.0, 100.0]);
    insta::assert_snapshot!(layout_table(&scales), @r"
    2024-01-01 .. 2024-07-01  [0 .. 100]
    2024-07-01 .. 2024-10-01  [100 .. 300]
    2024-10-01 .. 2025-01-01  [300 .. 400]
    ");
}

#[test]
fn interpolation_hits_item_bounds() {
    let scales = months_2024(1200.0);
    for item in scales.items() {
        assert_eq!(item.layout_location(item.start_time()), item.layout_start());
        assert_eq!(item.layout_location(item.end_time()), item.layout_end());
        assert_eq!(
            item.layout_location(item.start_time() - TimeDelta::days(3)),
            item.layout_start()
        );
        assert_eq!(
            item.layout_location(item.end_time() + TimeDelta::days(3)),
            item.layout_end()
        );
    }
    assert_eq!(scales.layout_location(at(2024, 2, 15)), Some(100.0 + 100.0 * 14.0 / 29.0));
    assert_eq!(scales.layout_location(at(2025, 1, 1)), None);
}

#[test]
fn outside_the_scale_is_not_found() {
    let scales = months_2024(1200.0);
    assert!(scales.find_item(at(2023, 12, 31)).is_none());
    assert!(scales.find_item(at(2025, 1, 1)).is_none());
    assert_eq!(scales.find_index(at(2024, 12, 31)), Some(11));
    assert_eq!(scales.find_index(at(2024, 1, 1)), Some(0));
}

#[test]
fn range_for_a_drawn_item() {
    let scales = months_2024(1200.0);
    let mut layout = json!({ "index": 0 });
    let range = scales.layout_range(at(2024, 3, 1), at(2024, 5, 1)).unwrap();
    range.write_into(&mut layout);
    assert_eq!(
        layout,
        json!({ "index": 0, "itemStart": 200.0, "itemEnd": 400.0, "itemSize": 200.0 })
    );
}

#[test]
fn modify_time_keeps_end_of_month_anchor() {
    let mut scales = TimeScales::build(
        &[
            ScaleDescriptor::new("a").start("2023-01-31"),
            ScaleDescriptor::new("b").start("2023-02-28"),
            ScaleDescriptor::new("c").start("2023-03-31").end("2023-04-30"),
        ],
        300.0,
    )
    .unwrap();
    scales.modify_time("2024-02-01").unwrap();
    let starts: Vec<_> = scales.items().iter().map(|i| i.start_time()).collect();
    assert_eq!(starts, vec![at(2024, 2, 29), at(2024, 3, 31), at(2024, 4, 30)]);
    assert_eq!(scales.end_time(), at(2024, 5, 31));

    scales.modify_time("2023-02-10").unwrap();
    assert_eq!(scales.start_time(), at(2023, 2, 28));
}

#[test]
fn modify_time_without_anchor_keeps_days() {
    let mut scales = months_2024(1200.0);
    scales.modify_time("2025-03-15T08:30:00").unwrap();
    let first = scales.first_scale();
    assert_eq!(first.start_time(), parse_time("2025-03-01T08:30:00").unwrap());
    assert_eq!(scales.end_time(), parse_time("2026-03-01T08:30:00").unwrap());
    // layout is untouched by time edits
    assert_eq!(scales.last_scale().layout_end(), 1200.0);
}

#[test]
fn parse_fault_leaves_state_untouched() {
    let mut scales = months_2024(1200.0);
    let before = scales.items().to_vec();
    assert_eq!(
        scales.modify_time("next spring"),
        Err(ScaleError::InvalidTime {
            index: 0,
            text: "next spring".into()
        })
    );
    assert!(matches!(
        scales.set_time_scales(&["2024-01-01", "2024-13-01"]),
        Err(ScaleError::InvalidTime { index: 1, .. })
    ));
    assert_eq!(scales.items(), &before[..]);
}

#[test]
fn boundary_violation_leaves_state_untouched() {
    let mut scales = months_2024(1200.0);
    let before = scales.items().to_vec();
    let err = scales
        .set_time_scales(&["2024-01-01", "2024-03-01", "2024-02-01"])
        .unwrap_err();
    assert!(matches!(err, ScaleError::BoundaryViolation { index: 1, .. }));
    assert_eq!(scales.items(), &before[..]);
}

#[test]
fn set_time_scales_then_restore() {
    let mut scales = months_2024(1200.0);
    let defaults = scales.items().to_vec();
    let mut values: Vec<String> = (1..=12).map(|m| format!("2030-{m:02}-05")).collect();
    values.push("2031-01-05".into());
    scales.set_time_scales(&values).unwrap();
    assert_eq!(scales.start_time(), at(2030, 1, 5));
    assert_eq!(scales.end_time(), at(2031, 1, 5));
    scales.restore_time_scales().unwrap();
    assert_eq!(scales.items(), &defaults[..]);
}

#[test]
fn display_overlay_round_trip() {
    let mut scales = months_2024(1200.0);
    let overlay: Vec<Option<DisplayEntry>> = serde_json::from_value(json!([
        { "text": "Spring", "subGroup": ["J", null, "M"] },
        null,
        "Summer"
    ]))
    .unwrap();
    scales.set_display(&overlay);
    let q1 = &scales.groups()[0];
    assert_eq!(q1.text(), Some("Spring"));
    let texts: Vec<_> = q1.children().iter().map(|g| g.text()).collect();
    assert_eq!(texts, vec![Some("J"), Some("Feb"), Some("M")]);
    assert_eq!(scales.groups()[2].text(), Some("Summer"));

    scales.restore_display();
    assert_eq!(scales.groups()[0].text(), None);
    assert_eq!(scales.groups()[0].children()[0].text(), Some("Jan"));
    assert_eq!(scales.groups()[2].text(), None);
}

#[test]
fn prime_year_of_projects() {
    let ranges = [
        (NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
        (NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()),
    ];
    assert_eq!(infer_prime_year(ranges), Some(2024));
}

#[test]
fn prime_date_through_fiscal_year_map() {
    let map = PrimeDateMap::compile("(month < 4 ? year - 1 : year) + '/04/01'").unwrap();
    let mut scales = months_2024(1200.0);
    scales.set_prime_date("2025-02-10", Some(&map)).unwrap();
    assert_eq!(scales.start_time(), at(2024, 4, 1));
    assert_eq!(scales.end_time(), at(2025, 4, 1));
    // labels stay with their groups
    assert_eq!(scales.groups()[0].children()[0].text(), Some("Jan"));
}

#[test]
fn prime_date_without_map_is_modify_time() {
    let mut mapped = months_2024(1200.0);
    let mut shifted = months_2024(1200.0);
    mapped.set_prime_date("2025-02-10", None).unwrap();
    shifted.modify_time("2025-02-10").unwrap();
    assert_eq!(mapped.items(), shifted.items());
    assert_eq!(mapped.start_time(), at(2025, 2, 1));
}

#[test]
fn failing_prime_date_map_keeps_state() {
    let mut scales = months_2024(1200.0);
    let before = scales.items().to_vec();
    let map = PrimeDateMap::compile("day.of.week").unwrap();
    assert!(matches!(
        scales.set_prime_date("2025-02-10", Some(&map)),
        Err(ScaleError::PrimeDateMap { .. })
    ));
    let map = PrimeDateMap::compile("'Q' + month").unwrap();
    assert_eq!(
        scales.set_prime_date("2025-02-10", Some(&map)),
        Err(ScaleError::InvalidTime {
            index: 0,
            text: "Q2".into()
        })
    );
    assert!(matches!(
        scales.set_prime_date("someday", Some(&map)),
        Err(ScaleError::InvalidTime { index: 0, .. })
    ));
    assert_eq!(scales.items(), &before[..]);
}

proptest! {
    #[test]
    fn find_item_is_order_independent(order in Just((0..12usize).collect::<Vec<_>>()).prop_shuffle(),
                                      offset_days in 0i64..28) {
        let scales = months_2024(1200.0);
        for index in order {
            let item = &scales.items()[index];
            let time = item.start_time() + TimeDelta::days(offset_days);
            prop_assert!(time < item.end_time());
            prop_assert_eq!(scales.find_index(time), Some(index));
        }
    }

    #[test]
    fn restore_is_bit_identical(edits in prop::collection::vec((any::<bool>(), -30i32..30, 1u32..28), 1..6)) {
        let mut scales = months_2024(1200.0);
        let defaults = scales.items().to_vec();
        for (shift, months, day) in edits {
            if shift {
                let year = 2024 + months.div_euclid(12);
                let month = months.rem_euclid(12) as u32 + 1;
                scales.modify_time(format!("{year}-{month:02}-{day:02}")).unwrap();
            } else {
                let start = at(2024, 1, 1) + TimeDelta::days(i64::from(months) * 7);
                let values: Vec<_> = (0..=12).map(|m| start + TimeDelta::days(m * 31)).collect();
                scales.set_time_scales(&values).unwrap();
            }
        }
        scales.restore_time_scales().unwrap();
        prop_assert_eq!(scales.items(), &defaults[..]);
    }
}
