// End-to-end timeline scenarios: records in, packed tracks out

use auditor_timeline::{
    load_addendums, load_letters, map_position, normalize_name, Addendum, AddendumRecord,
    EntityResolver, Letter, LetterRecord, TeamField, TimeAxis, TimelineConfig, TimelineIndex,
    ViewMode,
};
use chrono::{Duration, NaiveDate};
use std::fs;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn letter_a() -> Letter {
    Letter::from(LetterRecord {
        id: "101".to_string(),
        branch_name: "Cabang X".to_string(),
        letter_number: "ST-001".to_string(),
        team: TeamField::List(vec!["Budi Santoso".to_string(), "Ani".to_string()]),
        leader: "Budi Santoso".to_string(),
        audit_start_date: Some("2024-01-10".to_string()),
        audit_end_date: Some("2024-01-15".to_string()),
        status: "approved".to_string(),
        ..LetterRecord::default()
    })
}

fn addendum_for_a() -> Addendum {
    Addendum::from(AddendumRecord {
        id: "201".to_string(),
        letter_number: "ADD-001".to_string(),
        assignment_letter_before: "ST-001".to_string(),
        audit_start_date: Some("2024-01-16".to_string()),
        audit_end_date: Some("2024-01-20".to_string()),
        status: "approved".to_string(),
        ..AddendumRecord::default()
    })
}

fn simple_letter(id: &str, team: &str, start: &str, end: &str) -> Letter {
    Letter::from(LetterRecord {
        id: id.to_string(),
        branch_name: format!("Cabang {}", id),
        letter_number: format!("ST-{}", id),
        team: TeamField::from(team),
        audit_start_date: Some(start.to_string()),
        audit_end_date: Some(end.to_string()),
        status: "approved".to_string(),
        ..LetterRecord::default()
    })
}

fn january() -> ViewMode {
    ViewMode::Month { year: 2024, month: 1 }
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_letter_team_and_leader_become_two_entities() {
    let index = TimelineIndex::build(&[letter_a()], &[]);
    let layout = index.layout(january(), &TimelineConfig::default(), date(2024, 1, 1));

    let names: Vec<&str> = layout.tracks.iter().map(|t| t.display_name.as_str()).collect();
    assert_eq!(names, vec!["Ani", "Budi Santoso"]);

    for track in &layout.tracks {
        assert_eq!(track.bars.len(), 1);
        let assignment = &track.bars[0].assignment;
        assert_eq!(assignment.start, date(2024, 1, 10));
        assert_eq!(assignment.end, date(2024, 1, 15));
        assert_eq!(assignment.branch_label, "Cabang X");
        assert!(!assignment.is_addendum);
    }
}

#[test]
fn test_addendum_chains_from_parent_end() {
    let index = TimelineIndex::build(&[letter_a()], &[addendum_for_a()]);

    let addendums: Vec<_> = index.assignments().iter().filter(|a| a.is_addendum).collect();
    assert_eq!(addendums.len(), 2);

    for assignment in addendums {
        assert_eq!(assignment.start, date(2024, 1, 15));
        assert_eq!(assignment.end, date(2024, 1, 20));
        assert_eq!(assignment.branch_label, "Cabang X (Addendum)");
    }

    // Parent and addendum share 2024-01-15, so they stack
    let layout = index.layout(january(), &TimelineConfig::default(), date(2024, 1, 1));
    let budi = layout.track("Budi Santoso").unwrap();
    assert_eq!(budi.bars.len(), 2);
    assert_eq!(budi.row_count, 2);
}

#[test]
fn test_orphan_addendum_uses_own_start() {
    let mut orphan = addendum_for_a();
    orphan.parent_letter_no = "ST-404".to_string();
    orphan.team = TeamField::from("Citra Lestari");

    let index = TimelineIndex::build(&[letter_a()], &[orphan]);
    let citra = index
        .assignments()
        .iter()
        .find(|a| a.is_addendum)
        .unwrap();

    assert_eq!(citra.start, date(2024, 1, 16));
    assert_eq!(citra.branch_label, "(Addendum)");
}

#[test]
fn test_overlapping_letters_pack_into_two_rows() {
    let letters = vec![
        simple_letter("1", "Budi Santoso", "2024-02-01", "2024-02-10"),
        simple_letter("2", "Budi Santoso", "2024-02-05", "2024-02-15"),
    ];
    let index = TimelineIndex::build(&letters, &[]);
    let layout = index.layout(
        ViewMode::Month { year: 2024, month: 2 },
        &TimelineConfig::default(),
        date(2024, 2, 1),
    );

    let budi = layout.track("Budi Santoso").unwrap();
    let rows: Vec<usize> = budi.bars.iter().map(|b| b.row).collect();
    assert_eq!(rows, vec![0, 1]);
    assert_eq!(budi.row_count, 2);
}

#[test]
fn test_title_token_in_team_contributes_nothing() {
    let letters = vec![simple_letter("1", "S.E., Budi Santoso", "2024-01-10", "2024-01-15")];
    let index = TimelineIndex::build(&letters, &[]);

    assert_eq!(index.resolver().len(), 1);
    assert_eq!(index.resolver().entities()[0].display_name, "Budi Santoso");
    assert_eq!(index.assignments().len(), 1);
}

#[test]
fn test_year_axis_has_48_columns_with_leap_february() {
    let axis = TimeAxis::generate(
        ViewMode::Year { year: 2024 },
        &TimelineConfig::default(),
        date(2024, 1, 1),
    );

    assert_eq!(axis.columns.len(), 48);

    let feb_m4 = &axis.columns[7];
    assert_eq!(feb_m4.label, "M4");
    assert_eq!(feb_m4.start, date(2024, 2, 22));
    assert_eq!(feb_m4.end, date(2024, 2, 29));
}

#[test]
fn test_reversed_range_falls_back_to_current_month() {
    let mode = ViewMode::Range {
        start: Some(date(2024, 3, 10)),
        end: Some(date(2024, 3, 1)),
    };
    let axis = TimeAxis::generate(mode, &TimelineConfig::default(), date(2024, 6, 15));

    assert_eq!(axis.columns.len(), 30);
    assert_eq!(axis.columns[0].start, date(2024, 6, 1));
    assert_eq!(axis.columns[29].end, date(2024, 6, 30));
}

#[test]
fn test_load_json_snapshot_from_disk() {
    let dir = TempDir::new().unwrap();
    let letters_path = dir.path().join("letters.json");
    let addendums_path = dir.path().join("addendums.json");

    fs::write(
        &letters_path,
        r#"[
            {"id": 1, "branch_name": "Cabang X", "letter_number": "ST-001",
             "team": "[\"Budi Santoso\",\"Ani\"]", "leader": "Budi Santoso",
             "audit_start_date": "2024-01-10", "audit_end_date": "2024-01-15",
             "status": "approved"},
            {"id": 2, "branch_name": "Cabang Y", "letter_number": "ST-002",
             "team": "Dewi", "audit_start_date": "2024-01-03",
             "audit_end_date": "2024-01-04", "status": "rejected"}
        ]"#,
    )
    .unwrap();
    fs::write(
        &addendums_path,
        r#"[
            {"id": 7, "letter_number": "ADD-001", "assignment_letter_before": "ST-001",
             "new_audit_end_date": "2024-01-20", "status": "approved"}
        ]"#,
    )
    .unwrap();

    let letters = load_letters(&letters_path).unwrap();
    let addendums = load_addendums(&addendums_path).unwrap();
    let index = TimelineIndex::build(&letters, &addendums);

    assert_eq!(index.record_count(), 3);
    assert_eq!(index.resolver().len(), 2);
    assert_eq!(index.assignments().len(), 4);
    assert_eq!(index.skipped().len(), 1);
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn test_normalization_is_idempotent() {
    let inputs = [
        "  Budi   Santoso ",
        "ANDRE perkasa",
        "Dr. Citra Lestari, S.E.",
        "M.M.",
        "Al",
        "",
        "Élodie  Dupont",
    ];

    for raw in inputs {
        let once = normalize_name(raw);
        let twice = once.as_deref().and_then(normalize_name);
        assert_eq!(once, twice, "normalize is not idempotent for {:?}", raw);
    }
}

#[test]
fn test_title_tokens_never_create_entities() {
    let mut resolver = EntityResolver::new();
    for token in ["S.E.", "Dr.", "M.M.", "s.e", "  DR  "] {
        assert!(resolver.resolve_raw(token).is_none(), "{:?} created an entity", token);
    }
    assert!(resolver.is_empty());
}

#[test]
fn test_containment_merges_and_renames() {
    let mut resolver = EntityResolver::new();
    let short = resolver.resolve_raw("Andre").unwrap();
    let long = resolver.resolve_raw("Andre Perkasa Ginting").unwrap();

    assert_eq!(short.entity, long.entity);
    assert!(long.renamed);
    assert_eq!(resolver.display_name(short.entity), Some("Andre Perkasa Ginting"));
}

#[test]
fn test_same_row_bars_never_overlap() {
    let letters = vec![
        simple_letter("1", "Budi Santoso", "2024-01-02", "2024-01-03"),
        simple_letter("2", "Budi Santoso", "2024-01-09", "2024-01-10"),
        simple_letter("3", "Budi Santoso", "2024-01-08", "2024-01-09"),
        simple_letter("4", "Budi Santoso", "2024-01-03", "2024-01-08"),
        simple_letter("5", "Budi Santoso", "2024-01-01", "2024-01-31"),
        simple_letter("6", "Budi Santoso", "2024-01-11", "2024-01-12"),
    ];
    let index = TimelineIndex::build(&letters, &[]);

    for pack_by_start in [false, true] {
        let config = TimelineConfig {
            pack_by_start,
            ..TimelineConfig::default()
        };
        let layout = index.layout(january(), &config, date(2024, 1, 1));
        let bars = &layout.tracks[0].bars;

        for (i, a) in bars.iter().enumerate() {
            for b in &bars[i + 1..] {
                if a.row == b.row {
                    assert!(
                        a.assignment.end < b.assignment.start || a.assignment.start > b.assignment.end,
                        "{} and {} share row {}",
                        a.assignment.source_id,
                        b.assignment.source_id,
                        a.row
                    );
                }
            }
        }
    }
}

#[test]
fn test_columns_are_contiguous_in_every_mode() {
    let config = TimelineConfig::default();
    let today = date(2024, 6, 15);
    let modes = [
        ViewMode::Month { year: 2024, month: 2 },
        ViewMode::Year { year: 2023 },
        ViewMode::Range {
            start: Some(date(2023, 12, 20)),
            end: Some(date(2024, 1, 10)),
        },
        ViewMode::Range { start: None, end: None },
    ];

    for mode in modes {
        let axis = TimeAxis::generate(mode, &config, today);
        assert!(!axis.columns.is_empty());
        for pair in axis.columns.windows(2) {
            assert!(pair[0].start <= pair[0].end);
            assert_eq!(pair[0].end + Duration::days(1), pair[1].start, "gap in {:?}", mode);
        }
    }
}

#[test]
fn test_start_snap_never_exceeds_end_snap() {
    let config = TimelineConfig::default();
    let axis = TimeAxis::generate(ViewMode::Year { year: 2024 }, &config, date(2024, 1, 1));

    let mut day = date(2023, 12, 25);
    while day <= date(2025, 1, 5) {
        let left = map_position(day, &axis.columns, axis.column_width, false);
        let right = map_position(day, &axis.columns, axis.column_width, true);
        assert!(left <= right, "{}: {} > {}", day, left, right);
        day += Duration::days(1);
    }
}
