use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};

use matchdesk::analysis_fetch::{
    parse_analysis_detail_json, parse_analysis_page_json, parse_timestamp, ApiError,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_page_fixture() {
    let raw = read_fixture("analysis_page.json");
    let page = parse_analysis_page_json(&raw).expect("fixture should parse");

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, Some(23));
    assert_eq!(page.pages, Some(2));

    let first = &page.items[0];
    assert_eq!(first.id, "66f0a1");
    assert_eq!(first.home.name, "Manchester City");
    assert_eq!(first.away.name, "Liverpool");
    assert_eq!((first.score_home, first.score_away), (2, 1));
    assert_eq!(first.tournament.name, "Premier League");
    assert_eq!(first.venue.as_deref(), Some("Etihad Stadium"));
    assert_eq!(first.views, 412);
    assert_eq!(first.likes, Some(37));
    assert!(first.full_text.is_some());

    let second = &page.items[1];
    assert_eq!(second.id, "66f0a2");
    assert!(second.venue.is_none());
    assert!(second.likes.is_none());
    // Bare-date createdAt parses as local-free midnight UTC.
    assert_eq!(
        second.created_at,
        Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()
    );
}

#[test]
fn failure_envelope_is_an_error() {
    let err = parse_analysis_page_json(r#"{"success":false,"message":"db down"}"#)
        .expect_err("failure envelope should not parse");
    let api = err
        .downcast_ref::<ApiError>()
        .expect("should be an api error");
    assert!(matches!(api, ApiError::BadEnvelope(msg) if msg == "db down"));
}

#[test]
fn empty_and_null_bodies_are_errors() {
    assert!(parse_analysis_page_json("").is_err());
    assert!(parse_analysis_page_json("null").is_err());
    assert!(parse_analysis_page_json("  \n ").is_err());
    assert!(parse_analysis_page_json("{not json").is_err());
}

#[test]
fn rows_without_any_id_are_dropped() {
    let raw = r#"{
        "success": true,
        "data": [
            { "homeTeam": { "name": "A" }, "awayTeam": { "name": "B" }, "views": 3 },
            { "id": "keep", "views": 1 }
        ]
    }"#;
    let page = parse_analysis_page_json(raw).expect("envelope should parse");
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, "keep");
}

#[test]
fn falls_back_to_match_id() {
    let raw = r#"{"success":true,"data":[{"matchId":"fm-7","views":0}]}"#;
    let page = parse_analysis_page_json(raw).expect("envelope should parse");
    assert_eq!(page.items[0].id, "fm-7");
}

#[test]
fn parses_detail_fixture() {
    let raw = read_fixture("analysis_detail.json");
    let item = parse_analysis_detail_json(&raw).expect("fixture should parse");
    assert_eq!(item.id, "66f0a1");
    assert_eq!(item.views, 413);
    assert!(item.full_text.as_deref().unwrap().contains("corner count"));
}

#[test]
fn detail_with_null_payload_is_not_found() {
    let err = parse_analysis_detail_json(r#"{"success":true,"data":null}"#)
        .expect_err("null payload should be an error");
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::NotFound)
    ));
}

#[test]
fn timestamp_formats() {
    assert_eq!(
        parse_timestamp("2024-03-10T19:05:12.331Z"),
        Utc.with_ymd_and_hms(2024, 3, 10, 19, 5, 12)
            .single()
            .map(|dt| dt + chrono::Duration::milliseconds(331))
    );
    assert_eq!(
        parse_timestamp("2024-01-01"),
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(
        parse_timestamp("2024-01-01T08:30:00"),
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap())
    );
    assert_eq!(parse_timestamp(""), None);
    assert_eq!(parse_timestamp("yesterday"), None);
}
