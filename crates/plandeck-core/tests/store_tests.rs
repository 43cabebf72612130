//! Integration tests for the persistent record store.
//!
//! Exercises the redb backend through the Workspace façade against a
//! temporary database file.

use chrono::{TimeZone, Utc};
use plandeck_core::{
    CanvasDoc, CalendarEventRecord, DocumentStatus, InvoiceRecord, LayerKind, ProjectRecord,
    Workspace,
};

fn ts() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("timestamp")
}

fn sample_project(id: &str) -> ProjectRecord {
    let mut canvas = CanvasDoc::new();
    canvas
        .append_pages(vec![
            "https://cdn.test/p0.png".to_string(),
            "https://cdn.test/p1.png".to_string(),
        ])
        .expect("append");
    canvas
        .set_overlay(1, LayerKind::WallColor, "https://cdn.test/walls-1.png")
        .expect("overlay");

    ProjectRecord {
        id: id.to_string(),
        name: "Office tower".to_string(),
        owner: "default".to_string(),
        created_at: ts(),
        updated_at: ts(),
        canvas,
    }
}

#[test]
fn redb_project_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plandeck.db");

    {
        let mut ws = Workspace::with_redb(&path).expect("open");
        ws.upsert_project(&sample_project("p1")).expect("upsert");
    }

    // Reopen: the record and its overlay map survive the round trip.
    let ws = Workspace::with_redb(&path).expect("reopen");
    let project = ws.require_project("p1").expect("load");
    assert_eq!(project.name, "Office tower");
    assert_eq!(
        project.canvas.overlay_url(1, LayerKind::WallColor),
        Some("https://cdn.test/walls-1.png")
    );
    assert_eq!(project.canvas.overlay_url(0, LayerKind::WallColor), None);
}

#[test]
fn redb_delete_is_wholesale() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plandeck.db");

    let mut ws = Workspace::with_redb(&path).expect("open");
    ws.upsert_project(&sample_project("p1")).expect("upsert");

    assert!(ws.remove_project("p1").expect("remove"));
    assert!(ws.project("p1").expect("get").is_none());
    assert!(!ws.remove_project("p1").expect("second remove"));
}

#[test]
fn redb_full_document_replace_is_last_write_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plandeck.db");

    let mut ws = Workspace::with_redb(&path).expect("open");
    let mut project = sample_project("p1");
    ws.upsert_project(&project).expect("first write");

    project.name = "Office tower (revised)".to_string();
    ws.upsert_project(&project).expect("second write");

    let loaded = ws.require_project("p1").expect("load");
    assert_eq!(loaded.name, "Office tower (revised)");
    assert_eq!(ws.counts().expect("counts").projects, 1);
}

#[test]
fn redb_mixed_families_count_independently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plandeck.db");

    let mut ws = Workspace::with_redb(&path).expect("open");
    ws.upsert_project(&sample_project("p1")).expect("project");
    ws.upsert_invoice(&InvoiceRecord {
        id: "i1".to_string(),
        owner: "default".to_string(),
        number: "INV-260301-1234".to_string(),
        client_name: "Acme Builders".to_string(),
        client_email: "ops@acme.test".to_string(),
        status: DocumentStatus::Pending,
        created_at: ts(),
        updated_at: ts(),
    })
    .expect("invoice");
    ws.upsert_event(&CalendarEventRecord {
        id: "e1".to_string(),
        owner: "default".to_string(),
        title: "Site walk".to_string(),
        description: None,
        start_time: ts(),
        end_time: ts(),
        all_day: false,
        location: Some("Lot 14".to_string()),
        color: "#FF5F1F".to_string(),
        created_at: ts(),
        updated_at: ts(),
    })
    .expect("event");

    let counts = ws.counts().expect("counts");
    assert_eq!(counts.projects, 1);
    assert_eq!(counts.invoices, 1);
    assert_eq!(counts.takeoffs, 0);
    assert_eq!(counts.calendar_events, 1);
}

#[test]
fn snapshot_survives_backend_change() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plandeck.db");

    let mut persistent = Workspace::with_redb(&path).expect("open");
    persistent
        .upsert_project(&sample_project("p1"))
        .expect("upsert");
    let snapshot = persistent.snapshot().expect("snapshot");

    let mut memory = Workspace::new();
    memory.restore(&snapshot).expect("restore");
    assert_eq!(
        memory.require_project("p1").expect("load").canvas.page_count(),
        2
    );
}
