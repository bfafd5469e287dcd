// Integration tests for applying migrations

mod common;

use common::{
    insert_ledger_rows, ledger_names, table_exists, RecordingDatabase, SelfCommittingDatabase,
    Workspace,
};
use migrun_core::errors::ExErrorKind;
use migrun_core::logging_facility::test_capture::init_test_capture;
use migrun_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START, OP_UP};
use migrun_core_types::{RunContext, RunId};
use migrun_store::{Database, MigrationRunner, SqliteDatabase};

#[test]
fn test_up_applies_all_in_order() {
    let ws = Workspace::new();
    ws.write_abc();
    let mut runner = ws.runner();

    let report = runner.up(None).unwrap();

    assert_eq!(report.applied, vec!["001_a", "002_b", "003_c"]);
    assert_eq!(report.previously_applied, 0);
    let db = runner.database();
    assert_eq!(ledger_names(db), vec!["001_a", "002_b", "003_c"]);
    assert!(table_exists(db, "a") && table_exists(db, "b") && table_exists(db, "c"));
}

#[test]
fn test_up_twice_is_idempotent() {
    let ws = Workspace::new();
    ws.write_abc();
    let mut runner = ws.runner();

    runner.up(None).unwrap();
    let second = runner.up(None).unwrap();

    assert!(second.applied.is_empty());
    assert_eq!(second.previously_applied, 3);
    assert_eq!(ledger_names(runner.database()).len(), 3);
}

#[test]
fn test_up_applies_only_missing_migration() {
    let ws = Workspace::new();
    ws.write_abc();
    insert_ledger_rows(&ws.db_path(), &["001_a", "002_b"]);

    let mut runner = ws.runner();
    let report = runner.up(None).unwrap();

    assert_eq!(report.applied, vec!["003_c"]);
    let db = runner.database();
    assert_eq!(ledger_names(db), vec!["001_a", "002_b", "003_c"]);
    // 001_a and 002_b were only recorded, never executed
    assert!(!table_exists(db, "a"));
    assert!(table_exists(db, "c"));
}

#[test]
fn test_up_to_target_stops_there() {
    let ws = Workspace::new();
    ws.write_abc();
    let mut runner = ws.runner();

    let report = runner.up(Some("002_b")).unwrap();

    assert_eq!(report.applied, vec!["001_a", "002_b"]);
    let db = runner.database();
    assert_eq!(ledger_names(db), vec!["001_a", "002_b"]);
    assert!(!table_exists(db, "c"));
}

#[test]
fn test_up_to_already_applied_target_leaves_later_pending() {
    let ws = Workspace::new();
    ws.write_abc();
    let mut runner = ws.runner();
    runner.up(Some("002_b")).unwrap();

    let report = runner.up(Some("001_a")).unwrap();

    assert!(report.applied.is_empty());
    assert!(report.target_already_applied);
    assert!(!table_exists(runner.database(), "c"));
}

#[test]
fn test_up_unknown_target_fails_before_any_change() {
    let ws = Workspace::new();
    ws.write_abc();
    let mut runner = ws.runner();

    let err = runner.up(Some("999_missing")).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.migration(), Some("999_missing"));
    let db = runner.database();
    assert!(ledger_names(db).is_empty());
    assert!(!table_exists(db, "a"));
}

#[test]
fn test_failure_stops_run_and_keeps_earlier_successes() {
    let ws = Workspace::new();
    ws.write("001_a.sql", common::CREATE_A);
    ws.write(
        "002_b.sql",
        "CREATE TABLE b (id INTEGER PRIMARY KEY);\nTHIS IS NOT SQL;",
    );
    ws.write("003_c.sql", common::CREATE_C);
    let mut runner = ws.runner();

    let err = runner.up(None).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::SqlExecution);
    assert_eq!(err.migration(), Some("002_b"));
    let db = runner.database();
    assert_eq!(ledger_names(db), vec!["001_a"]);
    assert!(table_exists(db, "a"));
    // transactional apply rolled back the half-run script
    assert!(!table_exists(db, "b"));
    assert!(!table_exists(db, "c"));
}

#[test]
fn test_non_transactional_failure_leaves_partial_schema() {
    let ws = Workspace::new();
    ws.write("001_a.sql", common::CREATE_A);
    ws.write(
        "002_b.sql",
        "CREATE TABLE b (id INTEGER PRIMARY KEY);\nTHIS IS NOT SQL;",
    );
    ws.write("003_c.sql", common::CREATE_C);
    let mut runner = ws.non_transactional_runner();

    let err = runner.up(None).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::SqlExecution);
    let db = runner.database();
    assert_eq!(ledger_names(db), vec!["001_a"]);
    assert!(table_exists(db, "b"), "statements before the failure stay applied");
    assert!(!table_exists(db, "c"));
}

#[test]
fn test_fixed_script_is_picked_up_on_rerun() {
    let ws = Workspace::new();
    ws.write("001_a.sql", common::CREATE_A);
    ws.write("002_b.sql", "NOT SQL;");
    {
        let mut runner = ws.runner();
        assert!(runner.up(None).is_err());
    }

    ws.write("002_b.sql", common::CREATE_B);
    let mut runner = ws.runner();
    let report = runner.up(None).unwrap();

    assert_eq!(report.applied, vec!["002_b"]);
    assert_eq!(ledger_names(runner.database()), vec!["001_a", "002_b"]);
}

#[test]
fn test_up_with_empty_directory_succeeds() {
    let ws = Workspace::new();
    let mut runner = ws.runner();

    let report = runner.up(None).unwrap();

    assert!(report.applied.is_empty());
    assert!(table_exists(runner.database(), "migrations"));
}

#[test]
fn test_up_with_missing_directory_fails() {
    let ws = Workspace::new();
    let mut runner = ws.runner();
    std::fs::remove_dir(ws.migrations_dir()).unwrap();

    let err = runner.up(None).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::DirectoryNotFound);
}

#[test]
fn test_custom_ledger_table() {
    let ws = Workspace::new();
    ws.write_abc();
    let mut runner = ws.runner_with(ws.config().with_ledger_table("schema_ledger"));

    runner.up(None).unwrap();

    let db = runner.database();
    assert!(table_exists(db, "schema_ledger"));
    assert!(!table_exists(db, "migrations"));
}

#[test]
fn test_errors_carry_run_id() {
    let ws = Workspace::new();
    ws.write_abc();
    let run_id = RunId::from_string("ci-job-17".to_string());
    let mut runner = ws
        .runner()
        .with_context(RunContext::with_run_id(run_id.clone()));

    let err = runner.up(Some("nope")).unwrap_err();
    assert_eq!(err.run_id(), Some(&run_id));
}

#[test]
fn test_up_logs_operation_boundaries() {
    let capture = init_test_capture();
    let ws = Workspace::new();
    ws.write("001_logged_unique.sql", common::CREATE_A);
    let run_id = RunId::from_string("log-boundary-run".to_string());
    let mut runner = ws
        .runner()
        .with_context(RunContext::with_run_id(run_id).with_initiator("deploy-job"));

    runner.up(None).unwrap();
    let _ = runner.up(Some("missing_for_log_test"));

    let ours: Vec<_> = capture
        .events_for_op(OP_UP)
        .into_iter()
        .filter(|e| e.fields.get("run_id").map(String::as_str) == Some("log-boundary-run"))
        .collect();
    assert_eq!(ours.len(), 2, "one start per call carries the run id");
    assert!(ours.iter().all(|e| e.event.as_deref() == Some(EVENT_START)));
    assert!(ours
        .iter()
        .all(|e| e.fields.get("initiator").map(String::as_str) == Some("deploy-job")));

    assert!(capture.count_events(|e| e.op.as_deref() == Some(OP_UP)
        && e.event.as_deref() == Some(EVENT_END)) >= 1);
    assert!(capture.count_events(|e| e.op.as_deref() == Some(OP_UP)
        && e.event.as_deref() == Some(EVENT_END_ERROR)
        && e.fields.get("err.code").map(String::as_str) == Some("ERR_NOT_FOUND")) >= 1);
    assert!(capture.events_for_migration("001_logged_unique").len() >= 2);
}

#[test]
fn test_up_trims_target_like_down() {
    let ws = Workspace::new();
    ws.write_abc();
    let mut runner = ws.runner();

    let report = runner.up(Some(" 002_b ")).unwrap();

    assert_eq!(report.applied, vec!["001_a", "002_b"]);
    runner.down(" 002_b ").unwrap();
    assert_eq!(ledger_names(runner.database()), vec!["001_a"]);
}

#[test]
fn test_up_applies_script_with_its_own_transaction() {
    let ws = Workspace::new();
    ws.write(
        "001_a.sql",
        "BEGIN;\nCREATE TABLE a (id INTEGER PRIMARY KEY);\nINSERT INTO a VALUES (1);\nCOMMIT;",
    );
    ws.write("002_b.sql", common::CREATE_B);
    let mut runner = ws.runner();

    let report = runner.up(None).unwrap();

    assert_eq!(report.applied, vec!["001_a", "002_b"]);
    let db = runner.database();
    assert_eq!(ledger_names(db), vec!["001_a", "002_b"]);
    assert!(table_exists(db, "a") && table_exists(db, "b"));
    assert!(!db.in_transaction());
}

#[test]
fn test_up_script_with_failing_own_transaction_is_not_recorded() {
    let ws = Workspace::new();
    ws.write(
        "001_a.sql",
        "BEGIN;\nCREATE TABLE a (id INTEGER PRIMARY KEY);\nNOT VALID SQL;\nCOMMIT;",
    );
    let mut runner = ws.runner();

    let err = runner.up(None).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::SqlExecution);
    let db = runner.database();
    assert!(ledger_names(db).is_empty());
    assert!(!table_exists(db, "a"));
    assert!(!db.in_transaction());
}

#[test]
fn test_up_bare_commit_fails_without_ledger_row() {
    let ws = Workspace::new();
    ws.write("001_a.sql", "CREATE TABLE a (id INTEGER PRIMARY KEY);\nCOMMIT;");
    ws.write("002_b.sql", common::CREATE_B);
    let mut runner = ws.runner();

    let err = runner.up(None).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::SqlExecution);
    assert_eq!(err.migration(), Some("001_a"));
    let db = runner.database();
    assert!(ledger_names(db).is_empty());
    assert!(!table_exists(db, "b"));
}

#[test]
fn test_up_fails_when_runner_transaction_is_ended_by_script() {
    let ws = Workspace::new();
    ws.write_abc();
    let db = SelfCommittingDatabase(SqliteDatabase::connect(ws.db_path()).unwrap());
    let mut runner = MigrationRunner::new(db, ws.config()).unwrap();

    let err = runner.up(None).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::SqlExecution);
    assert_eq!(err.migration(), Some("001_a"));
    assert!(err.to_string().contains("ended the runner's transaction"));
    let db = &runner.database().0;
    assert!(ledger_names(db).is_empty());
    assert!(!table_exists(db, "b"));
}

#[test]
fn test_no_transaction_directive_skips_runner_transaction() {
    let ws = Workspace::new();
    ws.write(
        "001_a.sql",
        "-- migrun:no-transaction\nCREATE TABLE a (id INTEGER PRIMARY KEY);",
    );
    ws.write("002_b.sql", common::CREATE_B);
    let recording = RecordingDatabase::new(SqliteDatabase::connect(ws.db_path()).unwrap());
    let statements = recording.statements.clone();
    let mut runner = MigrationRunner::new(recording, ws.config()).unwrap();

    runner.up(None).unwrap();

    let statements = statements.lock().unwrap();
    let position = |needle: &str| statements.iter().position(|s| s.contains(needle)).unwrap();
    let begins: Vec<usize> = statements
        .iter()
        .enumerate()
        .filter(|(_, s)| s.trim() == "BEGIN")
        .map(|(i, _)| i)
        .collect();
    // only 002_b gets a runner transaction
    assert_eq!(begins.len(), 1);
    assert!(begins[0] > position("CREATE TABLE a"));
    assert!(begins[0] < position("CREATE TABLE b"));
}
