use shiftgrid_core::{ScheduleMode, Scope, ShiftValue, SubMode};
use shiftgrid_engine::{AutoConfirm, EngineError, Notice, SessionState, SubModeChange};
use shiftgrid_harness::{
    Action, FakeScheduleStore, RemoteCall, TestSession, grid, init_tracing, test_scope, values,
};
use shiftgrid_remote::RemoteError;
use shiftgrid_storage::MemorySessionStore;

fn names(options: &[ShiftValue]) -> Vec<&str> {
    options.iter().map(ShiftValue::as_str).collect()
}

// ============================================================================
// Entering edit mode
// ============================================================================

#[tokio::test]
async fn enter_edit_requires_loaded_grid() -> Result<(), Box<dyn std::error::Error>> {
    let remote = FakeScheduleStore::with_grid(test_scope(), grid(&[&["P"]]));
    let mut t = TestSession::new(remote, MemorySessionStore::new());

    assert!(matches!(
        t.session.enter_edit(&test_scope()),
        Err(EngineError::GridNotLoaded(_))
    ));
    assert_eq!(t.session.state(), SessionState::View);
    Ok(())
}

#[tokio::test]
async fn enter_edit_captures_baseline_without_network() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestSession::loaded(&[&["P", "S"], &["M", "OFF"]]).await?;
    t.remote.clear_calls();

    t.session.enter_edit(&test_scope())?;
    assert_eq!(t.session.state(), SessionState::Edit);
    assert_eq!(t.session.sub_mode(), SubMode::Lengkap);
    assert!(t.session.session_id().is_some());
    let baseline = t.session.baseline().ok_or("no baseline")?;
    assert_eq!(baseline.rows(), &[values(&["P", "S"]), values(&["M", "OFF"])]);
    assert!(t.remote.calls().is_empty());
    assert!(matches!(t.drain_notices().last(), Some(Notice::EditStarted { .. })));
    Ok(())
}

#[tokio::test]
async fn entering_twice_keeps_first_baseline() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestSession::editing(&[&["P"]]).await?;
    let id = t.session.session_id();
    t.session.change_cell(0, 0, "S")?.ok_or("change ignored")?.settled().await?;

    t.session.enter_edit(&test_scope())?;
    assert_eq!(t.session.session_id(), id);
    assert_eq!(
        t.session.baseline().and_then(|b| b.cell(0, 0)),
        Some(&ShiftValue::from("P"))
    );
    Ok(())
}

#[tokio::test]
async fn other_scope_is_locked_while_editing() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestSession::editing(&[&["P"]]).await?;
    let other = Scope::new(ScheduleMode::Dispatch, 3, "GUDANG");
    t.remote.put_grid(other.clone(), grid(&[&["M"]]));

    assert!(matches!(
        t.session.load(other.clone()).await,
        Err(EngineError::ScopeLocked { .. })
    ));
    t.session.load(test_scope()).await?;

    t.session.save().await;
    let loaded = t.session.load(other).await?;
    assert_eq!(loaded.rows[0].days, values(&["M"]));
    Ok(())
}

#[tokio::test]
async fn months_and_units_come_from_the_backend() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestSession::loaded(&[&["P"]]).await?;
    let months = t.session.list_months(ScheduleMode::Execution).await?;
    assert_eq!(months.iter().map(|m| m.value).collect::<Vec<_>>(), vec![3]);
    assert!(t.session.list_months(ScheduleMode::Dispatch).await?.is_empty());
    assert_eq!(t.session.list_units().await?, vec!["GUDANG".to_string()]);
    Ok(())
}

// ============================================================================
// Sub-mode and cell options
// ============================================================================

#[tokio::test]
async fn sub_mode_changes_weekday_options_only() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestSession::editing(&[&["P", "S", "M", "SM", "OFF", "P12", "M12"]]).await?;
    t.session.change_cell(0, 1, "CUTI")?;
    let overlay = t.session.overlay().clone();
    t.remote.clear_calls();

    let weekday = t.session.cell_view(0, 0).ok_or("no cell")?;
    assert_eq!(names(&weekday.options), ["", "P", "S", "M", "SM", "OFF", "CUTI"]);

    assert!(!t.session.set_sub_mode(SubMode::PSm, AutoConfirm(false)));
    assert_eq!(t.session.sub_mode(), SubMode::Lengkap);

    let asked = |change: &SubModeChange| {
        change.from == SubMode::Lengkap
            && change.to == SubMode::PSm
            && change.prompt().contains("Mode P, SM")
    };
    assert!(t.session.set_sub_mode(SubMode::PSm, asked));
    assert_eq!(t.session.sub_mode(), SubMode::PSm);

    let weekday = t.session.cell_view(0, 0).ok_or("no cell")?;
    assert_eq!(names(&weekday.options), ["", "P", "SM", "OFF", "CUTI"]);
    assert!(weekday.editable);

    let weekend = t.session.cell_view(0, 5).ok_or("no cell")?;
    assert_eq!(names(&weekend.options), ["", "P12", "M12", "OFF", "CUTI"]);

    let edited = t.session.cell_view(0, 1).ok_or("no cell")?;
    assert!(edited.edited);
    assert_eq!(names(&edited.options), ["", "P", "SM", "OFF", "CUTI"]);

    // S is no longer offered but stays selectable on the cell that holds it.
    t.session.undo();
    let restored = t.session.cell_view(0, 1).ok_or("no cell")?;
    assert_eq!(names(&restored.options), ["", "S", "P", "SM", "OFF", "CUTI"]);
    t.session.redo();

    assert_eq!(t.session.overlay(), &overlay);
    let writes: Vec<_> = t
        .remote
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, RemoteCall::SaveCell { .. }))
        .collect();
    assert!(writes.is_empty());
    Ok(())
}

#[tokio::test]
async fn same_sub_mode_does_not_ask() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestSession::editing(&[&["P"]]).await?;
    let never = |_: &SubModeChange| -> bool { panic!("gate consulted for a no-op change") };
    assert!(!t.session.set_sub_mode(SubMode::Lengkap, never));
    Ok(())
}

// ============================================================================
// Save and cancel
// ============================================================================

#[tokio::test]
async fn cancel_rolls_back_to_baseline() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut t = TestSession::editing(&[&["P", "S"], &["M", "OFF"]]).await?;
    t.session.set_sub_mode(SubMode::Psm, AutoConfirm(true));

    t.session.change_cell(0, 1, "M12")?.ok_or("change ignored")?.settled().await?;
    t.session.change_cell(1, 0, "CUTI")?.ok_or("change ignored")?.settled().await?;
    assert_eq!(t.remote.cell(&test_scope(), 0, 1), Some(ShiftValue::from("M12")));

    t.session.cancel().await;

    let baseline = vec![values(&["P", "S"]), values(&["M", "OFF"])];
    assert_eq!(
        t.remote.calls().last(),
        Some(&RemoteCall::SaveGrid {
            scope: test_scope(),
            rows: baseline.clone(),
        })
    );
    assert_eq!(t.remote.rows(&test_scope()), baseline);
    assert_eq!(t.session.state(), SessionState::View);
    assert_eq!(t.session.sub_mode(), SubMode::Lengkap);
    assert!(t.session.overlay().is_empty());
    assert!(!t.session.can_undo() && !t.session.can_redo());
    assert!(t.session.baseline().is_none());
    assert_eq!(t.row(0), values(&["P", "S"]));
    assert!(t.drain_notices().contains(&Notice::Cancelled));
    Ok(())
}

#[tokio::test]
async fn save_keeps_last_values_and_reloads() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestSession::editing(&[&["P", "S", "M"], &["M", "OFF", "P"]]).await?;

    t.session.change_cell(0, 0, "S")?.ok_or("change ignored")?.settled().await?;
    t.session.change_cell(0, 0, "OFF")?.ok_or("change ignored")?.settled().await?;
    t.session.change_cell(1, 2, "CUTI")?.ok_or("change ignored")?.settled().await?;
    let fetches = t.remote.hits(Action::FetchGrid);

    t.session.save().await;

    assert_eq!(t.remote.hits(Action::FetchGrid), fetches + 1);
    assert_eq!(t.remote.rows(&test_scope()), vec![
        values(&["OFF", "S", "M"]),
        values(&["M", "OFF", "CUTI"]),
    ]);
    assert_eq!(t.session.state(), SessionState::View);
    assert!(t.session.overlay().is_empty());
    assert!(t.session.baseline().is_none());
    assert_eq!(t.row(0), values(&["OFF", "S", "M"]));
    assert_eq!(t.row(1), values(&["M", "OFF", "CUTI"]));
    assert!(!t
        .remote
        .calls()
        .iter()
        .any(|c| matches!(c, RemoteCall::SaveGrid { .. })));
    Ok(())
}

#[tokio::test]
async fn save_and_cancel_outside_edit_are_noops() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestSession::loaded(&[&["P"]]).await?;
    let fetches = t.remote.hits(Action::FetchGrid);
    t.session.save().await;
    t.session.cancel().await;
    assert_eq!(t.remote.hits(Action::FetchGrid), fetches);
    assert_eq!(t.remote.hits(Action::SaveGrid), 0);
    Ok(())
}

#[tokio::test]
async fn failed_rollback_still_closes_session() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut t = TestSession::editing(&[&["P"]]).await?;
    t.session.change_cell(0, 0, "M")?.ok_or("change ignored")?.settled().await?;
    t.remote.fail(Action::SaveGrid, RemoteError::Network("offline".into()));

    t.session.cancel().await;

    assert_eq!(t.session.state(), SessionState::View);
    assert!(t.session.overlay().is_empty());
    let notices = t.drain_notices();
    let failures: Vec<_> = notices.iter().filter(|n| n.is_failure()).collect();
    assert!(matches!(failures.as_slice(), [Notice::RollbackFailed { .. }]));
    assert!(notices.contains(&Notice::Cancelled));
    Ok(())
}

#[tokio::test]
async fn failed_reload_after_save_is_a_notice() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestSession::editing(&[&["P"]]).await?;
    t.remote.fail(Action::FetchGrid, RemoteError::Network("offline".into()));

    t.session.save().await;

    assert_eq!(t.session.state(), SessionState::View);
    let notices = t.drain_notices();
    assert!(notices.contains(&Notice::Committed));
    assert!(notices.iter().any(|n| matches!(n, Notice::ReloadFailed { .. })));
    Ok(())
}
