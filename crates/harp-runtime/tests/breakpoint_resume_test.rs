mod common;

use common::*;
use harp_cloud::ResumeMode;
use harp_runtime::{Action, ExecutionStatus, HarpError, NodeState};

#[tokio::test]
async fn breakpoint_halts_before_the_marked_node() {
    let (engine, _store) = mock_engine();
    let start_ctx = ctx().mock().with_declarations(scenario()).with_breakpoint(2);

    let records = engine.play("create", &start_ctx).await.unwrap();
    assert_eq!(
        actions(&records),
        vec![Action::HarpId, Action::Create, Action::Break, Action::Token]
    );
    let break_record = records.iter().find(|r| r.action == Action::Break).unwrap();
    assert_eq!(break_record.payload["at"], "g");
    assert_eq!(break_record.payload["line"], 2);

    let execution = engine.status(&execution_id(&records)).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Suspended);
    assert_eq!(execution.node("v").unwrap().state, NodeState::Succeeded);
    assert_eq!(execution.node("g").unwrap().state, NodeState::Pending);
}

#[tokio::test]
async fn continue_after_breakpoint_matches_an_unbroken_run() {
    let (engine, _store) = mock_engine();
    let start_ctx = ctx().mock().with_declarations(scenario()).with_breakpoint(2);
    let records = engine.play("create", &start_ctx).await.unwrap();
    let id = execution_id(&records);
    let token = resume_token(&records);

    let resumed = engine
        .play(
            "create",
            &ctx()
                .mock()
                .with_execution_id(id.as_str())
                .resuming(token, ResumeMode::Continue),
        )
        .await
        .unwrap();
    // The segment picks up at the breakpoint node and runs to the end.
    assert_eq!(names_for(&resumed, Action::Create), vec!["g", "a"]);
    assert_eq!(resumed.last().unwrap().action, Action::End);

    let broken = engine.status(&id).await.unwrap();

    // Same terminal node states as a run that never hit a breakpoint.
    let (unbroken_engine, _store) = mock_engine();
    let records = unbroken_engine
        .play("create", &ctx().mock().with_declarations(scenario()))
        .await
        .unwrap();
    let unbroken = unbroken_engine
        .status(&execution_id(&records))
        .await
        .unwrap();

    assert_eq!(broken.status, unbroken.status);
    for name in ["v", "g", "a"] {
        assert_eq!(
            broken.node(name).unwrap().state,
            unbroken.node(name).unwrap().state
        );
    }
}

#[tokio::test]
async fn step_executes_exactly_one_node_then_resuspends() {
    let (engine, _store) = mock_engine();
    let start_ctx = ctx().mock().with_declarations(scenario()).with_breakpoint(2);
    let records = engine.play("create", &start_ctx).await.unwrap();
    let id = execution_id(&records);
    let token = resume_token(&records);

    let stepped = engine
        .play(
            "create",
            &ctx()
                .mock()
                .with_execution_id(id.as_str())
                .resuming(token, ResumeMode::Step),
        )
        .await
        .unwrap();
    assert_eq!(names_for(&stepped, Action::Create), vec!["g"]);
    assert_eq!(stepped.last().unwrap().action, Action::Token);

    let execution = engine.status(&id).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Suspended);
    assert_eq!(execution.node("a").unwrap().state, NodeState::Pending);

    // Stepping over the last node finishes the execution.
    let token = resume_token(&stepped);
    let finished = engine
        .play(
            "create",
            &ctx()
                .mock()
                .with_execution_id(id.as_str())
                .resuming(token, ResumeMode::Step),
        )
        .await
        .unwrap();
    assert_eq!(names_for(&finished, Action::Create), vec!["a"]);
    assert_eq!(finished.last().unwrap().action, Action::End);
    let execution = engine.status(&id).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Succeeded);
}

#[tokio::test]
async fn fresh_run_honours_single_step() {
    let (engine, _store) = mock_engine();
    let mut step_ctx = ctx().mock().with_declarations(scenario());
    step_ctx.resume_mode = ResumeMode::Step;

    let records = engine.play("create", &step_ctx).await.unwrap();
    assert_eq!(names_for(&records, Action::Create), vec!["v"]);

    let execution = engine.status(&execution_id(&records)).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Suspended);
    assert_eq!(execution.node("g").unwrap().state, NodeState::Pending);
}

#[tokio::test]
async fn stale_token_fails_without_mutating_state() {
    let (engine, _store) = mock_engine();
    let start_ctx = ctx().mock().with_declarations(scenario()).with_breakpoint(2);
    let records = engine.play("create", &start_ctx).await.unwrap();
    let id = execution_id(&records);
    let token = resume_token(&records);

    let err = engine
        .play(
            "create",
            &ctx()
                .mock()
                .with_execution_id(id.as_str())
                .resuming("not-the-token", ResumeMode::Continue),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HarpError::StaleCheckpoint(_)));

    // Still parked exactly where it was; the real token still works.
    let execution = engine.status(&id).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Suspended);
    assert_eq!(execution.node("g").unwrap().state, NodeState::Pending);

    engine
        .play(
            "create",
            &ctx()
                .mock()
                .with_execution_id(id.as_str())
                .resuming(token, ResumeMode::Continue),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn consumed_token_is_stale() {
    let (engine, _store) = mock_engine();
    let start_ctx = ctx().mock().with_declarations(scenario()).with_breakpoint(2);
    let records = engine.play("create", &start_ctx).await.unwrap();
    let id = execution_id(&records);
    let first_token = resume_token(&records);

    let stepped = engine
        .play(
            "create",
            &ctx()
                .mock()
                .with_execution_id(id.as_str())
                .resuming(first_token.as_str(), ResumeMode::Step),
        )
        .await
        .unwrap();

    // The original token was consumed by the step; replaying it fails.
    let err = engine
        .play(
            "create",
            &ctx()
                .mock()
                .with_execution_id(id.as_str())
                .resuming(first_token, ResumeMode::Continue),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HarpError::StaleCheckpoint(_)));

    // The freshly issued token is the valid one.
    engine
        .play(
            "create",
            &ctx()
                .mock()
                .with_execution_id(id.as_str())
                .resuming(resume_token(&stepped), ResumeMode::Continue),
        )
        .await
        .unwrap();
    let execution = engine.status(&id).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Succeeded);
}

#[tokio::test]
async fn resuming_a_terminal_execution_is_rejected() {
    let (engine, _store) = mock_engine();
    let records = engine
        .play("create", &ctx().mock().with_declarations(scenario()))
        .await
        .unwrap();
    let id = execution_id(&records);

    let err = engine
        .play(
            "create",
            &ctx()
                .mock()
                .with_execution_id(id.as_str())
                .resuming("anything", ResumeMode::Continue),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HarpError::NotSuspended(_)));
}
