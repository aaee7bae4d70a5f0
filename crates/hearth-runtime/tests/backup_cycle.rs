//! Integration tests for backup cycles against in-memory version control.

mod common;

use chrono::{Local, TimeZone};
use common::vcs::{Call, ScriptedVcs, SimulatedRepo};
use hearth_core::{BackupOutcome, BackupRecord, BackupStep, Event, StreamRole};
use hearth_runtime::backup::{BackupPlan, SQUASHED_COMMIT_MESSAGE, run_backup_cycle, snapshot_message};
use hearth_runtime::event_queue;

fn noon() -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
}

#[test]
fn test_snapshot_message_format() {
    assert_eq!(snapshot_message(noon()), "Backup: 2024-05-01 12:30");
}

#[tokio::test]
async fn test_squash_only_when_count_exceeds_two() {
    let vcs = ScriptedVcs::with_counts([1, 2, 3, 4]);
    let plan = BackupPlan::default();
    let (tx, _rx) = event_queue();

    let mut resets = Vec::new();
    for _ in 0..4 {
        let outcome = run_backup_cycle(&vcs, &plan, noon(), &tx).await;
        assert!(matches!(outcome, BackupOutcome::Pushed { .. }));
        let reset = vcs.take_calls().into_iter().find_map(|c| match c {
            Call::Reset(n) => Some(n),
            _ => None,
        });
        resets.push(reset);
    }

    assert_eq!(resets, [None, None, Some(2), Some(3)]);
}

#[tokio::test]
async fn test_squash_step_order() {
    let vcs = ScriptedVcs::with_counts([5]);
    let (tx, mut rx) = event_queue();

    let outcome = run_backup_cycle(&vcs, &BackupPlan::default(), noon(), &tx).await;

    let message = "Backup: 2024-05-01 12:30".to_string();
    assert_eq!(
        vcs.calls(),
        [
            Call::Stage,
            Call::Commit(message.clone()),
            Call::Count,
            Call::Reset(4),
            Call::Commit(SQUASHED_COMMIT_MESSAGE.to_string()),
            Call::Stage,
            Call::Commit(message),
            Call::Push("origin".into(), "main".into()),
        ]
    );
    assert_eq!(
        outcome,
        BackupOutcome::Pushed {
            branch: "main".into(),
            squashed_from: Some(5)
        }
    );
    assert_eq!(
        rx.drain(),
        [Event::raw(StreamRole::Backup, "Cleaning old backups (5 -> 2)")]
    );
}

#[tokio::test]
async fn test_history_stays_at_two_commits() {
    let repo = SimulatedRepo::default();
    let plan = BackupPlan::default();
    let (tx, _rx) = event_queue();

    for cycle in 1..=6u32 {
        repo.touch();
        let outcome = run_backup_cycle(&repo, &plan, noon(), &tx).await;
        assert!(outcome.reached_remote(), "cycle {cycle}: {outcome:?}");
        assert_eq!(repo.history().len(), cycle.min(2) as usize);
    }

    assert_eq!(repo.history()[1], SQUASHED_COMMIT_MESSAGE);
}

#[tokio::test]
async fn test_unchanged_tree_ends_early_without_push() {
    let vcs = ScriptedVcs {
        nothing_to_commit: true,
        ..ScriptedVcs::default()
    };
    let (tx, _rx) = event_queue();

    let outcome = run_backup_cycle(&vcs, &BackupPlan::default(), noon(), &tx).await;

    assert_eq!(outcome, BackupOutcome::NoChanges);
    assert!(outcome.success());
    assert!(!vcs.calls().iter().any(|c| matches!(c, Call::Push(..))));
}

#[tokio::test]
async fn test_push_falls_back_to_master() {
    let vcs = ScriptedVcs::with_counts([1]).failing_branches(&["main"]);
    let (tx, _rx) = event_queue();

    let outcome = run_backup_cycle(&vcs, &BackupPlan::default(), noon(), &tx).await;

    assert_eq!(
        outcome,
        BackupOutcome::Pushed {
            branch: "master".into(),
            squashed_from: None
        }
    );
    let pushes: Vec<_> = vcs
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Push(..)))
        .collect();
    assert_eq!(
        pushes,
        [
            Call::Push("origin".into(), "main".into()),
            Call::Push("origin".into(), "master".into()),
        ]
    );
}

#[tokio::test]
async fn test_both_pushes_failing_records_no_success() {
    let vcs = ScriptedVcs::with_counts([1]).failing_branches(&["main", "master"]);
    let (tx, _rx) = event_queue();

    let outcome = run_backup_cycle(&vcs, &BackupPlan::default(), noon(), &tx).await;

    assert!(matches!(
        outcome,
        BackupOutcome::Failed {
            step: BackupStep::Push,
            ..
        }
    ));
    assert!(!outcome.success());

    let mut record = BackupRecord::default();
    record.record(noon(), &outcome);
    assert_eq!(record.last_success, None);
    assert_eq!(record.last_completed, Some(noon()));
}

#[tokio::test]
async fn test_stage_failure_aborts_cycle() {
    let vcs = ScriptedVcs {
        fail_stage: true,
        ..ScriptedVcs::default()
    };
    let (tx, _rx) = event_queue();

    let outcome = run_backup_cycle(&vcs, &BackupPlan::default(), noon(), &tx).await;

    assert!(matches!(
        outcome,
        BackupOutcome::Failed {
            step: BackupStep::Stage,
            ..
        }
    ));
    assert_eq!(vcs.calls(), [Call::Stage]);
}

#[tokio::test]
async fn test_count_failure_aborts_before_push() {
    // No scripted counts: commit_count fails.
    let vcs = ScriptedVcs::default();
    let (tx, _rx) = event_queue();

    let outcome = run_backup_cycle(&vcs, &BackupPlan::default(), noon(), &tx).await;

    assert!(matches!(
        outcome,
        BackupOutcome::Failed {
            step: BackupStep::CountCommits,
            ..
        }
    ));
    assert!(!vcs.calls().iter().any(|c| matches!(c, Call::Push(..))));
}
