use jobcast::coordinator::registry::{JobRecord, JobRegistry, JobStatus};
use uuid::Uuid;

#[test]
fn test_ingest_skips_blank_lines() {
    let mut registry = JobRegistry::new();

    let added = registry.ingest_lines(["echo 1", "", "   ", "echo 2"]);

    assert_eq!(added, 2);
    assert_eq!(registry.pending_count(), 2);
    registry.validate().unwrap();
}

#[test]
fn test_assignment_order_is_fifo() {
    let mut registry = JobRegistry::new();
    let lines: Vec<String> = (0..100).map(|i| format!("cmd-{i}")).collect();
    registry.ingest_lines(&lines);

    for (i, expected) in lines.iter().enumerate() {
        let assignment = registry.take_next(i as u64).unwrap();
        assert_eq!(&assignment.command, expected);
    }
    assert!(registry.take_next(0).is_none());
}

#[test]
fn test_take_next_marks_in_work() {
    let mut registry = JobRegistry::new();
    registry.ingest_lines(["echo hello"]);

    let assignment = registry.take_next(7).unwrap();

    assert_eq!(registry.pending_count(), 0);
    assert!(registry.has_in_work());
    assert_eq!(registry.worker_for(&assignment.id), Some(7));
    assert_eq!(
        registry.job(&assignment.id).unwrap().status,
        JobStatus::InWork
    );
    registry.validate().unwrap();
}

#[test]
fn test_mark_done() {
    let mut registry = JobRegistry::new();
    registry.ingest_lines(["echo hello"]);
    let assignment = registry.take_next(0).unwrap();

    assert!(registry.mark_done(&assignment.id));

    assert_eq!(registry.job(&assignment.id).unwrap().status, JobStatus::Done);
    assert!(!registry.has_in_work());
    assert_eq!(registry.failed_count(), 0);
    registry.validate().unwrap();
}

#[test]
fn test_mark_failed_appends_to_failed_list() {
    let mut registry = JobRegistry::new();
    registry.ingest_lines(["false"]);
    let assignment = registry.take_next(0).unwrap();

    assert!(registry.mark_failed(&assignment.id));

    assert_eq!(
        registry.job(&assignment.id).unwrap().status,
        JobStatus::Failed
    );
    assert_eq!(registry.failed_ids(), &[assignment.id]);
    assert!(!registry.has_in_work());
    registry.validate().unwrap();
}

#[test]
fn test_unknown_ids_are_rejected() {
    let mut registry = JobRegistry::new();
    assert!(!registry.mark_done(&Uuid::new_v4()));
    assert!(!registry.mark_failed(&Uuid::new_v4()));
}

#[test]
fn test_clear_pending_leaves_in_work_alone() {
    let mut registry = JobRegistry::new();
    registry.ingest_lines(["sleep 60", "echo a", "echo b"]);
    let assignment = registry.take_next(0).unwrap();

    registry.clear_pending();

    assert_eq!(registry.pending_count(), 0);
    assert!(registry.has_in_work());
    assert_eq!(registry.worker_for(&assignment.id), Some(0));
    registry.validate().unwrap();
}

#[test]
fn test_restore_merge_keeps_only_pending() {
    let mut registry = JobRegistry::new();

    let pending = JobRecord::new("echo keep".to_string());
    let mut done = JobRecord::new("echo done".to_string());
    done.status = JobStatus::Done;
    let mut failed = JobRecord::new("echo failed".to_string());
    failed.status = JobStatus::Failed;

    let queued = registry.restore_merge(vec![pending.clone(), done.clone(), failed.clone()]);

    assert_eq!(queued, 1);
    assert_eq!(registry.pending_count(), 1);
    assert_eq!(registry.job(&pending.id), Some(&pending));
    assert!(registry.job(&done.id).is_none());
    assert!(registry.job(&failed.id).is_none());
    registry.validate().unwrap();
}

#[test]
fn test_restore_merge_overwrites_on_collision() {
    let mut registry = JobRegistry::new();
    registry.ingest_lines(["echo original"]);
    let original = registry.take_next(0).unwrap();
    registry.mark_done(&original.id);

    let replacement = JobRecord {
        id: original.id,
        command: "echo replacement".to_string(),
        status: JobStatus::Pending,
    };
    let queued = registry.restore_merge(vec![replacement]);

    assert_eq!(queued, 1);
    let record = registry.job(&original.id).unwrap();
    assert_eq!(record.command, "echo replacement");
    assert_eq!(record.status, JobStatus::Pending);
}

#[test]
fn test_no_id_is_queued_and_in_work_at_once() {
    let mut registry = JobRegistry::new();
    registry.ingest_lines(["echo 1", "echo 2", "echo 3"]);

    let first = registry.take_next(0).unwrap();
    let second = registry.take_next(1).unwrap();
    registry.mark_done(&first.id);
    registry.mark_failed(&second.id);

    registry.validate().unwrap();
    assert_eq!(registry.pending_count(), 1);
}
