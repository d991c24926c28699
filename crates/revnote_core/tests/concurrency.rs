use revnote_core::{
    InMemoryNoteRegistry, NoteRegistry, NoteService, NoteServiceError, SqliteNoteRegistry,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

const WORKERS: usize = 8;

fn shared_services() -> Vec<(&'static str, Arc<NoteService<Box<dyn NoteRegistry>>>)> {
    vec![
        (
            "memory",
            Arc::new(NoteService::new(
                Box::new(InMemoryNoteRegistry::new()) as Box<dyn NoteRegistry>
            )),
        ),
        (
            "sqlite",
            Arc::new(NoteService::new(
                Box::new(SqliteNoteRegistry::open_in_memory().unwrap()) as Box<dyn NoteRegistry>,
            )),
        ),
    ]
}

#[test]
fn concurrent_creates_with_same_alias_admit_exactly_one() {
    for (backend, service) in shared_services() {
        let barrier = Arc::new(Barrier::new(WORKERS));
        let handles: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    service.create_note(format!("worker {worker}"), Some("contested"))
                })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => created += 1,
                Err(NoteServiceError::AliasConflict(_)) => conflicts += 1,
                Err(other) => panic!("{backend}: unexpected error: {other}"),
            }
        }

        assert_eq!(created, 1, "{backend}");
        assert_eq!(conflicts, WORKERS - 1, "{backend}");
        assert_eq!(service.registry().len().unwrap(), 1, "{backend}");
    }
}

#[test]
fn concurrent_updates_claim_distinct_contiguous_indices() {
    const UPDATES_PER_WORKER: usize = 10;

    for (backend, service) in shared_services() {
        service.create_note("seed", Some("busy")).unwrap();
        let barrier = Arc::new(Barrier::new(WORKERS));

        let handles: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    (0..UPDATES_PER_WORKER)
                        .map(|step| {
                            service
                                .update_note("busy", format!("w{worker}-s{step}"))
                                .unwrap()
                                .metadata()
                                .current_revision
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut claimed = BTreeSet::new();
        for handle in handles {
            for index in handle.join().unwrap() {
                assert!(claimed.insert(index), "{backend}: index {index} claimed twice");
            }
        }

        let expected_total = 1 + WORKERS * UPDATES_PER_WORKER;
        let revisions = service.get_revisions("busy").unwrap();
        assert_eq!(revisions.len(), expected_total, "{backend}");
        for (position, revision) in revisions.iter().enumerate() {
            assert_eq!(revision.index() as usize, position + 1, "{backend}");
        }
        assert_eq!(revisions[0].content(), "seed", "{backend}");
    }
}

#[test]
fn concurrent_delete_and_update_never_resurrect_a_note() {
    for (backend, service) in shared_services() {
        service.create_note("doomed", Some("race")).unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let updater = {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for step in 0..50 {
                    match service.update_note("race", format!("step {step}")) {
                        Ok(_) | Err(NoteServiceError::NoteNotFound(_)) => {}
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
            })
        };
        barrier.wait();
        service.delete_note("race").unwrap();
        updater.join().unwrap();

        assert!(
            service.get_note_by_id_or_alias("race").unwrap().is_none(),
            "{backend}"
        );
    }
}
