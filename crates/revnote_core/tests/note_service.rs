use revnote_core::{
    InMemoryNoteRegistry, NoteRegistry, NoteService, NoteServiceError, SqliteNoteRegistry,
};

const TEST_NOTE: &str = "This is a test note.";

fn services() -> Vec<(&'static str, NoteService<Box<dyn NoteRegistry>>)> {
    vec![
        (
            "memory",
            NoteService::new(Box::new(InMemoryNoteRegistry::new()) as Box<dyn NoteRegistry>),
        ),
        (
            "sqlite",
            NoteService::new(
                Box::new(SqliteNoteRegistry::open_in_memory().unwrap()) as Box<dyn NoteRegistry>
            ),
        ),
    ]
}

#[test]
fn create_without_alias_is_readable_by_id() {
    for (backend, service) in services() {
        let created = service.create_note(TEST_NOTE, None).unwrap();
        let id = created.metadata().id.to_string();
        assert!(created.alias().is_none(), "{backend}");

        let loaded = service.get_note_by_id_or_alias(&id).unwrap().unwrap();
        assert_eq!(loaded.content().unwrap(), TEST_NOTE, "{backend}");
        assert_eq!(service.get_content(&id).unwrap(), TEST_NOTE, "{backend}");
    }
}

#[test]
fn create_with_alias_is_readable_by_alias_and_id() {
    for (backend, service) in services() {
        let created = service.create_note(TEST_NOTE, Some("test1")).unwrap();

        let by_alias = service.get_note_by_id_or_alias("test1").unwrap().unwrap();
        let by_id = service
            .get_note_by_id_or_alias(&created.id().to_string())
            .unwrap()
            .unwrap();
        assert_eq!(by_alias.content().unwrap(), TEST_NOTE, "{backend}");
        assert_eq!(by_alias.id(), by_id.id(), "{backend}");
        assert_eq!(by_alias.alias(), Some("test1"), "{backend}");
    }
}

#[test]
fn update_appends_revision_and_keeps_history() {
    for (backend, service) in services() {
        service.create_note(TEST_NOTE, Some("test4")).unwrap();
        let updated = service.update_note("test4", "New note text").unwrap();

        assert_eq!(updated.metadata().current_revision, 2, "{backend}");
        assert_eq!(service.get_content("test4").unwrap(), "New note text");

        let revisions = service.get_revisions("test4").unwrap();
        assert_eq!(revisions.len(), 2, "{backend}");
        assert_eq!(revisions[0].content(), TEST_NOTE, "{backend}");
        assert_eq!(revisions[1].content(), "New note text", "{backend}");
        assert_eq!(
            service.get_revision("test4", 1).unwrap().content(),
            TEST_NOTE,
            "{backend}"
        );
    }
}

#[test]
fn revision_count_tracks_content_changes() {
    for (backend, service) in services() {
        let note = service.create_note("v1", None).unwrap();
        let key = note.id().to_string();
        for step in 2..=6 {
            service.update_note(&key, format!("v{step}")).unwrap();
        }

        let revisions = service.get_revisions(&key).unwrap();
        let indices: Vec<_> = revisions.iter().map(|r| r.index()).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6], "{backend}");
        for revision in &revisions {
            assert_eq!(revision.content(), format!("v{}", revision.index()), "{backend}");
        }
        assert_eq!(service.get_content(&key).unwrap(), "v6", "{backend}");
    }
}

#[test]
fn new_note_has_single_revision_with_original_content() {
    for (backend, service) in services() {
        service.create_note(TEST_NOTE, Some("test7")).unwrap();

        assert_eq!(service.get_revisions("test7").unwrap().len(), 1, "{backend}");
        let first = service.get_revision("test7", 1).unwrap();
        assert_eq!(first.index(), 1, "{backend}");
        assert_eq!(first.content(), TEST_NOTE, "{backend}");
    }
}

#[test]
fn delete_makes_id_and_alias_miss() {
    for (backend, service) in services() {
        let created = service.create_note(TEST_NOTE, Some("test3")).unwrap();
        let id = created.id().to_string();

        service.delete_note("test3").unwrap();

        assert!(service.get_note_by_id_or_alias("test3").unwrap().is_none(), "{backend}");
        assert!(service.get_note_by_id_or_alias(&id).unwrap().is_none(), "{backend}");
        assert!(matches!(
            service.get_revisions(&id),
            Err(NoteServiceError::NoteNotFound(_))
        ));
        assert_eq!(service.registry().len().unwrap(), 0, "{backend}");
    }
}

#[test]
fn duplicate_alias_conflicts_until_owner_is_deleted() {
    for (backend, service) in services() {
        let first = service.create_note("first", Some("shared")).unwrap();

        let err = service.create_note("second", Some("shared")).unwrap_err();
        assert!(
            matches!(err, NoteServiceError::AliasConflict(ref alias) if alias == "shared"),
            "{backend}: {err}"
        );
        assert_eq!(service.get_content("shared").unwrap(), "first", "{backend}");

        service.delete_note("shared").unwrap();
        let reused = service.create_note("third", Some("shared")).unwrap();
        assert_ne!(reused.id(), first.id(), "{backend}");
        assert_eq!(service.get_content("shared").unwrap(), "third", "{backend}");
        assert_eq!(service.get_revisions("shared").unwrap().len(), 1, "{backend}");
    }
}

#[test]
fn mutations_on_missing_note_fail_with_not_found() {
    for (backend, service) in services() {
        assert!(
            service.get_note_by_id_or_alias("nope").unwrap().is_none(),
            "{backend}"
        );
        assert!(matches!(
            service.update_note("nope", "x"),
            Err(NoteServiceError::NoteNotFound(key)) if key == "nope"
        ));
        assert!(matches!(
            service.delete_note("nope"),
            Err(NoteServiceError::NoteNotFound(_))
        ));
        assert!(matches!(
            service.get_content("nope"),
            Err(NoteServiceError::NoteNotFound(_))
        ));
        assert!(matches!(
            service.get_revision("nope", 1),
            Err(NoteServiceError::NoteNotFound(_))
        ));
    }
}

#[test]
fn revision_index_outside_history_is_not_found() {
    for (backend, service) in services() {
        service.create_note("only", Some("single")).unwrap();
        for index in [0, 2, 99] {
            assert!(
                matches!(
                    service.get_revision("single", index),
                    Err(NoteServiceError::RevisionNotFound { index: found, .. }) if found == index
                ),
                "{backend} index {index}"
            );
        }
    }
}

#[test]
fn empty_and_multiline_content_round_trip() {
    for (backend, service) in services() {
        for content in ["", "line one\nline two\n", "ünïcødé ✓"] {
            let note = service.create_note(content, None).unwrap();
            assert_eq!(
                service.get_content(&note.id().to_string()).unwrap(),
                content,
                "{backend}"
            );
        }
    }
}
