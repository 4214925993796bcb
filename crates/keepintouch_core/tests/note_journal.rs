use chrono::{Local, TimeZone};
use keepintouch_core::db::Store;
use keepintouch_core::directory::Clock;
use keepintouch_core::{
    AccessStatus, ContactId, ContactRecord, ContactRepository, ContactSummary, ContactsEvent,
    CoreContext, DirectoryClient, ErrorKind, InMemoryDirectory, JournalError, MemorySettings,
    NoteEntry, SqliteContactRepository,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Clock starting at 2024-03-01 09:30 local, one minute later per call.
fn ticking_clock() -> Clock {
    let minutes = Arc::new(AtomicU32::new(0));
    Arc::new(move || {
        let offset = minutes.fetch_add(1, Ordering::SeqCst);
        Local
            .with_ymd_and_hms(2024, 3, 1, 9, 30 + offset, 0)
            .single()
            .unwrap()
    })
}

fn setup(note: &str) -> (CoreContext, Arc<InMemoryDirectory>, ContactId) {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add_contact(
        ContactSummary {
            id: "dir-1".to_string(),
            name: "Margaret".to_string(),
            phone_number: Some("555".to_string()),
            birthday: None,
            note: note.to_string(),
        },
        &[],
    );
    let client = DirectoryClient::with_clock(directory.clone(), ticking_clock());
    let context = CoreContext::from_parts(
        Store::open_in_memory().unwrap(),
        Arc::new(MemorySettings::new()),
        Arc::new(client),
    );
    let contact_id = context.engine().fetch_all().unwrap()[0].id;
    (context, directory, contact_id)
}

fn entry(timestamp: Option<&str>, body: &str) -> NoteEntry {
    NoteEntry {
        timestamp: timestamp.map(str::to_string),
        body: body.to_string(),
    }
}

#[test]
fn appends_stack_newest_first_over_prior_text() {
    let (context, directory, contact_id) = setup("met at the conference");
    let journal = context.journal();

    journal.append_entry(contact_id, "hello").unwrap();
    let entries = journal.append_entry(contact_id, "  world \n").unwrap();

    assert_eq!(
        entries,
        vec![
            entry(Some("2024-03-01 09:31"), "world"),
            entry(Some("2024-03-01 09:30"), "hello"),
            entry(None, "met at the conference"),
        ]
    );
    assert_eq!(
        directory.snapshot().contacts[0].note,
        "## 2024-03-01 09:31\nworld\n\n## 2024-03-01 09:30\nhello\n\nmet at the conference"
    );
    assert_eq!(journal.entries(contact_id).unwrap(), entries);
}

#[test]
fn blank_lines_inside_appended_text_are_collapsed() {
    let (context, directory, contact_id) = setup("older");

    let entries = context
        .journal()
        .append_entry(contact_id, "first line\n\n  \nsecond line")
        .unwrap();

    assert_eq!(
        entries,
        vec![
            entry(Some("2024-03-01 09:30"), "first line\nsecond line"),
            entry(None, "older"),
        ]
    );
    assert_eq!(
        directory.snapshot().contacts[0].note,
        "## 2024-03-01 09:30\nfirst line\nsecond line\n\nolder"
    );
}

#[test]
fn blank_text_is_rejected_without_touching_the_note() {
    let (context, directory, contact_id) = setup("keep me");

    let err = context.journal().append_entry(contact_id, " \t\n").unwrap_err();
    assert_eq!(err, JournalError::EmptyInput);
    assert_eq!(err.kind(), ErrorKind::EmptyInput);
    assert_eq!(directory.snapshot().contacts[0].note, "keep me");
}

#[test]
fn contact_without_directory_link_is_not_found() {
    let (context, _directory, _) = setup("");
    let local = ContactRecord::new("Local Only");
    SqliteContactRepository::new(context.store().clone())
        .create_contact(&local)
        .unwrap();
    context.engine().fetch_all().unwrap();

    assert_eq!(
        context.journal().append_entry(local.id, "hi").unwrap_err(),
        JournalError::NotFound(local.id)
    );
    let unknown = uuid::Uuid::new_v4();
    assert_eq!(
        context.journal().note_text(unknown).unwrap_err(),
        JournalError::NotFound(unknown)
    );
}

#[test]
fn replace_all_overwrites_whole_note() {
    let (context, directory, contact_id) = setup("## 2020-01-01 10:00\nold\n\n");
    let journal = context.journal();

    let entries = journal.replace_all(contact_id, "fresh start").unwrap();
    assert_eq!(entries, vec![entry(None, "fresh start")]);
    assert_eq!(journal.note_text(contact_id).unwrap(), "fresh start");

    journal.replace_all(contact_id, "").unwrap();
    assert!(journal.entries(contact_id).unwrap().is_empty());
    assert_eq!(directory.snapshot().contacts[0].note, "");
}

#[test]
fn confirmed_note_change_notifies_subscribers() {
    let (context, _directory, contact_id) = setup("");
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    context
        .engine()
        .subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    context.journal().append_entry(contact_id, "called").unwrap();
    let _ = context.journal().append_entry(contact_id, "");

    assert_eq!(
        events.lock().unwrap().as_slice(),
        &[ContactsEvent::NoteChanged { contact_id }]
    );
}

#[test]
fn revoked_access_is_permission_denied() {
    let (context, directory, contact_id) = setup("private");
    directory.set_access_granted(false);
    assert_eq!(
        context.directory().request_access().unwrap(),
        AccessStatus::Denied
    );

    let err = context.journal().append_entry(contact_id, "hi").unwrap_err();
    assert_eq!(err, JournalError::PermissionDenied);
    assert_eq!(directory.snapshot().contacts[0].note, "private");
}
