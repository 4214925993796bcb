use keepintouch_core::db::Store;
use keepintouch_core::{
    Birthday, ContactRecord, ContactRepository, ContactValidationError, ReminderGroup, RepoError,
    SqliteContactRepository,
};
use uuid::Uuid;

fn repo() -> SqliteContactRepository {
    SqliteContactRepository::new(Store::open_in_memory().unwrap())
}

#[test]
fn create_and_get_roundtrip_keeps_birthday_flag() {
    let repo = repo();
    let mut known = ContactRecord::new("Grace Hopper");
    known.phone_number = Some("+1 555 0100".to_string());
    known.birthday = Some(Birthday::with_year(1906, 12, 9).unwrap());
    let mut unknown = ContactRecord::new("Ada Lovelace");
    unknown.birthday = Some(Birthday::month_day(12, 10).unwrap());

    repo.create_contact(&known).unwrap();
    repo.create_contact(&unknown).unwrap();

    let loaded_known = repo.get_contact(known.id).unwrap().unwrap();
    let loaded_unknown = repo.get_contact(unknown.id).unwrap().unwrap();
    assert_eq!(loaded_known, known);
    assert!(loaded_known.birthday.unwrap().year_known());
    assert!(!loaded_unknown.birthday.unwrap().year_known());
}

#[test]
fn list_contacts_orders_by_name_case_insensitively() {
    let repo = repo();
    for name in ["charlie", "Alice", "bob"] {
        repo.create_contact(&ContactRecord::new(name)).unwrap();
    }

    let names: Vec<String> = repo
        .list_contacts()
        .unwrap()
        .into_iter()
        .map(|contact| contact.name)
        .collect();
    assert_eq!(names, vec!["Alice", "bob", "charlie"]);
}

#[test]
fn update_group_and_edit_keep_id_and_directory_link() {
    let repo = repo();
    let record = ContactRecord::imported("dir-7", "Linus", None, None);
    repo.create_contact(&record).unwrap();

    repo.update_group(record.id, ReminderGroup::Weekly).unwrap();
    let mut edited = repo.get_contact(record.id).unwrap().unwrap();
    assert_eq!(edited.group, ReminderGroup::Weekly);

    edited.name = "Linus T.".to_string();
    edited.phone_number = Some("555".to_string());
    edited.directory_id = Some("other".to_string());
    repo.update_contact(&edited).unwrap();

    let loaded = repo.get_contact(record.id).unwrap().unwrap();
    assert_eq!(loaded.id, record.id);
    assert_eq!(loaded.name, "Linus T.");
    assert_eq!(loaded.phone_number.as_deref(), Some("555"));
    assert_eq!(loaded.directory_id.as_deref(), Some("dir-7"));
}

#[test]
fn mutations_on_missing_id_return_not_found() {
    let repo = repo();
    let missing = Uuid::new_v4();

    assert!(matches!(
        repo.update_group(missing, ReminderGroup::Daily),
        Err(RepoError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        repo.delete_contact(missing),
        Err(RepoError::NotFound(id)) if id == missing
    ));
    let mut ghost = ContactRecord::new("ghost");
    ghost.id = missing;
    assert!(matches!(repo.update_contact(&ghost), Err(RepoError::NotFound(_))));
    assert_eq!(repo.get_contact(missing).unwrap(), None);
}

#[test]
fn delete_removes_only_target_row() {
    let repo = repo();
    let keep = ContactRecord::new("keep");
    let drop_me = ContactRecord::new("drop");
    repo.create_contacts(&[keep.clone(), drop_me.clone()]).unwrap();

    repo.delete_contact(drop_me.id).unwrap();

    assert_eq!(repo.count().unwrap(), 1);
    assert_eq!(repo.list_contacts().unwrap(), vec![keep]);
}

#[test]
fn batch_insert_is_all_or_nothing() {
    let repo = repo();
    let first = ContactRecord::imported("dup", "First", None, None);
    let second = ContactRecord::imported("dup", "Second", None, None);

    assert!(repo.create_contacts(&[first, second]).is_err());
    assert!(repo.is_empty().unwrap());
}

#[test]
fn invalid_record_is_rejected_before_write() {
    let repo = repo();
    let mut record = ContactRecord::new("   ");
    assert!(matches!(
        repo.create_contact(&record),
        Err(RepoError::Validation(ContactValidationError::EmptyName))
    ));

    record.name = "ok".to_string();
    record.phone_number = Some("  ".to_string());
    assert!(matches!(
        repo.create_contacts(&[ContactRecord::new("fine"), record]),
        Err(RepoError::Validation(ContactValidationError::BlankPhoneNumber))
    ));
    assert_eq!(repo.count().unwrap(), 0);
}
