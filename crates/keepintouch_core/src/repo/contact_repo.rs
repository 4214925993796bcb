//! Contact cache repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD + query-all over the `contacts` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `ContactRecord::validate()` before SQL mutations.
//! - Every write is one statement or one transaction: a failed write leaves
//!   the previous rows untouched.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `id` and `directory_id` are never rewritten by updates.

use crate::db::{DbError, Store};
use crate::model::contact::{Birthday, ContactId, ContactRecord, ContactValidationError, ReminderGroup};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    name,
    phone_number,
    birthday_month,
    birthday_day,
    birthday_year,
    reminder_group,
    directory_id
FROM contacts";

const CONTACT_INSERT_SQL: &str = "INSERT INTO contacts (
    id,
    name,
    phone_number,
    birthday_month,
    birthday_day,
    birthday_year,
    reminder_group,
    directory_id
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContactValidationError),
    Db(DbError),
    NotFound(ContactId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the local contact cache.
pub trait ContactRepository: Send + Sync {
    fn create_contact(&self, contact: &ContactRecord) -> RepoResult<ContactId>;
    /// Inserts all records in one transaction; either every row lands or none.
    fn create_contacts(&self, contacts: &[ContactRecord]) -> RepoResult<usize>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<ContactRecord>>;
    /// Lists every cached contact ordered by name, then id.
    fn list_contacts(&self) -> RepoResult<Vec<ContactRecord>>;
    /// Replaces name, phone, birthday and group of an existing record.
    fn update_contact(&self, contact: &ContactRecord) -> RepoResult<()>;
    fn update_group(&self, id: ContactId, group: ReminderGroup) -> RepoResult<()>;
    fn delete_contact(&self, id: ContactId) -> RepoResult<()>;
    fn count(&self) -> RepoResult<u64>;

    /// Emptiness is the only signal that triggers a directory import.
    fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.count()? == 0)
    }
}

/// SQLite-backed contact cache.
#[derive(Debug, Clone)]
pub struct SqliteContactRepository {
    store: Store,
}

impl SqliteContactRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl ContactRepository for SqliteContactRepository {
    fn create_contact(&self, contact: &ContactRecord) -> RepoResult<ContactId> {
        contact.validate()?;
        self.store
            .with_conn(|conn| insert_contact(conn, contact).map_err(RepoError::from))?;
        Ok(contact.id)
    }

    fn create_contacts(&self, contacts: &[ContactRecord]) -> RepoResult<usize> {
        for contact in contacts {
            contact.validate()?;
        }

        self.store.with_conn(|conn| {
            let tx = conn.transaction()?;
            for contact in contacts {
                insert_contact(&tx, contact)?;
            }
            tx.commit()?;
            Ok(contacts.len())
        })
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<ContactRecord>> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{CONTACT_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id.to_string()])?;
            match rows.next()? {
                Some(row) => Ok(Some(parse_contact_row(row)?)),
                None => Ok(None),
            }
        })
    }

    fn list_contacts(&self) -> RepoResult<Vec<ContactRecord>> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{CONTACT_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
            ))?;
            let mut rows = stmt.query([])?;
            let mut contacts = Vec::new();
            while let Some(row) = rows.next()? {
                contacts.push(parse_contact_row(row)?);
            }
            Ok(contacts)
        })
    }

    fn update_contact(&self, contact: &ContactRecord) -> RepoResult<()> {
        contact.validate()?;
        let (month, day, year) = birthday_columns(contact.birthday.as_ref());

        let changed = self.store.with_conn(|conn| {
            conn.execute(
                "UPDATE contacts
                 SET
                    name = ?1,
                    phone_number = ?2,
                    birthday_month = ?3,
                    birthday_day = ?4,
                    birthday_year = ?5,
                    reminder_group = ?6,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?7;",
                params![
                    contact.name.trim(),
                    contact.phone_number.as_deref(),
                    month,
                    day,
                    year,
                    contact.group.as_str(),
                    contact.id.to_string(),
                ],
            )
            .map_err(RepoError::from)
        })?;

        if changed == 0 {
            return Err(RepoError::NotFound(contact.id));
        }
        Ok(())
    }

    fn update_group(&self, id: ContactId, group: ReminderGroup) -> RepoResult<()> {
        let changed = self.store.with_conn(|conn| {
            conn.execute(
                "UPDATE contacts
                 SET
                    reminder_group = ?1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?2;",
                params![group.as_str(), id.to_string()],
            )
            .map_err(RepoError::from)
        })?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<()> {
        let changed = self.store.with_conn(|conn| {
            conn.execute("DELETE FROM contacts WHERE id = ?1;", [id.to_string()])
                .map_err(RepoError::from)
        })?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        self.store.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM contacts;", [], |row| row.get(0))?;
            u64::try_from(count)
                .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
        })
    }
}

fn insert_contact(conn: &Connection, contact: &ContactRecord) -> rusqlite::Result<usize> {
    let (month, day, year) = birthday_columns(contact.birthday.as_ref());
    conn.execute(
        CONTACT_INSERT_SQL,
        params![
            contact.id.to_string(),
            contact.name.trim(),
            contact.phone_number.as_deref(),
            month,
            day,
            year,
            contact.group.as_str(),
            contact.directory_id.as_deref(),
        ],
    )
}

fn birthday_columns(birthday: Option<&Birthday>) -> (Option<u32>, Option<u32>, Option<i32>) {
    match birthday {
        Some(birthday) => (Some(birthday.month()), Some(birthday.day()), birthday.year()),
        None => (None, None, None),
    }
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<ContactRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in contacts.id"))
    })?;

    let group_text: String = row.get("reminder_group")?;
    let group = group_text.parse::<ReminderGroup>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid reminder group `{group_text}` in contacts.reminder_group"
        ))
    })?;

    let month: Option<u32> = row.get("birthday_month")?;
    let day: Option<u32> = row.get("birthday_day")?;
    let year: Option<i32> = row.get("birthday_year")?;
    let birthday = match (month, day) {
        (Some(month), Some(day)) => Some(Birthday::new(month, day, year).map_err(|err| {
            RepoError::InvalidData(format!("{err} in contacts row `{id_text}`"))
        })?),
        (None, None) => None,
        _ => {
            return Err(RepoError::InvalidData(format!(
                "partial birthday in contacts row `{id_text}`"
            )));
        }
    };

    let contact = ContactRecord {
        id,
        name: row.get("name")?,
        phone_number: row.get("phone_number")?,
        birthday,
        group,
        directory_id: row.get("directory_id")?,
    };
    contact.validate()?;
    Ok(contact)
}
