//! Cached contact domain model.
//!
//! # Responsibility
//! - Define the record owned by the local contact cache.
//! - Carry the explicit "year known" flag for birthdays so no call site
//!   re-derives it from a placeholder year.
//!
//! # Invariants
//! - `id` is stable and never reused for another contact.
//! - `group` is authoritative in the cache only.
//! - A `Birthday` always holds a valid month/day pair.

use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a cached contact.
pub type ContactId = Uuid;

/// Name used when the directory provides no usable display name.
pub const UNKNOWN_CONTACT_NAME: &str = "Unknown";

/// Years some directories store when the real birth year was never entered.
const PLACEHOLDER_YEARS: &[i32] = &[1604, 1900];

/// Reach-out cadence assigned by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderGroup {
    Daily,
    Weekly,
    Monthly,
    Rarely,
    Never,
}

impl ReminderGroup {
    /// All groups in display order.
    pub const ALL: [ReminderGroup; 5] = [
        ReminderGroup::Daily,
        ReminderGroup::Weekly,
        ReminderGroup::Monthly,
        ReminderGroup::Rarely,
        ReminderGroup::Never,
    ];

    /// Storage/wire key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Rarely => "rarely",
            Self::Never => "never",
        }
    }

    /// Human-readable section title.
    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Rarely => "Rarely",
            Self::Never => "Never",
        }
    }
}

impl Default for ReminderGroup {
    fn default() -> Self {
        Self::Never
    }
}

impl Display for ReminderGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReminderGroup {
    type Err = ContactValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == normalized)
            .ok_or_else(|| ContactValidationError::UnknownGroup(value.to_string()))
    }
}

/// Validation errors for contact fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    EmptyName,
    BlankPhoneNumber,
    InvalidBirthday {
        month: u32,
        day: u32,
        year: Option<i32>,
    },
    UnknownGroup(String),
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "contact name cannot be empty"),
            Self::BlankPhoneNumber => write!(f, "phone number cannot be blank when present"),
            Self::InvalidBirthday { month, day, year } => match year {
                Some(year) => write!(f, "invalid birthday {year:04}-{month:02}-{day:02}"),
                None => write!(f, "invalid birthday --{month:02}-{day:02}"),
            },
            Self::UnknownGroup(value) => write!(f, "unknown reminder group `{value}`"),
        }
    }
}

impl Error for ContactValidationError {}

/// Birth date whose year may be unknown.
///
/// `year == None` is the explicit "year unknown" flag: formatting and
/// comparisons then use month and day only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BirthdayParts")]
pub struct Birthday {
    month: u32,
    day: u32,
    year: Option<i32>,
}

/// Unvalidated wire shape of a [`Birthday`].
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BirthdayParts {
    pub month: u32,
    pub day: u32,
    #[serde(default)]
    pub year: Option<i32>,
}

impl TryFrom<BirthdayParts> for Birthday {
    type Error = ContactValidationError;

    fn try_from(parts: BirthdayParts) -> Result<Self, Self::Error> {
        Self::new(parts.month, parts.day, parts.year)
    }
}

impl Birthday {
    /// Builds a birthday, validating the day against the month (and the year
    /// when known).
    pub fn new(month: u32, day: u32, year: Option<i32>) -> Result<Self, ContactValidationError> {
        // Leap reference year admits Feb 29 when the real year is unknown.
        let check_year = year.unwrap_or(2000);
        if NaiveDate::from_ymd_opt(check_year, month, day).is_none() {
            return Err(ContactValidationError::InvalidBirthday { month, day, year });
        }
        Ok(Self { month, day, year })
    }

    /// Birthday with unknown year.
    pub fn month_day(month: u32, day: u32) -> Result<Self, ContactValidationError> {
        Self::new(month, day, None)
    }

    /// Birthday with known year.
    pub fn with_year(year: i32, month: u32, day: u32) -> Result<Self, ContactValidationError> {
        Self::new(month, day, Some(year))
    }

    /// Converts raw directory date components into a birthday.
    ///
    /// This is the only place that maps placeholder years (missing, `<= 1`,
    /// 1604, 1900) to "year unknown".
    pub fn from_directory_parts(
        year: Option<i32>,
        month: u32,
        day: u32,
    ) -> Result<Self, ContactValidationError> {
        let year = year.filter(|value| !is_placeholder_year(*value));
        Self::new(month, day, year)
    }

    /// Same birthday with a placeholder year turned into "year unknown".
    pub fn normalized(self) -> Self {
        match self.year {
            Some(year) if is_placeholder_year(year) => Self { year: None, ..self },
            _ => self,
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn year_known(&self) -> bool {
        self.year.is_some()
    }

    /// Compares month and day only, ignoring the year flag.
    pub fn same_month_day(&self, other: &Birthday) -> bool {
        self.month == other.month && self.day == other.day
    }

    /// Sort key within a calendar year.
    pub fn month_day_key(&self) -> (u32, u32) {
        (self.month, self.day)
    }

    /// Full long date ("June 3, 1990") when the year is known, otherwise
    /// "June 3".
    pub fn display_text(&self) -> String {
        let month_name = month_name(self.month).unwrap_or("?");
        match self.year.and_then(|year| NaiveDate::from_ymd_opt(year, self.month, self.day)) {
            Some(date) => format!("{month_name} {}, {}", date.day(), date.year()),
            None => format!("{month_name} {}", self.day),
        }
    }
}

impl Display for Birthday {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_text())
    }
}

fn is_placeholder_year(year: i32) -> bool {
    year <= 1 || PLACEHOLDER_YEARS.contains(&year)
}

/// English month name for `1..=12`.
pub fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|value| Month::try_from(value).ok())
        .map(|value| value.name())
}

/// Contact record persisted in the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Assigned at import time; immutable afterwards.
    pub id: ContactId,
    pub name: String,
    pub phone_number: Option<String>,
    pub birthday: Option<Birthday>,
    pub group: ReminderGroup,
    /// Directory entry this record was imported from, when any.
    pub directory_id: Option<String>,
}

impl ContactRecord {
    /// Creates a local-only record with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone_number: None,
            birthday: None,
            group: ReminderGroup::default(),
            directory_id: None,
        }
    }

    /// Builds the record created for one directory contact during import.
    ///
    /// The reminder group starts as `Never`; blank names become
    /// [`UNKNOWN_CONTACT_NAME`], blank phone numbers are dropped and
    /// placeholder birth years become unknown.
    pub fn imported(
        directory_id: impl Into<String>,
        name: &str,
        phone_number: Option<&str>,
        birthday: Option<Birthday>,
    ) -> Self {
        let name = match name.trim() {
            "" => UNKNOWN_CONTACT_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            id: Uuid::new_v4(),
            name,
            phone_number: phone_number
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            birthday: birthday.map(Birthday::normalized),
            group: ReminderGroup::Never,
            directory_id: Some(directory_id.into()),
        }
    }

    /// Validates field-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.name.trim().is_empty() {
            return Err(ContactValidationError::EmptyName);
        }
        if self
            .phone_number
            .as_deref()
            .is_some_and(|phone| phone.trim().is_empty())
        {
            return Err(ContactValidationError::BlankPhoneNumber);
        }
        if let Some(birthday) = self.birthday {
            Birthday::new(birthday.month, birthday.day, birthday.year)?;
        }
        Ok(())
    }

    /// Whether a message-compose affordance can be offered.
    pub fn has_phone_number(&self) -> bool {
        self.phone_number.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{Birthday, ContactRecord, ContactValidationError, ReminderGroup};

    #[test]
    fn placeholder_years_become_unknown() {
        for year in [None, Some(0), Some(1), Some(1604), Some(1900)] {
            let birthday = Birthday::from_directory_parts(year, 6, 3).unwrap();
            assert!(!birthday.year_known(), "year {year:?} should be a placeholder");
        }
        let real = Birthday::from_directory_parts(Some(1990), 6, 3).unwrap();
        assert_eq!(real.year(), Some(1990));
    }

    #[test]
    fn display_text_branches_on_year_flag() {
        assert_eq!(
            Birthday::with_year(1990, 6, 3).unwrap().display_text(),
            "June 3, 1990"
        );
        assert_eq!(Birthday::month_day(12, 25).unwrap().display_text(), "December 25");
    }

    #[test]
    fn feb_29_requires_leap_year_only_when_year_known() {
        assert!(Birthday::month_day(2, 29).is_ok());
        assert!(Birthday::with_year(2000, 2, 29).is_ok());
        assert!(matches!(
            Birthday::with_year(2001, 2, 29),
            Err(ContactValidationError::InvalidBirthday { .. })
        ));
        assert!(Birthday::month_day(4, 31).is_err());
        assert!(Birthday::month_day(13, 1).is_err());
    }

    #[test]
    fn same_month_day_ignores_year() {
        let a = Birthday::with_year(1980, 7, 1).unwrap();
        let b = Birthday::month_day(7, 1).unwrap();
        assert!(a.same_month_day(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn imported_record_defaults_group_and_normalizes_fields() {
        let record = ContactRecord::imported("dir-1", "  ", Some("   "), None);
        assert_eq!(record.name, "Unknown");
        assert_eq!(record.phone_number, None);
        assert_eq!(record.group, ReminderGroup::Never);
        assert_eq!(record.directory_id.as_deref(), Some("dir-1"));
        record.validate().unwrap();
    }

    #[test]
    fn deserialized_birthday_is_validated() {
        let err = serde_json::from_str::<Birthday>(r#"{"month": 2, "day": 30, "year": null}"#);
        assert!(err.is_err());

        let leap = serde_json::from_str::<Birthday>(r#"{"month": 2, "day": 29}"#).unwrap();
        assert_eq!(leap, Birthday::month_day(2, 29).unwrap());
    }

    #[test]
    fn validate_rejects_impossible_birthday() {
        let mut record = ContactRecord::new("Ada");
        record.birthday = Some(Birthday {
            month: 2,
            day: 30,
            year: None,
        });
        assert!(matches!(
            record.validate(),
            Err(ContactValidationError::InvalidBirthday { month: 2, day: 30, .. })
        ));
    }

    #[test]
    fn imported_record_drops_placeholder_year() {
        let birthday = Birthday::with_year(1900, 6, 3).unwrap();
        let record = ContactRecord::imported("dir-1", "Ada", None, Some(birthday));
        assert_eq!(record.birthday, Some(Birthday::month_day(6, 3).unwrap()));

        let real = Birthday::with_year(1990, 6, 3).unwrap();
        assert_eq!(real.normalized(), real);
    }

    #[test]
    fn reminder_group_parses_case_insensitively() {
        assert_eq!("Weekly".parse::<ReminderGroup>().unwrap(), ReminderGroup::Weekly);
        assert!("sometimes".parse::<ReminderGroup>().is_err());
    }
}
