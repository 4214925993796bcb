//! Birthday views derived from the merged contact set.
//!
//! # Responsibility
//! - Filter contacts by birth month and order them by day.
//! - Map a month/day to its zodiac sign.
//!
//! # Invariants
//! - Pure functions of their inputs; nothing here touches storage.
//! - Contacts without a phone number stay in month views but are never
//!   actionable.

use crate::model::contact::{month_name, Birthday, ContactId, ContactRecord};
use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Western zodiac signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub fn glyph(self) -> char {
        match self {
            Self::Aries => '♈',
            Self::Taurus => '♉',
            Self::Gemini => '♊',
            Self::Cancer => '♋',
            Self::Leo => '♌',
            Self::Virgo => '♍',
            Self::Libra => '♎',
            Self::Scorpio => '♏',
            Self::Sagittarius => '♐',
            Self::Capricorn => '♑',
            Self::Aquarius => '♒',
            Self::Pisces => '♓',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Aries => "Aries",
            Self::Taurus => "Taurus",
            Self::Gemini => "Gemini",
            Self::Cancer => "Cancer",
            Self::Leo => "Leo",
            Self::Virgo => "Virgo",
            Self::Libra => "Libra",
            Self::Scorpio => "Scorpio",
            Self::Sagittarius => "Sagittarius",
            Self::Capricorn => "Capricorn",
            Self::Aquarius => "Aquarius",
            Self::Pisces => "Pisces",
        }
    }
}

/// First (month, day) of each sign within a calendar year. Capricorn also
/// covers Jan 1-19, before the first row.
const SIGN_STARTS: [(u32, u32, ZodiacSign); 12] = [
    (1, 20, ZodiacSign::Aquarius),
    (2, 19, ZodiacSign::Pisces),
    (3, 21, ZodiacSign::Aries),
    (4, 20, ZodiacSign::Taurus),
    (5, 21, ZodiacSign::Gemini),
    (6, 21, ZodiacSign::Cancer),
    (7, 23, ZodiacSign::Leo),
    (8, 23, ZodiacSign::Virgo),
    (9, 23, ZodiacSign::Libra),
    (10, 23, ZodiacSign::Scorpio),
    (11, 22, ZodiacSign::Sagittarius),
    (12, 22, ZodiacSign::Capricorn),
];

/// Zodiac sign for a month/day, `None` when the date does not exist.
pub fn zodiac_sign(month: u32, day: u32) -> Option<ZodiacSign> {
    Birthday::month_day(month, day).ok()?;
    let sign = SIGN_STARTS
        .iter()
        .rev()
        .find(|(start_month, start_day, _)| (month, day) >= (*start_month, *start_day))
        .map_or(ZodiacSign::Capricorn, |(_, _, sign)| *sign);
    Some(sign)
}

/// One row of the birthday month view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdayEntry {
    pub contact_id: ContactId,
    pub name: String,
    pub birthday: Birthday,
    /// "June 3, 1990" or "June 3" depending on whether the year is known.
    pub display_date: String,
    pub zodiac: ZodiacSign,
    pub phone_number: Option<String>,
    /// Address for a message-compose action; `None` when not actionable.
    pub compose_address: Option<String>,
}

impl BirthdayEntry {
    pub fn actionable(&self) -> bool {
        self.compose_address.is_some()
    }
}

/// Contacts born in `selected_month`, ascending by day of month.
///
/// Ties keep the input order.
pub fn month_view(contacts: &[ContactRecord], selected_month: u32) -> Vec<BirthdayEntry> {
    let mut entries: Vec<BirthdayEntry> = contacts
        .iter()
        .filter_map(|contact| {
            let birthday = contact.birthday?;
            (birthday.month() == selected_month).then(|| to_entry(contact, birthday))
        })
        .collect();
    entries.sort_by_key(|entry| entry.birthday.day());
    entries
}

/// Month the view opens on.
pub fn current_month() -> u32 {
    Local::now().month()
}

/// Month picker labels, January first.
pub fn month_labels() -> Vec<(u32, &'static str)> {
    (1..=12)
        .filter_map(|month| month_name(month).map(|name| (month, name)))
        .collect()
}

fn to_entry(contact: &ContactRecord, birthday: Birthday) -> BirthdayEntry {
    BirthdayEntry {
        contact_id: contact.id,
        name: contact.name.clone(),
        birthday,
        display_date: birthday.display_text(),
        zodiac: zodiac_sign(birthday.month(), birthday.day()).unwrap_or(ZodiacSign::Capricorn),
        phone_number: contact.phone_number.clone(),
        compose_address: contact.phone_number.as_deref().and_then(compose_address),
    }
}

fn compose_address(phone: &str) -> Option<String> {
    let compact = WHITESPACE_RE.replace_all(phone, "");
    (!compact.is_empty()).then(|| compact.into_owned())
}

#[cfg(test)]
mod tests {
    use super::{compose_address, month_labels, zodiac_sign, ZodiacSign};

    #[test]
    fn every_sign_boundary_is_inclusive() {
        let cases = [
            ((1, 19), ZodiacSign::Capricorn),
            ((1, 20), ZodiacSign::Aquarius),
            ((2, 18), ZodiacSign::Aquarius),
            ((2, 19), ZodiacSign::Pisces),
            ((4, 19), ZodiacSign::Aries),
            ((4, 20), ZodiacSign::Taurus),
            ((5, 20), ZodiacSign::Taurus),
            ((6, 20), ZodiacSign::Gemini),
            ((7, 22), ZodiacSign::Cancer),
            ((8, 22), ZodiacSign::Leo),
            ((9, 22), ZodiacSign::Virgo),
            ((10, 22), ZodiacSign::Libra),
            ((11, 21), ZodiacSign::Scorpio),
            ((12, 21), ZodiacSign::Sagittarius),
            ((12, 22), ZodiacSign::Capricorn),
            ((12, 31), ZodiacSign::Capricorn),
        ];
        for ((month, day), expected) in cases {
            assert_eq!(zodiac_sign(month, day), Some(expected), "{month}/{day}");
        }
    }

    #[test]
    fn invalid_dates_have_no_sign() {
        assert_eq!(zodiac_sign(2, 30), None);
        assert_eq!(zodiac_sign(0, 1), None);
        assert_eq!(zodiac_sign(2, 29), Some(ZodiacSign::Pisces));
    }

    #[test]
    fn compose_address_strips_whitespace() {
        assert_eq!(compose_address("+1 555\t0100"), Some("+15550100".to_string()));
        assert_eq!(compose_address("   "), None);
    }

    #[test]
    fn month_labels_cover_the_year() {
        let labels = month_labels();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], (1, "January"));
        assert_eq!(labels[11], (12, "December"));
    }
}
