use keepintouch_core::{month_view, zodiac_sign, Birthday, ContactRecord, ZodiacSign};

fn contact(name: &str, birthday: Option<Birthday>, phone: Option<&str>) -> ContactRecord {
    let mut record = ContactRecord::new(name);
    record.birthday = birthday;
    record.phone_number = phone.map(str::to_string);
    record
}

fn sample() -> Vec<ContactRecord> {
    vec![
        contact("June Third", Some(Birthday::with_year(1990, 6, 3).unwrap()), Some("+1 555 0103")),
        contact("June First", Some(Birthday::month_day(6, 1).unwrap()), None),
        contact("July First", Some(Birthday::month_day(7, 1).unwrap()), Some("555")),
        contact("No Birthday", None, Some("555")),
    ]
}

#[test]
fn month_view_filters_and_sorts_by_day() {
    let entries = month_view(&sample(), 6);

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["June First", "June Third"]);
    assert_eq!(entries[0].display_date, "June 1");
    assert_eq!(entries[1].display_date, "June 3, 1990");
    assert_eq!(entries[0].zodiac, ZodiacSign::Gemini);
}

#[test]
fn contacts_without_phone_are_listed_but_not_actionable() {
    let entries = month_view(&sample(), 6);

    assert!(!entries[0].actionable());
    assert_eq!(entries[0].compose_address, None);
    assert!(entries[1].actionable());
    assert_eq!(entries[1].compose_address.as_deref(), Some("+15550103"));
}

#[test]
fn month_without_birthdays_is_empty() {
    assert!(month_view(&sample(), 2).is_empty());
    assert!(month_view(&[], 6).is_empty());
}

#[test]
fn same_day_keeps_input_order() {
    let contacts = vec![
        contact("Zed", Some(Birthday::month_day(3, 5).unwrap()), None),
        contact("Amy", Some(Birthday::month_day(3, 5).unwrap()), None),
    ];
    let names: Vec<String> = month_view(&contacts, 3).into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["Zed", "Amy"]);
}

#[test]
fn zodiac_cusp_days() {
    assert_eq!(zodiac_sign(3, 21), Some(ZodiacSign::Aries));
    assert_eq!(zodiac_sign(3, 20), Some(ZodiacSign::Pisces));
    assert_eq!(ZodiacSign::Aries.name(), "Aries");
}
