use std::sync::OnceLock;

use regex::Regex;

use crate::applications::domain::{
    Address, BankCode, BankPreferences, BusinessAddress, PersonalReference, RelativeName,
};

/// Parses `"Last, First Middle Suffix"`.
///
/// With a single comma the first part is the last name and the given names are split on
/// whitespace: one token is a first name, two are first and middle, three or more put the last
/// token in `suffix` and the inner tokens in `middle_name`. Without a comma every token is a
/// given name and the last name stays empty.
pub fn parse_relative_name(text: &str) -> RelativeName {
    let text = text.trim();
    if text.is_empty() {
        return RelativeName::default();
    }

    let parts: Vec<&str> = text.split(',').collect();
    if let [last, given] = parts.as_slice() {
        let mut name = given_names(given.split_whitespace());
        name.last_name = last.trim().to_string();
        return name;
    }

    given_names(parts.iter().flat_map(|part| part.split_whitespace()))
}

fn given_names<'a>(tokens: impl Iterator<Item = &'a str>) -> RelativeName {
    let tokens: Vec<&str> = tokens.collect();
    let mut name = RelativeName::default();
    match tokens.as_slice() {
        [] => {}
        [first] => name.first_name = first.to_string(),
        [first, middle] => {
            name.first_name = first.to_string();
            name.middle_name = middle.to_string();
        }
        [first, inner @ .., suffix] => {
            name.first_name = first.to_string();
            name.middle_name = inner.join(" ");
            name.suffix = suffix.to_string();
        }
    }
    name
}

fn positional<const N: usize>(text: &str) -> [String; N] {
    let mut fields: [String; N] = std::array::from_fn(|_| String::new());
    if text.trim().is_empty() {
        return fields;
    }
    for (slot, part) in fields.iter_mut().zip(text.split(',')) {
        *slot = part.trim().to_string();
    }
    fields
}

/// Parses `"street, barangay, city, zip, province"`. Missing parts stay empty; extra parts are ignored.
pub fn parse_address(text: &str) -> Address {
    let [street, barangay, city, zip_code, province] = positional::<5>(text);
    Address {
        street,
        barangay,
        city,
        zip_code,
        province,
    }
}

pub fn parse_business_address(text: &str) -> BusinessAddress {
    let [street, barangay, city, zip_code, unit_floor, building_tower, lot_no] =
        positional::<7>(text);
    BusinessAddress {
        street,
        barangay,
        city,
        zip_code,
        unit_floor,
        building_tower,
        lot_no,
    }
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.*?)\s*\(([^()]*)\)\s+(\d+)$").expect("personal reference pattern compiles")
    })
}

/// Parses `"Last, First Middle Suffix (Relationship) MobileNumber"`.
///
/// Text without the trailing `(Relationship) digits` part yields an all-empty reference.
pub fn parse_personal_reference(text: &str) -> PersonalReference {
    let Some(captures) = reference_pattern().captures(text.trim()) else {
        return PersonalReference::default();
    };

    let field = |index: usize| {
        captures
            .get(index)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };

    PersonalReference {
        name: parse_relative_name(&field(1)),
        relationship: field(2),
        mobile_number: field(3),
    }
}

/// Parses a comma-joined bank list. Every bank is present in the result.
pub fn parse_bank_preferences(text: &str) -> BankPreferences {
    let tokens: Vec<String> = text
        .split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let mut preferences = BankPreferences::default();
    for code in BankCode::ordered() {
        let requested = code
            .aliases()
            .iter()
            .any(|alias| tokens.iter().any(|token| token == alias));
        preferences.set(code, requested);
    }
    preferences
}
