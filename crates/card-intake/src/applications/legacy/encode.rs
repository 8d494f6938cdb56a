use crate::applications::domain::{
    Address, BankPreferences, BusinessAddress, PersonalReference, RelativeName,
};

fn join_nonempty(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Writes `"Last, First Middle Suffix"`. An empty name encodes as an empty string.
pub fn encode_relative_name(name: &RelativeName) -> String {
    let given = join_nonempty(
        &[
            name.first_name.as_str(),
            name.middle_name.as_str(),
            name.suffix.as_str(),
        ],
        " ",
    );
    let last = name.last_name.trim();
    if last.is_empty() && given.is_empty() {
        return String::new();
    }
    format!("{last}, {given}").trim().to_string()
}

/// Joins fields positionally. Empty inner fields keep their slot; trailing empties are dropped.
fn encode_positional(fields: &[&str]) -> String {
    let used = fields
        .iter()
        .rposition(|field| !field.trim().is_empty())
        .map_or(0, |index| index + 1);
    fields[..used]
        .iter()
        .map(|field| field.trim())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn encode_address(address: &Address) -> String {
    encode_positional(&[
        address.street.as_str(),
        address.barangay.as_str(),
        address.city.as_str(),
        address.zip_code.as_str(),
        address.province.as_str(),
    ])
}

pub fn encode_business_address(address: &BusinessAddress) -> String {
    encode_positional(&[
        address.street.as_str(),
        address.barangay.as_str(),
        address.city.as_str(),
        address.zip_code.as_str(),
        address.unit_floor.as_str(),
        address.building_tower.as_str(),
        address.lot_no.as_str(),
    ])
}

/// Writes `"Last, First Middle Suffix (Relationship) MobileNumber"`.
pub fn encode_personal_reference(reference: &PersonalReference) -> String {
    let name = encode_relative_name(&reference.name);
    let relationship = reference.relationship.trim();
    let mobile = reference.mobile_number.trim();
    if name.is_empty() && relationship.is_empty() && mobile.is_empty() {
        return String::new();
    }
    format!("{name} ({relationship}) {mobile}").trim().to_string()
}

/// Canonical bank names of every requested bank, comma-joined in bank order.
pub fn encode_bank_preferences(preferences: &BankPreferences) -> String {
    preferences
        .selected()
        .map(|code| code.canonical_name())
        .collect::<Vec<_>>()
        .join(", ")
}
