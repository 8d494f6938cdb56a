use super::domain::ApplicationSubmission;

const MOBILE_DIGITS: usize = 11;

/// Every field that failed validation, named the way the view model names them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid application fields: {}", .fields.join(", "))]
pub struct ValidationError {
    pub fields: Vec<&'static str>,
}

/// Exactly eleven ASCII digits, nothing else.
pub fn is_valid_mobile(value: &str) -> bool {
    value.len() == MOBILE_DIGITS && value.bytes().all(|byte| byte.is_ascii_digit())
}

pub fn validate_submission(submission: &ApplicationSubmission) -> Result<(), ValidationError> {
    let personal = &submission.personal_details;
    let mut fields = Vec::new();

    let required = [
        ("personalDetails.firstName", &personal.first_name),
        ("personalDetails.lastName", &personal.last_name),
        ("personalDetails.dateOfBirth", &personal.date_of_birth),
        ("personalDetails.emailAddress", &personal.email_address),
        ("permanentAddress.street", &submission.permanent_address.street),
        ("permanentAddress.city", &submission.permanent_address.city),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            fields.push(field);
        }
    }

    if !is_valid_mobile(personal.mobile_number.trim()) {
        fields.push("personalDetails.mobileNumber");
    }

    let optional_mobiles = [
        (
            "spouseDetails.mobileNumber",
            &submission.spouse_details.mobile_number,
        ),
        (
            "personalReference.mobileNumber",
            &submission.personal_reference.mobile_number,
        ),
    ];
    for (field, value) in optional_mobiles {
        let value = value.trim();
        if !value.is_empty() && !is_valid_mobile(value) {
            fields.push(field);
        }
    }

    if !submission.bank_preferences.any_selected() {
        fields.push("bankPreferences");
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { fields })
    }
}
