//! Structural validation of submissions.
//!
//! Runs before admission control so a malformed request never consumes a
//! cooldown slot.

use crate::config::IntakeConfig;
use crate::types::{Category, District, EngineError, Result, SubmissionField, SubmissionInput, Urgency};

/// A submission whose fields have been checked and normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub district: District,
    pub category: Category,
    pub urgency: Urgency,
    pub title: String,
    pub description: String,
    pub phone: String,
    pub help_offer: Option<String>,
}

impl ValidatedSubmission {
    /// Contact identity admission control is keyed on.
    pub fn submitter_contact(&self) -> &str {
        &self.phone
    }
}

/// Phone numbers are `09` followed by exactly 8 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.starts_with("09") && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Validate a raw submission against the intake configuration.
pub fn validate_submission(input: &SubmissionInput, intake: &IntakeConfig) -> Result<ValidatedSubmission> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(EngineError::validation(SubmissionField::Title, "must not be empty"));
    }
    if title.chars().count() > intake.max_title_len {
        return Err(EngineError::validation(
            SubmissionField::Title,
            format!("exceeds {} characters", intake.max_title_len),
        ));
    }

    let description = input.description.trim();
    if description.is_empty() {
        return Err(EngineError::validation(SubmissionField::Description, "must not be empty"));
    }
    if description.chars().count() > intake.max_description_len {
        return Err(EngineError::validation(
            SubmissionField::Description,
            format!("exceeds {} characters", intake.max_description_len),
        ));
    }

    let phone = input.phone.trim();
    if !is_valid_phone(phone) {
        return Err(EngineError::validation(
            SubmissionField::Phone,
            "expected 09 followed by 8 digits",
        ));
    }

    let district = intake
        .districts
        .iter()
        .find(|d| d.as_str() == input.district.trim())
        .map(District::new)
        .ok_or_else(|| {
            EngineError::validation(
                SubmissionField::District,
                format!("unknown district {:?}", input.district),
            )
        })?;

    let category = intake
        .categories
        .iter()
        .find(|c| c.eq_ignore_ascii_case(input.category.trim()))
        .map(Category::new)
        .ok_or_else(|| {
            EngineError::validation(
                SubmissionField::Category,
                format!("unknown category {:?}", input.category),
            )
        })?;

    let help_offer = input
        .help_offer
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if let Some(offer) = &help_offer {
        if offer.chars().count() > intake.max_description_len {
            return Err(EngineError::validation(
                SubmissionField::HelpOffer,
                format!("exceeds {} characters", intake.max_description_len),
            ));
        }
    }

    Ok(ValidatedSubmission {
        district,
        category,
        urgency: input.urgency,
        title: title.to_string(),
        description: description.to_string(),
        phone: phone.to_string(),
        help_offer,
    })
}
