// src/models/patient.rs
use serde::{Deserialize, Serialize};
use validator::Validate;
use chrono::{DateTime, NaiveDate, Utc};
use strum::{AsRefStr, Display, EnumString};

// ==================== PATIENT ====================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    pub company: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row: the patient plus how many results of each category it owns.
#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
pub struct PatientSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub patient: Patient,
    pub clinical_count: i64,
    pub hematology_count: i64,
    pub serology_count: i64,
    pub chemistry_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum Gender {
    Male,
    Female,
}

/// Registration and edit form; updates resend every field.
#[derive(Debug, Validate, Clone)]
pub struct PatientRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    pub date_of_birth: Option<NaiveDate>,

    pub gender: String,

    #[validate(length(max = 255, message = "Company cannot exceed 255 characters"))]
    pub company: Option<String>,

    #[validate(length(max = 255, message = "Address cannot exceed 255 characters"))]
    pub address: Option<String>,
}
