// src/models/kit.rs
use serde::{Deserialize, Serialize};
use validator::Validate;
use chrono::{DateTime, NaiveDate, Utc};

// ==================== REAGENT KIT ====================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct ReagentKit {
    pub id: String,
    pub kit_name: String,
    pub kit_types: Option<String>,
    pub kit_lot_no: Option<String>,
    pub kit_expiration_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
pub struct KitListItem {
    #[serde(flatten)]
    pub kit: ReagentKit,
    /// Expiry as shown in the registry listing, e.g. "March 05, 2026".
    pub expiration_display: Option<String>,
}

impl From<ReagentKit> for KitListItem {
    fn from(kit: ReagentKit) -> Self {
        let expiration_display = kit
            .kit_expiration_date
            .map(|d| d.format("%B %d, %Y").to_string());
        Self { kit, expiration_display }
    }
}

#[derive(Debug, Validate, Clone)]
pub struct KitRequest {
    #[validate(length(min = 1, max = 255, message = "Kit name must be between 1 and 255 characters"))]
    pub kit_name: String,

    #[validate(length(max = 255, message = "Kit types cannot exceed 255 characters"))]
    pub kit_types: Option<String>,

    #[validate(length(max = 255, message = "Lot number cannot exceed 255 characters"))]
    pub kit_lot_no: Option<String>,

    pub kit_expiration_date: Option<NaiveDate>,
}
