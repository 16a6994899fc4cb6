// Backend response models
// One envelope grammar across the application, upload, and inquiry endpoints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =========================
// Generic envelope (matches the backend ApiResponse<T> contract)
// =========================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Per-field validation detail reported by the backend; keys mirror the
    /// submitted camelCase field names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, String>,
}

// =========================
// Receipts
// =========================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationReceipt {
    /// Reference shown to the applicant, e.g. "ST12345678"
    pub application_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryReceipt {
    pub inquiry_id: String,
}
