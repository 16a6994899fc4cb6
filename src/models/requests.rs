// Submission request models
// One typed payload per service; field names mirror the form field keys on
// the wire (camelCase), with uploaded document paths keyed by document name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document key -> server-assigned path, as carried in the submission body.
pub type DocumentPaths = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortTermLoanApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub loan_amount: String,
    pub loan_purpose: String,
    pub tenure_months: String,
    pub monthly_income: String,
    pub pan_number: String,
    pub employment_type: String,
    pub company_name: String,
    pub address: String,
    pub city: String,
    pub pincode: String,
    pub documents: DocumentPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
    pub business_type: String,
    pub annual_turnover: String,
    pub gst_number: String,
    pub service_scope: String,
    pub billing_cycle: String,
    pub current_software: String,
    pub documents: DocumentPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
    pub company_type: String,
    pub cin_number: String,
    pub incorporation_year: String,
    pub compliance_scope: String,
    pub filing_status: String,
    pub documents: DocumentPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
    pub employee_count: String,
    pub payroll_frequency: String,
    pub current_process: String,
    pub pf_registered: String,
    pub esi_registered: String,
    pub pincode: String,
    pub address: String,
    pub target_start_month: String,
    pub notes: String,
    pub documents: DocumentPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company_type: String,
    pub proposed_name: String,
    pub business_activity: String,
    pub director_count: String,
    pub authorized_capital: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub documents: DocumentPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxAuditApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub pan_number: String,
    pub business_type: String,
    pub annual_turnover: String,
    pub assessment_year: String,
    pub previous_audit: String,
    pub books_maintained: String,
    pub documents: DocumentPaths,
}

/// The submission body, a sum over the six service payload shapes.
/// Untagged: each service endpoint already implies the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApplicationPayload {
    ShortTermLoan(ShortTermLoanApplication),
    Accounting(AccountingApplication),
    CompanyCompliance(ComplianceApplication),
    Payroll(PayrollApplication),
    CompanyRegistration(RegistrationApplication),
    TaxAudit(TaxAuditApplication),
}

/// Generic corporate inquiry ("contact us") body, shared by every page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_term_loan_payload_serializes_camel_case() {
        let mut documents = DocumentPaths::new();
        documents.insert("panCard".to_string(), "/uploads/pan-1.pdf".to_string());

        let payload = ApplicationPayload::ShortTermLoan(ShortTermLoanApplication {
            full_name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            loan_amount: "50000".to_string(),
            loan_purpose: "Working capital".to_string(),
            tenure_months: "12".to_string(),
            monthly_income: "65000".to_string(),
            pan_number: "ABCDE1234F".to_string(),
            employment_type: "Salaried".to_string(),
            company_name: "Acme Traders".to_string(),
            address: "14 MG Road, Indiranagar".to_string(),
            city: "Bengaluru".to_string(),
            pincode: "560038".to_string(),
            documents,
        });

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"fullName\":\"Asha Rao\""), "{}", json);
        assert!(json.contains("\"loanAmount\":\"50000\""), "{}", json);
        assert!(json.contains("\"panNumber\":\"ABCDE1234F\""), "{}", json);
        assert!(
            json.contains("\"documents\":{\"panCard\":\"/uploads/pan-1.pdf\"}"),
            "{}",
            json
        );
    }

    #[test]
    fn inquiry_request_serializes_camel_case() {
        let req = InquiryRequest {
            full_name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            service: "payroll".to_string(),
            message: "Need a payroll quote for 40 employees".to_string(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"fullName\""), "{}", json);
        assert!(json.contains("\"service\":\"payroll\""), "{}", json);
    }
}
