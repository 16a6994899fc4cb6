// Submission assembly: typed wire payloads built from wizard state, plus
// inquiry validation for the contact form.

use crate::forms::catalog::Service;
use crate::forms::fields::{field, validate_field, FieldRule, FieldSpec};
use crate::models::requests::{
    AccountingApplication, ApplicationPayload, ComplianceApplication, DocumentPaths,
    InquiryRequest, PayrollApplication, RegistrationApplication, ShortTermLoanApplication,
    TaxAuditApplication,
};
use crate::models::state::{DocumentMap, ErrorMap, FormState};

/// Build the typed submission body for `service` from the wizard's state.
/// Callers validate first; this only shapes data for the wire.
pub fn build_payload(
    service: Service,
    state: &FormState,
    documents: &DocumentMap,
) -> ApplicationPayload {
    let text = |key: &str| state.value(key).to_string();
    let docs = document_paths(documents);

    match service {
        Service::ShortTermLoan => ApplicationPayload::ShortTermLoan(ShortTermLoanApplication {
            full_name: text("fullName"),
            email: text("email"),
            phone: text("phone"),
            loan_amount: text("loanAmount"),
            loan_purpose: text("loanPurpose"),
            tenure_months: text("tenureMonths"),
            monthly_income: text("monthlyIncome"),
            pan_number: text("panNumber"),
            employment_type: text("employmentType"),
            company_name: text("companyName"),
            address: text("address"),
            city: text("city"),
            pincode: text("pincode"),
            documents: docs,
        }),
        Service::Accounting => ApplicationPayload::Accounting(AccountingApplication {
            full_name: text("fullName"),
            email: text("email"),
            phone: text("phone"),
            company_name: text("companyName"),
            business_type: text("businessType"),
            annual_turnover: text("annualTurnover"),
            gst_number: text("gstNumber"),
            service_scope: text("serviceScope"),
            billing_cycle: text("billingCycle"),
            current_software: text("currentSoftware"),
            documents: docs,
        }),
        Service::CompanyCompliance => {
            ApplicationPayload::CompanyCompliance(ComplianceApplication {
                full_name: text("fullName"),
                email: text("email"),
                phone: text("phone"),
                company_name: text("companyName"),
                company_type: text("companyType"),
                cin_number: text("cinNumber"),
                incorporation_year: text("incorporationYear"),
                compliance_scope: text("complianceScope"),
                filing_status: text("filingStatus"),
                documents: docs,
            })
        }
        Service::Payroll => ApplicationPayload::Payroll(PayrollApplication {
            full_name: text("fullName"),
            email: text("email"),
            phone: text("phone"),
            company_name: text("companyName"),
            employee_count: text("employeeCount"),
            payroll_frequency: text("payrollFrequency"),
            current_process: text("currentProcess"),
            pf_registered: text("pfRegistered"),
            esi_registered: text("esiRegistered"),
            pincode: text("pincode"),
            address: text("address"),
            target_start_month: text("targetStartMonth"),
            notes: text("notes"),
            documents: docs,
        }),
        Service::CompanyRegistration => {
            ApplicationPayload::CompanyRegistration(RegistrationApplication {
                full_name: text("fullName"),
                email: text("email"),
                phone: text("phone"),
                company_type: text("companyType"),
                proposed_name: text("proposedName"),
                business_activity: text("businessActivity"),
                director_count: text("directorCount"),
                authorized_capital: text("authorizedCapital"),
                address: text("address"),
                city: text("city"),
                state: text("state"),
                pincode: text("pincode"),
                documents: docs,
            })
        }
        Service::TaxAudit => ApplicationPayload::TaxAudit(TaxAuditApplication {
            full_name: text("fullName"),
            email: text("email"),
            phone: text("phone"),
            pan_number: text("panNumber"),
            business_type: text("businessType"),
            annual_turnover: text("annualTurnover"),
            assessment_year: text("assessmentYear"),
            previous_audit: text("previousAudit"),
            books_maintained: text("booksMaintained"),
            documents: docs,
        }),
    }
}

fn document_paths(documents: &DocumentMap) -> DocumentPaths {
    documents
        .iter()
        .map(|(key, doc)| (key.clone(), doc.path.clone()))
        .collect()
}

/// Fields of the contact-form inquiry, validated with the same rules as the
/// wizard steps.
const INQUIRY_FIELDS: [FieldSpec; 5] = [
    field("fullName", "Full name", FieldRule::Name { min_len: 3 }),
    field("email", "Email", FieldRule::Email),
    field("phone", "Phone number", FieldRule::Phone),
    field("service", "Service", FieldRule::Required),
    field("message", "Message", FieldRule::Text { min_len: 10 }),
];

/// Validate an inquiry before it is posted. Empty map means sendable.
pub fn validate_inquiry(inquiry: &InquiryRequest) -> ErrorMap {
    let mut errors = ErrorMap::new();
    for spec in &INQUIRY_FIELDS {
        let value = match spec.key {
            "fullName" => inquiry.full_name.as_str(),
            "email" => inquiry.email.as_str(),
            "phone" => inquiry.phone.as_str(),
            "service" => inquiry.service.as_str(),
            _ => inquiry.message.as_str(),
        };
        if let Some(message) = validate_field(spec, value) {
            errors.insert(spec.key.to_string(), message);
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state::UploadedDocument;

    fn loan_state() -> FormState {
        let mut state = FormState::default();
        state.set_value("fullName", "Asha Rao");
        state.set_value("email", "asha@example.com");
        state.set_value("phone", "9876543210");
        state.set_value("loanAmount", "50000");
        state.set_value("panNumber", "ABCDE1234F");
        state
    }

    #[test]
    fn loan_payload_carries_state_and_document_paths() {
        let mut documents = DocumentMap::new();
        documents.insert(
            "panCard".to_string(),
            UploadedDocument {
                name: "pan.pdf".to_string(),
                path: "uploads/x1/pan.pdf".to_string(),
            },
        );

        let payload = build_payload(Service::ShortTermLoan, &loan_state(), &documents);

        match payload {
            ApplicationPayload::ShortTermLoan(app) => {
                assert_eq!(app.full_name, "Asha Rao");
                assert_eq!(app.loan_amount, "50000");
                assert_eq!(
                    app.documents.get("panCard").map(String::as_str),
                    Some("uploads/x1/pan.pdf")
                );
            }
            other => panic!("Wrong payload variant: {:?}", other),
        }
    }

    #[test]
    fn unfilled_fields_serialize_as_empty_strings() {
        let payload = build_payload(Service::ShortTermLoan, &loan_state(), &DocumentMap::new());
        match payload {
            ApplicationPayload::ShortTermLoan(app) => {
                assert_eq!(app.loan_purpose, "");
                assert_eq!(app.city, "");
                assert!(app.documents.is_empty());
            }
            other => panic!("Wrong payload variant: {:?}", other),
        }
    }

    #[test]
    fn every_service_builds_its_own_variant() {
        let state = FormState::default();
        let docs = DocumentMap::new();
        let built = [
            build_payload(Service::ShortTermLoan, &state, &docs),
            build_payload(Service::Accounting, &state, &docs),
            build_payload(Service::CompanyCompliance, &state, &docs),
            build_payload(Service::Payroll, &state, &docs),
            build_payload(Service::CompanyRegistration, &state, &docs),
            build_payload(Service::TaxAudit, &state, &docs),
        ];
        assert!(matches!(built[0], ApplicationPayload::ShortTermLoan(_)));
        assert!(matches!(built[1], ApplicationPayload::Accounting(_)));
        assert!(matches!(built[2], ApplicationPayload::CompanyCompliance(_)));
        assert!(matches!(built[3], ApplicationPayload::Payroll(_)));
        assert!(matches!(built[4], ApplicationPayload::CompanyRegistration(_)));
        assert!(matches!(built[5], ApplicationPayload::TaxAudit(_)));
    }

    #[test]
    fn inquiry_with_bad_email_and_short_message_fails_validation() {
        let inquiry = InquiryRequest {
            full_name: "Asha Rao".to_string(),
            email: "not-an-email".to_string(),
            phone: "9876543210".to_string(),
            service: "payroll".to_string(),
            message: "Hi".to_string(),
        };

        let errors = validate_inquiry(&inquiry);

        assert_eq!(errors.len(), 2, "Expected exactly two errors: {:?}", errors);
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("message"));
    }

    #[test]
    fn complete_inquiry_passes_validation() {
        let inquiry = InquiryRequest {
            full_name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "98765 43210".to_string(),
            service: "tax-audit".to_string(),
            message: "Please call about a statutory audit for FY 2023-24.".to_string(),
        };

        assert!(validate_inquiry(&inquiry).is_empty());
    }
}
