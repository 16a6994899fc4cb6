// Step validation
//
// Aggregates the field validators over a step's fixed field list and returns
// everything wrong with it at once. The documents step is different in kind:
// it checks required-document presence instead of delegating to field rules.

use super::catalog::ServiceDefinition;
use super::fields::validate_field;
use crate::models::state::{DocumentMap, ErrorMap, FormState};

/// Validate one step. An empty map means the step passes.
pub fn validate_step(
    def: &ServiceDefinition,
    step: usize,
    state: &FormState,
    documents: &DocumentMap,
) -> ErrorMap {
    let mut errors = ErrorMap::new();

    if def.is_documents_step(step) {
        for doc in def.documents {
            if !documents.contains_key(doc.key) {
                errors.insert(doc.key.to_string(), format!("{} is required", doc.label));
            }
        }
        return errors;
    }

    for spec in def.fields_for_step(step) {
        if let Some(message) = validate_field(spec, state.value(spec.key)) {
            errors.insert(spec.key.to_string(), message);
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::catalog::Service;
    use crate::models::state::UploadedDocument;

    fn blank_state(service: Service) -> FormState {
        let def = service.definition();
        FormState::with_fields(def.all_fields().map(|f| f.key))
    }

    fn uploaded(name: &str) -> UploadedDocument {
        UploadedDocument {
            name: name.to_string(),
            path: format!("/uploads/{}", name),
        }
    }

    #[test]
    fn step_one_reports_only_the_missing_name() {
        let def = Service::ShortTermLoan.definition();
        let mut state = blank_state(Service::ShortTermLoan);
        state.set_value("fullName", "");
        state.set_value("email", "a@b.com");
        state.set_value("phone", "9999999999");

        let errors = validate_step(def, 1, &state, &DocumentMap::new());
        assert_eq!(errors.len(), 1, "Exactly one error expected: {:?}", errors);
        assert_eq!(
            errors.get("fullName").map(String::as_str),
            Some("Full name is required")
        );
    }

    #[test]
    fn passing_step_returns_empty_map() {
        let def = Service::ShortTermLoan.definition();
        let mut state = blank_state(Service::ShortTermLoan);
        state.set_value("fullName", "Asha Rao");
        state.set_value("email", "asha@example.com");
        state.set_value("phone", "98765 43210");

        let errors = validate_step(def, 1, &state, &DocumentMap::new());
        assert!(errors.is_empty(), "Unexpected errors: {:?}", errors);
    }

    #[test]
    fn loan_step_collects_every_failing_field() {
        let def = Service::ShortTermLoan.definition();
        let mut state = blank_state(Service::ShortTermLoan);
        state.set_value("loanAmount", "5000"); // below minimum
        state.set_value("loanPurpose", "Working capital");
        // tenureMonths and monthlyIncome left empty

        let errors = validate_step(def, 2, &state, &DocumentMap::new());
        assert_eq!(errors.len(), 3, "{:?}", errors);
        assert_eq!(
            errors.get("loanAmount").map(String::as_str),
            Some("Loan amount must be between 10000 and 500000")
        );
        assert_eq!(
            errors.get("tenureMonths").map(String::as_str),
            Some("Tenure in months is required")
        );
    }

    #[test]
    fn documents_step_reports_exactly_the_missing_keys() {
        let def = Service::ShortTermLoan.definition();
        let state = blank_state(Service::ShortTermLoan);

        // 3 of 5 required documents present
        let mut documents = DocumentMap::new();
        documents.insert("aadhar".to_string(), uploaded("aadhar.pdf"));
        documents.insert("panCard".to_string(), uploaded("pan.pdf"));
        documents.insert("bankStatements".to_string(), uploaded("statements.pdf"));

        let errors = validate_step(def, 4, &state, &documents);
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors.contains_key("salarySlips"));
        assert!(errors.contains_key("addressProof"));
        assert_eq!(
            errors.get("salarySlips").map(String::as_str),
            Some("Salary slips (3 months) is required")
        );
    }

    #[test]
    fn documents_step_passes_with_all_keys_present() {
        let def = Service::Accounting.definition();
        let state = blank_state(Service::Accounting);

        let mut documents = DocumentMap::new();
        for doc in def.documents {
            documents.insert(doc.key.to_string(), uploaded(doc.key));
        }

        let errors = validate_step(def, def.final_step(), &state, &documents);
        assert!(errors.is_empty(), "{:?}", errors);
    }
}
