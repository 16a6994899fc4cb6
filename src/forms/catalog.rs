// Service catalog
//
// The six application services, each a static definition: ordered data steps
// with field rules, the required-document set checked on the final step, the
// submission endpoint path, and the session-slot prefix used across a login
// redirect. The wizard engine is generic; everything service-specific lives
// here.

use super::fields::{field, FieldRule, FieldSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    ShortTermLoan,
    Accounting,
    CompanyCompliance,
    Payroll,
    CompanyRegistration,
    TaxAudit,
}

impl Service {
    pub const ALL: [Service; 6] = [
        Service::ShortTermLoan,
        Service::Accounting,
        Service::CompanyCompliance,
        Service::Payroll,
        Service::CompanyRegistration,
        Service::TaxAudit,
    ];

    pub fn slug(self) -> &'static str {
        self.definition().slug
    }

    pub fn from_slug(slug: &str) -> Option<Service> {
        Service::ALL.iter().copied().find(|s| s.slug() == slug)
    }

    pub fn definition(self) -> &'static ServiceDefinition {
        match self {
            Service::ShortTermLoan => &SHORT_TERM_LOAN,
            Service::Accounting => &ACCOUNTING,
            Service::CompanyCompliance => &COMPANY_COMPLIANCE,
            Service::Payroll => &PAYROLL,
            Service::CompanyRegistration => &COMPANY_REGISTRATION,
            Service::TaxAudit => &TAX_AUDIT,
        }
    }
}

/// One data-collection screen: title plus the fixed field list validated as a
/// unit on forward navigation.
#[derive(Debug)]
pub struct StepDefinition {
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

/// A required document slot on the final step.
#[derive(Debug, Clone, Copy)]
pub struct DocumentSpec {
    pub key: &'static str,
    pub label: &'static str,
}

const fn document(key: &'static str, label: &'static str) -> DocumentSpec {
    DocumentSpec { key, label }
}

#[derive(Debug)]
pub struct ServiceDefinition {
    pub title: &'static str,
    /// URL/arg form, e.g. "short-term-loan"
    pub slug: &'static str,
    /// Session-slot prefix, e.g. "short_term_loan" -> "short_term_loan_form_data"
    pub storage_prefix: &'static str,
    /// Path under the API base, e.g. "/api/applications/short-term-loan"
    pub submit_path: &'static str,
    pub data_steps: &'static [StepDefinition],
    pub documents: &'static [DocumentSpec],
}

impl ServiceDefinition {
    /// Data steps plus the trailing documents step.
    pub fn total_steps(&self) -> usize {
        self.data_steps.len() + 1
    }

    /// The documents step is always last; submission happens from it.
    pub fn final_step(&self) -> usize {
        self.total_steps()
    }

    pub fn is_documents_step(&self, step: usize) -> bool {
        step == self.final_step()
    }

    pub fn step_title(&self, step: usize) -> &'static str {
        self.data_steps
            .get(step.saturating_sub(1))
            .map(|s| s.title)
            .unwrap_or("Documents")
    }

    /// Fields collected on a given data step; empty for the documents step.
    pub fn fields_for_step(&self, step: usize) -> &'static [FieldSpec] {
        if self.is_documents_step(step) {
            &[]
        } else {
            self.data_steps
                .get(step.saturating_sub(1))
                .map(|s| s.fields)
                .unwrap_or(&[])
        }
    }

    pub fn all_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.data_steps.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field_rule(&self, key: &str) -> Option<FieldRule> {
        self.all_fields().find(|f| f.key == key).map(|f| f.rule)
    }

    /// Session slot holding the serialized FormState across a login redirect.
    pub fn form_data_slot(&self) -> String {
        format!("{}_form_data", self.storage_prefix)
    }

    /// Session slot holding the step to resume at after login.
    pub fn pending_step_slot(&self) -> String {
        format!("{}_pending_step", self.storage_prefix)
    }
}

static SHORT_TERM_LOAN: ServiceDefinition = ServiceDefinition {
    title: "Short-Term Loan",
    slug: "short-term-loan",
    storage_prefix: "short_term_loan",
    submit_path: "/api/applications/short-term-loan",
    data_steps: &[
        StepDefinition {
            title: "Personal Details",
            fields: &[
                field("fullName", "Full name", FieldRule::Name { min_len: 3 }),
                field("email", "Email", FieldRule::Email),
                field("phone", "Phone number", FieldRule::Phone),
            ],
        },
        StepDefinition {
            title: "Loan Requirements",
            fields: &[
                field(
                    "loanAmount",
                    "Loan amount",
                    FieldRule::Amount {
                        min: 10_000,
                        max: 500_000,
                    },
                ),
                field("loanPurpose", "Loan purpose", FieldRule::Required),
                field(
                    "tenureMonths",
                    "Tenure in months",
                    FieldRule::Amount { min: 3, max: 36 },
                ),
                field(
                    "monthlyIncome",
                    "Monthly income",
                    FieldRule::Amount {
                        min: 15_000,
                        max: 10_000_000,
                    },
                ),
            ],
        },
        StepDefinition {
            title: "Employment & KYC",
            fields: &[
                field("panNumber", "PAN number", FieldRule::Pan),
                field("employmentType", "Employment type", FieldRule::Required),
                field("companyName", "Company name", FieldRule::Name { min_len: 3 }),
                field("address", "Address", FieldRule::Text { min_len: 10 }),
                field("city", "City", FieldRule::Name { min_len: 3 }),
                field("pincode", "Pincode", FieldRule::Pincode),
            ],
        },
    ],
    documents: &[
        document("aadhar", "Aadhar card"),
        document("panCard", "PAN card"),
        document("bankStatements", "Bank statements (6 months)"),
        document("salarySlips", "Salary slips (3 months)"),
        document("addressProof", "Address proof"),
    ],
};

static ACCOUNTING: ServiceDefinition = ServiceDefinition {
    title: "Accounting & Bookkeeping",
    slug: "accounting-bookkeeping",
    storage_prefix: "accounting",
    submit_path: "/api/applications/accounting-bookkeeping",
    data_steps: &[
        StepDefinition {
            title: "Contact Details",
            fields: &[
                field("fullName", "Full name", FieldRule::Name { min_len: 3 }),
                field("email", "Email", FieldRule::Email),
                field("phone", "Phone number", FieldRule::Phone),
                field("companyName", "Company name", FieldRule::Name { min_len: 3 }),
            ],
        },
        StepDefinition {
            title: "Business Profile",
            fields: &[
                field("businessType", "Business type", FieldRule::Required),
                field(
                    "annualTurnover",
                    "Annual turnover",
                    FieldRule::Amount {
                        min: 100_000,
                        max: 1_000_000_000,
                    },
                ),
                field("gstNumber", "GST number", FieldRule::Gstin),
            ],
        },
        StepDefinition {
            title: "Service Requirements",
            fields: &[
                field("serviceScope", "Service scope", FieldRule::Required),
                field("billingCycle", "Billing cycle", FieldRule::Required),
                field("currentSoftware", "Current software", FieldRule::Required),
            ],
        },
    ],
    documents: &[
        document("panCard", "Company PAN card"),
        document("gstCertificate", "GST certificate"),
        document("bankStatements", "Bank statements (3 months)"),
    ],
};

static COMPANY_COMPLIANCE: ServiceDefinition = ServiceDefinition {
    title: "Company Compliance",
    slug: "company-compliance",
    storage_prefix: "company_compliance",
    submit_path: "/api/applications/company-compliance",
    data_steps: &[
        StepDefinition {
            title: "Contact Details",
            fields: &[
                field("fullName", "Full name", FieldRule::Name { min_len: 3 }),
                field("email", "Email", FieldRule::Email),
                field("phone", "Phone number", FieldRule::Phone),
                field("companyName", "Company name", FieldRule::Name { min_len: 3 }),
            ],
        },
        StepDefinition {
            title: "Company Identity",
            fields: &[
                field("companyType", "Company type", FieldRule::Required),
                field("cinNumber", "CIN", FieldRule::Cin),
                field(
                    "incorporationYear",
                    "Incorporation year",
                    FieldRule::Amount {
                        min: 1950,
                        max: 2026,
                    },
                ),
            ],
        },
        StepDefinition {
            title: "Compliance Needs",
            fields: &[
                field("complianceScope", "Compliance scope", FieldRule::Required),
                field("filingStatus", "Filing status", FieldRule::Required),
            ],
        },
    ],
    documents: &[
        document("certificateOfIncorporation", "Certificate of incorporation"),
        document("panCard", "Company PAN card"),
        document("moa", "Memorandum of association"),
        document("aoa", "Articles of association"),
    ],
};

static PAYROLL: ServiceDefinition = ServiceDefinition {
    title: "Payroll Services",
    slug: "payroll",
    storage_prefix: "payroll",
    submit_path: "/api/applications/payroll",
    data_steps: &[
        StepDefinition {
            title: "Contact Details",
            fields: &[
                field("fullName", "Full name", FieldRule::Name { min_len: 3 }),
                field("email", "Email", FieldRule::Email),
                field("phone", "Phone number", FieldRule::Phone),
                field("companyName", "Company name", FieldRule::Name { min_len: 3 }),
            ],
        },
        StepDefinition {
            title: "Payroll Profile",
            fields: &[
                field(
                    "employeeCount",
                    "Employee count",
                    FieldRule::Amount {
                        min: 1,
                        max: 100_000,
                    },
                ),
                field("payrollFrequency", "Payroll frequency", FieldRule::Required),
                field("currentProcess", "Current process", FieldRule::Required),
            ],
        },
        StepDefinition {
            title: "Statutory Details",
            fields: &[
                field("pfRegistered", "PF registration status", FieldRule::Required),
                field("esiRegistered", "ESI registration status", FieldRule::Required),
                field("pincode", "Pincode", FieldRule::Pincode),
                field("address", "Address", FieldRule::Text { min_len: 10 }),
            ],
        },
        StepDefinition {
            title: "Rollout Preferences",
            fields: &[
                field("targetStartMonth", "Target start month", FieldRule::Required),
                field("notes", "Notes", FieldRule::Required),
            ],
        },
    ],
    documents: &[
        document("companyPan", "Company PAN card"),
        document("employeeList", "Employee list"),
        document("salaryRegister", "Salary register"),
    ],
};

static COMPANY_REGISTRATION: ServiceDefinition = ServiceDefinition {
    title: "Company Registration",
    slug: "company-registration",
    storage_prefix: "company_registration",
    submit_path: "/api/applications/company-registration",
    data_steps: &[
        StepDefinition {
            title: "Applicant Details",
            fields: &[
                field("fullName", "Full name", FieldRule::Name { min_len: 3 }),
                field("email", "Email", FieldRule::Email),
                field("phone", "Phone number", FieldRule::Phone),
            ],
        },
        StepDefinition {
            title: "Proposed Company",
            fields: &[
                field("companyType", "Company type", FieldRule::Required),
                field("proposedName", "Proposed name", FieldRule::Name { min_len: 3 }),
                field("businessActivity", "Business activity", FieldRule::Required),
            ],
        },
        StepDefinition {
            title: "Structure",
            fields: &[
                field(
                    "directorCount",
                    "Director count",
                    FieldRule::Amount { min: 1, max: 15 },
                ),
                field(
                    "authorizedCapital",
                    "Authorized capital",
                    FieldRule::Amount {
                        min: 100_000,
                        max: 1_000_000_000,
                    },
                ),
            ],
        },
        StepDefinition {
            title: "Registered Office",
            fields: &[
                field("address", "Address", FieldRule::Text { min_len: 10 }),
                field("city", "City", FieldRule::Name { min_len: 3 }),
                field("state", "State", FieldRule::Name { min_len: 3 }),
                field("pincode", "Pincode", FieldRule::Pincode),
            ],
        },
    ],
    documents: &[
        document("directorPan", "Director PAN card"),
        document("directorAadhar", "Director Aadhar card"),
        document("addressProof", "Registered office address proof"),
        document("photograph", "Passport photograph"),
    ],
};

static TAX_AUDIT: ServiceDefinition = ServiceDefinition {
    title: "Tax Audit",
    slug: "tax-audit",
    storage_prefix: "tax_audit",
    submit_path: "/api/applications/tax-audit",
    data_steps: &[
        StepDefinition {
            title: "Contact Details",
            fields: &[
                field("fullName", "Full name", FieldRule::Name { min_len: 3 }),
                field("email", "Email", FieldRule::Email),
                field("phone", "Phone number", FieldRule::Phone),
                field("panNumber", "PAN number", FieldRule::Pan),
            ],
        },
        StepDefinition {
            title: "Business Profile",
            fields: &[
                field("businessType", "Business type", FieldRule::Required),
                field(
                    "annualTurnover",
                    "Annual turnover",
                    FieldRule::Amount {
                        min: 10_000_000,
                        max: 100_000_000_000,
                    },
                ),
                field("assessmentYear", "Assessment year", FieldRule::AssessmentYear),
            ],
        },
        StepDefinition {
            title: "Audit History",
            fields: &[
                field("previousAudit", "Previous audit status", FieldRule::Required),
                field("booksMaintained", "Books maintained", FieldRule::Required),
            ],
        },
    ],
    documents: &[
        document("panCard", "PAN card"),
        document("financialStatements", "Financial statements"),
        document("bankStatements", "Bank statements (12 months)"),
        document("previousAuditReport", "Previous audit report"),
    ],
};
