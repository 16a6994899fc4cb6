// Wizard engine: one instance drives one application from mount to receipt.
//
// Step indices are 1-based. Steps 1..N-1 are data entry, step N is the
// documents step. The engine never advances past a step with errors, gates
// on the session token when leaving step 1 and again at submit, and persists
// a resume snapshot before every login redirect.

use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::api::gateway::{ApplicationGateway, SubmissionReply};
use crate::api::submission::build_payload;
use crate::api::uploads::{self, DocumentFile, UploadError};
use crate::forms::catalog::{Service, ServiceDefinition};
use crate::forms::fields::{normalize_for_storage, validate_field};
use crate::forms::steps::validate_step;
use crate::models::state::{DocumentMap, ErrorMap, FormState, TouchedSet};
use crate::session::auth::{login_redirect_url, TokenProvider};
use crate::session::store::SessionStore;
use crate::utils::logging::{mask_pan, mask_phone};

/// Life cycle of one wizard instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardPhase {
    InProgress,
    Submitted { application_id: String },
}

/// What happened when the wizard was mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    Fresh,
    Restored { step: usize },
}

/// What happened on a forward navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOutcome {
    Advanced { step: usize },
    Blocked,
    RedirectToLogin { url: String },
    AlreadyAtFinalStep,
}

/// What happened on a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted { application_id: String },
    RedirectToLogin { url: String },
    Blocked,
    NotReady,
    InFlight,
    RejectedByBackend { message: Option<String> },
    Failed { message: String },
}

pub struct Wizard {
    definition: &'static ServiceDefinition,
    service: Service,
    portal_login_url: String,
    tokens: Arc<dyn TokenProvider>,
    session: Arc<dyn SessionStore>,
    state: FormState,
    documents: DocumentMap,
    errors: ErrorMap,
    touched: TouchedSet,
    current_step: usize,
    completed: BTreeSet<usize>,
    submitting: bool,
    phase: WizardPhase,
}

impl Wizard {
    /// Mount a wizard for `service`. With a session token present, a resume
    /// snapshot left by an earlier login redirect is restored and its slots
    /// cleared; otherwise the wizard starts fresh and the slots are left
    /// untouched.
    pub fn mount(
        service: Service,
        portal_login_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        session: Arc<dyn SessionStore>,
    ) -> (Self, MountOutcome) {
        let definition = service.definition();
        let mut wizard = Self {
            definition,
            service,
            portal_login_url: portal_login_url.into(),
            tokens,
            session,
            state: FormState::with_fields(definition.all_fields().map(|f| f.key)),
            documents: DocumentMap::new(),
            errors: ErrorMap::new(),
            touched: TouchedSet::new(),
            current_step: 1,
            completed: BTreeSet::new(),
            submitting: false,
            phase: WizardPhase::InProgress,
        };

        if !wizard.tokens.has_token() {
            return (wizard, MountOutcome::Fresh);
        }
        match wizard.take_pending() {
            Some((state, step)) => {
                info!(
                    "[PHASE: wizard] [STEP: restore] Resuming {} at step {}",
                    definition.slug, step
                );
                wizard.state = state;
                wizard.current_step = step;
                (wizard, MountOutcome::Restored { step })
            }
            None => (wizard, MountOutcome::Fresh),
        }
    }

    pub fn definition(&self) -> &'static ServiceDefinition {
        self.definition
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn documents(&self) -> &DocumentMap {
        &self.documents
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn error_for(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    pub fn is_touched(&self, key: &str) -> bool {
        self.touched.contains(key)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn completed_steps(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    /// Update a field's value. Touched fields are revalidated on every
    /// change; untouched fields stay error-free until first blur.
    pub fn edit_field(&mut self, key: &str, raw: &str) {
        let rule = match self.definition.field_rule(key) {
            Some(rule) => rule,
            None => {
                warn!("[PHASE: wizard] [STEP: edit] Ignoring unknown field: {}", key);
                return;
            }
        };
        self.state.set_value(key, normalize_for_storage(rule, raw));
        if self.touched.contains(key) {
            self.revalidate_field(key);
        }
    }

    /// Mark a field as visited (blur) and validate it immediately.
    pub fn touch_field(&mut self, key: &str) {
        if self.definition.field_rule(key).is_none() {
            return;
        }
        self.touched.insert(key.to_string());
        self.revalidate_field(key);
    }

    /// Advance to the next step.
    ///
    /// Leaving step 1 without a session token persists the resume snapshot
    /// and redirects to the portal login before any validation runs. With a
    /// token, the current step must validate cleanly to advance.
    pub fn next(&mut self) -> anyhow::Result<NextOutcome> {
        if self.current_step >= self.definition.final_step() {
            return Ok(NextOutcome::AlreadyAtFinalStep);
        }

        if self.current_step == 1 && !self.tokens.has_token() {
            let target = self.current_step + 1;
            self.persist_pending(target)?;
            let url = login_redirect_url(&self.portal_login_url, self.service, target)?;
            info!(
                "[PHASE: wizard] [STEP: next] No session token for {}; redirecting to login",
                self.definition.slug
            );
            return Ok(NextOutcome::RedirectToLogin { url });
        }

        let step_errors = validate_step(
            self.definition,
            self.current_step,
            &self.state,
            &self.documents,
        );
        if !step_errors.is_empty() {
            warn!(
                "[PHASE: wizard] [STEP: validate] Step {} of {} blocked with {} error(s)",
                self.current_step,
                self.definition.slug,
                step_errors.len()
            );
            for key in step_errors.keys() {
                self.touched.insert(key.clone());
            }
            self.replace_step_errors(self.current_step, step_errors);
            return Ok(NextOutcome::Blocked);
        }

        self.replace_step_errors(self.current_step, ErrorMap::new());
        self.completed.insert(self.current_step);
        self.current_step += 1;
        info!(
            "[PHASE: wizard] [STEP: next] {} advanced to step {}",
            self.definition.slug, self.current_step
        );
        Ok(NextOutcome::Advanced {
            step: self.current_step,
        })
    }

    /// Step back one step. Never validates, never drops data, stops at 1.
    pub fn previous(&mut self) -> usize {
        if self.current_step > 1 {
            self.current_step -= 1;
            debug!(
                "[PHASE: wizard] [STEP: previous] {} back to step {}",
                self.definition.slug, self.current_step
            );
        }
        self.current_step
    }

    /// Upload a document into slot `key`. The slot keeps its previous
    /// content on any failure; the error is also recorded against the slot.
    pub async fn attach_document(
        &mut self,
        gateway: &dyn ApplicationGateway,
        key: &str,
        file: DocumentFile,
    ) -> Result<(), UploadError> {
        if !self.definition.documents.iter().any(|d| d.key == key) {
            return Err(UploadError::UnknownDocument {
                key: key.to_string(),
            });
        }
        match uploads::upload_document(gateway, file).await {
            Ok(document) => {
                self.documents.insert(key.to_string(), document);
                self.errors.remove(key);
                Ok(())
            }
            Err(e) => {
                warn!(
                    "[PHASE: document_upload] [STEP: attach] {} upload failed: {}",
                    key,
                    upload_error_detail(&e)
                );
                self.errors.insert(key.to_string(), e.to_string());
                Err(e)
            }
        }
    }

    /// Detach an uploaded document so a different file can be chosen.
    pub fn remove_document(&mut self, key: &str) -> bool {
        self.documents.remove(key).is_some()
    }

    /// Submit the application.
    ///
    /// Ignored below the final step and while a submission is in flight.
    /// Without a token the resume snapshot is persisted and the caller is
    /// redirected to login. The documents step must validate cleanly.
    pub async fn submit(
        &mut self,
        gateway: &dyn ApplicationGateway,
    ) -> anyhow::Result<SubmitOutcome> {
        let final_step = self.definition.final_step();
        if self.current_step < final_step {
            warn!(
                "[PHASE: submission] [STEP: guard] Submit ignored at step {} of {}",
                self.current_step, final_step
            );
            return Ok(SubmitOutcome::NotReady);
        }
        if self.submitting {
            debug!("[PHASE: submission] [STEP: guard] Submission already in flight");
            return Ok(SubmitOutcome::InFlight);
        }
        if !self.tokens.has_token() {
            self.persist_pending(final_step)?;
            let url = login_redirect_url(&self.portal_login_url, self.service, final_step)?;
            info!("[PHASE: submission] [STEP: guard] No session token at submit; redirecting to login");
            return Ok(SubmitOutcome::RedirectToLogin { url });
        }

        let step_errors = validate_step(self.definition, final_step, &self.state, &self.documents);
        if !step_errors.is_empty() {
            for key in step_errors.keys() {
                self.touched.insert(key.clone());
            }
            self.replace_step_errors(final_step, step_errors);
            return Ok(SubmitOutcome::Blocked);
        }

        self.submitting = true;
        let correlation_id = Uuid::new_v4().simple().to_string();
        let payload = build_payload(self.service, &self.state, &self.documents);
        info!(
            "[PHASE: submission] [STEP: post] Submitting {} application [{}]",
            self.definition.slug, correlation_id
        );
        // Identifiers are masked; raw applicant PII never reaches the logs
        debug!(
            "[PHASE: submission] [STEP: post] Applicant phone {} PAN {}",
            mask_phone(self.state.value("phone")),
            mask_pan(self.state.value("panNumber"))
        );

        let result = gateway
            .submit_application(self.definition.submit_path, &payload)
            .await;
        self.submitting = false;

        match result {
            Ok(SubmissionReply::Accepted { application_id }) => {
                info!(
                    "[PHASE: submission] [STEP: post] Application accepted as {} [{}]",
                    application_id, correlation_id
                );
                self.reset_after_success();
                self.phase = WizardPhase::Submitted {
                    application_id: application_id.clone(),
                };
                Ok(SubmitOutcome::Submitted { application_id })
            }
            Ok(SubmissionReply::Rejected {
                message,
                field_errors,
            }) => {
                if field_errors.is_empty() {
                    let message = message
                        .unwrap_or_else(|| "Submission failed. Please try again.".to_string());
                    Ok(SubmitOutcome::Failed { message })
                } else {
                    for (key, msg) in field_errors {
                        self.touched.insert(key.clone());
                        self.errors.insert(key, msg);
                    }
                    Ok(SubmitOutcome::RejectedByBackend { message })
                }
            }
            Err(e) => {
                error!(
                    "[PHASE: submission] [STEP: post] Submission failed [{}]: {}",
                    correlation_id,
                    e.detail()
                );
                Ok(SubmitOutcome::Failed {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Leave the success screen and prepare for a fresh application.
    pub fn start_again(&mut self) {
        self.phase = WizardPhase::InProgress;
    }

    fn revalidate_field(&mut self, key: &str) {
        let spec = match self.definition.all_fields().find(|f| f.key == key) {
            Some(spec) => spec,
            None => return,
        };
        match validate_field(spec, self.state.value(key)) {
            Some(message) => {
                self.errors.insert(key.to_string(), message);
            }
            None => {
                self.errors.remove(key);
            }
        }
    }

    fn step_keys(&self, step: usize) -> Vec<&'static str> {
        if self.definition.is_documents_step(step) {
            self.definition.documents.iter().map(|d| d.key).collect()
        } else {
            self.definition
                .fields_for_step(step)
                .iter()
                .map(|f| f.key)
                .collect()
        }
    }

    fn replace_step_errors(&mut self, step: usize, step_errors: ErrorMap) {
        for key in self.step_keys(step) {
            self.errors.remove(key);
        }
        self.errors.extend(step_errors);
    }

    fn persist_pending(&self, target_step: usize) -> anyhow::Result<()> {
        let snapshot = serde_json::to_string(&self.state)?;
        self.session
            .set(&self.definition.form_data_slot(), &snapshot)?;
        self.session
            .set(&self.definition.pending_step_slot(), &target_step.to_string())?;
        debug!(
            "[PHASE: session] [STEP: persist] Saved {} resume snapshot targeting step {}",
            self.definition.slug, target_step
        );
        Ok(())
    }

    /// Consume the resume snapshot. Both slots must be present and parse;
    /// anything else clears whatever is there and starts fresh.
    fn take_pending(&self) -> Option<(FormState, usize)> {
        let data_slot = self.definition.form_data_slot();
        let step_slot = self.definition.pending_step_slot();

        let (raw_state, raw_step) = match (self.session.get(&data_slot), self.session.get(&step_slot))
        {
            (Some(s), Some(p)) => (s, p),
            (None, None) => return None,
            _ => {
                warn!(
                    "[PHASE: session] [STEP: restore] Half-written resume slots for {}; discarding",
                    self.definition.slug
                );
                self.discard_pending();
                return None;
            }
        };

        match (
            serde_json::from_str::<FormState>(&raw_state),
            raw_step.trim().parse::<usize>(),
        ) {
            (Ok(restored), Ok(step)) => {
                self.discard_pending();
                let step = step.clamp(1, self.definition.final_step());
                Some((self.merge_restored(restored), step))
            }
            _ => {
                warn!(
                    "[PHASE: session] [STEP: restore] Corrupt resume snapshot for {}; discarding",
                    self.definition.slug
                );
                self.discard_pending();
                None
            }
        }
    }

    /// Overlay restored values onto the catalog's key set, dropping keys the
    /// current definition no longer knows.
    fn merge_restored(&self, restored: FormState) -> FormState {
        let mut merged = FormState::with_fields(self.definition.all_fields().map(|f| f.key));
        for spec in self.definition.all_fields() {
            let value = restored.value(spec.key);
            if !value.is_empty() {
                merged.set_value(spec.key, value);
            }
        }
        merged
    }

    fn discard_pending(&self) {
        for slot in [
            self.definition.form_data_slot(),
            self.definition.pending_step_slot(),
        ] {
            if let Err(e) = self.session.remove(&slot) {
                warn!(
                    "[PHASE: session] [STEP: restore] Failed to clear {}: {}",
                    slot, e
                );
            }
        }
    }

    fn reset_after_success(&mut self) {
        self.state.clear();
        self.documents.clear();
        self.errors.clear();
        self.touched.clear();
        self.completed.clear();
        self.current_step = 1;
    }
}

fn upload_error_detail(e: &UploadError) -> String {
    match e {
        UploadError::Gateway(inner) => inner.detail().to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::api::gateway::GatewayError;
    use crate::models::requests::{ApplicationPayload, InquiryRequest};
    use crate::models::responses::InquiryReceipt;
    use crate::models::state::UploadedDocument;
    use crate::session::auth::StaticTokenProvider;
    use crate::session::store::MemorySessionStore;

    const PORTAL: &str = "https://portal.finbridge.in/login";

    enum SubmitMode {
        Accept(&'static str),
        RejectWithFields(&'static [(&'static str, &'static str)]),
        RejectWithMessage(&'static str),
        Unreachable,
    }

    /// Stub gateway with call counters, so tests prove exactly when the
    /// network is touched.
    struct StubGateway {
        mode: SubmitMode,
        refuse_uploads: bool,
        submit_calls: AtomicU32,
        upload_calls: AtomicU32,
    }

    impl StubGateway {
        fn accepting(id: &'static str) -> Self {
            Self::with_mode(SubmitMode::Accept(id))
        }

        fn with_mode(mode: SubmitMode) -> Self {
            Self {
                mode,
                refuse_uploads: false,
                submit_calls: AtomicU32::new(0),
                upload_calls: AtomicU32::new(0),
            }
        }

        fn refusing_uploads() -> Self {
            let mut stub = Self::accepting("ST00000000");
            stub.refuse_uploads = true;
            stub
        }
    }

    #[async_trait]
    impl ApplicationGateway for StubGateway {
        async fn submit_application(
            &self,
            _path: &str,
            _payload: &ApplicationPayload,
        ) -> Result<SubmissionReply, GatewayError> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            match &self.mode {
                SubmitMode::Accept(id) => Ok(SubmissionReply::Accepted {
                    application_id: id.to_string(),
                }),
                SubmitMode::RejectWithFields(pairs) => Ok(SubmissionReply::Rejected {
                    message: Some("Validation failed".to_string()),
                    field_errors: pairs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                }),
                SubmitMode::RejectWithMessage(message) => Ok(SubmissionReply::Rejected {
                    message: Some(message.to_string()),
                    field_errors: BTreeMap::new(),
                }),
                SubmitMode::Unreachable => Err(GatewayError::Unreachable {
                    detail: "connection refused".to_string(),
                }),
            }
        }

        async fn upload_document(
            &self,
            file_name: &str,
            _mime_type: &str,
            _bytes: Vec<u8>,
        ) -> Result<UploadedDocument, GatewayError> {
            self.upload_calls.fetch_add(1, Ordering::SeqCst);
            if self.refuse_uploads {
                return Err(GatewayError::Refused {
                    message: "Upload refused".to_string(),
                });
            }
            Ok(UploadedDocument {
                name: file_name.to_string(),
                path: format!("uploads/stub/{}", file_name),
            })
        }

        async fn submit_inquiry(
            &self,
            _inquiry: &InquiryRequest,
        ) -> Result<InquiryReceipt, GatewayError> {
            unimplemented!()
        }
    }

    fn with_token(session: Arc<MemorySessionStore>) -> (Wizard, MountOutcome) {
        Wizard::mount(
            Service::ShortTermLoan,
            PORTAL,
            Arc::new(StaticTokenProvider::new("tok-123")),
            session,
        )
    }

    fn anonymous(session: Arc<MemorySessionStore>) -> (Wizard, MountOutcome) {
        Wizard::mount(
            Service::ShortTermLoan,
            PORTAL,
            Arc::new(StaticTokenProvider::anonymous()),
            session,
        )
    }

    fn fill_contact(wizard: &mut Wizard) {
        wizard.edit_field("fullName", "Asha Rao");
        wizard.edit_field("email", "asha@example.com");
        wizard.edit_field("phone", "9876543210");
    }

    fn fill_loan_details(wizard: &mut Wizard) {
        wizard.edit_field("loanAmount", "50000");
        wizard.edit_field("loanPurpose", "Working capital");
        wizard.edit_field("tenureMonths", "12");
        wizard.edit_field("monthlyIncome", "65000");
    }

    fn fill_kyc(wizard: &mut Wizard) {
        wizard.edit_field("panNumber", "abcde1234f");
        wizard.edit_field("employmentType", "Salaried");
        wizard.edit_field("companyName", "Acme Traders");
        wizard.edit_field("address", "14 MG Road, Indiranagar");
        wizard.edit_field("city", "Bengaluru");
        wizard.edit_field("pincode", "560038");
    }

    fn attach_all_documents(wizard: &mut Wizard) {
        for doc in wizard.definition.documents {
            wizard.documents.insert(
                doc.key.to_string(),
                UploadedDocument {
                    name: format!("{}.pdf", doc.key),
                    path: format!("uploads/test/{}.pdf", doc.key),
                },
            );
        }
    }

    fn advance_to_documents(wizard: &mut Wizard) {
        fill_contact(wizard);
        fill_loan_details(wizard);
        fill_kyc(wizard);
        while wizard.current_step < wizard.definition.final_step() {
            match wizard.next().unwrap() {
                NextOutcome::Advanced { .. } => {}
                other => panic!("Could not reach documents step: {:?}", other),
            }
        }
    }

    // INTENT: Prove that a fresh anonymous mount starts at step 1 and does
    // not invent resume slots.
    #[test]
    fn anonymous_mount_is_fresh_and_leaves_slots_alone() {
        let session = Arc::new(MemorySessionStore::new());
        let (wizard, outcome) = anonymous(session.clone());

        assert_eq!(outcome, MountOutcome::Fresh);
        assert_eq!(wizard.current_step(), 1);
        assert!(session.get("short_term_loan_form_data").is_none());
        assert!(session.get("short_term_loan_pending_step").is_none());
    }

    // INTENT: Prove that leaving step 1 without a token persists the form
    // and target step, redirects to login, and does not advance.
    #[test]
    fn next_without_token_persists_and_redirects_before_validation() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = anonymous(session.clone());
        // step 1 deliberately left invalid: the gate must fire first
        wizard.edit_field("fullName", "Asha Rao");

        let outcome = wizard.next().unwrap();

        let url = match outcome {
            NextOutcome::RedirectToLogin { url } => url,
            other => panic!("Expected redirect, got {:?}", other),
        };
        assert!(url.starts_with(PORTAL), "{}", url);
        assert!(url.contains("redirect=short-term-loan"), "{}", url);
        assert!(url.contains("step=2"), "{}", url);
        assert_eq!(wizard.current_step(), 1, "Redirect must not advance");

        let saved = session.get("short_term_loan_form_data").unwrap();
        let restored: FormState = serde_json::from_str(&saved).unwrap();
        assert_eq!(restored, *wizard.state(), "Snapshot must round-trip");
        assert_eq!(
            session.get("short_term_loan_pending_step").as_deref(),
            Some("2")
        );
    }

    // INTENT: Prove that a snapshot persisted before the login redirect is
    // restored deep-equal on the next authenticated mount, and consumed.
    #[test]
    fn authenticated_mount_restores_snapshot_and_clears_slots() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut first, _) = anonymous(session.clone());
        fill_contact(&mut first);
        first.next().unwrap();
        let persisted_state = first.state().clone();

        let (second, outcome) = with_token(session.clone());

        assert_eq!(outcome, MountOutcome::Restored { step: 2 });
        assert_eq!(second.current_step(), 2);
        assert_eq!(*second.state(), persisted_state);
        assert!(
            session.get("short_term_loan_form_data").is_none(),
            "Snapshot must be consumed on restore"
        );
        assert!(session.get("short_term_loan_pending_step").is_none());
    }

    // INTENT: Prove that a corrupt snapshot is discarded instead of crashing
    // or resuming into garbage.
    #[test]
    fn corrupt_snapshot_is_discarded_and_mount_is_fresh() {
        let session = Arc::new(MemorySessionStore::new());
        session.set("short_term_loan_form_data", "{not json").unwrap();
        session.set("short_term_loan_pending_step", "2").unwrap();

        let (wizard, outcome) = with_token(session.clone());

        assert_eq!(outcome, MountOutcome::Fresh);
        assert_eq!(wizard.current_step(), 1);
        assert!(session.get("short_term_loan_form_data").is_none());
        assert!(session.get("short_term_loan_pending_step").is_none());
    }

    // INTENT: Prove that a persisted step outside the wizard's range is
    // clamped instead of trusted.
    #[test]
    fn out_of_range_pending_step_is_clamped() {
        let session = Arc::new(MemorySessionStore::new());
        session
            .set("short_term_loan_form_data", &serde_json::to_string(&FormState::default()).unwrap())
            .unwrap();
        session.set("short_term_loan_pending_step", "99").unwrap();

        let (wizard, outcome) = with_token(session);

        assert_eq!(outcome, MountOutcome::Restored { step: 4 });
        assert_eq!(wizard.current_step(), 4);
    }

    // INTENT: Prove that the wizard never advances while the current step
    // has validation errors.
    #[test]
    fn next_with_invalid_fields_blocks_and_records_errors() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        wizard.edit_field("fullName", "");
        wizard.edit_field("email", "a@b.com");
        wizard.edit_field("phone", "9999999999");

        let outcome = wizard.next().unwrap();

        assert_eq!(outcome, NextOutcome::Blocked);
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(
            wizard.errors().len(),
            1,
            "Only fullName should fail: {:?}",
            wizard.errors()
        );
        assert!(wizard.error_for("fullName").is_some());
        assert!(wizard.is_touched("fullName"), "Blocked fields become touched");
    }

    #[test]
    fn next_with_valid_step_advances_and_marks_completed() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        fill_contact(&mut wizard);

        let outcome = wizard.next().unwrap();

        assert_eq!(outcome, NextOutcome::Advanced { step: 2 });
        assert!(wizard.completed_steps().contains(&1));
        assert!(wizard.errors().is_empty());
    }

    // INTENT: Prove that fixing a blocked field and retrying clears the
    // stale error rather than leaving it behind.
    #[test]
    fn fixing_blocked_field_clears_stale_error_on_retry() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        wizard.edit_field("email", "a@b.com");
        wizard.edit_field("phone", "9999999999");
        assert_eq!(wizard.next().unwrap(), NextOutcome::Blocked);

        wizard.edit_field("fullName", "Asha Rao");
        let outcome = wizard.next().unwrap();

        assert_eq!(outcome, NextOutcome::Advanced { step: 2 });
        assert!(wizard.errors().is_empty());
    }

    #[test]
    fn previous_saturates_at_step_one() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);

        assert_eq!(wizard.previous(), 1);

        fill_contact(&mut wizard);
        wizard.next().unwrap();
        assert_eq!(wizard.previous(), 1);
        assert_eq!(wizard.previous(), 1);
    }

    // INTENT: Prove that editing a touched field revalidates live, while an
    // untouched field stays quiet until blur.
    #[test]
    fn touched_fields_revalidate_on_edit() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);

        wizard.edit_field("email", "broken");
        assert!(wizard.error_for("email").is_none(), "Untouched stays quiet");

        wizard.touch_field("email");
        assert!(wizard.error_for("email").is_some());

        wizard.edit_field("email", "asha@example.com");
        assert!(wizard.error_for("email").is_none(), "Fix clears live");
    }

    #[test]
    fn pan_family_values_are_stored_uppercase() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);

        wizard.edit_field("panNumber", "abcde1234f");

        assert_eq!(wizard.state().value("panNumber"), "ABCDE1234F");
    }

    // INTENT: Prove that submit below the final step is a no-op with no
    // network call.
    #[tokio::test]
    async fn submit_below_final_step_is_not_ready_and_makes_no_call() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        let gateway = StubGateway::accepting("ST12345678");

        let outcome = wizard.submit(&gateway).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::NotReady);
        assert_eq!(
            gateway.submit_calls.load(Ordering::SeqCst),
            0,
            "Early submit must not touch the network"
        );
    }

    // INTENT: Prove that the in-flight guard swallows a second submit.
    #[tokio::test]
    async fn submit_while_in_flight_is_ignored() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        advance_to_documents(&mut wizard);
        attach_all_documents(&mut wizard);
        wizard.submitting = true;
        let gateway = StubGateway::accepting("ST12345678");

        let outcome = wizard.submit(&gateway).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::InFlight);
        assert_eq!(gateway.submit_calls.load(Ordering::SeqCst), 0);
    }

    // INTENT: Prove that submit without a token persists the snapshot
    // targeting the final step and redirects instead of posting.
    #[tokio::test]
    async fn submit_without_token_redirects_with_final_step_target() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session.clone());
        advance_to_documents(&mut wizard);
        attach_all_documents(&mut wizard);
        wizard.tokens = Arc::new(StaticTokenProvider::anonymous());
        let gateway = StubGateway::accepting("ST12345678");

        let outcome = wizard.submit(&gateway).await.unwrap();

        match outcome {
            SubmitOutcome::RedirectToLogin { url } => {
                assert!(url.contains("step=4"), "{}", url);
            }
            other => panic!("Expected redirect, got {:?}", other),
        }
        assert_eq!(
            session.get("short_term_loan_pending_step").as_deref(),
            Some("4")
        );
        assert_eq!(gateway.submit_calls.load(Ordering::SeqCst), 0);
    }

    // INTENT: Prove that missing documents block submission with one error
    // per missing slot and no network call.
    #[tokio::test]
    async fn submit_with_missing_documents_blocks_with_exact_errors() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        advance_to_documents(&mut wizard);
        attach_all_documents(&mut wizard);
        wizard.documents.remove("salarySlips");
        wizard.documents.remove("addressProof");
        let gateway = StubGateway::accepting("ST12345678");

        let outcome = wizard.submit(&gateway).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Blocked);
        assert_eq!(
            wizard.errors().len(),
            2,
            "Exactly the missing slots error: {:?}",
            wizard.errors()
        );
        assert!(wizard.error_for("salarySlips").is_some());
        assert!(wizard.error_for("addressProof").is_some());
        assert_eq!(gateway.submit_calls.load(Ordering::SeqCst), 0);
    }

    // INTENT: Prove that an accepted submission resets every piece of wizard
    // state and lands in the submitted phase with the server's id.
    #[tokio::test]
    async fn accepted_submission_resets_state_and_reports_id() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        advance_to_documents(&mut wizard);
        attach_all_documents(&mut wizard);
        let gateway = StubGateway::accepting("ST12345678");

        let outcome = wizard.submit(&gateway).await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Submitted {
                application_id: "ST12345678".to_string()
            }
        );
        assert_eq!(
            *wizard.phase(),
            WizardPhase::Submitted {
                application_id: "ST12345678".to_string()
            }
        );
        assert!(wizard.state().is_blank(), "Form must reset after success");
        assert!(wizard.documents().is_empty());
        assert!(wizard.errors().is_empty());
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(gateway.submit_calls.load(Ordering::SeqCst), 1);
    }

    // INTENT: Prove that backend field errors land on the fields and the
    // wizard keeps its state for correction.
    #[tokio::test]
    async fn backend_field_rejection_maps_errors_onto_fields() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        advance_to_documents(&mut wizard);
        attach_all_documents(&mut wizard);
        let gateway = StubGateway::with_mode(SubmitMode::RejectWithFields(&[(
            "panNumber",
            "PAN does not match records",
        )]));

        let outcome = wizard.submit(&gateway).await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::RejectedByBackend {
                message: Some("Validation failed".to_string())
            }
        );
        assert_eq!(
            wizard.error_for("panNumber"),
            Some("PAN does not match records")
        );
        assert_eq!(*wizard.phase(), WizardPhase::InProgress);
        assert!(!wizard.state().is_blank(), "State survives a rejection");
    }

    #[tokio::test]
    async fn backend_rejection_without_fields_fails_with_message() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        advance_to_documents(&mut wizard);
        attach_all_documents(&mut wizard);
        let gateway = StubGateway::with_mode(SubmitMode::RejectWithMessage("Service unavailable"));

        let outcome = wizard.submit(&gateway).await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: "Service unavailable".to_string()
            }
        );
    }

    // INTENT: Prove that a transport failure frees the busy flag so the user
    // can retry.
    #[tokio::test]
    async fn transport_failure_clears_busy_flag_for_retry() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        advance_to_documents(&mut wizard);
        attach_all_documents(&mut wizard);

        let failing = StubGateway::with_mode(SubmitMode::Unreachable);
        let outcome = wizard.submit(&failing).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert!(!wizard.is_submitting());

        let working = StubGateway::accepting("ST87654321");
        let retry = wizard.submit(&working).await.unwrap();
        assert_eq!(
            retry,
            SubmitOutcome::Submitted {
                application_id: "ST87654321".to_string()
            }
        );
    }

    // INTENT: Prove that attaching to an unknown slot fails fast with no
    // upload call and no document change.
    #[tokio::test]
    async fn attach_document_rejects_unknown_slot() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        let gateway = StubGateway::accepting("ST12345678");
        let file = DocumentFile {
            file_name: "x.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0u8; 16],
        };

        let result = wizard.attach_document(&gateway, "passport", file).await;

        assert!(matches!(result, Err(UploadError::UnknownDocument { .. })));
        assert!(wizard.documents().is_empty());
        assert_eq!(gateway.upload_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn attach_document_stores_descriptor_on_success() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        let gateway = StubGateway::accepting("ST12345678");
        let file = DocumentFile {
            file_name: "aadhar.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![0u8; 16],
        };

        wizard.attach_document(&gateway, "aadhar", file).await.unwrap();

        let stored = wizard.documents().get("aadhar").unwrap();
        assert_eq!(stored.name, "aadhar.png");
        assert_eq!(stored.path, "uploads/stub/aadhar.png");
    }

    // INTENT: Prove that a refused upload leaves the slot empty and records
    // the failure against it.
    #[tokio::test]
    async fn refused_upload_leaves_slot_empty_and_records_error() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        let gateway = StubGateway::refusing_uploads();
        let file = DocumentFile {
            file_name: "pan.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0u8; 16],
        };

        let result = wizard.attach_document(&gateway, "panCard", file).await;

        assert!(result.is_err());
        assert!(wizard.documents().is_empty());
        assert_eq!(wizard.error_for("panCard"), Some("Upload refused"));
    }

    #[test]
    fn remove_document_clears_the_slot_once() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        attach_all_documents(&mut wizard);

        assert!(wizard.remove_document("panCard"));
        assert!(wizard.documents().get("panCard").is_none());
        assert!(!wizard.remove_document("panCard"), "Second remove is a no-op");
    }

    #[tokio::test]
    async fn replacing_a_document_overwrites_the_slot() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        let gateway = StubGateway::accepting("ST12345678");

        for name in ["old.pdf", "new.pdf"] {
            let file = DocumentFile {
                file_name: name.to_string(),
                mime_type: "application/pdf".to_string(),
                bytes: vec![0u8; 8],
            };
            wizard.attach_document(&gateway, "panCard", file).await.unwrap();
        }

        assert_eq!(wizard.documents().len(), 1);
        assert_eq!(wizard.documents().get("panCard").unwrap().name, "new.pdf");
    }

    #[test]
    fn next_at_final_step_reports_already_there() {
        let session = Arc::new(MemorySessionStore::new());
        let (mut wizard, _) = with_token(session);
        advance_to_documents(&mut wizard);

        assert_eq!(wizard.next().unwrap(), NextOutcome::AlreadyAtFinalStep);
    }
}
