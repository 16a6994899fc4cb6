use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use thiserror::Error;

use crate::models::requests::{ApplicationPayload, InquiryRequest};
use crate::models::responses::{ApiEnvelope, ApplicationReceipt, InquiryReceipt};
use crate::models::state::UploadedDocument;
use crate::utils::settings::Settings;

// =============================================================================
// ApplicationGateway Trait
// =============================================================================

/// Error returned by gateway calls.
/// The Display form is safe to show in the UI; `detail()` is for logs.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unable to reach the server. Check your internet connection and retry.")]
    Unreachable { detail: String },
    #[error("The request timed out. Please retry.")]
    TimedOut,
    #[error("The server returned an unexpected response. Please retry.")]
    BadResponse { detail: String },
    #[error("Could not prepare the request. Please retry.")]
    RequestBuild { detail: String },
    #[error("{message}")]
    Refused { message: String },
}

impl GatewayError {
    /// Internal details for logging (never shown in the UI).
    pub fn detail(&self) -> &str {
        match self {
            GatewayError::Unreachable { detail } => detail,
            GatewayError::TimedOut => "request timed out",
            GatewayError::BadResponse { detail } => detail,
            GatewayError::RequestBuild { detail } => detail,
            GatewayError::Refused { message } => message,
        }
    }
}

/// Outcome of an application submission as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionReply {
    Accepted {
        application_id: String,
    },
    Rejected {
        message: Option<String>,
        field_errors: BTreeMap<String, String>,
    },
}

/// Trait for calls to the FinBridge backend.
/// Production code uses HttpGateway; tests use stub gateways.
#[async_trait]
pub trait ApplicationGateway: Send + Sync {
    /// Submit a completed application to the service endpoint at `path`.
    async fn submit_application(
        &self,
        path: &str,
        payload: &ApplicationPayload,
    ) -> Result<SubmissionReply, GatewayError>;

    /// Upload one supporting document and return its stored descriptor.
    async fn upload_document(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedDocument, GatewayError>;

    /// Submit a general inquiry from the contact form.
    async fn submit_inquiry(&self, inquiry: &InquiryRequest)
        -> Result<InquiryReceipt, GatewayError>;

    /// Per-request deadline for document uploads.
    fn upload_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
}

// =============================================================================
// HttpGateway
// =============================================================================

/// Gateway backed by the real FinBridge API.
///
/// The client carries no global timeout: application submissions wait as long
/// as the server takes. Only document uploads get a per-request deadline.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    upload_timeout: Duration,
}

impl HttpGateway {
    pub fn new(settings: &Settings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::RequestBuild {
                detail: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: settings.api_base_url.clone(),
            upload_timeout: Duration::from_secs(settings.upload_timeout_secs),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn transport_error(e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::TimedOut
        } else {
            GatewayError::Unreachable {
                detail: format!("Transport error: {}", e),
            }
        }
    }
}

#[async_trait]
impl ApplicationGateway for HttpGateway {
    async fn submit_application(
        &self,
        path: &str,
        payload: &ApplicationPayload,
    ) -> Result<SubmissionReply, GatewayError> {
        let url = self.endpoint(path);
        debug!("[PHASE: submission] [STEP: http] POST {}", url);

        let resp = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(Self::transport_error)?;
        let status = resp.status();
        let body = resp.text().await.map_err(Self::transport_error)?;

        let reply = interpret_submission(status, &body)?;
        if let SubmissionReply::Rejected { message, .. } = &reply {
            warn!(
                "[PHASE: submission] [STEP: http] Backend rejected application (HTTP {}): {}",
                status,
                message.as_deref().unwrap_or("no message")
            );
        }
        Ok(reply)
    }

    async fn upload_document(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedDocument, GatewayError> {
        let url = self.endpoint("/api/documents/upload");
        debug!(
            "[PHASE: document_upload] [STEP: http] POST {} ({} bytes)",
            url,
            bytes.len()
        );

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| GatewayError::RequestBuild {
                detail: format!("Invalid MIME type {}: {}", mime_type, e),
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(self.upload_timeout())
            .send()
            .await
            .map_err(Self::transport_error)?;
        let status = resp.status();
        let body = resp.text().await.map_err(Self::transport_error)?;

        interpret_upload(status, &body)
    }

    async fn submit_inquiry(
        &self,
        inquiry: &InquiryRequest,
    ) -> Result<InquiryReceipt, GatewayError> {
        let url = self.endpoint("/api/inquiries");
        debug!("[PHASE: submission] [STEP: http] POST {}", url);

        let resp = self
            .client
            .post(&url)
            .json(inquiry)
            .send()
            .await
            .map_err(Self::transport_error)?;
        let status = resp.status();
        let body = resp.text().await.map_err(Self::transport_error)?;

        interpret_inquiry(status, &body)
    }

    fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }
}

// =============================================================================
// Response interpretation
// =============================================================================

fn interpret_submission(status: StatusCode, body: &str) -> Result<SubmissionReply, GatewayError> {
    match serde_json::from_str::<ApiEnvelope<ApplicationReceipt>>(body) {
        Ok(envelope) => {
            if envelope.success {
                if let Some(receipt) = envelope.data {
                    return Ok(SubmissionReply::Accepted {
                        application_id: receipt.application_id,
                    });
                }
                return Err(GatewayError::BadResponse {
                    detail: "Success envelope without application data".to_string(),
                });
            }
            Ok(SubmissionReply::Rejected {
                message: envelope.error.or(envelope.message),
                field_errors: envelope.field_errors,
            })
        }
        Err(e) => {
            if status.is_success() {
                Err(GatewayError::BadResponse {
                    detail: format!("Unparseable response body: {}", e),
                })
            } else {
                Ok(SubmissionReply::Rejected {
                    message: Some(format!("Server error (HTTP {})", status.as_u16())),
                    field_errors: BTreeMap::new(),
                })
            }
        }
    }
}

fn interpret_upload(status: StatusCode, body: &str) -> Result<UploadedDocument, GatewayError> {
    match serde_json::from_str::<ApiEnvelope<UploadedDocument>>(body) {
        Ok(envelope) => {
            if envelope.success {
                if let Some(document) = envelope.data {
                    return Ok(document);
                }
                return Err(GatewayError::BadResponse {
                    detail: "Success envelope without document data".to_string(),
                });
            }
            Err(GatewayError::Refused {
                message: envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| "Upload was refused by the server.".to_string()),
            })
        }
        Err(e) => {
            if status.is_success() {
                Err(GatewayError::BadResponse {
                    detail: format!("Unparseable response body: {}", e),
                })
            } else {
                Err(GatewayError::Refused {
                    message: format!("Server error (HTTP {})", status.as_u16()),
                })
            }
        }
    }
}

fn interpret_inquiry(status: StatusCode, body: &str) -> Result<InquiryReceipt, GatewayError> {
    match serde_json::from_str::<ApiEnvelope<InquiryReceipt>>(body) {
        Ok(envelope) => {
            if envelope.success {
                if let Some(receipt) = envelope.data {
                    return Ok(receipt);
                }
                return Err(GatewayError::BadResponse {
                    detail: "Success envelope without inquiry data".to_string(),
                });
            }
            Err(GatewayError::Refused {
                message: envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| "Inquiry was refused by the server.".to_string()),
            })
        }
        Err(e) => {
            if status.is_success() {
                Err(GatewayError::BadResponse {
                    detail: format!("Unparseable response body: {}", e),
                })
            } else {
                Err(GatewayError::Refused {
                    message: format!("Server error (HTTP {})", status.as_u16()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // INTENT: Prove that an accepted submission yields the backend's
    // application id untouched.
    #[test]
    fn accepted_envelope_maps_to_accepted_reply() {
        let body = r#"{"success":true,"data":{"applicationId":"ST12345678"}}"#;
        let reply = interpret_submission(StatusCode::OK, body).unwrap();
        assert_eq!(
            reply,
            SubmissionReply::Accepted {
                application_id: "ST12345678".to_string()
            },
            "Accepted reply must carry the server-issued id"
        );
    }

    // INTENT: Prove that backend field errors survive into the Rejected reply
    // so the wizard can surface them next to the offending inputs.
    #[test]
    fn rejected_envelope_keeps_field_errors() {
        let body = r#"{
            "success": false,
            "error": "Validation failed",
            "fieldErrors": {"panNumber": "PAN does not match records"}
        }"#;
        let reply = interpret_submission(StatusCode::UNPROCESSABLE_ENTITY, body).unwrap();
        match reply {
            SubmissionReply::Rejected {
                message,
                field_errors,
            } => {
                assert_eq!(message.as_deref(), Some("Validation failed"));
                assert_eq!(
                    field_errors.get("panNumber").map(String::as_str),
                    Some("PAN does not match records")
                );
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    // INTENT: Prove that a success envelope missing its payload is treated as
    // a malformed response, not a silent acceptance.
    #[test]
    fn success_without_data_is_bad_response() {
        let body = r#"{"success":true}"#;
        let err = interpret_submission(StatusCode::OK, body).unwrap_err();
        assert!(
            matches!(err, GatewayError::BadResponse { .. }),
            "Got {:?}",
            err
        );
    }

    // INTENT: Prove that an unparseable 5xx body becomes a user-facing
    // rejection with the HTTP status, not a raw serde error.
    #[test]
    fn unparseable_server_error_maps_to_rejected_with_status() {
        let reply =
            interpret_submission(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>").unwrap();
        match reply {
            SubmissionReply::Rejected {
                message,
                field_errors,
            } => {
                assert_eq!(message.as_deref(), Some("Server error (HTTP 500)"));
                assert!(field_errors.is_empty());
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    // INTENT: Prove that garbage on a 200 is flagged as a bad response so the
    // caller never treats it as a rejection the user caused.
    #[test]
    fn unparseable_success_body_is_bad_response() {
        let err = interpret_submission(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, GatewayError::BadResponse { .. }));
    }

    #[test]
    fn upload_envelope_yields_stored_descriptor() {
        let body = r#"{"success":true,"data":{"name":"pan.pdf","path":"uploads/ab12/pan.pdf"}}"#;
        let document = interpret_upload(StatusCode::OK, body).unwrap();
        assert_eq!(document.name, "pan.pdf");
        assert_eq!(document.path, "uploads/ab12/pan.pdf");
    }

    #[test]
    fn refused_upload_surfaces_server_message() {
        let body = r#"{"success":false,"error":"File failed the malware scan"}"#;
        let err = interpret_upload(StatusCode::OK, body).unwrap_err();
        assert_eq!(err.to_string(), "File failed the malware scan");
    }

    #[test]
    fn inquiry_envelope_yields_receipt() {
        let body = r#"{"success":true,"data":{"inquiryId":"INQ-2024-0042"}}"#;
        let receipt = interpret_inquiry(StatusCode::OK, body).unwrap();
        assert_eq!(receipt.inquiry_id, "INQ-2024-0042");
    }

    // INTENT: Prove that every gateway error shows a user-safe message with
    // no transport internals leaking into the UI.
    #[test]
    fn error_display_never_leaks_internals() {
        let errors = [
            GatewayError::Unreachable {
                detail: "dns lookup failed for api.finbridge.in:443".to_string(),
            },
            GatewayError::TimedOut,
            GatewayError::BadResponse {
                detail: "expected value at line 1 column 1".to_string(),
            },
            GatewayError::RequestBuild {
                detail: "builder error".to_string(),
            },
        ];
        for err in &errors {
            let shown = err.to_string();
            assert!(
                !shown.contains("dns") && !shown.contains("line 1") && !shown.contains("builder"),
                "User message leaked internals: {}",
                shown
            );
        }
    }

    // INTENT: Prove that the default upload deadline stays at 30 seconds for
    // gateways that do not override it.
    #[test]
    fn default_upload_timeout_is_thirty_seconds() {
        struct Bare;

        #[async_trait]
        impl ApplicationGateway for Bare {
            async fn submit_application(
                &self,
                _path: &str,
                _payload: &ApplicationPayload,
            ) -> Result<SubmissionReply, GatewayError> {
                unimplemented!()
            }

            async fn upload_document(
                &self,
                _file_name: &str,
                _mime_type: &str,
                _bytes: Vec<u8>,
            ) -> Result<UploadedDocument, GatewayError> {
                unimplemented!()
            }

            async fn submit_inquiry(
                &self,
                _inquiry: &InquiryRequest,
            ) -> Result<InquiryReceipt, GatewayError> {
                unimplemented!()
            }
        }

        assert_eq!(Bare.upload_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn endpoint_join_tolerates_trailing_slash() {
        let settings = Settings {
            api_base_url: "https://api.finbridge.in/".to_string(),
            ..Settings::default()
        };
        let gateway = HttpGateway::new(&settings).unwrap();
        assert_eq!(
            gateway.endpoint("/api/inquiries"),
            "https://api.finbridge.in/api/inquiries"
        );
    }
}
