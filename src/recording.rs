//! Verification with an audit trail.
//!
//! [`RecordingVerifier`] delegates the cryptographic decision to any
//! [`Verifier`] and keeps only the most recent outcome. A call either
//! commits a new record and emits one event, or fails and changes nothing.

use std::sync::Arc;

use serde::Serialize;

use crate::error::VerifyError;
use crate::field::FieldElement;
use crate::verifier::Verifier;

/// Outcome of the most recent successful `verify_and_store` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerificationRecord {
    last_result: bool,
    last_public_inputs: Vec<FieldElement>,
}

impl VerificationRecord {
    pub fn last_result(&self) -> bool {
        self.last_result
    }

    pub fn last_public_inputs(&self) -> &[FieldElement] {
        &self.last_public_inputs
    }
}

/// Audit notification emitted once per committed verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationEvent {
    pub result: bool,
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &VerificationEvent);
}

/// Writes audit events to the `modexp_prover::audit` tracing target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: &VerificationEvent) {
        tracing::info!(target: "modexp_prover::audit", result = event.result, "proof verified");
    }
}

pub struct RecordingVerifier {
    verifier: Arc<dyn Verifier>,
    sink: Arc<dyn AuditSink>,
    record: VerificationRecord,
}

impl RecordingVerifier {
    pub fn new(verifier: Arc<dyn Verifier>) -> Self {
        Self::with_sink(verifier, Arc::new(TracingAuditSink))
    }

    pub fn with_sink(verifier: Arc<dyn Verifier>, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            verifier,
            sink,
            record: VerificationRecord::default(),
        }
    }

    /// Verify, then replace the stored record and emit one audit event.
    ///
    /// A structural failure from the underlying verifier is returned as is;
    /// the record is untouched and no event is emitted.
    pub fn verify_and_store(
        &mut self,
        proof: &[u8],
        public_inputs: &[FieldElement],
    ) -> Result<bool, VerifyError> {
        let result = self.verifier.verify(proof, public_inputs)?;

        self.record = VerificationRecord {
            last_result: result,
            last_public_inputs: public_inputs.to_vec(),
        };
        tracing::debug!(
            "Verification record updated: result={} inputs={}",
            result,
            public_inputs.len()
        );

        self.sink.emit(&VerificationEvent { result });
        Ok(result)
    }

    pub fn last_result(&self) -> bool {
        self.record.last_result
    }

    pub fn last_public_inputs(&self) -> &[FieldElement] {
        &self.record.last_public_inputs
    }

    pub fn record(&self) -> &VerificationRecord {
        &self.record
    }
}

/// Plain verification through the wrapped verifier, without recording.
impl Verifier for RecordingVerifier {
    fn verify(&self, proof: &[u8], public_inputs: &[FieldElement]) -> Result<bool, VerifyError> {
        self.verifier.verify(proof, public_inputs)
    }
}
