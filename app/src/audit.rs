// ==============================================================================
// audit.rs - Audit Logging for Pharmacogenomic Analyses
// ==============================================================================
// Description: Audit trail for uploads, analyses and explanation requests
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-19
// Version: 2.0.0
// Compliance: HIPAA § 164.312(b), GDPR Article 30
// ==============================================================================
// Events are written as JSON through `tracing` under the "audit" target so they
// can be routed separately (RUST_LOG=audit=info). Audit metadata (ids,
// timestamps) never enters an AnalysisResult.
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // File operations
    FileValidated,
    FileRejected,

    // Analysis events
    AnalysisCompleted,
    AnalysisRejected,

    // Collaborator calls
    ExplanationRequested,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub resource: Option<String>,
    pub result: String,
    pub details: serde_json::Value,
    pub severity: LogSeverity,
}

impl AuditEvent {
    pub fn new(
        event_type: AuditEventType,
        resource: Option<String>,
        details: serde_json::Value,
    ) -> Self {
        let (severity, result) = match event_type {
            AuditEventType::FileRejected => (LogSeverity::Error, "failure"),
            AuditEventType::AnalysisRejected => (LogSeverity::Warning, "failure"),
            _ => (LogSeverity::Info, "success"),
        };

        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            resource,
            result: result.to_string(),
            details,
            severity,
        }
    }

    /// Emit the event through the tracing subscriber
    pub fn log(&self) {
        let payload = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!(target: "audit", "Failed to serialize audit event {}: {}", self.id, e);
                return;
            }
        };

        match self.severity {
            LogSeverity::Info => info!(target: "audit", "{}", payload),
            LogSeverity::Warning => warn!(target: "audit", "{}", payload),
            LogSeverity::Error => error!(target: "audit", "{}", payload),
        }
    }
}

/// Convenience function to log an audit event
pub fn log_event(
    event_type: AuditEventType,
    resource: Option<String>,
    details: serde_json::Value,
) -> AuditEvent {
    let event = AuditEvent::new(event_type, resource, details);
    event.log();
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_creation() {
        let event = AuditEvent::new(
            AuditEventType::AnalysisCompleted,
            Some("patient.vcf".to_string()),
            serde_json::json!({
                "drug": "CODEINE",
                "risk": "Adjust Dosage"
            }),
        );

        assert_eq!(event.resource, Some("patient.vcf".to_string()));
        assert_eq!(event.result, "success");
        assert!(matches!(event.severity, LogSeverity::Info));
    }

    #[test]
    fn test_rejection_severity() {
        let rejected = AuditEvent::new(AuditEventType::FileRejected, None, serde_json::json!({}));
        assert!(matches!(rejected.severity, LogSeverity::Error));
        assert_eq!(rejected.result, "failure");

        let unsupported = AuditEvent::new(
            AuditEventType::AnalysisRejected,
            None,
            serde_json::json!({"drug": "Aspirin"}),
        );
        assert!(matches!(unsupported.severity, LogSeverity::Warning));
    }

    #[test]
    fn test_event_serialization() {
        let event = log_event(
            AuditEventType::ExplanationRequested,
            Some("p01.vcf".to_string()),
            serde_json::json!({"drug": "WARFARIN"}),
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "explanation_requested");
        assert_eq!(json["severity"], "info");
        assert_eq!(json["details"]["drug"], "WARFARIN");
    }
}
