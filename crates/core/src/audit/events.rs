use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit events covering every externally visible state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },
    ArtworkUploaded {
        artwork_id: String,
        owner: Option<String>,
        size_bytes: u64,
        content_type: String,
    },
    UploadRejected {
        reason: String,
        content_type: Option<String>,
        size_bytes: u64,
    },
    JobStateChanged {
        job_id: String,
        artwork_id: String,
        from_state: String,
        to_state: String,
        reason: Option<String>,
    },
    ArtworkCompleted {
        artwork_id: String,
        job_id: String,
        palette_count: u32,
        region_count: u32,
    },
    ArtworkFailed {
        artwork_id: String,
        job_id: String,
        error: String,
    },
    OrderCreated {
        order_id: String,
        artwork_id: String,
        palette_id: u32,
        product_type: String,
        amount_cents: i64,
    },
    OrderStatusChanged {
        order_id: String,
        from_status: String,
        to_status: String,
    },
}

impl AuditEvent {
    /// Stable type tag, used as the queryable event_type column.
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::ServiceStarted { .. } => "service_started",
            AuditEvent::ServiceStopped { .. } => "service_stopped",
            AuditEvent::ArtworkUploaded { .. } => "artwork_uploaded",
            AuditEvent::UploadRejected { .. } => "upload_rejected",
            AuditEvent::JobStateChanged { .. } => "job_state_changed",
            AuditEvent::ArtworkCompleted { .. } => "artwork_completed",
            AuditEvent::ArtworkFailed { .. } => "artwork_failed",
            AuditEvent::OrderCreated { .. } => "order_created",
            AuditEvent::OrderStatusChanged { .. } => "order_status_changed",
        }
    }

    /// Artwork this event concerns, if any.
    pub fn artwork_id(&self) -> Option<&str> {
        match self {
            AuditEvent::ArtworkUploaded { artwork_id, .. }
            | AuditEvent::JobStateChanged { artwork_id, .. }
            | AuditEvent::ArtworkCompleted { artwork_id, .. }
            | AuditEvent::ArtworkFailed { artwork_id, .. }
            | AuditEvent::OrderCreated { artwork_id, .. } => Some(artwork_id),
            _ => None,
        }
    }

    /// Order this event concerns, if any.
    pub fn order_id(&self) -> Option<&str> {
        match self {
            AuditEvent::OrderCreated { order_id, .. }
            | AuditEvent::OrderStatusChanged { order_id, .. } => Some(order_id),
            _ => None,
        }
    }
}

/// A persisted audit event with its storage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub artwork_id: Option<String>,
    pub order_id: Option<String>,
    pub data: AuditEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_tags() {
        let event = AuditEvent::ArtworkUploaded {
            artwork_id: "a-1".to_string(),
            owner: Some("user-1".to_string()),
            size_bytes: 1024,
            content_type: "image/png".to_string(),
        };
        assert_eq!(event.event_type(), "artwork_uploaded");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "artwork_uploaded");
        assert_eq!(json["artwork_id"], "a-1");
    }

    #[test]
    fn test_id_extraction() {
        let event = AuditEvent::OrderCreated {
            order_id: "o-1".to_string(),
            artwork_id: "a-1".to_string(),
            palette_id: 2,
            product_type: "digital".to_string(),
            amount_cents: 1999,
        };
        assert_eq!(event.artwork_id(), Some("a-1"));
        assert_eq!(event.order_id(), Some("o-1"));

        let event = AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        };
        assert_eq!(event.artwork_id(), None);
        assert_eq!(event.order_id(), None);
    }

    #[test]
    fn test_event_roundtrip() {
        let event = AuditEvent::JobStateChanged {
            job_id: "j-1".to_string(),
            artwork_id: "a-1".to_string(),
            from_state: "queued".to_string(),
            to_state: "running".to_string(),
            reason: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
