//! Webhook wire contract
//!
//! HTTP POST over TLS only. The JSON alert payload is wrapped with a unix
//! timestamp and a random nonce, and signed with a per-tenant shared
//! secret: `X-Signature: sha256=<hmac>` over the canonical JSON body.
//! Receivers must reject stale timestamps and replayed nonces; the
//! verifier here implements both checks for receiver-side use and tests.

use crate::channel::{ChannelError, NotificationChannel};
use alert_model::{AlertEvent, AlertPayload, ChannelBinding};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Header name carrying the body signature
pub const SIGNATURE_HEADER: &str = "X-Signature";
/// Maximum accepted timestamp age, in seconds
pub const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("malformed webhook body: {0}")]
    Malformed(String),
    #[error("signature mismatch")]
    BadSignature,
    #[error("timestamp older than {MAX_TIMESTAMP_SKEW_SECS}s")]
    StaleTimestamp,
    #[error("nonce already seen")]
    ReplayedNonce,
}

/// Body wrapper: payload plus replay-protection fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    /// Unix seconds at signing time
    pub timestamp: i64,
    pub nonce: Uuid,
    pub alert: AlertPayload,
}

/// A body ready to POST, with its signature header value
#[derive(Debug, Clone)]
pub struct SignedWebhook {
    pub body: String,
    pub signature: String,
}

/// Signs outbound webhook bodies with the tenant's shared secret
pub struct WebhookSigner {
    secret: Vec<u8>,
}

impl WebhookSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn sign_payload(&self, alert: &AlertPayload) -> Result<SignedWebhook, WebhookError> {
        let envelope = WebhookEnvelope {
            timestamp: Utc::now().timestamp(),
            nonce: Uuid::new_v4(),
            alert: alert.clone(),
        };
        let body = serde_json::to_string(&envelope)
            .map_err(|e| WebhookError::Malformed(e.to_string()))?;
        let signature = self.signature_for(&body);
        Ok(SignedWebhook { body, signature })
    }

    pub fn signature_for(&self, body: &str) -> String {
        let mac = self.mac_for(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time check of a `sha256=<hex>` header value against the body
    pub fn verify_signature(&self, body: &str, signature: &str) -> Result<(), WebhookError> {
        let hex_sig = signature
            .strip_prefix("sha256=")
            .ok_or(WebhookError::BadSignature)?;
        let sig_bytes = hex::decode(hex_sig).map_err(|_| WebhookError::BadSignature)?;
        self.mac_for(body)
            .verify_slice(&sig_bytes)
            .map_err(|_| WebhookError::BadSignature)
    }

    fn mac_for(&self, body: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length");
        mac.update(body.as_bytes());
        mac
    }
}

/// Receiver-side verification: signature, timestamp skew, nonce replay.
/// The nonce cache is interior state so one verifier instance covers a
/// receiving endpoint. Nonces older than the skew window can never be
/// replayed successfully, so they are pruned on insert and the cache
/// stays bounded by the window's traffic.
pub struct WebhookVerifier {
    signer: WebhookSigner,
    /// Nonce -> envelope timestamp, for window-bounded replay tracking
    seen_nonces: Mutex<HashMap<Uuid, i64>>,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            signer: WebhookSigner::new(secret),
            seen_nonces: Mutex::new(HashMap::new()),
        }
    }

    pub fn verify(
        &self,
        body: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<WebhookEnvelope, WebhookError> {
        self.signer.verify_signature(body, signature)?;

        let envelope: WebhookEnvelope =
            serde_json::from_str(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;

        if now.timestamp() - envelope.timestamp > MAX_TIMESTAMP_SKEW_SECS {
            return Err(WebhookError::StaleTimestamp);
        }

        let mut seen = match self.seen_nonces.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        seen.retain(|_, ts| now.timestamp() - *ts <= MAX_TIMESTAMP_SKEW_SECS);
        if seen.insert(envelope.nonce, envelope.timestamp).is_some() {
            return Err(WebhookError::ReplayedNonce);
        }

        Ok(envelope)
    }

    /// Nonces currently tracked for replay protection
    pub fn tracked_nonces(&self) -> usize {
        match self.seen_nonces.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// Posts a signed body to a webhook endpoint. Kept behind a trait so the
/// signing path is testable without an HTTP stack.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post(&self, body: &str, signature: &str) -> Result<(), ChannelError>;
}

/// Webhook notification channel: wraps the alert payload in a signed
/// envelope and posts it through the transport.
pub struct WebhookChannel {
    signer: WebhookSigner,
    transport: Arc<dyn WebhookTransport>,
}

impl WebhookChannel {
    pub fn new(secret: impl Into<Vec<u8>>, transport: Arc<dyn WebhookTransport>) -> Self {
        Self {
            signer: WebhookSigner::new(secret),
            transport,
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn kind(&self) -> ChannelBinding {
        ChannelBinding::Webhook
    }

    async fn deliver(&self, alert: &AlertEvent) -> Result<(), ChannelError> {
        let signed = self
            .signer
            .sign_payload(&alert.payload)
            .map_err(|e| ChannelError::Failed(e.to_string()))?;
        self.transport.post(&signed.body, &signed.signature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_model::{ConfidenceBreakdown, Severity, SignalEvidence};
    use chrono::Duration;

    fn payload() -> AlertPayload {
        AlertPayload {
            entity: "Acme Health".to_string(),
            severity: Severity::Critical,
            evidence: SignalEvidence::AuthFailure {
                baseline_rate: 0.05,
                current_rate: 0.22,
                delta: 0.17,
                sample_count: 40,
            },
            confidence: ConfidenceBreakdown {
                sample_size: 0.7,
                significance: 1.0,
                stability: 0.8,
                persistence: 0.6,
                historical: 0.5,
                score: 0.78,
            },
        }
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let signer = WebhookSigner::new(b"tenant-secret".to_vec());
        let verifier = WebhookVerifier::new(b"tenant-secret".to_vec());
        let signed = signer.sign_payload(&payload()).unwrap();

        let envelope = verifier
            .verify(&signed.body, &signed.signature, Utc::now())
            .unwrap();
        assert_eq!(envelope.alert, payload());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = WebhookSigner::new(b"tenant-secret".to_vec());
        let verifier = WebhookVerifier::new(b"other-secret".to_vec());
        let signed = signer.sign_payload(&payload()).unwrap();

        assert!(matches!(
            verifier.verify(&signed.body, &signed.signature, Utc::now()),
            Err(WebhookError::BadSignature)
        ));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signer = WebhookSigner::new(b"tenant-secret".to_vec());
        let verifier = WebhookVerifier::new(b"tenant-secret".to_vec());
        let signed = signer.sign_payload(&payload()).unwrap();
        let tampered = signed.body.replace("Acme", "Evil");

        assert!(matches!(
            verifier.verify(&tampered, &signed.signature, Utc::now()),
            Err(WebhookError::BadSignature)
        ));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let signer = WebhookSigner::new(b"tenant-secret".to_vec());
        let verifier = WebhookVerifier::new(b"tenant-secret".to_vec());
        let signed = signer.sign_payload(&payload()).unwrap();

        let future = Utc::now() + Duration::seconds(MAX_TIMESTAMP_SKEW_SECS + 10);
        assert!(matches!(
            verifier.verify(&signed.body, &signed.signature, future),
            Err(WebhookError::StaleTimestamp)
        ));
    }

    fn envelope_at(signer: &WebhookSigner, timestamp: i64) -> (String, String) {
        let envelope = WebhookEnvelope {
            timestamp,
            nonce: Uuid::new_v4(),
            alert: payload(),
        };
        let body = serde_json::to_string(&envelope).unwrap();
        let signature = signer.signature_for(&body);
        (body, signature)
    }

    #[test]
    fn test_expired_nonces_are_evicted() {
        let signer = WebhookSigner::new(b"tenant-secret".to_vec());
        let verifier = WebhookVerifier::new(b"tenant-secret".to_vec());
        let now = Utc::now();

        let (body, sig) = envelope_at(&signer, now.timestamp());
        verifier.verify(&body, &sig, now).unwrap();
        assert_eq!(verifier.tracked_nonces(), 1);

        // A later delivery past the skew window prunes the stale nonce
        let later = now + Duration::seconds(MAX_TIMESTAMP_SKEW_SECS + 60);
        let (body, sig) = envelope_at(&signer, later.timestamp());
        verifier.verify(&body, &sig, later).unwrap();
        assert_eq!(verifier.tracked_nonces(), 1);
    }

    #[test]
    fn test_malformed_signature_header_rejected() {
        let signer = WebhookSigner::new(b"tenant-secret".to_vec());
        let verifier = WebhookVerifier::new(b"tenant-secret".to_vec());
        let signed = signer.sign_payload(&payload()).unwrap();

        for bad in ["", "md5=abcd", "sha256=not-hex"] {
            assert!(matches!(
                verifier.verify(&signed.body, bad, Utc::now()),
                Err(WebhookError::BadSignature)
            ));
        }
    }

    struct CapturingTransport {
        verifier: WebhookVerifier,
    }

    #[async_trait]
    impl WebhookTransport for CapturingTransport {
        async fn post(&self, body: &str, signature: &str) -> Result<(), ChannelError> {
            self.verifier
                .verify(body, signature, Utc::now())
                .map(|_| ())
                .map_err(|e| ChannelError::Failed(e.to_string()))
        }
    }

    #[tokio::test]
    async fn test_channel_posts_verifiable_body() {
        let transport = Arc::new(CapturingTransport {
            verifier: WebhookVerifier::new(b"tenant-secret".to_vec()),
        });
        let channel = WebhookChannel::new(b"tenant-secret".to_vec(), transport);
        assert_eq!(channel.kind(), ChannelBinding::Webhook);

        let alert = AlertEvent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            payload(),
        );
        channel.deliver(&alert).await.unwrap();
        // Redelivery reuses nothing: a fresh nonce passes the replay check
        channel.deliver(&alert).await.unwrap();
    }

    #[test]
    fn test_nonce_replay_rejected() {
        let signer = WebhookSigner::new(b"tenant-secret".to_vec());
        let verifier = WebhookVerifier::new(b"tenant-secret".to_vec());
        let signed = signer.sign_payload(&payload()).unwrap();

        verifier
            .verify(&signed.body, &signed.signature, Utc::now())
            .unwrap();
        assert!(matches!(
            verifier.verify(&signed.body, &signed.signature, Utc::now()),
            Err(WebhookError::ReplayedNonce)
        ));
    }
}
