//! Time-boxed, HMAC-signed course tokens rendered as QR codes.
//!
//! A code has the shape `{course_id}-{issued_at_ms}-{signature}`, where the signature is
//! `hex(hmac_sha256("{course_id}-{issued_at_ms}"))`.
//! The same window bounds both the advertised expiry and verification.

use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;
use util::config::AppConfig;

type HmacSha256 = Hmac<Sha256>;

const DELIMITER: char = '-';

#[derive(Debug, Error, PartialEq)]
#[error("QR signing secret must not be empty")]
pub struct InvalidSecret;

/// A freshly issued token, ready to be rendered for students to scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub code: String,
    pub course_id: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Fields recovered from a code whose signature and age both checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub course_id: i64,
    pub issued_at_ms: i64,
}

#[derive(Clone)]
pub struct QrTokenCodec {
    mac: HmacSha256,
    window: Duration,
}

impl std::fmt::Debug for QrTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrTokenCodec")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl QrTokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, window: Duration) -> Result<Self, InvalidSecret> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(InvalidSecret);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| InvalidSecret)?;
        Ok(Self { mac, window })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, InvalidSecret> {
        Self::new(
            cfg.qr_secret.as_bytes(),
            Duration::seconds(cfg.qr_token_window_seconds as i64),
        )
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn signer(&self, course: &str, timestamp: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(format!("{course}{DELIMITER}{timestamp}").as_bytes());
        mac
    }

    pub fn generate(&self, course_id: i64, now: DateTime<Utc>) -> IssuedToken {
        let course = course_id.to_string();
        let timestamp = now.timestamp_millis().to_string();
        let signature = hex::encode(self.signer(&course, &timestamp).finalize().into_bytes());

        // round-trip through millis so issued_at matches what the code carries
        let issued_at = Utc
            .timestamp_millis_opt(now.timestamp_millis())
            .single()
            .unwrap_or(now);

        IssuedToken {
            code: format!("{course}{DELIMITER}{timestamp}{DELIMITER}{signature}"),
            course_id,
            issued_at,
            expires_at: issued_at + self.window,
        }
    }

    /// Returns the decoded token only if the code is well formed, carries a valid
    /// signature, and was issued no more than one window before `now`.
    ///
    /// Every failure collapses to `None`; callers cannot tell which check failed.
    pub fn verify(&self, code: &str, now: DateTime<Utc>) -> Option<VerifiedToken> {
        let mut parts = code.trim().split(DELIMITER);
        let (course, timestamp, signature) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let course_id: i64 = course.parse().ok()?;
        let issued_at_ms: i64 = timestamp.parse().ok()?;
        let signature = hex::decode(signature).ok()?;

        self.signer(course, timestamp).verify_slice(&signature).ok()?;

        let age_ms = now.timestamp_millis().checked_sub(issued_at_ms)?;
        if age_ms < 0 || age_ms > self.window.num_milliseconds() {
            return None;
        }

        Some(VerifiedToken {
            course_id,
            issued_at_ms,
        })
    }
}
