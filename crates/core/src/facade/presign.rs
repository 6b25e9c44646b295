//! Presigned URL policy
//!
//! When presign mode is on, get/put/delete/head produce a signed URL and
//! perform no transfer. Callers consult the gate before any streaming or
//! deletion logic.

use jiff::{SignedDuration, Timestamp};

use crate::address::Address;
use crate::command::Presign;
use crate::error::{Error, Result};
use crate::traits::{ObjectStore, PresignMethod};

/// A signed URL and the moment it stops working
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedRequest {
    pub url: String,
    pub expires_at: Timestamp,
}

/// Presign decision for one command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresignGate {
    presign: Option<Presign>,
}

impl PresignGate {
    pub fn new(presign: Option<Presign>) -> Self {
        Self { presign }
    }

    pub fn is_active(&self) -> bool {
        self.presign.is_some()
    }

    /// Expiry for a URL signed now
    pub fn expires_at(&self, now: Timestamp) -> Result<Option<Timestamp>> {
        let Some(presign) = self.presign else {
            return Ok(None);
        };
        let seconds = i64::try_from(presign.ttl_minutes)
            .ok()
            .and_then(|minutes| minutes.checked_mul(60))
            .ok_or_else(|| {
                Error::General(format!(
                    "expiry of {} minutes is too large",
                    presign.ttl_minutes
                ))
            })?;
        let expires_at = now
            .checked_add(SignedDuration::from_secs(seconds))
            .map_err(|e| Error::General(format!("invalid presign expiry: {e}")))?;
        Ok(Some(expires_at))
    }

    /// Sign `address` for `method` when presign mode is on
    ///
    /// Returns `None` when the caller should perform the real operation.
    pub async fn sign<S>(
        &self,
        store: &S,
        method: PresignMethod,
        address: &Address,
    ) -> Result<Option<PresignedRequest>>
    where
        S: ObjectStore + ?Sized,
    {
        let Some(expires_at) = self.expires_at(Timestamp::now())? else {
            return Ok(None);
        };
        let url = store.presign(method, address, expires_at).await?;
        tracing::debug!(%method, %address, %expires_at, "presigned request");
        Ok(Some(PresignedRequest { url, expires_at }))
    }

    /// Fail for operations that have no presigned equivalent
    pub fn reject(&self, operation: &str) -> Result<()> {
        if self.is_active() {
            return Err(Error::UnsupportedFeature(format!(
                "presigned URLs are not supported for {operation}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_gate() {
        let gate = PresignGate::default();
        assert!(!gate.is_active());
        assert_eq!(gate.expires_at(Timestamp::now()).unwrap(), None);
        assert!(gate.reject("batched delete").is_ok());
    }

    #[test]
    fn test_expiry_adds_ttl() {
        let gate = PresignGate::new(Some(Presign::minutes(90)));
        let now: Timestamp = "2024-05-01T10:00:00Z".parse().unwrap();
        let expires_at = gate.expires_at(now).unwrap().unwrap();
        assert_eq!(expires_at.to_string(), "2024-05-01T11:30:00Z");
    }

    #[test]
    fn test_reject_when_active() {
        let gate = PresignGate::new(Some(Presign::minutes(5)));
        let err = gate.reject("batched delete").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(_)));
        assert!(err.to_string().contains("batched delete"));
    }

    #[test]
    fn test_absurd_ttl_is_an_error() {
        let gate = PresignGate::new(Some(Presign::minutes(u64::MAX)));
        assert!(gate.expires_at(Timestamp::now()).is_err());
    }
}
