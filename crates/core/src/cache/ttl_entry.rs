use chrono::{DateTime, Duration, Utc};

/// A cached value together with the instant it was written and how long it
/// stays fresh.
#[derive(Clone, Debug, PartialEq)]
pub struct TtlEntry<T> {
    pub data: T,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl<T> TtlEntry<T> {
    pub fn new(data: T, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            data,
            created_at,
            ttl,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + self.ttl
    }

    /// An entry is expired once its age reaches the TTL. The boundary itself
    /// counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= self.ttl
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TtlEntry<U> {
        TtlEntry {
            data: f(self.data),
            created_at: self.created_at,
            ttl: self.ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_fresh_entry_is_valid() {
        let entry = TtlEntry::new("x", t0(), Duration::seconds(60));
        assert!(entry.is_valid(t0()));
        assert!(entry.is_valid(t0() + Duration::seconds(59)));
    }

    #[test]
    fn test_entry_expires_exactly_at_ttl() {
        let entry = TtlEntry::new("x", t0(), Duration::seconds(60));
        assert!(entry.is_expired(t0() + Duration::seconds(60)));
        assert!(!entry.is_valid(t0() + Duration::seconds(60)));
        assert_eq!(entry.expires_at(), t0() + Duration::seconds(60));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let entry = TtlEntry::new(1u8, t0(), Duration::zero());
        assert!(entry.is_expired(t0()));
    }

    #[test]
    fn test_map_keeps_timestamps() {
        let entry = TtlEntry::new(2, t0(), Duration::seconds(5)).map(|v| v * 10);
        assert_eq!(entry.data, 20);
        assert_eq!(entry.created_at, t0());
        assert_eq!(entry.ttl, Duration::seconds(5));
    }
}
