use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Refresh tokens that have already been exchanged, kept until they expire.
#[derive(Default)]
pub struct RefreshLedger {
    retired: RwLock<HashMap<Uuid, i64>>,
}

impl RefreshLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retires `jti` until `exp`. Returns `false` if it was already retired,
    /// meaning the token is being replayed.
    pub async fn retire(&self, jti: Uuid, exp: i64) -> bool {
        let now = Utc::now().timestamp();
        let mut retired = self.retired.write().await;
        retired.retain(|_, expires| *expires > now);

        if retired.contains_key(&jti) {
            return false;
        }
        retired.insert(jti, exp);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl RefreshLedger {
        async fn is_retired(&self, jti: &Uuid) -> bool {
            self.retired.read().await.contains_key(jti)
        }

        async fn len(&self) -> usize {
            self.retired.read().await.len()
        }
    }

    #[tokio::test]
    async fn test_second_retire_detects_reuse() {
        let ledger = RefreshLedger::new();
        let jti = Uuid::new_v4();
        let exp = Utc::now().timestamp() + 3600;

        assert!(ledger.retire(jti, exp).await);
        assert!(!ledger.retire(jti, exp).await);
        assert!(ledger.is_retired(&jti).await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_pruned() {
        let ledger = RefreshLedger::new();
        let now = Utc::now().timestamp();

        ledger.retire(Uuid::new_v4(), now - 10).await;
        ledger.retire(Uuid::new_v4(), now + 3600).await;

        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_retire_admits_one() {
        let ledger = std::sync::Arc::new(RefreshLedger::new());
        let jti = Uuid::new_v4();
        let exp = Utc::now().timestamp() + 3600;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.retire(jti, exp).await })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }
}
