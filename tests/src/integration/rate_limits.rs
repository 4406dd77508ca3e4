//! # Rate Limit Windows
//!
//! Per-account, per-operation fixed windows over the shared store.

#[cfg(test)]
mod tests {
    use crate::fixtures::World;
    use cl_01_document_store::Collection;
    use cl_02_rate_limiter::{
        EnforcementMode, Operation, RateDecision, RateLimitError, RateLimitPolicy,
        RateLimiterConfig,
    };
    use shared_types::entities::AccountId;

    #[tokio::test]
    async fn test_fourth_connect_in_window_is_denied() {
        let world = World::new();
        let alice = AccountId::from("alice");

        for _ in 0..3 {
            world.limiter.enforce(&alice, Operation::Connect).await.unwrap();
        }
        match world.limiter.enforce(&alice, Operation::Connect).await {
            Err(RateLimitError::Exceeded {
                operation,
                retry_after_secs,
            }) => {
                assert_eq!(operation, Operation::Connect);
                assert_eq!(retry_after_secs, 300);
            }
            other => panic!("expected Exceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_next_window_resets_the_count() {
        let world = World::new();
        let alice = AccountId::from("alice");

        for _ in 0..3 {
            world.limiter.enforce(&alice, Operation::Connect).await.unwrap();
        }
        assert!(world.limiter.enforce(&alice, Operation::Connect).await.is_err());

        world.clock.advance(chrono::Duration::minutes(5));
        world.limiter.enforce(&alice, Operation::Connect).await.unwrap();
        assert_eq!(world.backend.len(Collection::RateLimits), 2);
    }

    #[tokio::test]
    async fn test_counts_are_per_account_and_operation() {
        let world = World::new();
        let alice = AccountId::from("alice");
        let bob = AccountId::from("bob");

        for _ in 0..2 {
            world.limiter.enforce(&alice, Operation::IssueCode).await.unwrap();
        }
        assert!(world.limiter.enforce(&alice, Operation::IssueCode).await.is_err());

        world.limiter.enforce(&bob, Operation::IssueCode).await.unwrap();
        world.limiter.enforce(&alice, Operation::ValidateCode).await.unwrap();
    }

    #[tokio::test]
    async fn test_log_only_allows_and_records() {
        let world = World::with_limits(RateLimiterConfig {
            mode: EnforcementMode::LogOnly,
            ..RateLimiterConfig::default()
        });
        let alice = AccountId::from("alice");

        for _ in 0..3 {
            world.limiter.enforce(&alice, Operation::DeleteAccount).await.unwrap();
        }
        let decision = world
            .limiter
            .check_and_increment(&alice, Operation::DeleteAccount)
            .await
            .unwrap();
        assert_eq!(decision, RateDecision::Flagged { observed: 4 });
        assert_eq!(world.backend.len(Collection::SecurityEvents), 1);
    }

    #[tokio::test]
    async fn test_override_policy_applies() {
        let world = World::with_limits(
            RateLimiterConfig::default()
                .with_policy(Operation::SyncSubscription, RateLimitPolicy::new(1, 1)),
        );
        let alice = AccountId::from("alice");

        world
            .limiter
            .enforce(&alice, Operation::SyncSubscription)
            .await
            .unwrap();
        assert!(world
            .limiter
            .enforce(&alice, Operation::SyncSubscription)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_sweep_drops_only_idle_windows() {
        let world = World::new();
        let alice = AccountId::from("alice");

        world.limiter.enforce(&alice, Operation::Connect).await.unwrap();
        world.clock.advance(chrono::Duration::hours(25));
        world.limiter.enforce(&alice, Operation::Disconnect).await.unwrap();

        let removed = world
            .limiter
            .sweep_expired(chrono::Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(world.backend.len(Collection::RateLimits), 1);
    }
}
