//! # Concurrency
//!
//! Contended transactions on a multi-threaded runtime.

#[cfg(test)]
mod tests {
    use crate::fixtures::World;
    use cl_02_rate_limiter::{FailurePolicy, Operation, RateDecision, RateLimiterConfig};
    use cl_05_connection_engine::ConnectionError;
    use shared_types::entities::AccountId;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_connects_have_one_winner() {
        let world = Arc::new(World::new());
        let alice = world.account("alice").await;
        world.subscribe("alice").await;
        world.code_source.push("99990000");
        world.codes.issue_code(&alice).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..6 {
            let world = Arc::clone(&world);
            handles.push(tokio::spawn(async move {
                let requester = world.account(&format!("requester{i}")).await;
                world.connections.connect(&requester, "99990000").await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(outcome) => {
                    assert_eq!(outcome.partner_id, alice);
                    winners += 1;
                }
                Err(ConnectionError::Rejected(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(winners, 1);

        let partner = world.get("alice").unwrap().partner_id.unwrap();
        assert!(world.get(partner.as_str()).unwrap().inherits_from(&alice));
        world.assert_invariants();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rate_limit_calls_do_not_overcount() {
        let world = Arc::new(World::with_limits(RateLimiterConfig {
            failure_policy: FailurePolicy::Strict,
            ..RateLimiterConfig::default()
        }));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let world = Arc::clone(&world);
            handles.push(tokio::spawn(async move {
                world
                    .limiter
                    .check_and_increment(&AccountId::from("alice"), Operation::Connect)
                    .await
            }));
        }

        let mut allowed = 0;
        let mut denied = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                RateDecision::Allowed { .. } => allowed += 1,
                RateDecision::Denied { .. } => denied += 1,
                other => panic!("unexpected decision: {other:?}"),
            }
        }
        assert_eq!((allowed, denied), (3, 2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_disconnect_races_partner_deletion() {
        let world = Arc::new(World::new());
        let alice = world.account("alice").await;
        let bob = world.account("bob").await;
        world.subscribe("alice").await;
        world.code_source.push("31415926");
        world.codes.issue_code(&alice).await.unwrap();
        world.connections.connect(&bob, "31415926").await.unwrap();

        let disconnect = {
            let world = Arc::clone(&world);
            let bob = bob.clone();
            tokio::spawn(async move { world.connections.disconnect(&bob).await })
        };
        let delete = {
            let world = Arc::clone(&world);
            tokio::spawn(async move { world.deletion.delete_account(&alice).await })
        };

        // The loser of the race sees no partner; either way both sides end unlinked.
        let _ = disconnect.await.unwrap();
        delete.await.unwrap().unwrap();

        let bob_after = world.get("bob").unwrap();
        assert!(bob_after.partner_id.is_none());
        assert!(!bob_after.is_inherited());
        world.assert_invariants();
    }
}
