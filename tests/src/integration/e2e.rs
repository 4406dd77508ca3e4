//! # End-to-End Flows
//!
//! Full pairing lifecycles across codes, connection, inheritance, deletion
//! and the orphan auditor.

#[cfg(test)]
mod tests {
    use crate::fixtures::World;
    use cl_03_pairing_codes::PairingError;
    use cl_05_connection_engine::ConnectionError;
    use shared_types::entities::{PairingCode, SubscriptionType};

    // =============================================================================
    // ISSUE → CONNECT → DELETE
    // =============================================================================

    #[tokio::test]
    async fn test_connect_then_owner_deleted() {
        let world = World::new();
        let alice = world.account("alice").await;
        let bob = world.account("bob").await;
        world.subscribe("alice").await;
        world.code_source.push("12345678");

        let issued = world.codes.issue_code(&alice).await.unwrap();
        assert_eq!(issued.code, "12345678");

        let outcome = world.connections.connect(&bob, "12345678").await.unwrap();
        assert_eq!(outcome.partner_id, alice);
        assert!(outcome.subscription_inherited);
        assert!(world.get("bob").unwrap().inherits_from(&alice));
        world.assert_invariants();

        let report = world.deletion.delete_account(&alice).await.unwrap();
        assert_eq!(report.former_partner_id, Some(bob.clone()));

        let bob_after = world.get("bob").unwrap();
        assert_eq!(bob_after.subscription_type, SubscriptionType::None);
        assert!(bob_after.partner_id.is_none());
        assert!(world.get("alice").is_none());
        assert!(!world.directory.contains(&alice));

        let code: PairingCode = world.store.get("12345678").unwrap().unwrap();
        assert!(!code.is_active);

        world.assert_invariants();
        assert!(world.auditor.diagnose().unwrap().violations.is_empty());
    }

    #[tokio::test]
    async fn test_requester_deleted_leaves_owner_free_to_reissue() {
        let world = World::new();
        let alice = world.account("alice").await;
        let bob = world.account("bob").await;
        world.subscribe("alice").await;
        world.code_source.push("11112222");
        world.code_source.push("33334444");

        world.codes.issue_code(&alice).await.unwrap();
        world.connections.connect(&bob, "11112222").await.unwrap();
        world.deletion.delete_account(&bob).await.unwrap();

        let alice_after = world.get("alice").unwrap();
        assert!(alice_after.partner_id.is_none());
        assert!(alice_after.is_direct());
        assert!(alice_after.active_pairing_code.is_none());

        let reissued = world.codes.issue_code(&alice).await.unwrap();
        assert_eq!(reissued.code, "33334444");
        assert!(!reissued.reused);
        world.assert_invariants();
    }

    // =============================================================================
    // CODE LIFECYCLE
    // =============================================================================

    #[tokio::test]
    async fn test_issue_is_idempotent_until_connected() {
        let world = World::new();
        let alice = world.account("alice").await;
        world.code_source.push("55556666");
        world.code_source.push("77778888");

        let first = world.codes.issue_code(&alice).await.unwrap();
        let second = world.codes.issue_code(&alice).await.unwrap();
        assert_eq!(first.code, second.code);
        assert!(second.reused);
    }

    #[tokio::test]
    async fn test_expired_code_is_retired_on_validate() {
        let world = World::new();
        let alice = world.account("alice").await;
        let bob = world.account("bob").await;
        world.code_source.push("24682468");
        world.codes.issue_code(&alice).await.unwrap();

        world.clock.advance(chrono::Duration::hours(25));
        assert_eq!(
            world.codes.validate_code("24682468", &bob).await,
            Err(PairingError::Expired)
        );
        let code: PairingCode = world.store.get("24682468").unwrap().unwrap();
        assert!(!code.is_active);

        // A retired code stays retired.
        assert_eq!(
            world.codes.validate_code("24682468", &bob).await,
            Err(PairingError::Inactive)
        );
    }

    #[tokio::test]
    async fn test_consumed_code_is_not_reopened_by_disconnect() {
        let world = World::new();
        let alice = world.account("alice").await;
        let bob = world.account("bob").await;
        let carol = world.account("carol").await;
        world.code_source.push("13571357");
        world.codes.issue_code(&alice).await.unwrap();
        world.connections.connect(&bob, "13571357").await.unwrap();
        world.connections.disconnect(&alice).await.unwrap();

        assert_eq!(
            world.connections.connect(&carol, "13571357").await,
            Err(ConnectionError::Rejected(PairingError::Inactive))
        );
    }

    // =============================================================================
    // DISCONNECT
    // =============================================================================

    #[tokio::test]
    async fn test_disconnect_keeps_direct_and_drops_inherited() {
        let world = World::new();
        let alice = world.account("alice").await;
        let bob = world.account("bob").await;
        world.subscribe("bob").await;
        world.code_source.push("86428642");

        world.codes.issue_code(&alice).await.unwrap();
        let outcome = world.connections.connect(&bob, "86428642").await.unwrap();
        assert!(!outcome.subscription_inherited);
        assert!(world.get("alice").unwrap().inherits_from(&bob));

        world.connections.disconnect(&bob).await.unwrap();
        let alice_after = world.get("alice").unwrap();
        let bob_after = world.get("bob").unwrap();

        assert_eq!(alice_after.subscription_type, SubscriptionType::None);
        assert!(alice_after.subscription_source_account_id.is_none());
        assert!(alice_after.partner_id.is_none());
        assert!(bob_after.is_direct());
        assert!(bob_after.partner_id.is_none());
        world.assert_invariants();
    }

    // =============================================================================
    // ENTITLEMENT LAPSE
    // =============================================================================

    #[tokio::test]
    async fn test_lapse_revokes_partner_and_resubscribe_restores() {
        let world = World::new();
        let alice = world.account("alice").await;
        let bob = world.account("bob").await;
        world.subscribe("alice").await;
        world.code_source.push("10203040");
        world.codes.issue_code(&alice).await.unwrap();
        world.connections.connect(&bob, "10203040").await.unwrap();

        world.verifier.revoke(&alice);
        let lapsed = world.entitlements.sync_subscription(&alice, None).await.unwrap();
        assert_eq!(lapsed.subscription_type, SubscriptionType::None);
        assert_eq!(lapsed.partner_subscription_type, Some(SubscriptionType::None));
        world.assert_invariants();

        let restored = world.subscribe("alice").await;
        assert_eq!(restored.subscription_type, SubscriptionType::Direct);
        assert_eq!(restored.partner_subscription_type, Some(SubscriptionType::Inherited));
        assert!(world.get("bob").unwrap().inherits_from(&alice));
        world.assert_invariants();
    }
}
