//! # Partner Notifications
//!
//! Committed changes reach the partner who did not initiate them, and
//! only that partner.

#[cfg(test)]
mod tests {
    use crate::fixtures::World;
    use shared_bus::{EventFilter, PartnerEvent, Subscription};
    use shared_types::entities::{AccountId, SubscriptionType};
    use std::time::Duration;

    async fn next(subscription: &mut Subscription) -> PartnerEvent {
        tokio::time::timeout(Duration::from_secs(1), subscription.recv())
            .await
            .expect("timed out waiting for event")
            .expect("bus closed")
    }

    async fn paired(world: &World, code: &str) -> (AccountId, AccountId) {
        let alice = world.account("alice").await;
        let bob = world.account("bob").await;
        world.subscribe("alice").await;
        world.code_source.push(code);
        world.codes.issue_code(&alice).await.unwrap();
        (alice, bob)
    }

    #[tokio::test]
    async fn test_owner_hears_about_connect_and_disconnect() {
        let world = World::new();
        let (alice, bob) = paired(&world, "42424242").await;
        let mut alice_events = world.bus.subscribe(EventFilter::for_recipient(alice.clone()));
        let mut bob_events = world.bus.subscribe(EventFilter::for_recipient(bob.clone()));

        world.connections.connect(&bob, "42424242").await.unwrap();
        assert_eq!(
            next(&mut alice_events).await,
            PartnerEvent::PartnerConnected {
                recipient: alice.clone(),
                partner_id: bob.clone(),
                recipient_inherited: false,
            }
        );

        world.connections.disconnect(&bob).await.unwrap();
        assert_eq!(
            next(&mut alice_events).await,
            PartnerEvent::PartnerDisconnected {
                recipient: alice,
                former_partner_id: bob,
            }
        );

        // The initiator is never notified of its own actions.
        assert_eq!(bob_events.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn test_partner_hears_about_deletion() {
        let world = World::new();
        let (alice, bob) = paired(&world, "51515151").await;
        world.connections.connect(&bob, "51515151").await.unwrap();

        let mut bob_events = world.bus.subscribe(EventFilter::for_recipient(bob.clone()));
        world.deletion.delete_account(&alice).await.unwrap();

        assert_eq!(
            next(&mut bob_events).await,
            PartnerEvent::PartnerAccountDeleted {
                recipient: bob,
                deleted_account_id: alice,
            }
        );
    }

    #[tokio::test]
    async fn test_beneficiary_hears_about_lapse() {
        let world = World::new();
        let (alice, bob) = paired(&world, "60606060").await;
        world.connections.connect(&bob, "60606060").await.unwrap();

        let mut bob_events = world.bus.subscribe(EventFilter::for_recipient(bob.clone()));
        world.verifier.revoke(&alice);
        world.entitlements.sync_subscription(&alice, None).await.unwrap();

        assert_eq!(
            next(&mut bob_events).await,
            PartnerEvent::EntitlementChanged {
                recipient: bob,
                subscription_type: SubscriptionType::None,
            }
        );
    }

    #[tokio::test]
    async fn test_rejected_connect_publishes_nothing() {
        let world = World::new();
        let (alice, bob) = paired(&world, "70707070").await;
        let mut alice_events = world.bus.subscribe(EventFilter::for_recipient(alice));

        assert!(world.connections.connect(&bob, "00000000").await.is_err());
        assert_eq!(alice_events.try_recv().unwrap(), None);
    }
}
