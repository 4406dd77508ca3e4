//! # Invariant Walk
//!
//! Seeded random sequences of every mutating operation. After each step the
//! pairing and entitlement invariants must hold over the whole store.

#[cfg(test)]
mod tests {
    use crate::fixtures::World;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::entities::AccountId;
    use std::collections::HashSet;

    const PEOPLE: [&str; 5] = ["ana", "ben", "cy", "dee", "eli"];

    struct Walk {
        world: World,
        rng: StdRng,
        paying: HashSet<&'static str>,
        next_code: u32,
    }

    impl Walk {
        async fn new(seed: u64) -> Self {
            let world = World::new();
            for id in PEOPLE {
                world.account(id).await;
            }
            Self {
                world,
                rng: StdRng::seed_from_u64(seed),
                paying: HashSet::new(),
                next_code: 10_000_000,
            }
        }

        fn pick(&mut self) -> &'static str {
            PEOPLE[self.rng.gen_range(0..PEOPLE.len())]
        }

        async fn step(&mut self) -> &'static str {
            let who = self.pick();
            let id = AccountId::from(who);
            let world = &self.world;

            match self.rng.gen_range(0..7) {
                0 => {
                    self.next_code += 1;
                    world.code_source.push(self.next_code.to_string());
                    let _ = world.codes.issue_code(&id).await;
                    "issue"
                }
                1 => {
                    let owner = PEOPLE[self.rng.gen_range(0..PEOPLE.len())];
                    let code = world
                        .get(owner)
                        .and_then(|a| a.active_pairing_code)
                        .unwrap_or_else(|| "00000001".to_string());
                    let _ = world.connections.connect(&id, &code).await;
                    "connect"
                }
                2 => {
                    let _ = world.connections.disconnect(&id).await;
                    "disconnect"
                }
                3 => {
                    if self.paying.remove(who) {
                        world.verifier.revoke(&id);
                    } else {
                        self.paying.insert(who);
                        world.verifier.grant(who);
                    }
                    let _ = world.entitlements.sync_subscription(&id, None).await;
                    "sync"
                }
                4 => {
                    let hours = self.rng.gen_range(0..30);
                    world.clock.advance(chrono::Duration::hours(hours));
                    "advance"
                }
                5 => {
                    let _ = world.deletion.delete_account(&id).await;
                    world.account(who).await;
                    "recreate"
                }
                _ => {
                    let _ = world.connections.acknowledge_connection(&id).await;
                    "acknowledge"
                }
            }
        }
    }

    async fn walk(seed: u64, steps: usize) {
        let mut walk = Walk::new(seed).await;
        for step in 0..steps {
            let op = walk.step().await;
            let accounts = walk.world.accounts();
            let grants = walk
                .world
                .store
                .scan::<shared_types::entities::InheritanceGrant>()
                .unwrap();
            if let Err(violation) = crate::fixtures::check_invariants(&accounts, &grants) {
                panic!("seed {seed}, step {step} ({op}): {violation}");
            }
        }
        let diagnosis = walk.world.auditor.diagnose().unwrap();
        assert!(
            diagnosis.violations.is_empty(),
            "seed {seed}: {:?}",
            diagnosis.violations
        );
    }

    #[tokio::test]
    async fn test_random_walk_preserves_invariants() {
        for seed in [1, 7, 42, 1234, 98765] {
            walk(seed, 300).await;
        }
    }

    #[tokio::test]
    async fn test_cleanup_is_a_no_op_on_consistent_state() {
        let mut walk = Walk::new(5).await;
        for _ in 0..200 {
            walk.step().await;
        }
        let report = walk.world.auditor.cleanup().await.unwrap();
        assert_eq!(report.cleaned_count, 0);
        walk.world.assert_invariants();
    }
}
