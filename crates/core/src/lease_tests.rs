// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{Clock, FakeClock};

const TTL: Duration = Duration::from_secs(30);

fn acquire(lease: &Lease, holder: &str, clock: &FakeClock) -> (Lease, LeaseDecision) {
    lease.transition(
        LeaseInput::Acquire {
            holder: HolderId::new(holder),
            ttl: TTL,
        },
        clock.now(),
    )
}

#[test]
fn new_lease_is_free() {
    let lease = Lease::new("op-1");
    assert!(lease.is_available(FakeClock::new().now()));
    assert!(lease.holder().is_none());
}

#[test]
fn acquire_free_lease_succeeds() {
    let clock = FakeClock::new();
    let (lease, decision) = acquire(&Lease::new("op-1"), "worker-1", &clock);

    assert_eq!(decision, LeaseDecision::Granted);
    assert!(lease.is_held_by(&HolderId::new("worker-1"), clock.now()));
    assert!(!lease.is_available(clock.now()));
}

#[test]
fn acquire_held_lease_is_denied() {
    let clock = FakeClock::new();
    let (lease, _) = acquire(&Lease::new("op-1"), "worker-1", &clock);
    let (lease, decision) = acquire(&lease, "worker-2", &clock);

    assert_eq!(
        decision,
        LeaseDecision::Denied {
            current: HolderId::new("worker-1")
        }
    );
    assert!(lease.is_held_by(&HolderId::new("worker-1"), clock.now()));
}

#[test]
fn expired_lease_is_reclaimed() {
    let clock = FakeClock::new();
    let (lease, _) = acquire(&Lease::new("op-1"), "worker-1", &clock);

    clock.advance(TTL + Duration::from_secs(1));
    let (lease, decision) = acquire(&lease, "worker-2", &clock);

    assert_eq!(
        decision,
        LeaseDecision::Reclaimed {
            previous: HolderId::new("worker-1")
        }
    );
    assert!(lease.is_held_by(&HolderId::new("worker-2"), clock.now()));
}

#[test]
fn lease_expires_exactly_at_ttl() {
    let clock = FakeClock::new();
    let (lease, _) = acquire(&Lease::new("op-1"), "worker-1", &clock);
    clock.advance(TTL);
    assert!(lease.is_available(clock.now()));
}

#[test]
fn renew_extends_expiry() {
    let clock = FakeClock::new();
    let holder = HolderId::new("worker-1");
    let (lease, _) = acquire(&Lease::new("op-1"), "worker-1", &clock);

    clock.advance(Duration::from_secs(20));
    let (lease, decision) = lease.transition(
        LeaseInput::Renew {
            holder: holder.clone(),
            ttl: TTL,
        },
        clock.now(),
    );
    assert_eq!(decision, LeaseDecision::Renewed);

    clock.advance(Duration::from_secs(20));
    assert!(lease.is_held_by(&holder, clock.now()));
}

#[test]
fn renew_after_expiry_is_ignored() {
    let clock = FakeClock::new();
    let (lease, _) = acquire(&Lease::new("op-1"), "worker-1", &clock);
    clock.advance(TTL * 2);

    let (_, decision) = lease.transition(
        LeaseInput::Renew {
            holder: HolderId::new("worker-1"),
            ttl: TTL,
        },
        clock.now(),
    );
    assert_eq!(decision, LeaseDecision::Ignored);
    assert!(!decision.is_held());
}

#[test]
fn renew_by_other_holder_is_ignored() {
    let clock = FakeClock::new();
    let (lease, _) = acquire(&Lease::new("op-1"), "worker-1", &clock);
    let (after, decision) = lease.transition(
        LeaseInput::Renew {
            holder: HolderId::new("worker-2"),
            ttl: TTL,
        },
        clock.now(),
    );
    assert_eq!(decision, LeaseDecision::Ignored);
    assert_eq!(after, lease);
}

#[test]
fn release_by_holder_frees_lease() {
    let clock = FakeClock::new();
    let (lease, _) = acquire(&Lease::new("op-1"), "worker-1", &clock);
    let (lease, decision) = lease.transition(
        LeaseInput::Release {
            holder: HolderId::new("worker-1"),
        },
        clock.now(),
    );
    assert_eq!(decision, LeaseDecision::Released);
    assert!(lease.holder().is_none());
}

#[test]
fn release_by_other_holder_is_ignored() {
    let clock = FakeClock::new();
    let (lease, _) = acquire(&Lease::new("op-1"), "worker-1", &clock);
    let (lease, decision) = lease.transition(
        LeaseInput::Release {
            holder: HolderId::new("worker-2"),
        },
        clock.now(),
    );
    assert_eq!(decision, LeaseDecision::Ignored);
    assert_eq!(lease.holder(), Some(&HolderId::new("worker-1")));
}

#[test]
fn lease_round_trips_through_json() {
    let clock = FakeClock::new();
    let (lease, _) = acquire(&Lease::new("op-1"), "worker-1", &clock);
    let json = serde_json::to_string(&lease).unwrap();
    let back: Lease = serde_json::from_str(&json).unwrap();
    assert_eq!(back, lease);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Step {
        Acquire(u8),
        Renew(u8),
        Release(u8),
        Wait(u16),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0u8..3).prop_map(Step::Acquire),
            (0u8..3).prop_map(Step::Renew),
            (0u8..3).prop_map(Step::Release),
            (0u16..45).prop_map(Step::Wait),
        ]
    }

    proptest! {
        // At every point in time at most one holder can believe it holds the
        // lease, and a grant is only ever handed out when the lease was free
        // or expired.
        #[test]
        fn at_most_one_holder(steps in proptest::collection::vec(step(), 1..60)) {
            let clock = FakeClock::new();
            let mut lease = Lease::new("op-1");

            for step in steps {
                let available_before = lease.is_available(clock.now());
                let (next, decision) = match step {
                    Step::Acquire(h) => lease.transition(
                        LeaseInput::Acquire { holder: HolderId::new(format!("w{}", h)), ttl: TTL },
                        clock.now(),
                    ),
                    Step::Renew(h) => lease.transition(
                        LeaseInput::Renew { holder: HolderId::new(format!("w{}", h)), ttl: TTL },
                        clock.now(),
                    ),
                    Step::Release(h) => lease.transition(
                        LeaseInput::Release { holder: HolderId::new(format!("w{}", h)) },
                        clock.now(),
                    ),
                    Step::Wait(secs) => {
                        clock.advance(Duration::from_secs(u64::from(secs)));
                        continue;
                    }
                };

                if matches!(decision, LeaseDecision::Granted | LeaseDecision::Reclaimed { .. }) {
                    prop_assert!(available_before);
                }

                let holders = (0u8..3)
                    .filter(|h| next.is_held_by(&HolderId::new(format!("w{}", h)), clock.now()))
                    .count();
                prop_assert!(holders <= 1);
                lease = next;
            }
        }
    }
}
