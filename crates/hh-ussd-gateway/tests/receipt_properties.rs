//! # Receipt Hash Properties
//!
//! Receipts must be reproducible from the vote and salt alone, and must
//! change when any one input changes.

use hh_ussd_gateway::{VoteChoice, VoteHash, VoteSalt};
use proptest::prelude::*;

fn choice() -> impl Strategy<Value = VoteChoice> {
    prop_oneof![Just(VoteChoice::Yes), Just(VoteChoice::No)]
}

proptest! {
    #[test]
    fn receipt_is_deterministic(
        voter in "[A-Za-z0-9_+]{1,24}",
        proposal in 1u32..1000,
        choice in choice(),
        timestamp in any::<u64>(),
        salt in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        let salt = VoteSalt::new(salt);
        let a = VoteHash::compute(&voter, proposal, choice, timestamp, &salt);
        let b = VoteHash::compute(&voter, proposal, choice, timestamp, &salt);
        prop_assert_eq!(a, b);
        prop_assert_eq!(a.to_hex().len(), 64);
        prop_assert!(a.to_hex().starts_with(&a.short()));
    }

    #[test]
    fn receipt_depends_on_every_input(
        voter in "[A-Za-z0-9_+]{1,24}",
        proposal in 1u32..1000,
        timestamp in 0u64..u64::MAX,
    ) {
        let salt = VoteSalt::new("salt-a");
        let base = VoteHash::compute(&voter, proposal, VoteChoice::Yes, timestamp, &salt);

        let other_voter = format!("{voter}x");
        prop_assert_ne!(base, VoteHash::compute(&other_voter, proposal, VoteChoice::Yes, timestamp, &salt));
        prop_assert_ne!(base, VoteHash::compute(&voter, proposal + 1, VoteChoice::Yes, timestamp, &salt));
        prop_assert_ne!(base, VoteHash::compute(&voter, proposal, VoteChoice::No, timestamp, &salt));
        prop_assert_ne!(base, VoteHash::compute(&voter, proposal, VoteChoice::Yes, timestamp + 1, &salt));
        prop_assert_ne!(base, VoteHash::compute(&voter, proposal, VoteChoice::Yes, timestamp, &VoteSalt::new("salt-b")));
    }
}
