//! Property-based tests for the merkle engine.
//!
//! Tests the invariants the on-chain verifier depends on under arbitrary
//! leaf sets and permutations.

use proptest::prelude::*;

use charon_core::{Leaf, EVENT_LEAF_LEN, TX_LEAF_LEN};

use crate::{MerklePath, MerkleTree};

// ============================================================================
// Arbitrary Implementations
// ============================================================================

/// Generate an arbitrary leaf in either packed form.
fn arb_leaf() -> impl Strategy<Value = Leaf> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), TX_LEAF_LEN),
        prop::collection::vec(any::<u8>(), EVENT_LEAF_LEN),
    ]
    .prop_map(|bytes| Leaf::from_bytes(bytes).expect("generated widths are valid"))
}

/// Generate a non-empty set of distinct leaves.
fn arb_leaves(max_count: usize) -> impl Strategy<Value = Vec<Leaf>> {
    prop::collection::hash_set(arb_leaf(), 1..max_count)
        .prop_map(|set| set.into_iter().collect())
}

// ============================================================================
// Property Tests: Tree Construction
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The root is a pure function of the leaf set, not insertion order.
    #[test]
    fn prop_root_invariant_under_permutation(leaves in arb_leaves(40), seed in any::<u64>()) {
        let tree = MerkleTree::build(&leaves).expect("non-empty build succeeds");

        let mut shuffled = leaves.clone();
        // Cheap deterministic shuffle driven by the seed.
        let n = shuffled.len();
        let mut state = seed;
        for i in (1..n).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state % (i as u64 + 1)) as usize;
            shuffled.swap(i, j);
        }

        let shuffled_tree = MerkleTree::build(&shuffled).expect("non-empty build succeeds");
        prop_assert_eq!(tree.root(), shuffled_tree.root());
    }

    /// Every level except the root has an even node count.
    #[test]
    fn prop_levels_padded_even(leaves in arb_leaves(50)) {
        let tree = MerkleTree::build(&leaves).expect("non-empty build succeeds");
        prop_assert_eq!(tree.width() % 2, 0);
    }

    /// Height grows logarithmically with the leaf count.
    #[test]
    fn prop_height_logarithmic(leaves in arb_leaves(60)) {
        let tree = MerkleTree::build(&leaves).expect("non-empty build succeeds");
        let max_height = (leaves.len() as f64).log2().ceil() as usize + 1;
        prop_assert!(tree.height() <= max_height);
    }
}

// ============================================================================
// Property Tests: Inclusion Proofs
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Every leaf in the set has a verifying path.
    #[test]
    fn prop_all_leaves_provable(leaves in arb_leaves(40)) {
        let tree = MerkleTree::build(&leaves).expect("non-empty build succeeds");
        let root = tree.root();

        for leaf in &leaves {
            let path = tree.path(leaf).expect("member leaf has a path");
            prop_assert_eq!(path.len(), tree.height());
            prop_assert!(path.verify(leaf, root));
        }
    }

    /// A leaf outside the set fails lookup; no false positives.
    #[test]
    fn prop_absent_leaf_not_found(leaves in arb_leaves(30), outsider in arb_leaf()) {
        prop_assume!(!leaves.contains(&outsider));

        let tree = MerkleTree::build(&leaves).expect("non-empty build succeeds");
        prop_assert!(tree.path(&outsider).is_err());
    }

    /// The wire encoding round-trips and still verifies.
    #[test]
    fn prop_wire_roundtrip_verifies(leaves in arb_leaves(30)) {
        let tree = MerkleTree::build(&leaves).expect("non-empty build succeeds");
        let leaf = &leaves[0];
        let path = tree.path(leaf).expect("member leaf has a path");

        let hex = path.to_hex_entries();
        let restored = MerklePath::from_hex_entries(&hex).expect("round-trip decodes");
        prop_assert!(restored.verify(leaf, tree.root()));
    }
}

// ============================================================================
// Property Tests: Tamper Detection
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Flipping any byte of any proof entry breaks verification.
    #[test]
    fn prop_tampered_entry_fails(
        leaves in arb_leaves(30),
        entry_pick in any::<prop::sample::Index>(),
        byte_pick in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let tree = MerkleTree::build(&leaves).expect("non-empty build succeeds");
        let leaf = &leaves[0];
        let path = tree.path(leaf).expect("member leaf has a path");

        let mut tagged = path.to_tagged();
        let entry = entry_pick.index(tagged.len());
        let byte = byte_pick.index(32);
        let mut bytes = *tagged[entry].as_bytes();
        bytes[byte] ^= flip;
        tagged[entry] = charon_core::Hash::from_bytes(bytes);

        let tampered = MerklePath::from_tagged(tagged);
        prop_assert!(!tampered.verify(leaf, tree.root()));
    }

    /// A path for one leaf never verifies a different leaf.
    #[test]
    fn prop_substituted_leaf_fails(leaves in arb_leaves(30)) {
        prop_assume!(leaves.len() >= 2);

        let tree = MerkleTree::build(&leaves).expect("non-empty build succeeds");
        let path = tree.path(&leaves[0]).expect("member leaf has a path");
        prop_assert!(!path.verify(&leaves[1], tree.root()));
    }
}
