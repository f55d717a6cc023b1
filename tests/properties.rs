use std::io::Cursor;

use idpdp::block::BlockReader;
use idpdp::{AlgebraicContext, Challenge, derive_coefficient, sample_indices};
use proptest::prelude::*;

proptest! {
    #[test]
    fn sampled_indices_are_sorted_distinct_and_in_range(
        seed in any::<[u8; 32]>(),
        upper in 1u64..400,
        fraction in 0.0f64..=1.0,
    ) {
        let count = (upper as f64 * fraction) as usize;
        let indices = sample_indices(&seed, count, upper).unwrap();

        prop_assert_eq!(indices.len(), count);
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(indices.iter().all(|&i| (1..=upper).contains(&i)));
        prop_assert_eq!(indices, sample_indices(&seed, count, upper).unwrap());
    }

    #[test]
    fn oversampling_is_refused(seed in any::<[u8; 32]>(), upper in 0u64..100, extra in 1usize..10) {
        prop_assert!(sample_indices(&seed, upper as usize + extra, upper).is_err());
    }

    #[test]
    fn coefficients_are_pure(seed in any::<[u8; 32]>(), index in any::<u64>()) {
        prop_assert_eq!(
            derive_coefficient(&seed, index).to_bytes(),
            derive_coefficient(&seed, index).to_bytes()
        );
    }

    #[test]
    fn block_count_law(size in any::<u32>()) {
        let ctx = AlgebraicContext::default();
        let size = u64::from(size);
        prop_assert_eq!(ctx.block_count(size), size / 1000 + 1);
    }

    #[test]
    fn block_stream_matches_law(size in 0usize..6000, block_size in 1usize..1500) {
        let ctx = AlgebraicContext::with_block_size(block_size).unwrap();
        let mut reader = BlockReader::new(Cursor::new(vec![0u8; size]), block_size);
        let mut buf = Vec::new();
        let mut blocks = 0u64;
        while reader.next_block(&mut buf).unwrap().is_some() {
            blocks += 1;
        }
        prop_assert_eq!(blocks, ctx.block_count(size as u64));
    }

    #[test]
    fn challenge_expansion_is_deterministic(
        seed in any::<[u8; 32]>(),
        ratio in 0.001f64..=1.0,
        blocks in 1u64..300,
    ) {
        let challenge = Challenge::new(seed, ratio).unwrap();
        let decoded = Challenge::from_bytes(&challenge.to_bytes()).unwrap();
        let indices = challenge.indices(blocks).unwrap();
        prop_assert_eq!(&indices, &decoded.indices(blocks).unwrap());
        prop_assert_eq!(indices.len() as u64, challenge.challenged_count(blocks));
        prop_assert!(!indices.is_empty());
    }
}
