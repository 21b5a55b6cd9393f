// crates/fastpred-core/tests/tanimoto_properties.rs

use fastpred_core::similarity::{intersection, popcount_slice, tanimoto};

fn lcg_next(x: &mut u64) -> u64 {
    // deterministic, not crypto
    *x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
    *x
}

fn random_fp(seed: &mut u64, len: usize) -> Vec<u8> {
    (0..len).map(|_| (lcg_next(seed) >> 56) as u8).collect()
}

#[test]
fn self_similarity_is_one_for_nonzero_fingerprints() {
    let mut seed = 0x0bad_cafe_dead_beef;
    for &len in &[1usize, 41, 128] {
        for _ in 0..64 {
            let a = random_fp(&mut seed, len);
            if popcount_slice(&a) == 0 {
                continue;
            }
            assert_eq!(tanimoto(&a, &a), 1.0, "len={len}");
        }
    }
}

#[test]
fn symmetric_and_bounded() {
    let mut seed = 0x1234_5678_9abc_def0;
    for &len in &[1usize, 41, 128] {
        for _ in 0..64 {
            let a = random_fp(&mut seed, len);
            let b = random_fp(&mut seed, len);
            let ab = tanimoto(&a, &b);
            assert_eq!(ab.to_bits(), tanimoto(&b, &a).to_bits(), "len={len}");
            assert!((0.0..=1.0).contains(&ab));
        }
    }
}

#[test]
fn matches_set_definition() {
    let mut seed = 42;
    let a = random_fp(&mut seed, 128);
    let b = random_fp(&mut seed, 128);
    let c = intersection(&a, &b) as f64;
    let union = (popcount_slice(&a) + popcount_slice(&b)) as f64 - c;
    assert_eq!(tanimoto(&a, &b), c / union);
}
