use strata::rng::DeterministicRng;

fn draw(seed: u32, clamp: i32, n: usize) -> Vec<i32> {
    let mut rng = DeterministicRng::new(seed);
    (0..n).map(|_| rng.next(clamp)).collect()
}

// ── Reference sequences ──────────────────────────────────────────────────────

#[test]
fn seed_42_clamped_to_1000() {
    assert_eq!(draw(42, 1000, 8), [431, 782, 181, 386, 923, 509, 30, 980]);
}

#[test]
fn seed_42_unclamped() {
    assert_eq!(draw(42, 0, 4), [1372697431, 557926782, 510299181, 1022975386]);
}

#[test]
fn seed_0_clamped_to_100() {
    assert_eq!(draw(0, 100, 5), [55, 81, 90, 34, 39]);
}

#[test]
fn seed_7_die_rolls() {
    assert_eq!(draw(7, 6, 10), [3, 5, 2, 3, 4, 2, 3, 1, 5, 1]);
}

// ── Stream behaviour ─────────────────────────────────────────────────────────

#[test]
fn clamp_only_changes_the_reduction_not_the_stream() {
    let mut clamped = DeterministicRng::new(42);
    let mut raw = DeterministicRng::new(42);
    for _ in 0..8 {
        let big = raw.next(0);
        assert_eq!(clamped.next(1000), (big.wrapping_sub(1) & 0x7FFF_FFFF) % 1000 + 1);
    }
}

#[test]
fn two_generators_with_same_seed_agree() {
    assert_eq!(draw(123_456, 999, 64), draw(123_456, 999, 64));
    assert_ne!(draw(1, 999, 16), draw(2, 999, 16));
}
