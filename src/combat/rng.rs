//! Turning displayed percentages into outcomes under the configured policy

use rand::Rng;

use crate::data::RngMode;

fn roll<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(0..100)
}

/// Whether a strike with `chance`% to hit connects
pub fn roll_hit<R: Rng + ?Sized>(mode: RngMode, chance: i32, rng: &mut R) -> bool {
    match mode {
        RngMode::Classic => roll(rng) < chance,
        RngMode::TrueHit => (roll(rng) + roll(rng)) / 2 < chance,
        RngMode::TrueHitPlus => (roll(rng) + roll(rng) + roll(rng)) / 3 < chance,
        RngMode::Fair => chance >= 50,
        RngMode::AlwaysHit => true,
    }
}

/// Crits always use a single roll; deterministic modes crit only at 100%
pub fn roll_crit<R: Rng + ?Sized>(mode: RngMode, chance: i32, rng: &mut R) -> bool {
    if mode.is_deterministic() {
        chance >= 100
    } else {
        roll(rng) < chance
    }
}

/// Points gained for one stat on level-up. Every full 100% of growth is a
/// guaranteed point; the remainder is rolled.
pub fn roll_growth<R: Rng + ?Sized>(mode: RngMode, growth: i32, rng: &mut R) -> i32 {
    if growth <= 0 {
        return 0;
    }
    let guaranteed = growth / 100;
    let rest = growth % 100;
    let extra = match mode {
        _ if rest == 0 => false,
        RngMode::Fair | RngMode::AlwaysHit => rest >= 50,
        _ => roll(rng) < rest,
    };
    guaranteed + extra as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_deterministic_modes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(roll_hit(RngMode::AlwaysHit, 0, &mut rng));
        assert!(roll_hit(RngMode::Fair, 50, &mut rng));
        assert!(!roll_hit(RngMode::Fair, 49, &mut rng));
        assert!(!roll_crit(RngMode::AlwaysHit, 99, &mut rng));
        assert!(roll_crit(RngMode::AlwaysHit, 100, &mut rng));
    }

    #[test]
    fn test_bounds_are_certain() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for mode in [RngMode::Classic, RngMode::TrueHit, RngMode::TrueHitPlus] {
            for _ in 0..200 {
                assert!(roll_hit(mode, 100, &mut rng));
                assert!(!roll_hit(mode, 0, &mut rng));
            }
        }
    }

    #[test]
    fn test_growth_guaranteed_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(roll_growth(RngMode::Classic, 200, &mut rng), 2);
        assert_eq!(roll_growth(RngMode::Fair, 150, &mut rng), 2);
        assert_eq!(roll_growth(RngMode::Fair, 40, &mut rng), 0);
        assert_eq!(roll_growth(RngMode::TrueHit, 0, &mut rng), 0);
    }

    #[test]
    fn test_true_hit_skews_toward_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let trials = 4000;
        let classic = (0..trials).filter(|_| roll_hit(RngMode::Classic, 80, &mut rng)).count();
        let true_hit = (0..trials).filter(|_| roll_hit(RngMode::TrueHit, 80, &mut rng)).count();
        assert!(true_hit > classic);
    }
}
