//! Capacity planner — pure demand → replica count mapping.

use ramp_state::ScalingConfig;

/// Target replica count for a demand level.
///
/// Zero demand maps to the configured minimum; otherwise
/// `ceil(demand / per_replica_capacity)` clamped to `min..=max`.
/// Defined for every demand value and monotonic non-decreasing.
pub fn desired_replicas(demand: u32, config: &ScalingConfig) -> u32 {
    if demand == 0 {
        return config.min_replicas;
    }
    demand
        .div_ceil(config.per_replica_capacity)
        .clamp(config.min_replicas, config.max_replicas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScalingConfig {
        ScalingConfig::default() // 500 users/replica, 1..=4 replicas
    }

    #[test]
    fn zero_demand_yields_min() {
        assert_eq!(desired_replicas(0, &config()), 1);
    }

    #[test]
    fn reference_demand_sequence() {
        // 0, 100, ..., 2000 → ceil(d/500) clamped to 4.
        let expected = [
            1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4,
        ];
        let config = config();
        for (i, want) in expected.iter().enumerate() {
            let demand = (i as u32) * 100;
            assert_eq!(desired_replicas(demand, &config), *want, "demand {demand}");
        }
    }

    #[test]
    fn always_within_bounds() {
        let config = config();
        for demand in (0..=50_000).step_by(37) {
            let desired = desired_replicas(demand, &config);
            assert!((config.min_replicas..=config.max_replicas).contains(&desired));
        }
    }

    #[test]
    fn monotonic_non_decreasing() {
        let config = config();
        let mut prev = 0;
        for demand in 0..=10_000 {
            let desired = desired_replicas(demand, &config);
            assert!(desired >= prev, "dropped at demand {demand}");
            prev = desired;
        }
    }

    #[test]
    fn exact_multiples_do_not_round_up() {
        let config = config();
        assert_eq!(desired_replicas(500, &config), 1);
        assert_eq!(desired_replicas(501, &config), 2);
        assert_eq!(desired_replicas(1000, &config), 2);
    }
}
