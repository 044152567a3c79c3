//! Synthetic sensor fleet

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use beacon_core::{Event, NetworkStatus, NodeId};

const SENSOR_TYPES: [&str; 5] = ["temperature", "humidity", "smoke", "water", "gps"];

/// One simulated device
#[derive(Clone, Debug)]
pub struct SimNode {
    pub id: NodeId,
    pub sensor_type: &'static str,
    pub battery: f64,
    pub network: NetworkStatus,
    /// Typical importance of this device's readings
    pub baseline: f64,
}

impl SimNode {
    fn random(index: usize, rng: &mut StdRng) -> Self {
        let sensor_type = SENSOR_TYPES.choose(rng).copied().unwrap_or("temperature");
        SimNode {
            id: NodeId::new(format!("{}-{:03}", sensor_type, index)),
            sensor_type,
            battery: rng.gen_range(10.0..=100.0),
            network: random_network(rng),
            baseline: rng.gen_range(1.0..=6.0),
        }
    }

    /// Produce the next reading and age the device
    fn reading(&mut self, rng: &mut StdRng) -> Event {
        // Occasional alarms push importance to the top of the range
        let importance = if rng.gen_bool(0.1) {
            rng.gen_range(8.0..=10.0)
        } else {
            (self.baseline + rng.gen_range(-1.0..=1.0)).clamp(0.0, 10.0)
        };

        let event = Event::new(self.id.clone(), importance, self.battery, self.network)
            .with_sensor_type(self.sensor_type)
            .with_payload(serde_json::json!({ "reading": rng.gen_range(0.0..100.0_f64) }));

        self.battery = (self.battery - rng.gen_range(0.0..=2.0)).max(0.0);
        if rng.gen_bool(0.2) {
            self.network = random_network(rng);
        }
        event
    }
}

fn random_network(rng: &mut StdRng) -> NetworkStatus {
    match rng.gen_range(0..100) {
        0..=19 => NetworkStatus::Excellent,
        20..=49 => NetworkStatus::Good,
        50..=74 => NetworkStatus::Fair,
        75..=89 => NetworkStatus::Poor,
        90..=96 => NetworkStatus::Critical,
        _ => NetworkStatus::Unknown,
    }
}

/// A set of nodes reporting in round-robin
pub struct Fleet {
    nodes: Vec<SimNode>,
    cursor: usize,
}

impl Fleet {
    pub fn new(size: usize, rng: &mut StdRng) -> Self {
        Fleet {
            nodes: (0..size).map(|i| SimNode::random(i, rng)).collect(),
            cursor: 0,
        }
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn next_event(&mut self, rng: &mut StdRng) -> Option<Event> {
        if self.nodes.is_empty() {
            return None;
        }
        let index = self.cursor % self.nodes.len();
        self.cursor += 1;
        Some(self.nodes[index].reading(rng))
    }
}

/// Chance that an upload over `network` is lost
pub fn loss_rate(network: NetworkStatus) -> f64 {
    match network {
        NetworkStatus::Excellent => 0.0,
        NetworkStatus::Good => 0.02,
        NetworkStatus::Fair => 0.05,
        NetworkStatus::Poor => 0.2,
        NetworkStatus::Critical => 0.5,
        NetworkStatus::Unknown => 0.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_fleet_is_deterministic_per_seed() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let mut fleet_a = Fleet::new(4, &mut a);
        let mut fleet_b = Fleet::new(4, &mut b);

        for _ in 0..10 {
            let ea = fleet_a.next_event(&mut a).unwrap();
            let eb = fleet_b.next_event(&mut b).unwrap();
            assert_eq!(ea.node_id, eb.node_id);
            assert_eq!(ea.importance, eb.importance);
            assert_eq!(ea.battery, eb.battery);
        }
    }

    #[test]
    fn test_readings_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut fleet = Fleet::new(8, &mut rng);
        for _ in 0..500 {
            let event = fleet.next_event(&mut rng).unwrap();
            assert!((0.0..=10.0).contains(&event.importance));
            assert!((0.0..=100.0).contains(&event.battery));
        }
    }

    #[test]
    fn test_empty_fleet() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut fleet = Fleet::new(0, &mut rng);
        assert!(fleet.next_event(&mut rng).is_none());
    }
}
