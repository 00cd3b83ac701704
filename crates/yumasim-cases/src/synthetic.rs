// crates/yumasim-cases/src/synthetic.rs
//
// The synthetic scenario library.
//
// Each scenario has three validators and two servers over 40 epochs. They
// exercise how quickly validators follow a consensus shift ("kappa moves
// first/second/third"), late and dishonest validators, stake merges,
// clipping, and bond resets. Weights are given per epoch as functions of
// the epoch index so a case costs nothing until it is stepped.

use yumasim_core::{BondReset, Case, EpochSnapshot, YumaError};

/// Epochs every synthetic scenario spans.
pub const DEFAULT_NUM_EPOCHS: usize = 40;

/// Registry keys, in presentation order.
pub const CASE_KEYS: [&str; 14] = [
    "Case 1", "Case 2", "Case 3", "Case 4", "Case 5", "Case 6", "Case 7", "Case 8", "Case 9",
    "Case 10", "Case 11", "Case 12", "Case 13", "Case 14",
];

/// A scenario whose weights and stakes are functions of the epoch index.
#[derive(Debug, Clone)]
pub struct SyntheticCase {
    name: String,
    validators: Vec<String>,
    base_validator: String,
    num_epochs: usize,
    servers: Vec<String>,
    bond_reset: Option<BondReset>,
    weights: fn(usize) -> Vec<Vec<f64>>,
    stakes: fn(usize) -> Vec<f64>,
}

impl SyntheticCase {
    fn new(
        name: &str,
        validators: [&str; 3],
        base_validator: &str,
        weights: fn(usize) -> Vec<Vec<f64>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            validators: validators.iter().map(|v| v.to_string()).collect(),
            base_validator: base_validator.to_string(),
            num_epochs: DEFAULT_NUM_EPOCHS,
            servers: vec!["Server 1".to_string(), "Server 2".to_string()],
            bond_reset: None,
            weights,
            stakes: |_| vec![0.8, 0.1, 0.1],
        }
    }

    fn with_reset(mut self, miner_index: usize, epoch: usize) -> Self {
        self.bond_reset = Some(BondReset { miner_index, epoch });
        self
    }

    fn with_stakes(mut self, stakes: fn(usize) -> Vec<f64>) -> Self {
        self.stakes = stakes;
        self
    }

    /// Same scenario over a different number of epochs.
    pub fn with_num_epochs(mut self, num_epochs: usize) -> Self {
        self.num_epochs = num_epochs;
        self
    }

    pub fn servers(&self) -> &[String] {
        &self.servers
    }
}

impl Case for SyntheticCase {
    fn name(&self) -> &str {
        &self.name
    }

    fn validators(&self) -> &[String] {
        &self.validators
    }

    fn base_validator(&self) -> &str {
        &self.base_validator
    }

    fn num_epochs(&self) -> usize {
        self.num_epochs
    }

    fn snapshot(&self, epoch: usize) -> Result<EpochSnapshot, YumaError> {
        if epoch >= self.num_epochs {
            return Err(YumaError::InvalidConfig(format!(
                "{}: epoch {} out of range for {} epochs",
                self.name, epoch, self.num_epochs
            )));
        }
        Ok(EpochSnapshot {
            validators: self.validators.clone(),
            miners: self.servers.clone(),
            weights: (self.weights)(epoch),
            stakes: (self.stakes)(epoch),
        })
    }

    fn bond_reset(&self) -> Option<BondReset> {
        self.bond_reset
    }
}

/// One-hot rows: validator `v` puts all its weight on server `servers[v]`.
fn to_servers(servers: [usize; 3]) -> Vec<Vec<f64>> {
    servers
        .iter()
        .map(|&s| {
            let mut row = vec![0.0; 2];
            row[s] = 1.0;
            row
        })
        .collect()
}

/// Build a case by registry key ("Case 1" .. "Case 14").
pub fn create_case(key: &str) -> Result<SyntheticCase, YumaError> {
    let case = match key {
        "Case 1" => SyntheticCase::new(
            "Case 1 - kappa moves first",
            ["Big vali. (0.8)", "Small lazy vali. (0.1)", "Small lazier vali. (0.1)"],
            "Big vali. (0.8)",
            |epoch| match epoch {
                0 => to_servers([0, 0, 0]),
                1 => to_servers([1, 0, 0]),
                2 => to_servers([1, 1, 0]),
                _ => to_servers([1, 1, 1]),
            },
        ),
        "Case 2" => SyntheticCase::new(
            "Case 2 - kappa moves second",
            ["Big vali. (0.8)", "Small eager vali. (0.1)", "Small lazy vali. (0.1)"],
            "Small eager vali. (0.1)",
            |epoch| match epoch {
                0 => to_servers([0, 0, 0]),
                1 => to_servers([0, 1, 0]),
                2 => to_servers([1, 1, 0]),
                _ => to_servers([1, 1, 1]),
            },
        ),
        "Case 3" => SyntheticCase::new(
            "Case 3 - kappa moves third",
            ["Big vali. (0.8)", "Small eager vali. (0.1)", "Small lazy vali. (0.1)"],
            "Small eager vali. (0.1)",
            |epoch| match epoch {
                0 => to_servers([0, 0, 0]),
                1 => to_servers([0, 1, 0]),
                2 => to_servers([0, 1, 1]),
                _ => to_servers([1, 1, 1]),
            },
        ),
        "Case 4" => SyntheticCase::new(
            "Case 4 - all validators switch",
            ["Big vali. (0.8)", "Small vali. (0.1)", "Small vali 2. (0.1)"],
            "Big vali. (0.8)",
            |epoch| match epoch {
                0 => to_servers([0, 0, 0]),
                _ => to_servers([1, 1, 1]),
            },
        ),
        "Case 5" => SyntheticCase::new(
            "Case 5 - kappa moves second, then third",
            [
                "Big vali. (0.8)",
                "Small eager-eager vali. (0.1)",
                "Small eager-lazy vali. (0.1)",
            ],
            "Small eager-eager vali. (0.1)",
            |epoch| match epoch {
                0 => to_servers([0, 0, 0]),
                1 => to_servers([0, 1, 1]),
                2..=20 => to_servers([1, 1, 1]),
                21 => to_servers([1, 0, 1]),
                22 => to_servers([1, 0, 0]),
                _ => to_servers([0, 0, 0]),
            },
        )
        .with_reset(1, 20),
        "Case 6" => SyntheticCase::new(
            "Case 6 - kappa moves second, then all validators switch",
            ["Big vali. (0.8)", "Small eager vali. (0.1)", "Small lazy vali. (0.1)"],
            "Small eager vali. (0.1)",
            |epoch| match epoch {
                0 => to_servers([0, 0, 0]),
                1 => to_servers([0, 1, 0]),
                2 => to_servers([1, 1, 0]),
                3..=20 => to_servers([1, 1, 1]),
                _ => to_servers([0, 0, 0]),
            },
        )
        .with_reset(0, 21),
        "Case 7" => SyntheticCase::new(
            "Case 7 - big vali moves late, then all but one small vali moves late",
            [
                "Big vali. (0.8)",
                "Small eager-lazy vali. (0.1)",
                "Small eager-eager vali. (0.1)",
            ],
            "Small eager-eager vali. (0.1)",
            |epoch| match epoch {
                0 => to_servers([0, 0, 0]),
                1 => to_servers([0, 1, 1]),
                2..=20 => to_servers([1, 1, 1]),
                21 => to_servers([1, 1, 0]),
                _ => to_servers([0, 0, 0]),
            },
        )
        .with_reset(0, 21),
        "Case 8" => SyntheticCase::new(
            "Case 8 - big vali moves late, then late",
            [
                "Big dishonest lazy vali. (0.8)",
                "Small eager-eager vali. (0.1)",
                "Small eager-eager vali 2. (0.1)",
            ],
            "Small eager-eager vali. (0.1)",
            |epoch| match epoch {
                0 => to_servers([0, 0, 0]),
                1 => to_servers([0, 1, 1]),
                2..=20 => to_servers([1, 1, 1]),
                21 => to_servers([1, 0, 0]),
                _ => to_servers([0, 0, 0]),
            },
        )
        .with_reset(1, 20),
        "Case 9" => SyntheticCase::new(
            "Case 9 - small validators merged in e5",
            ["Big vali. (0.8)", "Small vali. (0.1/0.2)", "Small vali 2. (0.1/0.0)"],
            "Big vali. (0.8)",
            |_| to_servers([1, 1, 1]),
        )
        .with_stakes(|epoch| {
            if epoch <= 5 {
                vec![0.8, 0.1, 0.1]
            } else {
                vec![0.8, 0.2, 0.0]
            }
        }),
        "Case 10" => SyntheticCase::new(
            "Case 10 - kappa delayed",
            ["Big delayed vali. (0.8)", "Small eager vali. (0.1)", "Small lazy vali. (0.1)"],
            "Small eager vali. (0.1)",
            |epoch| match epoch {
                0 => to_servers([0, 0, 0]),
                1..=9 => to_servers([0, 1, 0]),
                10 => to_servers([1, 1, 0]),
                _ => to_servers([1, 1, 1]),
            },
        ),
        "Case 11" => SyntheticCase::new(
            "Case 11 - clipping demo",
            ["Big vali. 1 (0.49)", "Big vali. 2 (0.49)", "Small vali. (0.02)"],
            "Big vali. 1 (0.49)",
            |epoch| {
                if epoch < 20 {
                    vec![vec![0.3, 0.7], vec![0.6, 0.4], vec![0.61, 0.39]]
                } else {
                    vec![vec![0.3, 0.7], vec![0.6, 0.4], vec![0.3, 0.61]]
                }
            },
        )
        .with_stakes(|_| vec![0.49, 0.49, 0.02])
        .with_reset(1, 20),
        "Case 12" => SyntheticCase::new(
            "Case 12 - all validators switch, but small validator/s support alt miner with minimal weight",
            ["Big vali. (0.8)", "Small dishonest vali. (0.1)", "Small vali. (0.1)"],
            "Big vali. (0.8)",
            |epoch| match epoch {
                1..=20 => vec![vec![0.0, 1.0], vec![0.001, 0.999], vec![0.0, 1.0]],
                _ => vec![vec![1.0, 0.0], vec![0.999, 0.001], vec![1.0, 0.0]],
            },
        )
        .with_reset(1, 20),
        "Case 13" => SyntheticCase::new(
            "Case 13 - Big vali supports server 2, small validator/s support server 1",
            ["Big vali. (0.8)", "Small vali. (0.1)", "Small vali 2. (0.1)"],
            "Big vali. (0.8)",
            |epoch| {
                if epoch <= 20 {
                    vec![vec![0.0, 1.0], vec![0.5, 0.5], vec![0.0, 1.0]]
                } else {
                    vec![vec![0.0, 1.0], vec![0.5, 0.5], vec![0.5, 0.5]]
                }
            },
        )
        .with_reset(0, 20),
        "Case 14" => SyntheticCase::new(
            "Case 14 - All validators support Server 1, one of them switches to Server 2 for one epoch",
            ["Vali. 1 (0.33)", "Vali. 2 (0.33)", "Vali. 3 (0.34)"],
            "Vali. 1 (0.33)",
            |epoch| match epoch {
                20 => to_servers([0, 0, 1]),
                _ => to_servers([0, 0, 0]),
            },
        )
        .with_stakes(|_| vec![0.33, 0.33, 0.34]),
        _ => return Err(YumaError::UnknownCase(key.to_string())),
    };
    Ok(case)
}

/// Every registered scenario, in registry order.
pub fn all_cases() -> Vec<SyntheticCase> {
    CASE_KEYS
        .iter()
        .filter_map(|key| create_case(key).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds_every_case() {
        let cases = all_cases();
        assert_eq!(cases.len(), CASE_KEYS.len());
        for case in &cases {
            assert!(case.validators().iter().any(|v| v == case.base_validator()));
            assert_eq!(case.num_epochs(), DEFAULT_NUM_EPOCHS);
            for epoch in 0..case.num_epochs() {
                let snapshot = case.snapshot(epoch).unwrap();
                assert!(snapshot.validate().is_ok(), "{} epoch {}", case.name(), epoch);
            }
        }
    }

    #[test]
    fn test_unknown_case() {
        let err = create_case("Case 99").unwrap_err();
        assert!(matches!(err, YumaError::UnknownCase(key) if key == "Case 99"));
    }

    #[test]
    fn test_case_1_schedule() {
        let case = create_case("Case 1").unwrap();
        assert_eq!(case.snapshot(0).unwrap().weights, to_servers([0, 0, 0]));
        assert_eq!(case.snapshot(1).unwrap().weights, to_servers([1, 0, 0]));
        assert_eq!(case.snapshot(39).unwrap().weights, to_servers([1, 1, 1]));
        assert!(case.snapshot(40).is_err());
    }

    #[test]
    fn test_case_9_stake_merge() {
        let case = create_case("Case 9").unwrap();
        assert_eq!(case.snapshot(5).unwrap().stakes, vec![0.8, 0.1, 0.1]);
        assert_eq!(case.snapshot(6).unwrap().stakes, vec![0.8, 0.2, 0.0]);
    }

    #[test]
    fn test_reset_schedules() {
        let reset = |key: &str| create_case(key).unwrap().bond_reset();
        assert_eq!(reset("Case 5"), Some(BondReset { miner_index: 1, epoch: 20 }));
        assert_eq!(reset("Case 6"), Some(BondReset { miner_index: 0, epoch: 21 }));
        assert_eq!(reset("Case 13"), Some(BondReset { miner_index: 0, epoch: 20 }));
        assert_eq!(reset("Case 1"), None);
        assert_eq!(reset("Case 14"), None);
    }

    #[test]
    fn test_shorter_run() {
        let case = create_case("Case 4").unwrap().with_num_epochs(3);
        assert_eq!(case.num_epochs(), 3);
        assert!(case.snapshot(2).is_ok());
        assert!(case.snapshot(3).is_err());
    }
}
