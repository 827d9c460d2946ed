//! Built-in scenarios, each combining two bodies of evidence with Dempster's rule.

use {
    crate::{errors::EvaluationError, evaluate::evaluate, report::Report},
    shafer_config::{Combination, Config, Evidence, Focal, Frame, Reference, Rule},
};

type Weights<'w> = &'w [(&'w [&'w str], f64)];

/// A named built-in configuration.
pub struct Scenario {
    pub name: &'static str,
    pub config: Config,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn evidence(reference: &str, frame: &str, weights: Weights) -> Evidence {
    Evidence {
        reference: reference.to_string(),
        frame: frame.to_string(),
        focal: weights
            .iter()
            .map(|&(events, weight)| Focal {
                events: strings(events),
                weight,
            })
            .collect(),
    }
}

fn scenario(name: &'static str, events: &[&str], first: Weights, second: Weights) -> Scenario {
    Scenario {
        name,
        config: Config {
            frames: vec![Frame {
                reference: name.to_string(),
                events: strings(events),
            }],
            evidence: vec![
                evidence("first", name, first),
                evidence("second", name, second),
            ],
            combinations: vec![Combination {
                reference: "combined".to_string(),
                rule: Rule::Dempster,
                inputs: vec![
                    Reference::Evidence("first".to_string()),
                    Reference::Evidence("second".to_string()),
                ],
            }],
            ..Default::default()
        },
    }
}

/// The built-in scenarios, in the order they are printed.
pub fn scenarios() -> Vec<Scenario> {
    vec![
        scenario(
            "basic",
            &["A", "B"],
            &[(&["A", "B"], 1.0), (&["A"], 1.0), (&["B"], 8.0)],
            &[(&["A", "B"], 1.0), (&["A"], 3.0), (&["B"], 1.0)],
        ),
        scenario(
            "bigger",
            &["A", "B", "C", "D"],
            &[(&["B", "C", "D"], 3.0), (&["A", "B", "C", "D"], 1.0)],
            &[(&["B"], 2.0), (&["D"], 2.0), (&["A", "B", "C", "D"], 1.0)],
        ),
        scenario(
            "probability",
            &["A", "B", "C"],
            &[(&["A"], 9.0), (&["B", "C"], 1.0)],
            &[(&["C"], 4.0), (&["A", "B"], 1.0)],
        ),
    ]
}

/// Evaluates every built-in scenario.
pub fn run() -> Result<Vec<(&'static str, Report)>, EvaluationError> {
    scenarios()
        .into_iter()
        .map(|scenario| Ok((scenario.name, evaluate(&scenario.config)?)))
        .collect()
}
