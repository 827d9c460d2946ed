//! Turns a loaded configuration into mass assignments and combines them.

use {
    crate::{
        errors::{CombinationError, EvaluationError},
        report::{Entry, Report},
    },
    shafer_config::{Combination, Config, Reference, ResolutionError, Rule},
    shafer_mass::{CombineError, MassAssignment},
    std::collections::HashMap,
    tracing::{debug, info, warn},
};

type Assignment = MassAssignment<String>;

/// A combined mass assignment.
#[derive(Debug, Clone)]
pub struct Evaluated {
    pub assignment: Assignment,
    /// The mass Dempster's rule discarded as conflicting, over every pairwise step.
    ///
    /// Murphy's rule reports no conflict.
    pub conflict: Option<f64>,
}

/// Evaluates the combinations of a [`Config`], computing each one at most once.
pub struct Evaluator<'a> {
    config: &'a Config,
    evidence: HashMap<&'a str, Assignment>,
    combinations: HashMap<&'a str, Result<Evaluated, CombinationError>>,
}

impl<'a> Evaluator<'a> {
    /// Builds the mass assignment of every body of evidence and checks that every combination resolves.
    pub fn new(config: &'a Config) -> Result<Self, EvaluationError> {
        let mut evidence = HashMap::with_capacity(config.evidence.len());
        for item in &config.evidence {
            let frame = config
                .frame(&item.frame)
                .ok_or_else(|| ResolutionError::Missing(item.frame.clone()))?;
            let assignment = MassAssignment::new(
                frame.events.iter().cloned(),
                item.focal
                    .iter()
                    .map(|focal| (focal.events.iter(), focal.weight)),
            )
            .map_err(|error| EvaluationError::Frame(frame.reference.clone(), error))?;
            debug!(
                message = "built mass assignment",
                evidence = %item.reference,
                frame = %frame.reference,
            );
            evidence.insert(item.reference.as_str(), assignment);
        }
        for combination in &config.combinations {
            combination.resolve_evidence(config)?;
        }
        Ok(Self {
            config,
            evidence,
            combinations: HashMap::with_capacity(config.combinations.len()),
        })
    }

    /// The mass assignment built for a body of evidence.
    pub fn evidence(&self, reference: &str) -> Option<&Assignment> {
        self.evidence.get(reference)
    }

    /// Evaluates a combination, reusing the result if it was already computed.
    pub fn combination(
        &mut self,
        combination: &'a Combination,
    ) -> Result<Evaluated, CombinationError> {
        if let Some(result) = self.combinations.get(combination.reference.as_str()) {
            return result.clone();
        }
        let result = self.combine(combination);
        match &result {
            Ok(evaluated) => debug!(
                message = "combined evidence",
                combination = %combination.reference,
                rule = %combination.rule,
                conflict = ?evaluated.conflict,
            ),
            Err(error) => warn!(
                message = "combination failed",
                combination = %combination.reference,
                error_message = %error,
            ),
        }
        self.combinations
            .insert(combination.reference.as_str(), result.clone());
        result
    }

    fn combine(&mut self, combination: &'a Combination) -> Result<Evaluated, CombinationError> {
        let config = self.config;
        let mut inputs = Vec::with_capacity(combination.inputs.len());
        for reference in &combination.inputs {
            let input = match reference {
                Reference::Evidence(name) => self
                    .evidence
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| CombinationError::FailedInput(name.clone()))?,
                Reference::Combination(name) => {
                    let inner = config
                        .combination(name)
                        .ok_or_else(|| CombinationError::FailedInput(name.clone()))?;
                    self.combination(inner)
                        .map_err(|_| CombinationError::FailedInput(name.clone()))?
                        .assignment
                }
                Reference::Missing(name) => {
                    return Err(CombinationError::FailedInput(name.clone()));
                }
            };
            inputs.push(input);
        }

        match combination.rule {
            Rule::Dempster => {
                let mut remaining = inputs.iter();
                let mut combined = remaining.next().ok_or(CombineError::Empty)?.clone();
                let mut agreement = 1.0;
                for next in remaining {
                    let (result, conflict) = MassAssignment::combine_with_conflict(&combined, next)?;
                    agreement *= 1.0 - conflict;
                    combined = result;
                }
                Ok(Evaluated {
                    assignment: combined,
                    conflict: Some(1.0 - agreement),
                })
            }
            Rule::Murphy => Ok(Evaluated {
                assignment: MassAssignment::combine_murphy(&inputs)?,
                conflict: None,
            }),
        }
    }

    /// The events of the frame a combination is ultimately defined over, used to label failures.
    fn frame_events(&self, combination: &Combination) -> Vec<String> {
        combination
            .resolve_evidence(self.config)
            .ok()
            .and_then(|evidence| evidence.first().map(|item| item.frame.clone()))
            .and_then(|frame| self.config.frame(&frame))
            .map(|frame| frame.events.clone())
            .unwrap_or_default()
    }
}

/// Evaluates every body of evidence and every combination in a configuration.
///
/// Entries follow the configuration order, evidence first. A combination that fails produces a failed
/// entry rather than an error.
pub fn evaluate(config: &Config) -> Result<Report, EvaluationError> {
    info!(
        message = "evaluating configuration",
        frames = config.frames.len(),
        evidence = config.evidence.len(),
        combinations = config.combinations.len(),
    );
    let cumulative = config.output.cumulative;
    let mut evaluator = Evaluator::new(config)?;
    let mut entries = Vec::with_capacity(config.evidence.len() + config.combinations.len());

    for item in &config.evidence {
        if let Some(assignment) = evaluator.evidence(&item.reference) {
            entries.push(Entry::from_assignment(
                &item.reference,
                assignment,
                None,
                cumulative,
            ));
        }
    }
    for combination in &config.combinations {
        let entry = match evaluator.combination(combination) {
            Ok(evaluated) => Entry::from_assignment(
                &combination.reference,
                &evaluated.assignment,
                evaluated.conflict,
                cumulative,
            ),
            Err(error) => Entry::failed(
                &combination.reference,
                evaluator.frame_events(combination),
                &error,
            ),
        };
        entries.push(entry);
    }
    Ok(Report { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shafer_config::{Evidence, Focal, Frame};

    fn focal(events: &[&str], weight: f64) -> Focal {
        Focal {
            events: events.iter().map(|event| event.to_string()).collect(),
            weight,
        }
    }

    fn config(combinations: Vec<Combination>) -> Config {
        Config {
            frames: vec![Frame {
                reference: "coin".to_string(),
                events: vec!["heads".to_string(), "tails".to_string()],
            }],
            evidence: vec![
                Evidence {
                    reference: "toss".to_string(),
                    frame: "coin".to_string(),
                    focal: vec![focal(&["heads"], 1.0)],
                },
                Evidence {
                    reference: "rumor".to_string(),
                    frame: "coin".to_string(),
                    focal: vec![focal(&["tails"], 1.0)],
                },
                Evidence {
                    reference: "hunch".to_string(),
                    frame: "coin".to_string(),
                    focal: vec![focal(&["heads"], 3.0), focal(&["heads", "tails"], 1.0)],
                },
            ],
            combinations,
            ..Default::default()
        }
    }

    fn combination(reference: &str, rule: Rule, inputs: Vec<Reference>) -> Combination {
        Combination {
            reference: reference.to_string(),
            rule,
            inputs,
        }
    }

    fn evidence(name: &str) -> Reference {
        Reference::Evidence(name.to_string())
    }

    #[test]
    fn test_total_conflict_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let config = config(vec![
            combination(
                "impossible",
                Rule::Dempster,
                vec![evidence("toss"), evidence("rumor")],
            ),
            combination("averaged", Rule::Murphy, vec![evidence("toss"), evidence("rumor")]),
            combination(
                "downstream",
                Rule::Dempster,
                vec![
                    Reference::Combination("impossible".to_string()),
                    evidence("hunch"),
                ],
            ),
        ]);
        let report = evaluate(&config)?;
        assert_eq!(report.entries.len(), 6);

        let impossible = &report.entries[3];
        assert_eq!(impossible.name, "impossible");
        assert_eq!(
            impossible.error.as_deref(),
            Some("mass assignments are in total conflict")
        );
        assert_eq!(impossible.events, vec!["heads", "tails"]);

        let averaged = &report.entries[4];
        assert!(averaged.error.is_none());
        assert_relative_eq!(averaged.subsets[1].mass, 0.5, epsilon = 1e-12);
        assert_relative_eq!(averaged.subsets[2].mass, 0.5, epsilon = 1e-12);
        assert_eq!(averaged.conflict, None);

        let downstream = &report.entries[5];
        assert_eq!(
            downstream.error.as_deref(),
            Some("input 'impossible' could not be evaluated")
        );
        Ok(())
    }

    #[test]
    fn test_nested_combination() -> Result<(), Box<dyn std::error::Error>> {
        let config = config(vec![
            combination(
                "pair",
                Rule::Dempster,
                vec![evidence("hunch"), evidence("rumor")],
            ),
            combination(
                "nested",
                Rule::Dempster,
                vec![
                    Reference::Combination("pair".to_string()),
                    evidence("hunch"),
                ],
            ),
        ]);
        let mut evaluator = Evaluator::new(&config)?;
        let pair = evaluator.combination(&config.combinations[0])?;
        // hunch {heads: .75, Ω: .25} against rumor {tails: 1}
        assert_relative_eq!(pair.conflict.unwrap_or_default(), 0.75, epsilon = 1e-12);
        assert_relative_eq!(
            pair.assignment.belief_assignment(["tails"].map(String::from)),
            1.0,
            epsilon = 1e-12
        );

        // the nested step conflicts by .75 again, so 1 - .25 * .25 overall
        let nested = evaluator.combination(&config.combinations[1])?;
        assert_relative_eq!(nested.conflict.unwrap_or_default(), 0.9375, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_missing_frame() {
        let mut config = config(vec![]);
        config.evidence[0].frame = "dice".to_string();
        assert!(matches!(
            Evaluator::new(&config),
            Err(EvaluationError::Resolution(ResolutionError::Missing(name))) if name == "dice"
        ));
    }

    #[test]
    fn test_invalid_frame() {
        let mut config = config(vec![]);
        config.frames[0].events.clear();
        assert!(matches!(
            Evaluator::new(&config),
            Err(EvaluationError::Frame(name, shafer_mass::FrameError::Empty)) if name == "coin"
        ));
    }

    #[test]
    fn test_circular_combination() {
        let config = config(vec![
            combination(
                "left",
                Rule::Dempster,
                vec![Reference::Combination("right".to_string())],
            ),
            combination(
                "right",
                Rule::Murphy,
                vec![Reference::Combination("left".to_string())],
            ),
        ]);
        assert!(matches!(
            Evaluator::new(&config),
            Err(EvaluationError::Resolution(
                ResolutionError::CircularCombination(_)
            ))
        ));
    }
}
