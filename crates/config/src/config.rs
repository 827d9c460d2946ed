//! The config module provides the internal representation of the evaluation configuration.

use crate::ResolutionError;
use regex::Regex;
use std::collections::HashSet;
use validator::{Validate, ValidationError};

lazy_static! {
    static ref RE_VALID_REFERENCE: Regex = Regex::new(r"^[_a-z0-9]+$").unwrap();
}

/// The root of an evaluation configuration.
///
/// Wraps all child configuration structures: the frames of discernment, the bodies of evidence defined
/// over them, and the combinations to compute.
#[derive(Debug, Default)]
pub struct Config {
    /// Configuration for rendering results.
    pub output: Output,
    /// A list of named frames of discernment.
    pub frames: Vec<Frame>,
    /// A list of named bodies of evidence, each a weighted-subset mapping over a frame.
    pub evidence: Vec<Evidence>,
    /// A list of named combinations of evidence or of other combinations.
    pub combinations: Vec<Combination>,
}

impl Config {
    /// Looks up the [`Frame`] corresponding to the `reference` string.
    ///
    /// # Arguments
    ///
    /// * `reference` - A string that corresponds to a [`Frame::reference`] value.
    pub fn frame(&self, reference: &str) -> Option<&Frame> {
        self.frames.iter().find(|&frame| frame.reference == reference)
    }

    /// Looks up the [`Evidence`] corresponding to the `reference` string.
    ///
    /// # Arguments
    ///
    /// * `reference` - A string that corresponds to an [`Evidence::reference`] value.
    pub fn evidence(&self, reference: &str) -> Option<&Evidence> {
        self.evidence
            .iter()
            .find(|&evidence| evidence.reference == reference)
    }

    /// Looks up the [`Combination`] corresponding to the `reference` string.
    ///
    /// # Arguments
    ///
    /// * `reference` - A string that corresponds to a [`Combination::reference`] value.
    pub fn combination(&self, reference: &str) -> Option<&Combination> {
        self.combinations
            .iter()
            .find(|&combination| combination.reference == reference)
    }
}

/// Configuration for rendering results.
#[derive(Debug, Validate, Clone)]
pub struct Output {
    /// The maximum number of decimal places printed for a mass or belief value.
    #[validate(range(max = 15))]
    pub precision: usize,
    /// True if the table of cumulative queries should be printed, false otherwise.
    ///
    /// The table has `3^n` rows for an `n`-event frame.
    pub cumulative: bool,
}

/// The default [`Output::precision`] value.
pub const DEFAULT_PRECISION: usize = 3;

impl Default for Output {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            cumulative: true,
        }
    }
}

/// A named frame of discernment.
#[derive(Debug, Validate, Clone)]
pub struct Frame {
    /// The frame reference key. Should be limited to ASCII lowercase a-z, digits and underscores. Maximum
    /// 96 characters.
    #[validate(length(min = 1, max = 96), regex(path = "RE_VALID_REFERENCE"))]
    pub reference: String,
    /// The events of the frame, in the order that determines their ids.
    #[validate(custom = "validate_events")]
    pub events: Vec<String>,
}

/// Validates that a frame has between one and [`MAX_FRAME_SIZE`](shafer_mass::MAX_FRAME_SIZE) distinct
/// events.
fn validate_events(events: &[String]) -> Result<(), ValidationError> {
    if events.is_empty() {
        return Err(ValidationError::new("frame must have at least one event"));
    }
    let distinct: HashSet<&String> = events.iter().collect();
    if distinct.len() != events.len() {
        return Err(ValidationError::new("frame events must be distinct"));
    }
    if events.len() > shafer_mass::MAX_FRAME_SIZE {
        return Err(ValidationError::new("frame has too many events"));
    }
    Ok(())
}

/// A named body of evidence: weights assigned to subsets of a frame.
#[derive(Debug, Validate, Clone)]
pub struct Evidence {
    /// The evidence reference key. Should be limited to ASCII lowercase a-z, digits and underscores.
    /// Maximum 96 characters.
    #[validate(length(min = 1, max = 96), regex(path = "RE_VALID_REFERENCE"))]
    pub reference: String,
    /// The reference of the [`Frame`] the evidence is defined over.
    pub frame: String,
    /// The weighted subsets. Weights need not sum to one; an empty list means total ignorance.
    #[validate]
    pub focal: Vec<Focal>,
}

/// A weight assigned to a subset of a frame.
#[derive(Debug, Validate, Clone)]
pub struct Focal {
    /// The events of the subset. Events outside the frame are ignored.
    pub events: Vec<String>,
    /// The unnormalized weight of the subset.
    #[validate(range(min = 0.0))]
    pub weight: f64,
}

/// The default [`Focal::weight`] value.
pub const DEFAULT_FOCAL_WEIGHT: f64 = 1.0;

/// The rule used to combine the inputs of a [`Combination`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Rule {
    /// Dempster's rule of combination, applied left to right.
    Dempster,
    /// Murphy's averaging rule.
    Murphy,
}

/// A named combination of bodies of evidence and other combinations.
#[derive(Debug, Validate, Clone)]
pub struct Combination {
    /// The combination reference key. Should be limited to ASCII lowercase a-z, digits and underscores.
    /// Maximum 96 characters.
    #[validate(length(min = 1, max = 96), regex(path = "RE_VALID_REFERENCE"))]
    pub reference: String,
    /// The rule used to combine the inputs.
    pub rule: Rule,
    /// The references to the evidence and combinations that are combined, in order.
    #[validate(length(min = 1))]
    pub inputs: Vec<Reference>,
}

impl Combination {
    /// Resolves all references within a `Combination`, producing a flattened list of the [`Evidence`]
    /// it ultimately draws on, in input order.
    ///
    /// Evidence reached through more than one path is listed once.
    ///
    /// # Arguments
    ///
    /// * `config` - A [`Config`] reference to perform lookups against.
    ///   `Combination`s do not maintain their own references to their parent [`Config`] so this must be
    ///   passed in.
    pub fn resolve_evidence<'a>(
        &'a self,
        config: &'a Config,
    ) -> Result<Vec<&'a Evidence>, ResolutionError> {
        let mut visiting = HashSet::new();
        visiting.insert(self.reference.clone());
        let mut evidence = Vec::with_capacity(self.inputs.len());
        self.resolve_evidence_recursive(config, &mut visiting, &mut evidence)?;
        Ok(evidence)
    }

    /// Resolves all references, checking for cycles.
    fn resolve_evidence_recursive<'a>(
        &'a self,
        config: &'a Config,
        visiting: &mut HashSet<String>,
        evidence: &mut Vec<&'a Evidence>,
    ) -> Result<(), ResolutionError> {
        for reference in &self.inputs {
            match reference {
                Reference::Evidence(ref_name) => {
                    let found = config
                        .evidence(ref_name)
                        .ok_or_else(|| ResolutionError::Missing(ref_name.to_string()))?;
                    if !evidence
                        .iter()
                        .any(|known| known.reference == found.reference)
                    {
                        evidence.push(found);
                    }
                }
                Reference::Combination(ref_name) => {
                    if !visiting.insert(ref_name.to_string()) {
                        return Err(ResolutionError::CircularCombination(ref_name.to_string()));
                    }
                    let inner = config
                        .combination(ref_name)
                        .ok_or_else(|| ResolutionError::Missing(ref_name.to_string()))?;
                    inner.resolve_evidence_recursive(config, visiting, evidence)?;
                    visiting.remove(ref_name);
                }
                Reference::Missing(ref_name) => {
                    return Err(ResolutionError::Missing(ref_name.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Wraps reference strings and differentiates what the reference points to.
#[derive(Debug, PartialEq, Eq, Clone, serde::Serialize)]
pub enum Reference {
    /// A reference to an [`Evidence`].
    Evidence(String),
    /// A reference to a [`Combination`].
    Combination(String),
    /// A reference that could not be resolved.
    Missing(String),
}

impl Reference {
    /// The referenced name.
    pub fn name(&self) -> &str {
        match self {
            Reference::Evidence(name) | Reference::Combination(name) | Reference::Missing(name) => {
                name
            }
        }
    }
}
