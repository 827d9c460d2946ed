//! The `toml` module provides TOML deserialization and parsing for evaluation configuration files.

// Due to the need for multiple serialization mappings, TOML deserialization is not done
// directly in the [`shafer_config`](crate) module's structs.

use {
    crate::{ConfigFileError, ResolutionError},
    itertools::Itertools,
    serde::{Deserialize, Serialize},
    std::{
        collections::HashSet,
        fs,
        path::{Path, PathBuf},
        str::FromStr,
    },
    tracing::debug,
    validator::Validate,
};

/// The TOML serialization for a Config structure.
#[derive(Serialize, Deserialize, Default)]
struct Config {
    #[serde(default)]
    output: Output,
    #[serde(default, rename(serialize = "include", deserialize = "include"))]
    includes: Vec<Include>,
    #[serde(default, rename(serialize = "frame", deserialize = "frame"))]
    frames: Vec<Frame>,
    #[serde(default)]
    evidence: Vec<Evidence>,
    #[serde(default, rename(serialize = "combination", deserialize = "combination"))]
    combinations: Vec<Combination>,
}

/// The TOML serialization for an Output structure.
#[derive(Serialize, Deserialize)]
struct Output {
    #[serde(default = "default_precision")]
    precision: usize,
    #[serde(default = "default_cumulative")]
    cumulative: bool,
}

/// The default number of decimal places.
///
/// See [`DEFAULT_PRECISION`](crate::DEFAULT_PRECISION).
fn default_precision() -> usize {
    crate::DEFAULT_PRECISION
}

/// The default for whether cumulative tables are printed.
fn default_cumulative() -> bool {
    true
}

impl Default for Output {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            cumulative: default_cumulative(),
        }
    }
}

impl From<Output> for crate::Output {
    fn from(output: Output) -> Self {
        Self {
            precision: output.precision,
            cumulative: output.cumulative,
        }
    }
}

/// The TOML serialization for an Include structure.
#[derive(Serialize, Deserialize)]
struct Include {
    path: String,
}

/// The TOML serialization for a Frame structure.
#[derive(Serialize, Deserialize, Clone)]
struct Frame {
    #[serde(rename(serialize = "ref", deserialize = "ref"))]
    reference: String,
    events: Vec<String>,
}

impl From<&Frame> for crate::Frame {
    fn from(frame: &Frame) -> Self {
        Self {
            reference: frame.reference.clone(),
            events: frame.events.clone(),
        }
    }
}

/// The TOML serialization for an Evidence structure.
#[derive(Serialize, Deserialize, Clone)]
struct Evidence {
    #[serde(rename(serialize = "ref", deserialize = "ref"))]
    reference: String,
    frame: String,
    #[serde(default)]
    focal: Vec<Focal>,
}

/// The TOML serialization for a Focal structure.
#[derive(Serialize, Deserialize, Clone)]
struct Focal {
    events: Vec<String>,
    #[serde(default = "default_focal_weight")]
    weight: f64,
}

/// The default weight for a focal subset.
///
/// See [`DEFAULT_FOCAL_WEIGHT`](crate::DEFAULT_FOCAL_WEIGHT).
fn default_focal_weight() -> f64 {
    crate::DEFAULT_FOCAL_WEIGHT
}

impl From<&Evidence> for crate::Evidence {
    fn from(evidence: &Evidence) -> Self {
        Self {
            reference: evidence.reference.clone(),
            frame: evidence.frame.clone(),
            focal: evidence
                .focal
                .iter()
                .map(|focal| crate::Focal {
                    events: focal.events.clone(),
                    weight: focal.weight,
                })
                .collect(),
        }
    }
}

/// The TOML serialization for a Combination structure.
#[derive(Serialize, Deserialize, Clone)]
struct Combination {
    #[serde(rename(serialize = "ref", deserialize = "ref"))]
    reference: String,
    #[serde(default = "default_rule")]
    rule: String,
    inputs: Vec<String>,
}

/// The default combination rule.
fn default_rule() -> String {
    crate::Rule::Dempster.to_string()
}

/// Loads a TOML config file into a [`Config`](crate::Config) structure.
///
/// Included files are resolved relative to the file that includes them. A file reached through
/// more than one include is only loaded the first time.
pub fn load_config<'a, P>(path: &'a P) -> Result<crate::Config, ConfigFileError>
where
    P: 'a + ?Sized + AsRef<Path>,
{
    fn load_config_recursive(
        path: &Path,
        visited: &mut HashSet<PathBuf>,
        loaded: &mut HashSet<PathBuf>,
    ) -> Result<Config, ConfigFileError> {
        if !path.exists() {
            return Err(ConfigFileError::NotFound(path.to_path_buf()));
        }
        let canonical = path.canonicalize()?;
        if visited.contains(&canonical) {
            return Err(ConfigFileError::CircularInclude(
                path.to_string_lossy().to_string(),
            ));
        }
        if !loaded.insert(canonical.clone()) {
            debug!(
                message = "skipping config that was already included",
                path = %path.display()
            );
            return Ok(Config::default());
        }
        visited.insert(canonical.clone());

        let toml_data = fs::read_to_string(path)?;
        let mut root: Config = toml::from_str(&toml_data)?;
        let base = path
            .parent()
            .ok_or_else(|| ConfigFileError::MissingParent(path.to_string_lossy().to_string()))?;

        for include in &root.includes {
            let include_path = base.join(&include.path);
            debug!(
                message = "loading included config",
                path = %include_path.display()
            );
            let include_root = load_config_recursive(&include_path, visited, loaded)?;
            root.frames.extend(include_root.frames);
            root.evidence.extend(include_root.evidence);
            root.combinations.extend(include_root.combinations);
        }

        // Strip includes once processed
        root.includes = vec![];
        visited.remove(&canonical);

        Ok(root)
    }

    // Load the raw serialization format and resolve includes
    let mut visited = HashSet::new();
    let mut loaded = HashSet::new();
    let root = load_config_recursive(path.as_ref(), &mut visited, &mut loaded)?;
    resolve_config(root)
}

/// Parses a TOML string into a [`Config`](crate::Config) structure.
///
/// Includes cannot be resolved without a file location and are rejected.
pub fn parse_config(toml_data: &str) -> Result<crate::Config, ConfigFileError> {
    let root: Config = toml::from_str(toml_data)?;
    if let Some(include) = root.includes.first() {
        return Err(ConfigFileError::UnresolvedInclude(include.path.clone()));
    }
    resolve_config(root)
}

/// Transfers to the public config type, checking references and validating every structure.
fn resolve_config(root: Config) -> Result<crate::Config, ConfigFileError> {
    if let Some(duplicate) = root
        .frames
        .iter()
        .map(|frame| &frame.reference)
        .duplicates()
        .next()
    {
        return Err(ConfigFileError::Duplicate(duplicate.clone()));
    }
    // Evidence and combinations share a namespace since combination inputs may name either.
    if let Some(duplicate) = root
        .evidence
        .iter()
        .map(|evidence| &evidence.reference)
        .chain(root.combinations.iter().map(|combination| &combination.reference))
        .duplicates()
        .next()
    {
        return Err(ConfigFileError::Duplicate(duplicate.clone()));
    }

    let resolve_reference = |ref_name: &String| {
        if root.evidence.iter().any(|e| e.reference == *ref_name) {
            crate::Reference::Evidence(ref_name.clone())
        } else if root.combinations.iter().any(|c| c.reference == *ref_name) {
            crate::Reference::Combination(ref_name.clone())
        } else {
            crate::Reference::Missing(ref_name.clone())
        }
    };

    let mut combinations = Vec::with_capacity(root.combinations.len());
    for combination in &root.combinations {
        combinations.push(crate::Combination {
            reference: combination.reference.clone(),
            rule: crate::Rule::from_str(&combination.rule)
                .map_err(|_| ConfigFileError::InvalidRule(combination.rule.clone()))?,
            inputs: combination.inputs.iter().map(resolve_reference).collect(),
        });
    }

    let config = crate::Config {
        output: root.output.into(),
        frames: root.frames.iter().map(|frame| frame.into()).collect(),
        evidence: root.evidence.iter().map(|evidence| evidence.into()).collect(),
        combinations,
    };

    config.output.validate()?;
    for frame in &config.frames {
        frame.validate()?;
    }
    for evidence in &config.evidence {
        evidence.validate()?;
        if config.frame(&evidence.frame).is_none() {
            return Err(ResolutionError::Missing(evidence.frame.clone()).into());
        }
    }
    for combination in &config.combinations {
        combination.validate()?;
        combination.resolve_evidence(&config)?;
    }

    Ok(config)
}
