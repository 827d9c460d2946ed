//! Rendering of evaluated mass assignments as text tables or JSON.

use {
    serde::Serialize,
    shafer_mass::{MassAssignment, Queries},
    std::fmt::Write,
};

/// The results of an evaluation, one entry per body of evidence or combination.
#[derive(Debug, Serialize)]
pub struct Report {
    pub entries: Vec<Entry>,
}

/// A single evaluated mass assignment, or the reason it could not be produced.
#[derive(Debug, Serialize)]
pub struct Entry {
    pub name: String,
    pub events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subsets: Vec<SubsetRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pignistic: Vec<EventProbability>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cumulative: Vec<CumulativeRow>,
}

/// Mass, belief and plausibility of one subset of the frame.
#[derive(Debug, Serialize)]
pub struct SubsetRow {
    pub events: Vec<String>,
    pub mass: f64,
    pub belief: f64,
    pub plausibility: f64,
}

/// The pignistic probability of a single event.
#[derive(Debug, Serialize)]
pub struct EventProbability {
    pub event: String,
    pub probability: f64,
}

/// The cumulative mass selected by one ternary query.
///
/// The pattern has one character per event in frame order: `1` for an event every counted subset
/// contains, `0` for an event none contains, and `*` for an unconstrained event.
#[derive(Debug, Serialize)]
pub struct CumulativeRow {
    pub pattern: String,
    pub value: f64,
}

impl Entry {
    /// Tabulates a mass assignment.
    ///
    /// The cumulative table has `3^n` rows and is only filled in when `cumulative` is set.
    pub fn from_assignment(
        name: &str,
        assignment: &MassAssignment<String>,
        conflict: Option<f64>,
        cumulative: bool,
    ) -> Self {
        let frame = assignment.frame();
        let subsets = (0..=frame.full_id())
            .map(|subset_id| {
                let events = frame.subset(subset_id);
                SubsetRow {
                    mass: assignment.belief_assignment(&events),
                    belief: assignment.belief(&events),
                    plausibility: assignment.plausibility(&events),
                    events,
                }
            })
            .collect();
        let pignistic = assignment
            .pignistic()
            .into_iter()
            .map(|(event, probability)| EventProbability { event, probability })
            .collect();
        let cumulative = if cumulative {
            Queries::new(frame.len())
                .map(|query| {
                    let excluded = query.free_complement(frame.len()) & !query.intersection();
                    let pattern = (0..frame.len())
                        .map(|id| {
                            if query.free() & (1 << id) != 0 {
                                '*'
                            } else if query.intersection() & (1 << id) != 0 {
                                '1'
                            } else {
                                '0'
                            }
                        })
                        .collect();
                    CumulativeRow {
                        pattern,
                        value: assignment.cumulative_belief_assignment(
                            frame.subset(query.intersection()),
                            frame.subset(excluded),
                        ),
                    }
                })
                .collect()
        } else {
            vec![]
        };
        Self {
            name: name.to_string(),
            events: assignment.event_space(),
            conflict,
            error: None,
            subsets,
            pignistic,
            cumulative,
        }
    }

    /// Records an entry that could not be evaluated.
    pub fn failed(name: &str, events: Vec<String>, error: &dyn std::error::Error) -> Self {
        Self {
            name: name.to_string(),
            events,
            conflict: None,
            error: Some(error.to_string()),
            subsets: vec![],
            pignistic: vec![],
            cumulative: vec![],
        }
    }
}

/// Formats a value with at most `precision` decimal places, dropping trailing zeros.
pub fn format_value(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*}", precision, value);
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes a subset in set notation: `∅` for the empty set, `Ω` for the whole frame, and
/// `{A, B}` otherwise.
pub fn set_notation(events: &[String], frame_size: usize) -> String {
    if events.is_empty() {
        "∅".to_string()
    } else if events.len() == frame_size {
        "Ω".to_string()
    } else {
        format!("{{{}}}", events.join(", "))
    }
}

/// Renders a report as plain text.
///
/// Each kind of table is printed for every entry before moving on to the next kind, so that the same
/// subset can be compared across entries.
pub fn render_text(report: &Report, precision: usize) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let mut sections: Vec<String> = vec![];

    let mut section = String::new();
    for entry in &report.entries {
        if let Some(error) = &entry.error {
            writeln!(section, "m[{}]: failed: {}", entry.name, error)?;
            continue;
        }
        for row in &entry.subsets {
            writeln!(
                section,
                "m[{}]({}) = {}",
                entry.name,
                set_notation(&row.events, entry.events.len()),
                format_value(row.mass, precision)
            )?;
        }
        if let Some(conflict) = entry.conflict {
            writeln!(
                section,
                "K[{}] = {}",
                entry.name,
                format_value(conflict, precision)
            )?;
        }
    }
    sections.push(section);

    type Column = fn(&SubsetRow) -> f64;
    let columns: [(&str, Column); 2] = [("Bel", |row| row.belief), ("Pl", |row| row.plausibility)];
    for (label, column) in columns {
        let mut section = String::new();
        for entry in report.entries.iter().filter(|entry| entry.error.is_none()) {
            for row in &entry.subsets {
                writeln!(
                    section,
                    "{}[{}]({}) = {}",
                    label,
                    entry.name,
                    set_notation(&row.events, entry.events.len()),
                    format_value(column(row), precision)
                )?;
            }
        }
        sections.push(section);
    }

    let mut section = String::new();
    for entry in report.entries.iter().filter(|entry| entry.error.is_none()) {
        for probability in &entry.pignistic {
            writeln!(
                section,
                "BetP[{}]({}) = {}",
                entry.name,
                probability.event,
                format_value(probability.probability, precision)
            )?;
        }
    }
    sections.push(section);

    let mut section = String::new();
    for entry in report.entries.iter().filter(|entry| entry.error.is_none()) {
        for row in &entry.cumulative {
            writeln!(
                section,
                "cbm[{}]({}) = {}",
                entry.name,
                row.pattern,
                format_value(row.value, precision)
            )?;
        }
    }
    sections.push(section);

    for section in sections.iter().filter(|section| !section.is_empty()) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(section);
    }
    Ok(out)
}

/// Renders a report as pretty-printed JSON.
pub fn render_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
