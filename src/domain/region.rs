//! Marker-delimited band extraction.
//!
//! The preload list keeps its bulk entries between pairs of sentinel comments,
//! one pair per historical bulk policy ("band"). The bands must appear once
//! each, in the configured order. The scan is an explicit state machine with a
//! pure transition function; adding a band means adding a [`Band`] to the list.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::entry::Entry;
use crate::domain::error::StructureError;
use crate::domain::line::{Document, Line, LineKind};

/// Substring shared by every band marker.
pub const DEFAULT_MARKER_FAMILY: &str = "BULK";

/// One START/END marker pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    pub start: String,
    pub end: String,
}

impl Band {
    pub fn new(name: &str, start: &str, end: &str) -> Self {
        Self {
            name: name.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// The bands of the current Chromium list, in document order.
pub fn default_bands() -> Vec<Band> {
    vec![
        Band::new(
            "legacy-18-week",
            "START OF LEGACY 18-WEEK BULK HSTS ENTRIES",
            "END OF LEGACY 18-WEEK BULK HSTS ENTRIES",
        ),
        Band::new(
            "18-week",
            "START OF 18-WEEK BULK HSTS ENTRIES",
            "END OF 18-WEEK BULK HSTS ENTRIES",
        ),
        Band::new(
            "1-year",
            "START OF 1-YEAR BULK HSTS ENTRIES",
            "END OF 1-YEAR BULK HSTS ENTRIES",
        ),
        Band::new(
            "1-year-subdomain",
            "START OF 1-YEAR BULK SUBDOMAIN HSTS ENTRIES",
            "END OF 1-YEAR BULK SUBDOMAIN HSTS ENTRIES",
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    /// Waiting for the START marker of band `i`.
    Before(usize),
    /// Inside band `i`, waiting for its END marker.
    During(usize),
    /// Past the END marker of the last band.
    Done,
}

/// Line count found inside one band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSummary {
    pub name: String,
    pub lines: usize,
}

/// Result of a successful scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Entries of all bands, in document order
    pub entries: Vec<Entry>,
    pub bands: Vec<BandSummary>,
}

impl Extraction {
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RegionExtractor {
    bands: Vec<Band>,
    family: String,
}

impl RegionExtractor {
    pub fn new(bands: Vec<Band>, family: impl Into<String>) -> Result<Self, StructureError> {
        if bands.is_empty() {
            return Err(StructureError::NoBands);
        }
        Ok(Self {
            bands,
            family: family.into(),
        })
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn initial(&self) -> RegionState {
        RegionState::Before(0)
    }

    /// Advance the scan by one line.
    ///
    /// Returns the next state and, when inside a band, the line content to
    /// accumulate. Comment and blank lines inside a band are not emitted.
    pub fn step<'l>(
        &self,
        state: RegionState,
        line: &Line<'l>,
    ) -> Result<(RegionState, Option<&'l str>), StructureError> {
        let content = line.content;
        match state {
            RegionState::Before(i) => {
                if content.contains(self.bands[i].start.as_str()) {
                    Ok((RegionState::During(i), None))
                } else {
                    self.reject_marker(state, line)?;
                    Ok((state, None))
                }
            }
            RegionState::During(i) => {
                if content.contains(self.bands[i].end.as_str()) {
                    let next = self.after(i);
                    // the next band may open on the same line
                    if let RegionState::Before(j) = next {
                        if content.contains(self.bands[j].start.as_str()) {
                            return Ok((RegionState::During(j), None));
                        }
                    }
                    Ok((next, None))
                } else {
                    self.reject_marker(state, line)?;
                    let emit = match line.kind {
                        LineKind::Comment | LineKind::Blank => None,
                        LineKind::Entry | LineKind::Unknown => Some(content),
                    };
                    Ok((state, emit))
                }
            }
            RegionState::Done => {
                if content.contains(self.family.as_str()) {
                    Err(StructureError::MarkerAfterLastBand {
                        line: line.number,
                        family: self.family.clone(),
                        content: content.trim().to_string(),
                    })
                } else {
                    Ok((state, None))
                }
            }
        }
    }

    fn after(&self, i: usize) -> RegionState {
        if i + 1 < self.bands.len() {
            RegionState::Before(i + 1)
        } else {
            RegionState::Done
        }
    }

    /// Any configured marker other than the one `state` expects is an error.
    fn reject_marker(&self, state: RegionState, line: &Line<'_>) -> Result<(), StructureError> {
        let found = self
            .bands
            .iter()
            .flat_map(|b| [b.start.as_str(), b.end.as_str()])
            .find(|m| line.content.contains(m));
        match found {
            Some(marker) => Err(StructureError::UnexpectedMarker {
                line: line.number,
                found: marker.to_string(),
                state: self.describe(state),
            }),
            None => Ok(()),
        }
    }

    pub fn describe(&self, state: RegionState) -> String {
        match state {
            RegionState::Before(i) => format!(
                "waiting for {:?} (band {})",
                self.bands[i].start, self.bands[i].name
            ),
            RegionState::During(i) => format!(
                "inside band {}, waiting for {:?}",
                self.bands[i].name, self.bands[i].end
            ),
            RegionState::Done => "after the last band".to_string(),
        }
    }

    /// Scan the whole document and decode the entries of every band.
    pub fn extract(&self, doc: &Document<'_>) -> Result<Extraction, StructureError> {
        let mut state = self.initial();
        let mut buffer = String::from("[\n");
        let mut summaries: Vec<BandSummary> = self
            .bands
            .iter()
            .map(|b| BandSummary {
                name: b.name.clone(),
                lines: 0,
            })
            .collect();

        for line in doc.lines() {
            let (next, emit) = self.step(state, line)?;
            if let (RegionState::During(i), Some(content)) = (state, emit) {
                buffer.push_str(content);
                buffer.push('\n');
                summaries[i].lines += 1;
            }
            state = next;
        }

        if state != RegionState::Done {
            return Err(StructureError::UnexpectedEnd {
                state: self.describe(state),
            });
        }

        // placeholder element absorbs the last trailing comma
        buffer.push_str("{}]");
        let mut values: Vec<Value> = serde_json::from_str(&buffer)
            .map_err(|e| StructureError::InvalidBandJson(e.to_string()))?;
        values.pop();

        let entries = values
            .into_iter()
            .map(serde_json::from_value::<Entry>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StructureError::InvalidBandJson(e.to_string()))?;

        for summary in &summaries {
            debug!("band {}: {} lines", summary.name, summary.lines);
        }
        info!("Found {} bulk entries", entries.len());

        Ok(Extraction {
            entries,
            bands: summaries,
        })
    }
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            family: DEFAULT_MARKER_FAMILY.to_string(),
        }
    }
}
