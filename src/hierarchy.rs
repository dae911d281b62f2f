//! Suite hierarchy resolution.
//!
//! Suites only point at their parent, so each suite's full path is rebuilt
//! by walking parent pointers up to a root. The walk tracks visited suite
//! ids and stops on malformed data instead of looping.

use crate::types::TestSuite;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Separator between segments of a rendered suite path
pub const PATH_SEPARATOR: &str = " > ";

/// Why the parent walk stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTermination {
    /// Reached a suite without a parent
    Root,
    /// The parent id is not part of the plan's suite list
    MissingParent(String),
    /// The parent was already visited on this walk
    Cycle(String),
}

/// Names from the root down to a suite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitePath {
    pub segments: Vec<String>,
    pub termination: PathTermination,
}

impl SuitePath {
    pub fn full_path(&self) -> String {
        self.segments.join(PATH_SEPARATOR)
    }
}

/// Id lookup over one plan's suites
pub struct SuiteIndex<'a> {
    by_id: HashMap<&'a str, &'a TestSuite>,
}

impl<'a> SuiteIndex<'a> {
    pub fn new(suites: &'a [TestSuite]) -> Self {
        let mut by_id = HashMap::with_capacity(suites.len());
        for suite in suites {
            if let Some(id) = suite.id.as_deref() {
                // First occurrence wins for duplicated ids
                by_id.entry(id).or_insert(suite);
            }
        }
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a TestSuite> {
        self.by_id.get(id).copied()
    }

    /// Build the root-to-suite path for `suite`
    pub fn resolve(&self, suite: &TestSuite) -> SuitePath {
        let mut segments = vec![suite.name.clone()];
        let mut visited: HashSet<&str> = HashSet::new();
        if let Some(id) = suite.id.as_deref() {
            visited.insert(id);
        }

        let mut current = suite;
        let termination = loop {
            let Some(parent_id) = current.parent_id() else {
                break PathTermination::Root;
            };
            if visited.contains(parent_id) {
                warn!("Cycle in suite hierarchy: suite {} is its own ancestor via {}", suite.id(), parent_id);
                break PathTermination::Cycle(parent_id.to_string());
            }
            let Some(parent) = self.get(parent_id) else {
                warn!("Parent suite {} of suite {} not found in suite list", parent_id, current.id());
                break PathTermination::MissingParent(parent_id.to_string());
            };

            debug!("  Added to path: {}", parent.name);
            visited.insert(parent_id);
            segments.insert(0, parent.name.clone());
            current = parent;
        };

        SuitePath { segments, termination }
    }
}
