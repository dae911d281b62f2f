//! Shared step flattening.
//!
//! A test case can call a reusable block of steps stored as a separate
//! work item. Such a call shows up as a step whose action carries an
//! `@<id>` marker. Flattening replaces every marker step with the
//! referenced block's own (recursively flattened) steps.
//!
//! Recursion is bounded twice: the chain of ids currently being expanded
//! rejects cycles, and a maximum nesting depth rejects runaway chains.
//! A rejected reference stays in place as the original marker step while
//! its siblings are still expanded.

use crate::api::PlanApi;
use crate::client::RemoteClient;
use crate::steps::parse_test_steps;
use crate::types::{TestStep, WorkItem};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error;

/// Default maximum nesting of shared steps inside shared steps
pub const DEFAULT_MAX_DEPTH: usize = 16;

lazy_static! {
    static ref SHARED_STEP_MARKER: Regex = Regex::new(r"@(\d+)").expect("valid marker pattern");
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SharedStepError {
    #[error("shared step {id} references itself through {}", chain.join(" -> "))]
    CyclicReference { id: String, chain: Vec<String> },

    #[error("shared step {id} nested deeper than {max_depth} levels")]
    DepthExceeded { id: String, max_depth: usize },
}

/// Where shared step work items come from
pub trait SharedStepSource: Sync {
    fn shared_step(&self, id: &str) -> Option<WorkItem>;
}

impl<C: RemoteClient> SharedStepSource for PlanApi<C> {
    fn shared_step(&self, id: &str) -> Option<WorkItem> {
        let item = self.work_item(id);
        if item.is_none() {
            warn!("Failed to retrieve shared steps {}", id);
        }
        item
    }
}

/// Memoizes lookups so a block used by many cases is fetched once per run
pub struct SharedStepCache<'a, S: ?Sized> {
    source: &'a S,
    items: Mutex<HashMap<String, Arc<OnceLock<Option<WorkItem>>>>>,
}

impl<'a, S: SharedStepSource + ?Sized> SharedStepCache<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source, items: Mutex::new(HashMap::new()) }
    }
}

impl<S: SharedStepSource + ?Sized> SharedStepSource for SharedStepCache<'_, S> {
    fn shared_step(&self, id: &str) -> Option<WorkItem> {
        let slot = match self.items.lock() {
            Ok(mut items) => Arc::clone(items.entry(id.to_string()).or_default()),
            Err(_) => return self.source.shared_step(id),
        };

        // Concurrent lookups of one id wait for a single fetch
        if let Some(cached) = slot.get() {
            debug!("Using cached shared steps {}", id);
            return cached.clone();
        }
        slot.get_or_init(|| self.source.shared_step(id)).clone()
    }
}

/// The shared step id referenced by a step's action, if any
pub fn shared_step_reference(step: &TestStep) -> Option<&str> {
    SHARED_STEP_MARKER.captures(&step.action).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Outcome of flattening one step list
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Flattened {
    pub steps: Vec<TestStep>,
    /// References left unexpanded, in the order they were met
    pub errors: Vec<SharedStepError>,
}

/// Inlines shared step references
pub struct SharedStepResolver<'a, S: ?Sized> {
    source: &'a S,
    max_depth: usize,
}

impl<'a, S: SharedStepSource + ?Sized> SharedStepResolver<'a, S> {
    pub fn new(source: &'a S, max_depth: usize) -> Self {
        Self { source, max_depth }
    }

    /// Replace every reference step in `steps` with the referenced steps.
    ///
    /// `origin_id` is the work item the steps belong to; a shared step that
    /// leads back to it is a cycle. Cyclic or too-deep references are kept
    /// verbatim and reported in [`Flattened::errors`].
    pub fn flatten(&self, steps: Vec<TestStep>, origin_id: &str) -> Flattened {
        let mut chain = vec![origin_id.to_string()];
        let mut errors = Vec::new();
        let steps = self.flatten_within(steps, &mut chain, &mut errors);
        Flattened { steps, errors }
    }

    fn flatten_within(
        &self,
        steps: Vec<TestStep>,
        chain: &mut Vec<String>,
        errors: &mut Vec<SharedStepError>,
    ) -> Vec<TestStep> {
        let owner = chain.last().cloned().unwrap_or_default();
        let mut flattened = Vec::with_capacity(steps.len());
        let mut references = 0;

        for step in steps {
            let Some(id) = shared_step_reference(&step).map(str::to_string) else {
                flattened.push(step);
                continue;
            };
            references += 1;

            let rejected = if chain.contains(&id) {
                Some(SharedStepError::CyclicReference { id: id.clone(), chain: chain.clone() })
            } else if chain.len() > self.max_depth {
                // The origin test case is not itself a level of nesting
                Some(SharedStepError::DepthExceeded { id: id.clone(), max_depth: self.max_depth })
            } else {
                None
            };
            if let Some(err) = rejected {
                warn!("Not expanding shared steps in {}: {}", owner, err);
                errors.push(err);
                flattened.push(step);
                continue;
            }

            info!("  Fetching shared steps {} for work item {}", id, owner);
            let Some(item) = self.source.shared_step(&id) else {
                warn!("Could not retrieve shared steps {}, keeping reference step", id);
                flattened.push(step);
                continue;
            };
            let Some(markup) = item.steps_markup() else {
                warn!("No steps XML found in shared steps {}, keeping reference step", id);
                flattened.push(step);
                continue;
            };

            let shared = parse_test_steps(markup);
            debug!("Parsed {} steps from shared steps {}", shared.len(), id);

            chain.push(id);
            let expanded = self.flatten_within(shared, chain, errors);
            chain.pop();
            flattened.extend(expanded);
        }

        if references > 0 {
            info!(
                "Processed {} shared step references for {}, result: {} total steps",
                references,
                owner,
                flattened.len()
            );
        }

        flattened
    }
}

#[cfg(test)]
#[path = "shared_steps_test.rs"]
mod shared_steps_test;
