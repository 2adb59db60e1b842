//! Exclusion set and visualization state.
//!
//! Both live for the whole process. Only the lock rules in
//! [`VisualizationState::adopt_columns`] touch them implicitly; every other
//! change goes through an explicit user command.

use std::collections::{BTreeSet, HashMap, HashSet};

/// Lower-cased column names that never get a bar or statistics.
///
/// Seeded from configuration (primary-key-like columns) and grown whenever a
/// non-numeric column is seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_lowercase())
    }
}

/// Which piece of state a `lock`/`unlock` command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTarget {
    Scale,
    Hidden,
}

impl std::str::FromStr for LockTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scale" => Ok(Self::Scale),
            "hidden" => Ok(Self::Hidden),
            _ => Err(format!("Unknown lock target: {s}")),
        }
    }
}

/// Scale factors, hidden columns and their locks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualizationState {
    scale: HashMap<String, f64>,
    hidden: BTreeSet<String>,
    scale_locked: bool,
    hidden_locked: bool,
    stats_on: bool,
}

impl VisualizationState {
    pub fn new(stats_on: bool) -> Self {
        Self {
            stats_on,
            ..Default::default()
        }
    }

    /// Scale factor for a column; untracked columns draw at 1.0.
    pub fn scale_of(&self, column: &str) -> f64 {
        self.scale.get(column).copied().unwrap_or(1.0)
    }

    pub fn is_scale_tracked(&self, column: &str) -> bool {
        self.scale.contains_key(column)
    }

    pub fn is_hidden(&self, column: &str) -> bool {
        self.hidden.contains(column)
    }

    /// Hidden columns in set order.
    pub fn hidden(&self) -> impl Iterator<Item = &str> {
        self.hidden.iter().map(String::as_str)
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    pub fn scale_locked(&self) -> bool {
        self.scale_locked
    }

    pub fn hidden_locked(&self) -> bool {
        self.hidden_locked
    }

    pub fn stats_on(&self) -> bool {
        self.stats_on
    }

    pub fn set_stats_on(&mut self, on: bool) {
        self.stats_on = on;
    }

    /// Apply the lock rules for a freshly materialized result.
    ///
    /// `columns` yields `(name, excluded)` in result order.
    pub fn adopt_columns<'a, I>(&mut self, columns: I)
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        if !self.scale_locked {
            self.scale.clear();
        }
        if !self.hidden_locked {
            self.hidden.clear();
        }

        let mut present = HashSet::new();
        for (name, excluded) in columns {
            if !excluded {
                self.scale.entry(name.to_string()).or_insert(1.0);
            }
            present.insert(name);
        }

        self.scale.retain(|name, _| present.contains(name.as_str()));
        if self.scale.is_empty() {
            self.scale_locked = false;
        }
        self.hidden.retain(|name| present.contains(name.as_str()));
        if self.hidden.is_empty() {
            self.hidden_locked = false;
        }
    }

    /// Set every tracked column to `factor`.
    pub fn set_scale_all(&mut self, factor: f64) {
        for value in self.scale.values_mut() {
            *value = factor;
        }
    }

    /// Set one tracked column; returns false when the column is not tracked.
    pub fn set_scale(&mut self, column: &str, factor: f64) -> bool {
        match self.scale.get_mut(&column.to_lowercase()) {
            Some(value) => {
                *value = factor;
                true
            }
            None => false,
        }
    }

    pub fn hide(&mut self, column: &str) -> bool {
        self.hidden.insert(column.to_lowercase())
    }

    /// Remove one column from the hidden set; an emptied set drops its lock.
    pub fn unhide(&mut self, column: &str) -> bool {
        let removed = self.hidden.remove(&column.to_lowercase());
        if self.hidden.is_empty() {
            self.hidden_locked = false;
        }
        removed
    }

    pub fn unhide_all(&mut self) {
        self.hidden.clear();
        self.hidden_locked = false;
    }

    pub fn lock(&mut self, target: LockTarget) {
        match target {
            LockTarget::Scale => self.scale_locked = true,
            LockTarget::Hidden => self.hidden_locked = true,
        }
    }

    pub fn unlock(&mut self, target: LockTarget) {
        match target {
            LockTarget::Scale => self.scale_locked = false,
            LockTarget::Hidden => self.hidden_locked = false,
        }
    }
}
