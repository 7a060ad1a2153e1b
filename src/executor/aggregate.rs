// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

use prettytable::{format, Table as PrettyTable};

use super::*;

/// How a [`FrequencyDistribution`] is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionOrder {
    /// Ascending by category, compared as strings.
    ByKey,
    /// Descending by count, keeping at most `limit` entries.
    ///
    /// Categories with equal counts keep the order in which they were first seen.
    ByCountDesc { limit: usize },
}

/// The executor of counting the occurrences of each value of a text column.
///
/// With a `separator`, every cell is split into tokens which are counted on their
/// own. NULL cells count as the empty category, or contribute no token when split.
pub struct FrequencyExecutor<'a> {
    pub column: &'a str,
    pub separator: Option<&'a str>,
    pub order: DistributionOrder,
}

impl FrequencyExecutor<'_> {
    pub fn execute(&self, set: &WorkingSet) -> Result<FrequencyDistribution, QueryError> {
        let values = set
            .column(self.column)
            .ok_or_else(|| QueryError::NotText(self.column.into()))?;

        let mut counter = Counter::default();
        for value in values {
            match (self.separator, value) {
                (Some(sep), Some(v)) => v.split(sep).for_each(|token| counter.add(token)),
                (Some(_), None) => {}
                (None, v) => counter.add(v.unwrap_or("")),
            }
        }
        let mut entries = counter.entries;

        match self.order {
            DistributionOrder::ByKey => entries.sort_by(|a, b| a.0.cmp(b.0)),
            DistributionOrder::ByCountDesc { limit } => {
                // stable, so ties stay in first-seen order
                entries.sort_by_key(|&(_, count)| Reverse(count));
                entries.truncate(limit);
            }
        }
        Ok(FrequencyDistribution {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }
}

/// Counts keys, remembering the order in which they were first seen.
#[derive(Default)]
struct Counter<'a> {
    index: HashMap<&'a str, usize>,
    entries: Vec<(&'a str, u64)>,
}

impl<'a> Counter<'a> {
    fn add(&mut self, key: &'a str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }
}

/// Ordered pairs of category and count.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrequencyDistribution {
    entries: Vec<(String, u64)>,
}

impl FrequencyDistribution {
    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of a category, if present.
    pub fn get(&self, category: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(k, _)| k == category)
            .map(|(_, v)| *v)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn counts(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts().sum()
    }
}

impl fmt::Display for FrequencyDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = PrettyTable::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP);
        for (k, v) in &self.entries {
            table.add_row([k.clone(), v.to_string()].into_iter().collect());
        }
        write!(f, "{}", table)
    }
}
