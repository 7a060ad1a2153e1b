// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! The charts offered to the presentation layer.

use std::fmt;

use prettytable::{format, Table};

use crate::catalog::{AUTHORS, SOURCE_TITLE, YEAR};
use crate::executor::{
    DistributionOrder, FrequencyDistribution, FrequencyExecutor, QueryError, WorkingSet,
};

/// Number of entries kept by the top-N charts.
pub const TOP_N: usize = 10;

/// Separator between the names of an author list.
pub const AUTHOR_SEPARATOR: &str = ", ";

/// A chart that can be drawn from a working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// Publications per year, ascending by year.
    PublicationsByYear,
    /// The most frequent authors.
    TopAuthors,
    /// The most frequent sources.
    TopVenues,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [Self::PublicationsByYear, Self::TopAuthors, Self::TopVenues];

    pub fn title(self) -> &'static str {
        match self {
            Self::PublicationsByYear => "Publications per Year",
            Self::TopAuthors => "Top 10 Authors",
            Self::TopVenues => "Top 10 Venues",
        }
    }

    pub fn x_label(self) -> &'static str {
        match self {
            Self::PublicationsByYear => "Year",
            Self::TopAuthors => "Author",
            Self::TopVenues => "Venue",
        }
    }

    pub fn y_label(self) -> &'static str {
        "Number of Publications"
    }

    /// The field the chart counts.
    pub fn column(self) -> &'static str {
        match self {
            Self::PublicationsByYear => YEAR,
            Self::TopAuthors => AUTHORS,
            Self::TopVenues => SOURCE_TITLE,
        }
    }

    pub fn executor(self) -> FrequencyExecutor<'static> {
        let (separator, order) = match self {
            Self::PublicationsByYear => (None, DistributionOrder::ByKey),
            Self::TopAuthors => (
                Some(AUTHOR_SEPARATOR),
                DistributionOrder::ByCountDesc { limit: TOP_N },
            ),
            Self::TopVenues => (None, DistributionOrder::ByCountDesc { limit: TOP_N }),
        };
        FrequencyExecutor {
            column: self.column(),
            separator,
            order,
        }
    }

    /// Draw the chart from a working set holding [`ChartKind::column`].
    pub fn draw(self, set: &WorkingSet) -> Result<Chart, QueryError> {
        Ok(Chart {
            kind: self,
            distribution: self.executor().execute(set)?,
        })
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A distribution labelled for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    kind: ChartKind,
    distribution: FrequencyDistribution,
}

impl Chart {
    /// A chart with no data.
    pub fn empty(kind: ChartKind) -> Self {
        Chart {
            kind,
            distribution: FrequencyDistribution::default(),
        }
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn distribution(&self) -> &FrequencyDistribution {
        &self.distribution
    }

    /// Labels of the x axis.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.distribution.categories()
    }

    /// Heights of the bars.
    pub fn counts(&self) -> impl Iterator<Item = u64> + '_ {
        self.distribution.counts()
    }

    /// Whether the chart should be rendered as "no data".
    pub fn is_empty(&self) -> bool {
        self.distribution.is_empty()
    }
}

impl fmt::Display for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind.title())?;
        if self.is_empty() {
            return writeln!(f, "(no data)");
        }
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        let titles = [self.kind.x_label(), self.kind.y_label()];
        table.set_titles(titles.into_iter().collect());
        for (k, v) in self.distribution.entries() {
            table.add_row([k.clone(), v.to_string()].into_iter().collect());
        }
        write!(f, "{}", table)
    }
}
