use std::collections::HashSet;
use std::sync::Arc;

use crate::dataset::Dataset;
use crate::errors::Result;
use crate::models::{Column, RegressionResult};
use crate::stats::{self, CorrelationMatrix};

// The engine the UI layer talks to: it supplies countries/axes/categories,
// we hand back tables and statistics. The snapshot behind the Arc is never
// mutated, so any number of concurrent sessions can share one engine.
#[derive(Debug, Clone)]
pub(crate) struct MetricsEngine {
    dataset: Arc<Dataset>,
}

impl MetricsEngine {
    pub(crate) fn new(dataset: Arc<Dataset>) -> MetricsEngine {
        MetricsEngine { dataset }
    }

    pub(crate) fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub(crate) fn filtered(&self, countries: &HashSet<String>) -> Dataset {
        self.dataset.filter_by_countries(countries)
    }

    pub(crate) fn statistics(
        &self,
        dataset: &Dataset,
        x_col: Column,
        y_col: Column,
    ) -> Result<RegressionResult> {
        stats::linear_regression(dataset, x_col, y_col)
    }

    pub(crate) fn correlation_matrix(
        &self,
        dataset: &Dataset,
        columns: &[Column],
    ) -> Result<CorrelationMatrix> {
        stats::correlation_matrix(dataset, columns)
    }
}
