//! Update action - checks every configured package concurrently.
//!
//! One task per package. A failing package is logged and recorded in the
//! report; it never stops the others and never fails the run.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use log::{error, warn};

use crate::package::PackageSpec;
use crate::runtime::Runtime;

use super::check::{CheckOutcome, PackageChecker};

/// What happened to each candidate of a run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateReport {
    pub updated: Vec<String>,
    pub up_to_date: Vec<String>,
    /// Not installed on this host
    pub skipped: Vec<String>,
    /// Package name and the full cause chain
    pub failed: Vec<(String, String)>,
}

impl UpdateReport {
    fn record(&mut self, name: String, outcome: CheckOutcome) {
        match outcome {
            CheckOutcome::NotInstalled => self.skipped.push(name),
            CheckOutcome::UpToDate { .. } | CheckOutcome::NothingPublished => {
                self.up_to_date.push(name)
            }
            CheckOutcome::Updated { .. } => self.updated.push(name),
        }
    }

    fn fail(&mut self, name: String, cause: String) {
        error!("{}: {}", name, cause);
        self.failed.push((name, cause));
    }
}

pub struct UpdateUseCase<R: Runtime + ?Sized> {
    checker: Arc<PackageChecker<R>>,
    packages: BTreeMap<String, PackageSpec>,
}

impl<R: Runtime + ?Sized + 'static> UpdateUseCase<R> {
    pub fn new(checker: Arc<PackageChecker<R>>, packages: BTreeMap<String, PackageSpec>) -> Self {
        Self { checker, packages }
    }

    /// Packages to check: all of them, or only those named in `filter`.
    fn candidates(&self, filter: &[String]) -> Vec<PackageSpec> {
        if filter.is_empty() {
            return self.packages.values().cloned().collect();
        }

        for name in filter {
            if !self.packages.contains_key(name) {
                warn!("No package named '{}' is configured", name);
            }
        }

        self.packages
            .values()
            .filter(|spec| filter.contains(&spec.name))
            .cloned()
            .collect()
    }

    /// Check and update the candidates, waiting for all of them.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, filter: &[String]) -> UpdateReport {
        let candidates = self.candidates(filter);

        let names: Vec<String> = candidates.iter().map(|s| s.name.clone()).collect();
        let handles = candidates.into_iter().map(|spec| {
            let checker = Arc::clone(&self.checker);
            tokio::spawn(async move { checker.check_and_update(&spec).await })
        });
        let results = join_all(handles).await;

        let mut report = UpdateReport::default();
        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(Ok(outcome)) => report.record(name, outcome),
                Ok(Err(e)) => report.fail(name, format!("{:#}", e)),
                Err(e) => report.fail(name, format!("task failed: {}", e)),
            }
        }

        report
    }
}
