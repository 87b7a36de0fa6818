//! Configuration gateway.
//!
//! # Responsibilities
//! - Load and persist the candidate list under `optionList`
//! - Resolve the browser default Accept-Language
//! - Drive the menu rebuild
//!
//! # Design Decisions
//! - Persist before probing, so a failing probe never loses the user's input
//! - `configure` never fails: problems are logged and reported
//! - Each call takes a generation number; a call overtaken by a newer one
//!   discards its rebuild instead of racing it

use std::sync::atomic::Ordering;

use serde::Serialize;

use super::probe::sniff_accept_language;
use super::store::{OptionList, OPT_STORAGE_OPTION_LIST};
use super::{AltTong, MenuShape};
use crate::error::{ProbeError, StorageError};
use crate::host::MenuSurface;
use crate::observability::metrics;

/// What one `configure` call did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigureReport {
    pub generation: u64,
    pub persisted: bool,
    pub browser_default: Option<String>,
    pub shape: Option<MenuShape>,
    pub superseded: bool,
    pub errors: Vec<String>,
}

impl AltTong {
    /// Persisted candidate list; empty when nothing was saved yet.
    pub async fn get_options(&self) -> Result<OptionList, StorageError> {
        let stored = self.storage.get(OPT_STORAGE_OPTION_LIST).await?;
        let option_list = match stored {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        Ok(OptionList { option_list })
    }

    async fn save_options(&self, options: &OptionList) -> Result<(), StorageError> {
        let value = serde_json::to_value(&options.option_list)?;
        self.storage.set(OPT_STORAGE_OPTION_LIST, value).await
    }

    /// Accept-Language the host attaches to ordinary requests.
    pub async fn get_accept_languages(&self) -> Result<Option<String>, ProbeError> {
        sniff_accept_language(&self.hub, &self.probe).await
    }

    /// Apply `options`, or the persisted list when `None`.
    pub async fn configure(&self, options: Option<OptionList>) -> ConfigureReport {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut report = ConfigureReport {
            generation,
            ..Default::default()
        };

        // A call overtaken by a newer generation skips every write.
        let _gate = self.rebuild_gate.lock().await;
        if self.is_superseded(generation, &mut report) {
            return report;
        }

        let options = match options {
            Some(options) => options,
            None => match self.get_options().await {
                Ok(options) => options,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load options, using an empty list");
                    report.errors.push(e.to_string());
                    OptionList::default()
                }
            },
        };

        match self.save_options(&options).await {
            Ok(()) => report.persisted = true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist options");
                report.errors.push(e.to_string());
            }
        }

        report.browser_default = match self.get_accept_languages().await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Default Accept-Language unavailable");
                None
            }
        };

        if self.is_superseded(generation, &mut report) {
            return report;
        }
        self.surface.remove_all().await;

        let shape = {
            let mut menu = self.menu.lock().expect("menu mutex poisoned");
            let ctx = self.menu_context();
            menu.rebuild(&ctx, &options.option_list, report.browser_default.as_deref())
        };
        report.shape = Some(shape);

        metrics::record_reconfigure(if report.errors.is_empty() { "ok" } else { "degraded" });
        tracing::info!(
            generation,
            candidates = options.option_list.len(),
            shape = ?shape,
            "Reconfigured"
        );
        report
    }

    fn is_superseded(&self, generation: u64, report: &mut ConfigureReport) -> bool {
        if self.generation.load(Ordering::SeqCst) == generation {
            return false;
        }
        tracing::info!(generation, "Reconfiguration superseded, menu left to newer call");
        report.superseded = true;
        metrics::record_reconfigure("superseded");
        true
    }
}
