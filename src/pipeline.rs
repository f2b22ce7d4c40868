use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::changes::{diff_snapshots, Changeset};
use crate::config::{Config, ReportConfig};
use crate::mapping::{api_codes, load_mapping, ProductMapping};
use crate::notify::{Notifier, SmtpNotifier, StdoutNotifier};
use crate::pricing::{HttpPricingSource, PricingSource, SpreadQuotes};
use crate::report::{price_rows, render_report};
use crate::snapshot::builder::build_snapshots;
use crate::snapshot::store::SnapshotStore;
use crate::snapshot::{Snapshot, TroubleReason};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroubledProduct {
    pub product: String,
    pub api_code: String,
    pub reasons: Vec<TroubleReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: NaiveDateTime,
    pub products: usize,
    pub troublesome: Vec<TroubledProduct>,
    pub changes: usize,
    pub delivered: bool,
}

#[derive(Debug, Clone)]
pub struct Preview {
    pub snapshots: Vec<Snapshot>,
    pub changeset: Changeset,
}

/// Runs one job with collaborators built from `config`.
///
/// With `dry_run` (or email disabled) the report is printed instead of mailed.
pub async fn run_job(config: &Config, dry_run: bool) -> Result<RunSummary> {
    let mappings = load_mapping(&config.resolved_mapping_path())?;
    let source = HttpPricingSource::new(&config.pricing)?;
    let store = SnapshotStore::open(&config.resolved_db_path())?;
    let notifier: Box<dyn Notifier> = if dry_run || !config.email.enabled {
        Box::new(StdoutNotifier)
    } else {
        Box::new(SmtpNotifier::new(&config.email)?)
    };
    execute(
        &mappings,
        &source,
        &store,
        notifier.as_ref(),
        &config.report,
        Local::now().naive_local(),
    )
    .await
}

/// fetch → build → persist → diff → render → send, strictly in order.
pub async fn execute(
    mappings: &[ProductMapping],
    source: &dyn PricingSource,
    store: &SnapshotStore,
    notifier: &dyn Notifier,
    options: &ReportConfig,
    now: NaiveDateTime,
) -> Result<RunSummary> {
    let previous = store.load_all().context("failed reading previous snapshots")?;
    if previous.is_empty() {
        info!("no previous snapshots; this run establishes the baseline");
    }

    let (snapshots, spreads) = fetch_and_build(mappings, source).await?;
    let troublesome = collect_troubled(&snapshots);

    store
        .upsert_all(&snapshots)
        .context("failed persisting snapshots")?;
    let current = store.load_all().context("failed reading current snapshots")?;

    let changeset = diff_snapshots(&previous, &current);
    info!(
        "diffed {} previous against {} current rows: {} changes",
        previous.len(),
        current.len(),
        changeset.total_changes()
    );

    let report = render_report(&changeset, &price_rows(mappings, &spreads), now);
    let delivered = if changeset.is_empty() && !options.send_when_unchanged {
        info!("no changes and send_when_unchanged is off; skipping delivery");
        false
    } else {
        match notifier.send(&report).await {
            Ok(()) => true,
            Err(err) => {
                error!("failed sending report, it will not be retried: {err:#}");
                false
            }
        }
    };

    Ok(RunSummary {
        generated_at: now,
        products: snapshots.len(),
        troublesome,
        changes: changeset.total_changes(),
        delivered,
    })
}

/// Fetches and builds without touching the store, then diffs against it.
pub async fn preview(
    mappings: &[ProductMapping],
    source: &dyn PricingSource,
    store: &SnapshotStore,
) -> Result<Preview> {
    let previous = store.load_all()?;
    let (snapshots, _) = fetch_and_build(mappings, source).await?;
    let changeset = diff_snapshots(&previous, &snapshots);
    Ok(Preview {
        snapshots,
        changeset,
    })
}

async fn fetch_and_build(
    mappings: &[ProductMapping],
    source: &dyn PricingSource,
) -> Result<(Vec<Snapshot>, SpreadQuotes)> {
    let codes = api_codes(mappings);
    info!("fetching pricing for {} products", codes.len());
    let spreads = source
        .fetch_spreads(&codes)
        .await
        .context("spread lookup failed")?;
    let premiums = source
        .fetch_premiums(&codes)
        .await
        .context("premium lookup failed")?;
    let snapshots = build_snapshots(mappings, &spreads, &premiums);
    Ok((snapshots, spreads))
}

fn collect_troubled(snapshots: &[Snapshot]) -> Vec<TroubledProduct> {
    snapshots
        .iter()
        .filter(|s| s.is_troublesome())
        .map(|s| {
            warn!(
                "{} ({}) is troublesome: {}",
                s.label(),
                s.api_code,
                s.provenance.reasons_label()
            );
            TroubledProduct {
                product: s.label().to_string(),
                api_code: s.api_code.clone(),
                reasons: s.provenance.reasons.clone(),
            }
        })
        .collect()
}
