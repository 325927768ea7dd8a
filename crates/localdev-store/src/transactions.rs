use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

use crate::fs_utils::{remove_file_if_exists, write_atomic};
use crate::{SiteLayout, TransactionJournalEntry, TransactionMetadata, TransactionStatus};

const TRANSACTION_METADATA_VERSION: u32 = 1;

pub(crate) static TRANSACTION_SEQUENCE: AtomicU64 = AtomicU64::new(0);

pub fn set_active_transaction(layout: &SiteLayout, txid: &str) -> Result<PathBuf> {
    let path = layout.transaction_active_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            let existing = read_active_transaction(layout).ok().flatten();
            let detail = existing
                .map(|existing_txid| format!(" (txid={existing_txid})"))
                .unwrap_or_default();
            return Err(anyhow!("active transaction marker already exists{detail}"));
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!(
                    "failed to claim active transaction file: {}",
                    path.display()
                )
            });
        }
    };

    file.write_all(format!("{txid}\n").as_bytes())
        .with_context(|| {
            format!(
                "failed to write active transaction file: {}",
                path.display()
            )
        })?;
    file.flush().with_context(|| {
        format!(
            "failed to flush active transaction file: {}",
            path.display()
        )
    })?;

    Ok(path)
}

pub fn read_active_transaction(layout: &SiteLayout) -> Result<Option<String>> {
    let path = layout.transaction_active_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| {
                format!("failed to read active transaction file: {}", path.display())
            });
        }
    };

    let txid = raw.trim();
    if txid.is_empty() {
        return Ok(None);
    }

    Ok(Some(txid.to_string()))
}

pub fn clear_active_transaction(layout: &SiteLayout) -> Result<()> {
    let path = layout.transaction_active_path();
    remove_file_if_exists(&path).with_context(|| {
        format!(
            "failed to clear active transaction file: {}",
            path.display()
        )
    })
}

pub fn write_transaction_metadata(
    layout: &SiteLayout,
    metadata: &TransactionMetadata,
) -> Result<PathBuf> {
    let path = layout.transaction_metadata_path(&metadata.txid);
    let mut payload =
        serde_json::to_string_pretty(metadata).context("failed to serialize transaction metadata")?;
    payload.push('\n');
    write_atomic(&path, payload.as_bytes()).with_context(|| {
        format!(
            "failed to write transaction metadata file: {}",
            path.display()
        )
    })?;
    Ok(path)
}

pub fn read_transaction_metadata(
    layout: &SiteLayout,
    txid: &str,
) -> Result<Option<TransactionMetadata>> {
    let path = layout.transaction_metadata_path(txid);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| {
                format!(
                    "failed to read transaction metadata file: {}",
                    path.display()
                )
            });
        }
    };

    let metadata = serde_json::from_str(&raw).with_context(|| {
        format!(
            "failed parsing transaction metadata file: {}",
            path.display()
        )
    })?;
    Ok(Some(metadata))
}

pub fn update_transaction_status(
    layout: &SiteLayout,
    txid: &str,
    status: TransactionStatus,
) -> Result<()> {
    let mut metadata = read_transaction_metadata(layout, txid)?
        .ok_or_else(|| anyhow!("transaction metadata not found for '{txid}'"))?;
    metadata.status = status;
    write_transaction_metadata(layout, &metadata)?;
    Ok(())
}

pub fn append_transaction_journal_entry(
    layout: &SiteLayout,
    txid: &str,
    entry: &TransactionJournalEntry,
) -> Result<PathBuf> {
    let path = layout.transaction_journal_path(txid);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let line = serde_json::to_string(entry).context("failed to serialize journal entry")?;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open transaction journal: {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("failed to append transaction journal: {}", path.display()))?;
    file.write_all(b"\n").with_context(|| {
        format!(
            "failed to append transaction journal newline: {}",
            path.display()
        )
    })?;
    file.flush()
        .with_context(|| format!("failed to flush transaction journal: {}", path.display()))?;
    Ok(path)
}

pub fn read_transaction_journal(
    layout: &SiteLayout,
    txid: &str,
) -> Result<Vec<TransactionJournalEntry>> {
    let path = layout.transaction_journal_path(txid);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| {
                format!("failed to read transaction journal: {}", path.display())
            });
        }
    };

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str(line).with_context(|| {
                format!("invalid transaction journal line in {}", path.display())
            })
        })
        .collect()
}

pub fn current_unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_secs())
}

/// Removes an active marker left behind by a transaction that already
/// finished. Markers of unfinished or unknown transactions stay in place.
pub fn clear_stale_active_transaction(layout: &SiteLayout) -> Result<bool> {
    let Some(txid) = read_active_transaction(layout)? else {
        return Ok(false);
    };
    let metadata = read_transaction_metadata(layout, &txid).with_context(|| {
        format!(
            "transaction {txid} requires repair (reason=metadata_unreadable path={})",
            layout.transaction_metadata_path(&txid).display()
        )
    })?;

    match metadata {
        Some(metadata) if metadata.status.allows_stale_marker_cleanup() => {
            clear_active_transaction(layout)?;
            debug!(
                txid = txid.as_str(),
                status = metadata.status.as_str(),
                "cleared stale transaction marker"
            );
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Records planning metadata and claims the active marker. A marker left by
/// a finished transaction is cleared first; the metadata file is removed
/// again when another transaction still holds the marker.
pub fn begin_transaction(
    layout: &SiteLayout,
    operation: &str,
    started_at_unix: u64,
) -> Result<TransactionMetadata> {
    clear_stale_active_transaction(layout)?;

    let sequence = TRANSACTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let metadata = TransactionMetadata {
        version: TRANSACTION_METADATA_VERSION,
        txid: transaction_id(started_at_unix, sequence),
        operation: operation.to_string(),
        status: TransactionStatus::Planning,
        started_at_unix,
    };

    write_transaction_metadata(layout, &metadata)?;
    if let Err(err) = set_active_transaction(layout, &metadata.txid) {
        let _ = remove_file_if_exists(&layout.transaction_metadata_path(&metadata.txid));
        return Err(err);
    }
    debug!(txid = metadata.txid.as_str(), operation, "transaction started");
    Ok(metadata)
}

pub(crate) fn transaction_id(started_at_unix: u64, sequence: u64) -> String {
    format!("tx-{started_at_unix}-{}-{sequence}", std::process::id())
}

/// Runs `run` while holding the site's active transaction marker. The
/// transaction ends `committed` on success and `failed` otherwise. Once `run`
/// has succeeded its writes stand: status and marker bookkeeping failures
/// after that point are logged, not returned.
pub fn execute_with_transaction<T, F>(layout: &SiteLayout, operation: &str, run: F) -> Result<T>
where
    F: FnOnce(&TransactionMetadata) -> Result<T>,
{
    let started_at_unix = current_unix_timestamp()?;
    let tx = begin_transaction(layout, operation, started_at_unix).map_err(|err| {
        anyhow!("cannot {operation} (reason=active_transaction): {err:#}")
    })?;

    let run_result = update_transaction_status(layout, &tx.txid, TransactionStatus::Applying)
        .and_then(|()| run(&tx));

    match run_result {
        Ok(value) => {
            if let Err(err) = update_transaction_status(layout, &tx.txid, TransactionStatus::Committed)
            {
                warn!(
                    txid = tx.txid.as_str(),
                    error = %format!("{err:#}"),
                    "failed to record committed transaction status"
                );
            }
            release_marker(layout, &tx.txid);
            Ok(value)
        }
        Err(err) => {
            warn!(txid = tx.txid.as_str(), error = %format!("{err:#}"), "transaction failed");
            if let Err(status_err) =
                update_transaction_status(layout, &tx.txid, TransactionStatus::Failed)
            {
                warn!(
                    txid = tx.txid.as_str(),
                    error = %format!("{status_err:#}"),
                    "failed to record failed transaction status"
                );
            }
            release_marker(layout, &tx.txid);
            Err(err)
        }
    }
}

fn release_marker(layout: &SiteLayout, txid: &str) {
    if let Err(err) = clear_active_transaction(layout) {
        warn!(
            txid,
            error = %format!("{err:#}"),
            "failed to clear active transaction marker"
        );
    }
}
