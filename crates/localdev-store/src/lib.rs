mod config;
mod diagnostics;
mod fs_utils;
mod inventory;
mod layout;
mod site;
mod state;
mod transactions;
mod types;

pub use config::{SiteConfig, CONFIG_FILE_NAME};
pub use diagnostics::{diagnose_site, DiagnosticFinding, DiagnosticSeverity};
pub use inventory::{scan_plugins, scan_themes};
pub use layout::{default_site_root, SiteLayout};
pub use site::Site;
pub use state::{
    read_active_plugins, read_active_theme, read_overrides, write_active_plugins,
    write_active_theme, write_overrides,
};
pub use transactions::{
    append_transaction_journal_entry, begin_transaction, clear_active_transaction,
    clear_stale_active_transaction,
    current_unix_timestamp, execute_with_transaction, read_active_transaction,
    read_transaction_journal, read_transaction_metadata, set_active_transaction,
    update_transaction_status, write_transaction_metadata,
};
pub use types::{TransactionJournalEntry, TransactionMetadata, TransactionStatus};
