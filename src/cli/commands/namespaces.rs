//! Namespace listing
//!
//! Prints every namespace of the project, one per line. The default
//! namespace prints as an empty line.

use super::exit_code_for;
use crate::adapters::datastore::DatastoreClient;
use crate::cli::EXIT_OK;
use crate::config::BackupConfig;
use crate::core::backup::MetadataLister;
use crate::domain::NamespaceName;
use crate::log_error_with_context;
use std::sync::Arc;

/// Bucket placeholder satisfying validation when no export will run
pub const UNUSED_BUCKET: &str = "unused";

/// List namespaces
pub async fn execute(config: &BackupConfig) -> anyhow::Result<i32> {
    let client = match DatastoreClient::new(&config.datastore) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e.message());
            return Ok(exit_code_for(&e));
        }
    };

    let lister = MetadataLister::new(Arc::new(client));
    match lister.list_namespaces().await {
        Ok(namespaces) => {
            print!("{}", render_namespaces(&namespaces));
            Ok(EXIT_OK)
        }
        Err(e) => {
            log_error_with_context!(&e, "Listing namespaces failed");
            eprintln!("Error: {}", e.message());
            Ok(exit_code_for(&e))
        }
    }
}

fn render_namespaces(namespaces: &[NamespaceName]) -> String {
    namespaces
        .iter()
        .map(|ns| format!("{ns}\n"))
        .collect()
}
