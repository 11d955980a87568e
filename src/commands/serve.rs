use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::server;
use crate::services::{database_exists, Store};

pub fn run(port: u16, database: PathBuf) {
    if !database_exists(&database) {
        println!(
            "Database {} does not exist yet; starting with an empty one. Run `ingest` to populate it.",
            database.display()
        );
    }

    if let Err(e) = run_server(port, database) {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn run_server(port: u16, database: PathBuf) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Config(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        let store = Store::new(&database).await?;
        server::serve(store, port).await
    })
}
