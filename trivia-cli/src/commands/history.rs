use super::open_storage;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use std::path::Path;
use trivia_core::storage::TransactionStore;

pub async fn show_history(data_dir: &Path, limit: usize) -> Result<()> {
    let store = TransactionStore::new(open_storage(data_dir).await?);
    let transactions = store.list(limit).await?;

    if transactions.is_empty() {
        println!("No transactions found");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Reference",
        "Type",
        "Amount (KSH)",
        "Phone",
        "Status",
        "Created",
    ]);

    for tx in transactions {
        table.add_row(vec![
            tx.reference.to_string(),
            tx.kind.as_str().to_string(),
            tx.amount.to_string(),
            tx.phone_number,
            tx.status.to_string(),
            tx.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}
