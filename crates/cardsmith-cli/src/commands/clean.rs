//! Clean command implementation.

use crate::error::Result;
use crate::output::Formatter;
use cardsmith_domain::traits::FlashcardStore;
use cardsmith_store::JsonStore;
use std::path::Path;

/// Execute the clean command.
///
/// Loading already drops duplicates; this writes the result back.
pub fn execute_clean(store_path: &Path, formatter: &Formatter) -> Result<()> {
    let mut store = JsonStore::open(store_path)?;
    let removed = store.clean()?;

    if formatter.is_verbose() {
        println!(
            "{}",
            formatter.success(&format!("Removed {} duplicate(s), {} flashcards remain", removed, store.len()))
        );
    } else {
        println!("{}", removed);
    }
    Ok(())
}
