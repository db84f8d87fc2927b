//! List command implementation.

use crate::cli::ListArgs;
use crate::error::Result;
use crate::output::Formatter;
use cardsmith_domain::traits::FlashcardStore;
use cardsmith_store::JsonStore;
use std::path::Path;

/// Execute the list command.
pub fn execute_list(args: ListArgs, store_path: &Path, formatter: &Formatter) -> Result<()> {
    let store = JsonStore::open(store_path)?;
    let cards = store.flashcards();
    let shown = &cards[..args.limit.map_or(cards.len(), |limit| limit.min(cards.len()))];

    println!("{}", formatter.format_flashcards(shown)?);
    if shown.len() < cards.len() && formatter.is_verbose() {
        println!("{}", formatter.info(&format!("Showing {} of {} flashcards", shown.len(), cards.len())));
    }
    Ok(())
}
