//! Command implementations.

pub mod clean;
pub mod generate;
pub mod list;

pub use self::clean::execute_clean;
pub use self::generate::execute_generate;
pub use self::list::execute_list;
