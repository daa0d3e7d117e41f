pub mod decoder;
pub mod mempool;
pub mod scanner;
pub mod types;

pub use scanner::{initial_cursor, Scanner};
pub use types::{ScanCursor, TickReport};
