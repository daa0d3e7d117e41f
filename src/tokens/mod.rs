pub mod metadata;

pub use metadata::{fetch_token_info, TokenInfo};
