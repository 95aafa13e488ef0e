pub mod api_types;
pub mod client;
mod records;
pub mod types;
