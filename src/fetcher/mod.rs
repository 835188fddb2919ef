pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;

pub use client::{AssetStream, fetch_asset, fetch_page, get_client};
pub use errors::FetchError;
pub use types::{Charset, CharsetSource, RemoteDocument};
