//! Shared blocking HTTP client

use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// The process-wide client. The timeout of the first caller sticks.
pub fn http_client(timeout_secs: u64) -> Result<&'static Client, reqwest::Error> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(concat!("rosco/", env!("CARGO_PKG_VERSION")))
            .build()
    })
}
