//! Page rendering: URL in, HTML string out.
//!
//! The crawler is agnostic to how HTML is produced. The default renderer
//! is a plain async HTTP client; a headless-Chrome renderer is available
//! behind the `headless` feature for sites that need script execution.

use std::time::Duration;

const USER_AGENT_DEFAULT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

/// Default per-request timeout for page rendering.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Opaque "render URL to HTML" capability.
///
/// Implementations must bound their own timeout and return `None` on any
/// failure, including expiry. A failed render never propagates an error;
/// the crawler treats it as an empty subtree.
#[allow(async_fn_in_trait)]
pub trait PageRenderer {
    async fn render(&self, url: &str) -> Option<String>;
}

/// Renders pages with a plain HTTP GET.
pub struct HttpRenderer {
    client: reqwest::Client,
}

impl HttpRenderer {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT_DEFAULT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> Option<String> {
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                log::debug!("{url}: fetch failed: {err}");
                return None;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            log::debug!("{url}: {status}");
            return None;
        }

        match resp.text().await {
            Ok(body) if !body.is_empty() => Some(body),
            Ok(_) => {
                log::debug!("{url}: empty body");
                None
            }
            Err(err) => {
                log::debug!("{url}: body read failed: {err}");
                None
            }
        }
    }
}

/// Renders pages through headless Chrome, for sites that build their
/// content with javascript.
#[cfg(feature = "headless")]
pub struct ChromeRenderer {
    timeout: Duration,
}

#[cfg(feature = "headless")]
impl ChromeRenderer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn fetch_blocking(url: &str, timeout: Duration) -> anyhow::Result<String> {
        use std::path::PathBuf;

        let chrome_path = std::env::var("CHROME_PATH").unwrap_or_else(|_| "chromium".to_string());
        let options = headless_chrome::LaunchOptionsBuilder::default()
            .path(Some(PathBuf::from(chrome_path)))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build chrome options: {e}"))?;

        let browser = headless_chrome::Browser::new(options)?;
        let tab = browser.new_tab()?;
        tab.set_default_timeout(timeout);
        tab.navigate_to(url)?;
        tab.wait_until_navigated()?;

        Ok(tab.get_content()?)
    }
}

#[cfg(feature = "headless")]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Option<String> {
        let url = url.to_string();
        let timeout = self.timeout;

        let result =
            tokio::task::spawn_blocking(move || Self::fetch_blocking(&url, timeout)).await;

        match result {
            Ok(Ok(html)) if !html.is_empty() => Some(html),
            Ok(Ok(_)) => None,
            Ok(Err(err)) => {
                log::debug!("chrome render failed: {err}");
                None
            }
            Err(err) => {
                log::error!("chrome render task panicked: {err}");
                None
            }
        }
    }
}
