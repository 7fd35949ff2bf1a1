use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use http::Request;
use http::header::RANGE;

use biograf_fetch::ReqwestClient;
use biograf_range::{Interceptor, RangedResponder};

use super::Session;

#[derive(Debug, clap::Args)]
pub struct Get {
    /// Absolute URL, or a path relative to the origin
    url: String,
    /// Range header value, e.g. `bytes=0-1023`
    #[arg(long)]
    range: Option<String>,
    /// Write the body here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Get {
    pub async fn run(self, session: &Session) -> Result<()> {
        let fetcher = session.cache.fetcher();
        let url = if self.url.contains("://") {
            self.url.clone()
        } else {
            fetcher.resolve(&self.url)?.to_string()
        };

        let responder = RangedResponder::new(session.cache.store().clone())
            .with_mount(fetcher.origin().path());
        let interceptor = Interceptor::new(responder, ReqwestClient::new());

        let mut request = Request::get(&url);
        if let Some(range) = &self.range {
            request = request.header(RANGE, range);
        }
        let request = request.body(()).context("Invalid request")?;

        let response = interceptor
            .handle(&request)
            .await
            .with_context(|| format!("Failed to get {url}"))?;

        eprintln!("{}", response.status());
        for (name, value) in response.headers() {
            eprintln!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }

        match &self.output {
            Some(path) => std::fs::write(path, response.body())
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => std::io::stdout()
                .lock()
                .write_all(response.body())
                .context("Failed to write body")?,
        }
        Ok(())
    }
}
