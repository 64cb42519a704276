use std::io;
use std::time::Duration;

use log::{debug, trace};

use reqwest;

use super::error::FetchError;


static USER_AGENT: &'static str = concat!("covid-density/", env!("CARGO_PKG_VERSION"));


fn is_timeout(err: &io::Error) -> bool {
	if err.kind() == io::ErrorKind::TimedOut {
		return true
	}
	let mut source = err.get_ref().map(|e| e as &(dyn std::error::Error + 'static));
	while let Some(e) = source {
		if let Some(e) = e.downcast_ref::<reqwest::Error>() {
			if e.is_timeout() {
				return true
			}
		}
		if let Some(e) = e.downcast_ref::<io::Error>() {
			if e.kind() == io::ErrorKind::TimedOut {
				return true
			}
		}
		source = e.source();
	}
	false
}

/// Classify an error raised while draining a response body. Timeouts may
/// be nested anywhere in the error's source chain.
pub fn read_failure(url: &str, err: io::Error) -> FetchError {
	if is_timeout(&err) {
		FetchError::Timeout(url.into())
	} else {
		FetchError::Io(err)
	}
}


/// Blocking HTTP access with a hard timeout. Nothing is retried; callers
/// get a `FetchError` and may re-invoke.
pub struct Fetcher {
	client: reqwest::blocking::Client,
}

impl Fetcher {
	pub fn new(timeout: Duration) -> Result<Self, FetchError> {
		let client = reqwest::blocking::Client::builder()
			.timeout(timeout)
			.user_agent(USER_AGENT)
			.build()?;
		Ok(Self{client})
	}

	/// Send a GET request and hand out the response body as a reader. The
	/// connection is released when the response is dropped.
	pub fn open(&self, url: &str) -> Result<reqwest::blocking::Response, FetchError> {
		debug!("GET {}", url);
		let resp = self.client.get(url).send()?;
		let status = resp.status();
		if !status.is_success() {
			return Err(FetchError::Status{url: url.into(), status})
		}
		Ok(resp)
	}

	pub fn get_text(&self, url: &str) -> Result<String, FetchError> {
		Ok(self.open(url)?.text()?)
	}

	pub fn download<W: io::Write + ?Sized>(&self, url: &str, w: &mut W) -> Result<u64, FetchError> {
		let mut resp = self.open(url)?;
		let n = resp.copy_to(w)?;
		trace!("received {} bytes from {}", n, url);
		Ok(n)
	}
}
