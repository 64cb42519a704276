use std::io;
use std::io::Read;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use flate2;

use log::{debug, info};

use tempfile::NamedTempFile;

use super::error::Result;


pub fn magic_open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Read>> {
	let path = path.as_ref();
	match path.extension() {
		Some(x) if x == "gz" => {
			Ok(Box::new(flate2::read::GzDecoder::new(fs::File::open(path)?)))
		},
		_ => Ok(Box::new(fs::File::open(path)?)),
	}
}


pub fn is_expired(modified: DateTime<Utc>, max_age: chrono::Duration, now: DateTime<Utc>) -> bool {
	modified + max_age <= now
}


/// A single cached download. The file is only replaced when it is missing
/// or older than `max_age`; there is no locking, so concurrent processes
/// sharing a cache directory are not supported.
#[derive(Debug, Clone)]
pub struct CachePolicy {
	path: PathBuf,
	max_age: chrono::Duration,
}

impl CachePolicy {
	pub fn new<P: Into<PathBuf>>(path: P, max_age: chrono::Duration) -> Self {
		Self{
			path: path.into(),
			max_age,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn max_age(&self) -> chrono::Duration {
		self.max_age
	}

	pub fn is_stale_at(&self, now: DateTime<Utc>) -> io::Result<bool> {
		let modified = match fs::metadata(&self.path) {
			Ok(m) => m.modified()?,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
			Err(e) => return Err(e),
		};
		Ok(is_expired(DateTime::<Utc>::from(modified), self.max_age, now))
	}

	pub fn is_stale(&self) -> io::Result<bool> {
		self.is_stale_at(Utc::now())
	}

	/// Run `fetch` into a scratch file next to the cache entry if the entry
	/// is stale, then move it into place. On error the scratch file is
	/// removed and the previous entry (if any) stays untouched.
	pub fn refresh<F>(&self, fetch: F) -> Result<&Path>
		where F: FnOnce(&mut fs::File) -> Result<()>
	{
		if !self.is_stale()? {
			debug!("using cached {}", self.path.display());
			return Ok(&self.path)
		}
		let dir = match self.path.parent() {
			Some(p) if p.as_os_str().len() > 0 => p.to_path_buf(),
			_ => PathBuf::from("."),
		};
		fs::create_dir_all(&dir)?;
		info!("refreshing {}", self.path.display());
		let mut scratch = NamedTempFile::new_in(&dir)?;
		fetch(scratch.as_file_mut())?;
		scratch.persist(&self.path).map_err(|e| e.error)?;
		Ok(&self.path)
	}
}
