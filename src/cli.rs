use std::fmt;
use std::io;

use super::error::Error;
use super::source::{SourceKind, UnknownSource};


pub static EXIT_FAILURE: i32 = 1;
pub static EXIT_USAGE: i32 = 2;


/// Why a binary stopped: bad arguments (reported with the usage text) or a
/// failure of the pipeline itself.
#[derive(Debug)]
pub enum CliError {
	Usage(String),
	Failed(Box<dyn std::error::Error>),
}

impl CliError {
	pub fn exit_code(&self) -> i32 {
		match self {
			Self::Usage(_) => EXIT_USAGE,
			Self::Failed(_) => EXIT_FAILURE,
		}
	}

	/// Print the error to stderr and return the exit code to use.
	pub fn report(&self, prog: &str, usage: &str) -> i32 {
		match self {
			Self::Usage(msg) => eprintln!("{}\n\n{}", msg, usage),
			Self::Failed(e) => eprintln!("{}: {}", prog, e),
		}
		self.exit_code()
	}
}

impl fmt::Display for CliError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Usage(msg) => f.write_str(msg),
			Self::Failed(e) => fmt::Display::fmt(e, f),
		}
	}
}

impl From<Error> for CliError {
	fn from(err: Error) -> Self {
		Self::Failed(Box::new(err))
	}
}

impl From<io::Error> for CliError {
	fn from(err: io::Error) -> Self {
		Self::Failed(Box::new(err))
	}
}

impl From<UnknownSource> for CliError {
	fn from(err: UnknownSource) -> Self {
		Self::Usage(err.to_string())
	}
}


/// Split `argv` (program name first) into the source and the remaining
/// arguments. `max_rest` bounds the number of arguments after the source.
pub fn source_args(argv: &[String], max_rest: Option<usize>) -> Result<(SourceKind, &[String]), CliError> {
	let source = match argv.get(1) {
		Some(s) => s,
		None => return Err(CliError::Usage("missing SOURCE argument".into())),
	};
	let rest = &argv[2..];
	if let Some(max) = max_rest {
		if rest.len() > max {
			return Err(CliError::Usage("too many arguments".into()))
		}
	}
	Ok((source.parse::<SourceKind>()?, rest))
}

pub fn no_args(argv: &[String]) -> Result<(), CliError> {
	if argv.len() > 1 {
		return Err(CliError::Usage("unexpected arguments".into()))
	}
	Ok(())
}
