use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
	/// 5xx responses, throttling, timeouts and connection failures. Retried.
	#[error("Transient backend error: {message}")]
	Transient { message: String, status: Option<u16> },
	/// 4xx responses. Never retried.
	#[error("Permanent backend error: {message}")]
	Permanent { message: String, status: Option<u16> },
	#[error("Invalid backend response: {message}")]
	InvalidResponse { message: String },
	#[error("Invalid remote configuration: {message}")]
	InvalidConfig { message: String },
}
impl Error {
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transient { status, .. } | Self::Permanent { status, .. } => *status,
			_ => None,
		}
	}

	pub fn from_status(status: StatusCode, body: &str) -> Self {
		let snippet: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
		let message = if snippet.is_empty() {
			format!("HTTP {status}.")
		} else {
			format!("HTTP {status}: {snippet}")
		};

		if status.is_server_error()
			|| status == StatusCode::REQUEST_TIMEOUT
			|| status == StatusCode::TOO_MANY_REQUESTS
		{
			Self::Transient { message, status: Some(status.as_u16()) }
		} else {
			Self::Permanent { message, status: Some(status.as_u16()) }
		}
	}

	pub fn from_transport(err: reqwest::Error) -> Self {
		if let Some(status) = err.status() {
			return Self::from_status(status, "");
		}
		if err.is_builder() {
			return Self::InvalidConfig { message: err.to_string() };
		}
		if err.is_decode() {
			return Self::InvalidResponse { message: err.to_string() };
		}

		Self::Transient { message: err.to_string(), status: None }
	}
}

impl From<reqwest::header::InvalidHeaderName> for Error {
	fn from(err: reqwest::header::InvalidHeaderName) -> Self {
		Self::InvalidConfig { message: err.to_string() }
	}
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
	fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
		Self::InvalidConfig { message: err.to_string() }
	}
}

/// Decides whether a failed attempt may be repeated.
pub trait Retryable {
	fn is_retryable(&self) -> bool;
}
impl Retryable for Error {
	fn is_retryable(&self) -> bool {
		matches!(self, Self::Transient { .. })
	}
}
