pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	/// The snapshot could not be built and there is no earlier snapshot to serve.
	#[error("Retrieval temporarily unavailable: {message}")]
	CacheRefresh { message: String },
	#[error("Backend rejected the request: {message}")]
	PermanentBackend { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl Error {
	/// Maps a failed snapshot refresh. Client errors keep their identity, everything else is an
	/// unavailable backend.
	pub fn from_refresh_failure(err: mnemo_remote::Error) -> Self {
		match err {
			mnemo_remote::Error::Permanent { message, .. } => Self::PermanentBackend { message },
			other => Self::CacheRefresh { message: other.to_string() },
		}
	}
}
