use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown vehicle type: {0}")]
    UnknownVehicleType(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Simulation cancelled")]
    Cancelled,
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(#[from] geojson::Error),
}

impl Error {
    /// True for errors caused by a malformed request rather than by the
    /// routing data or the environment.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownVehicleType(_) | Error::InvalidRequest(_)
        )
    }
}
