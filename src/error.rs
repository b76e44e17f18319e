use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Tracking not initialized at {0}. Run 'intel track init' first.")]
    NotInitialized(PathBuf),

    #[error("Tracking already initialized at {0}. Use update commands instead.")]
    AlreadyInitialized(PathBuf),

    #[error("Round {0} not found")]
    RoundNotFound(u32),

    #[error("Round {0} already exists")]
    DuplicateRound(u32),

    #[error("Invalid {field} rating {value}: expected 0-5")]
    InvalidRating { field: &'static str, value: u8 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed tracking document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("No tracking data found for {company}{}", suggestion_suffix(.suggestion))]
    NotFound {
        company: String,
        suggestion: Option<String>,
    },

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write JSON to {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{}'?)", name),
        None => String::new(),
    }
}
