//! Error types for the waypoint library

use std::fmt;
use thiserror::Error;

/// Unified error type for the waypoint library
#[derive(Debug, Error)]
pub enum WaypointError {
    /// An activity failed while being stopped
    #[error("Activity {activity} failed to stop")]
    ActivityStop {
        activity: String,
        #[source]
        source: anyhow::Error,
    },

    /// An activity failed while being started
    #[error("Activity {activity} failed to start")]
    ActivityStart {
        activity: String,
        #[source]
        source: anyhow::Error,
    },

    /// An activity failed while being cancelled. Never aggregated.
    #[error("Activity {activity} failed to cancel")]
    ActivityCancel {
        activity: String,
        #[source]
        source: anyhow::Error,
    },

    /// An activity failed while asked whether it may stop. Never aggregated.
    #[error("Activity {activity} failed to answer may_stop")]
    MayStop {
        activity: String,
        #[source]
        source: anyhow::Error,
    },

    /// Stop and/or start failures captured during one place transition,
    /// stop failure first
    #[error("Place transition failed: {}", Causes(.causes))]
    Transition { causes: Vec<WaypointError> },

    /// One or more handlers failed while an event was being dispatched
    #[error("Dispatch of {event} failed: {}", Causes(.causes))]
    Dispatch {
        event: &'static str,
        causes: Vec<WaypointError>,
    },

    /// Subscribing through a channel whose run has already ended
    #[error("Channel is sealed: {message}")]
    ChannelSealed { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// Serialization errors
    #[error("Serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

struct Causes<'a>(&'a [WaypointError]);

impl fmt::Display for Causes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cause(s)", self.0.len())?;
        for (i, cause) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, cause)?;
            if let Some(source) = std::error::Error::source(cause) {
                write!(f, " ({})", source)?;
            }
        }
        Ok(())
    }
}

impl WaypointError {
    pub fn activity_stop<S: Into<String>>(activity: S, source: anyhow::Error) -> Self {
        Self::ActivityStop {
            activity: activity.into(),
            source,
        }
    }

    pub fn activity_start<S: Into<String>>(activity: S, source: anyhow::Error) -> Self {
        Self::ActivityStart {
            activity: activity.into(),
            source,
        }
    }

    pub fn activity_cancel<S: Into<String>>(activity: S, source: anyhow::Error) -> Self {
        Self::ActivityCancel {
            activity: activity.into(),
            source,
        }
    }

    pub fn may_stop<S: Into<String>>(activity: S, source: anyhow::Error) -> Self {
        Self::MayStop {
            activity: activity.into(),
            source,
        }
    }

    /// Build the aggregate for one transition. Returns `None` when nothing
    /// failed.
    pub fn transition(
        stop_failure: Option<WaypointError>,
        start_failure: Option<WaypointError>,
    ) -> Option<Self> {
        let causes: Vec<_> = stop_failure.into_iter().chain(start_failure).collect();
        if causes.is_empty() {
            None
        } else {
            Some(Self::Transition { causes })
        }
    }

    pub fn channel_sealed<S: Into<String>>(message: S) -> Self {
        Self::ChannelSealed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error naming the offending field
    pub fn configuration_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Underlying causes of an aggregate, or an empty slice for leaf errors
    pub fn causes(&self) -> &[WaypointError] {
        match self {
            Self::Transition { causes } | Self::Dispatch { causes, .. } => causes,
            _ => &[],
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::ActivityStop { .. } => "stop",
            Self::ActivityStart { .. } => "start",
            Self::ActivityCancel { .. } => "cancel",
            Self::MayStop { .. } => "may_stop",
            Self::Transition { .. } => "transition",
            Self::Dispatch { .. } => "dispatch",
            Self::ChannelSealed { .. } => "channel",
            Self::Configuration { .. } => "configuration",
            Self::Serialization { .. } => "serialization",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WaypointError>;

impl From<anyhow::Error> for WaypointError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for WaypointError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}

impl From<serde_yaml::Error> for WaypointError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization("yaml", err)
    }
}
