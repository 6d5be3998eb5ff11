//! Error types for diabench.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiabenchError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Configuration error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Benchmark requires a reference directory, an output directory, or both")]
    BenchmarkTargetMissing,

    // Corpus errors
    #[error("Corpus directory not found: {path}")]
    CorpusDirNotFound { path: String },

    #[error("No recordings found under {path}")]
    EmptyCorpus { path: String },

    #[error("Duplicate recording identifier in corpus: {uri}")]
    DuplicateRecording { uri: String },

    // Audio errors
    #[error("Failed to read audio from {path}: {message}")]
    AudioRead { path: String, message: String },

    #[error("Unsupported channel count in {path}: {channels}")]
    UnsupportedChannelCount { path: String, channels: u16 },

    #[error("Sample rate of {path} is {actual} Hz, pipeline expects {expected} Hz")]
    SampleRateMismatch {
        path: String,
        expected: u32,
        actual: u32,
    },

    // Engine errors
    #[error("Diarization engine error: {message}")]
    Engine { message: String },

    // Evaluation errors
    #[error("No ground truth for '{uri}' at {path}")]
    GroundTruthNotFound { uri: String, path: String },

    #[error("Malformed RTTM in {path} line {line}: {message}")]
    RttmParse {
        path: String,
        line: usize,
        message: String,
    },

    // External tool errors
    #[error("External tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("External tool {tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("External tool {tool} exceeded its {timeout_secs}s timeout")]
    ToolTimeout { tool: String, timeout_secs: u64 },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DiabenchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = DiabenchError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = DiabenchError::ConfigInvalidValue {
            key: "tau_active".to_string(),
            message: "must lie in [0, 1]".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for tau_active: must lie in [0, 1]"
        );
    }

    #[test]
    fn test_benchmark_target_missing_display() {
        let error = DiabenchError::BenchmarkTargetMissing;
        assert_eq!(
            error.to_string(),
            "Benchmark requires a reference directory, an output directory, or both"
        );
    }

    #[test]
    fn test_corpus_dir_not_found_display() {
        let error = DiabenchError::CorpusDirNotFound {
            path: "/data/speech".to_string(),
        };
        assert_eq!(error.to_string(), "Corpus directory not found: /data/speech");
    }

    #[test]
    fn test_empty_corpus_display() {
        let error = DiabenchError::EmptyCorpus {
            path: "/data/speech".to_string(),
        };
        assert_eq!(error.to_string(), "No recordings found under /data/speech");
    }

    #[test]
    fn test_duplicate_recording_display() {
        let error = DiabenchError::DuplicateRecording {
            uri: "meeting".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Duplicate recording identifier in corpus: meeting"
        );
    }

    #[test]
    fn test_audio_read_display() {
        let error = DiabenchError::AudioRead {
            path: "a.wav".to_string(),
            message: "not a WAV file".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to read audio from a.wav: not a WAV file"
        );
    }

    #[test]
    fn test_unsupported_channel_count_display() {
        let error = DiabenchError::UnsupportedChannelCount {
            path: "a.wav".to_string(),
            channels: 6,
        };
        assert_eq!(error.to_string(), "Unsupported channel count in a.wav: 6");
    }

    #[test]
    fn test_sample_rate_mismatch_display() {
        let error = DiabenchError::SampleRateMismatch {
            path: "a.wav".to_string(),
            expected: 16000,
            actual: 44100,
        };
        assert_eq!(
            error.to_string(),
            "Sample rate of a.wav is 44100 Hz, pipeline expects 16000 Hz"
        );
    }

    #[test]
    fn test_engine_display() {
        let error = DiabenchError::Engine {
            message: "model state exhausted".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Diarization engine error: model state exhausted"
        );
    }

    #[test]
    fn test_ground_truth_not_found_display() {
        let error = DiabenchError::GroundTruthNotFound {
            uri: "meeting".to_string(),
            path: "/refs/meeting.rttm".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No ground truth for 'meeting' at /refs/meeting.rttm"
        );
    }

    #[test]
    fn test_rttm_parse_display() {
        let error = DiabenchError::RttmParse {
            path: "gt.rttm".to_string(),
            line: 3,
            message: "expected 10 fields, found 4".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed RTTM in gt.rttm line 3: expected 10 fields, found 4"
        );
    }

    #[test]
    fn test_tool_not_found_display() {
        let error = DiabenchError::ToolNotFound {
            tool: "ffmpeg".to_string(),
        };
        assert_eq!(error.to_string(), "External tool not found: ffmpeg");
    }

    #[test]
    fn test_tool_failed_display() {
        let error = DiabenchError::ToolFailed {
            tool: "arecord".to_string(),
            message: "device busy".to_string(),
        };
        assert_eq!(error.to_string(), "External tool arecord failed: device busy");
    }

    #[test]
    fn test_tool_timeout_display() {
        let error = DiabenchError::ToolTimeout {
            tool: "ffmpeg".to_string(),
            timeout_secs: 120,
        };
        assert_eq!(
            error.to_string(),
            "External tool ffmpeg exceeded its 120s timeout"
        );
    }

    #[test]
    fn test_other_display() {
        let error = DiabenchError::Other("unexpected error".to_string());
        assert_eq!(error.to_string(), "unexpected error");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: DiabenchError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: DiabenchError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);

        fn returns_error() -> Result<i32> {
            Err(DiabenchError::Other("test error".to_string()))
        }
        assert!(returns_error().is_err());
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: DiabenchError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<DiabenchError>();
        assert_sync::<DiabenchError>();
    }

    #[test]
    fn test_error_debug_format() {
        let error = DiabenchError::GroundTruthNotFound {
            uri: "meeting".to_string(),
            path: "/refs/meeting.rttm".to_string(),
        };
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("GroundTruthNotFound"));
        assert!(debug_str.contains("meeting"));
    }
}
