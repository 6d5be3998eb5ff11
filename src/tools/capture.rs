//! Microphone capture via `arecord` for growing a benchmark corpus.

use std::path::Path;
use std::time::Duration;

use crate::defaults;
use crate::error::Result;
use crate::tools::{SystemToolRunner, ToolRunner};

/// Records fixed-length mono WAV files in the format the pipelines
/// expect (signed 16-bit, single channel, configured sample rate).
pub struct MicRecorder<R: ToolRunner> {
    runner: R,
    device: Option<String>,
    sample_rate: u32,
}

impl MicRecorder<SystemToolRunner> {
    /// Recorder backed by the real `arecord` binary.
    pub fn system() -> Self {
        Self::new(SystemToolRunner::new())
    }
}

impl<R: ToolRunner> MicRecorder<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }

    /// Selects an ALSA device instead of the default input.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Records `duration` of audio into `out`.
    ///
    /// The tool deadline is the requested duration plus a grace period,
    /// so a device that never delivers samples ends as a timeout error
    /// instead of a hang.
    pub fn record(&self, duration: Duration, out: &Path) -> Result<()> {
        let secs = duration.as_secs().max(1).to_string();
        let rate = self.sample_rate.to_string();
        let out_path = out.display().to_string();

        let mut args: Vec<&str> = vec!["-q", "-d", &secs, "-f", "S16_LE", "-r", &rate, "-c", "1"];
        if let Some(device) = &self.device {
            args.push("-D");
            args.push(device);
        }
        args.push(&out_path);

        let timeout = duration + Duration::from_secs(defaults::RECORD_GRACE_SECS);
        self.runner.run("arecord", &args, timeout)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiabenchError;
    use crate::tools::MockToolRunner;
    use std::path::PathBuf;

    #[test]
    fn record_invokes_arecord_with_wav_format() {
        let recorder = MicRecorder::new(MockToolRunner::new());

        recorder
            .record(Duration::from_secs(90), &PathBuf::from("/tmp/take.wav"))
            .unwrap();

        let call = recorder.runner.call(0).unwrap();
        assert_eq!(call.program, "arecord");
        assert_eq!(
            call.args,
            vec!["-q", "-d", "90", "-f", "S16_LE", "-r", "16000", "-c", "1", "/tmp/take.wav"]
        );
    }

    #[test]
    fn record_timeout_adds_grace_period() {
        let recorder = MicRecorder::new(MockToolRunner::new());

        recorder
            .record(Duration::from_secs(30), &PathBuf::from("/tmp/take.wav"))
            .unwrap();

        let call = recorder.runner.call(0).unwrap();
        assert_eq!(call.timeout, Duration::from_secs(40));
    }

    #[test]
    fn device_flag_precedes_the_output_path() {
        let recorder = MicRecorder::new(MockToolRunner::new()).with_device("hw:1,0");

        recorder
            .record(Duration::from_secs(5), &PathBuf::from("out.wav"))
            .unwrap();

        let call = recorder.runner.call(0).unwrap();
        let args = call.args;
        assert_eq!(&args[args.len() - 3..], &["-D", "hw:1,0", "out.wav"]);
    }

    #[test]
    fn sub_second_durations_record_at_least_one_second() {
        let recorder = MicRecorder::new(MockToolRunner::new());

        recorder
            .record(Duration::from_millis(200), &PathBuf::from("out.wav"))
            .unwrap();

        let call = recorder.runner.call(0).unwrap();
        assert!(call.args.contains(&"1".to_string()));
    }

    #[test]
    fn custom_sample_rate_is_passed_through() {
        let recorder = MicRecorder::new(MockToolRunner::new()).with_sample_rate(48_000);

        recorder
            .record(Duration::from_secs(5), &PathBuf::from("out.wav"))
            .unwrap();

        let call = recorder.runner.call(0).unwrap();
        assert!(call.args.contains(&"48000".to_string()));
    }

    #[test]
    fn recorder_failures_propagate() {
        let recorder = MicRecorder::new(MockToolRunner::new().with_failure(
            DiabenchError::ToolNotFound {
                tool: "arecord".to_string(),
            },
        ));

        let err = recorder
            .record(Duration::from_secs(5), &PathBuf::from("out.wav"))
            .unwrap_err();
        assert!(matches!(err, DiabenchError::ToolNotFound { .. }));
    }
}
