//! Cuts per-speaker clips out of a recording with `ffmpeg`.
//!
//! Useful once a run looks good: the hypothesis timeline is turned into
//! audible evidence, one directory of clips per detected speaker.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::defaults;
use crate::error::{DiabenchError, Result};
use crate::timeline::SpeakerSegment;
use crate::tools::{SystemToolRunner, ToolRunner};

pub struct ClipCutter<R: ToolRunner> {
    runner: R,
    timeout: Duration,
}

impl ClipCutter<SystemToolRunner> {
    /// Cutter backed by the real `ffmpeg` binary.
    pub fn system() -> Self {
        Self::new(SystemToolRunner::new())
    }
}

impl<R: ToolRunner> ClipCutter<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            timeout: Duration::from_secs(defaults::TOOL_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cuts one clip per segment into `<out_dir>/<speaker>/`.
    ///
    /// Clips are numbered per speaker in segment order and named
    /// `segment_<speaker>_<NN>.wav`. Returns the created paths.
    pub fn cut(
        &self,
        audio: &Path,
        segments: &[SpeakerSegment],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let audio_path = audio.display().to_string();
        let mut counters: HashMap<&str, usize> = HashMap::new();
        let mut clips = Vec::with_capacity(segments.len());

        for segment in segments {
            let counter = counters.entry(segment.speaker.as_str()).or_insert(0);
            *counter += 1;

            let speaker_dir = out_dir.join(&segment.speaker);
            fs::create_dir_all(&speaker_dir)?;
            let clip = speaker_dir.join(format!("segment_{}_{:02}.wav", segment.speaker, counter));

            let start = format!("{:.3}", segment.start);
            let length = format!("{:.3}", segment.duration);
            let clip_path = clip.display().to_string();
            self.runner.run(
                "ffmpeg",
                &[
                    "-y",
                    "-loglevel",
                    "error",
                    "-i",
                    &audio_path,
                    "-ss",
                    &start,
                    "-t",
                    &length,
                    "-c",
                    "copy",
                    &clip_path,
                ],
                self.timeout,
            )?;
            clips.push(clip);
        }

        Ok(clips)
    }

    /// Concatenates clips into one file via ffmpeg's concat demuxer.
    ///
    /// The demuxer needs its input list on disk; the list file is
    /// written next to `out` and removed again afterwards.
    pub fn concatenate(&self, clips: &[PathBuf], out: &Path) -> Result<()> {
        if clips.is_empty() {
            return Err(DiabenchError::Other(
                "no clips to concatenate".to_string(),
            ));
        }

        let list_path = out.with_extension("txt");
        let mut list = String::new();
        for clip in clips {
            list.push_str(&format!("file '{}'\n", clip.display()));
        }
        fs::write(&list_path, list)?;

        let list_arg = list_path.display().to_string();
        let out_arg = out.display().to_string();
        let result = self.runner.run(
            "ffmpeg",
            &[
                "-y",
                "-loglevel",
                "error",
                "-f",
                "concat",
                "-safe",
                "0",
                "-i",
                &list_arg,
                "-c",
                "copy",
                &out_arg,
            ],
            self.timeout,
        );
        fs::remove_file(&list_path).ok();
        result?;

        Ok(())
    }
}
