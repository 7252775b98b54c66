/// Stream host for the correction engine
///
/// Reads interleaved native-endian `f32` frames, runs them through a
/// [`CorrectionEngine`] one period at a time and writes the result to the
/// sink. Engine diagnostics are drained and logged between periods, off the
/// processing call itself.
use crate::config::{HostConfig, STDIO};
use crate::error::Result;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tweaker_audio::{CorrectionEngine, EngineMode, DEFAULT_EVENT_CAPACITY};
use tweaker_core::ConfigSource;
use tweaker_filterfile::MappedFilterFile;

const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

/// What a finished run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStats {
    pub periods: u64,
    pub frames: u64,
    /// Bytes at the end of the input that did not form a whole frame
    pub discarded_bytes: usize,
    pub final_mode: EngineMode,
    pub adopted_revision: Option<u32>,
}

/// Map the configured filter file and stream `input` into `output`
pub fn run<R: Read, W: Write>(config: &HostConfig, input: R, output: W) -> Result<ProcessStats> {
    config.validate()?;
    let source = MappedFilterFile::open(&config.filterfile)?;
    run_with_source(config, source, input, output)
}

/// Stream `input` into `output` through an engine reading `source`
pub fn run_with_source<S, R, W>(
    config: &HostConfig,
    source: S,
    mut input: R,
    mut output: W,
) -> Result<ProcessStats>
where
    S: ConfigSource,
    R: Read,
    W: Write,
{
    config.validate()?;
    let mut engine = CorrectionEngine::new(config.channels, source)?;
    let mut events = engine.subscribe(DEFAULT_EVENT_CAPACITY);

    tracing::info!(
        channels = config.channels,
        sample_rate = config.sample_rate,
        period_frames = config.period_frames,
        "Processing stream"
    );

    let period_samples = config.period_frames * config.channels;
    let mut in_buf = vec![0.0_f32; period_samples];
    let mut out_buf = vec![0.0_f32; period_samples];
    let mut stats = ProcessStats {
        periods: 0,
        frames: 0,
        discarded_bytes: 0,
        final_mode: engine.mode(),
        adopted_revision: None,
    };

    loop {
        let filled = read_full(&mut input, bytemuck::cast_slice_mut(&mut in_buf))?;
        let frame_bytes = config.channels * SAMPLE_BYTES;
        let whole = filled / frame_bytes * frame_bytes;
        stats.discarded_bytes = filled - whole;

        if whole > 0 {
            let samples = whole / SAMPLE_BYTES;
            let frames = engine.process(&in_buf[..samples], &mut out_buf[..samples], config.sample_rate)?;
            output.write_all(bytemuck::cast_slice(&out_buf[..samples]))?;
            stats.periods += 1;
            stats.frames += frames as u64;
        }
        events.log_pending();

        if filled < in_buf.len() * SAMPLE_BYTES {
            break;
        }
    }
    output.flush()?;

    if stats.discarded_bytes > 0 {
        tracing::warn!(
            bytes = stats.discarded_bytes,
            "Input ended in the middle of a frame; trailing bytes dropped"
        );
    }
    if engine.dropped_events() > 0 {
        tracing::warn!(dropped = engine.dropped_events(), "Engine diagnostics were dropped");
    }

    stats.final_mode = engine.mode();
    stats.adopted_revision = engine.adopted_revision();
    tracing::info!(
        periods = stats.periods,
        frames = stats.frames,
        mode = ?stats.final_mode,
        "Stream finished"
    );
    Ok(stats)
}

/// Open `name` for reading, `-` meaning stdin
pub fn open_input(name: &str) -> Result<Box<dyn Read>> {
    if name == STDIO {
        Ok(Box::new(BufReader::new(io::stdin().lock())))
    } else {
        Ok(Box::new(BufReader::new(File::open(Path::new(name))?)))
    }
}

/// Open the configured sink for writing
pub fn open_sink(config: &HostConfig) -> Result<Box<dyn Write>> {
    if config.sink_is_stdout() {
        Ok(Box::new(BufWriter::new(io::stdout().lock())))
    } else {
        Ok(Box::new(BufWriter::new(File::create(Path::new(&config.sink))?)))
    }
}

/// Read until `buf` is full or the input ends, returning the bytes read
fn read_full<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tweaker_core::{ConfigSnapshot, FilterParameter};
    use tweaker_filterfile::{FilterFileImage, SharedFilterFile};

    fn to_bytes(samples: &[f32]) -> Vec<u8> {
        bytemuck::cast_slice(samples).to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(SAMPLE_BYTES)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn config(channels: usize, period_frames: usize) -> HostConfig {
        HostConfig {
            channels,
            period_frames,
            ..HostConfig::default()
        }
    }

    /// Reader that hands out at most `chunk` bytes per call
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn passes_through_without_stages() {
        let file = SharedFilterFile::new(48_000);
        file.publish(&ConfigSnapshot::from_stages(48_000, &[]));
        let input: Vec<f32> = (0..2 * 100).map(|i| i as f32 * 0.01).collect();
        let mut sink = Vec::new();

        let stats = run_with_source(&config(2, 32), file, to_bytes(&input).as_slice(), &mut sink).unwrap();

        assert_eq!(from_bytes(&sink), input);
        assert_eq!(stats.frames, 100);
        assert_eq!(stats.periods, 4);
        assert_eq!(stats.final_mode, EngineMode::Active);
    }

    #[test]
    fn filters_when_rates_match() {
        let file = SharedFilterFile::new(48_000);
        file.publish(&ConfigSnapshot::from_stages(
            48_000,
            &[FilterParameter::new(-1.8, 0.85, 0.5)],
        ));
        let mut input = vec![0.0_f32; 64];
        input[0] = 1.0;
        let mut sink = Vec::new();

        let stats = run_with_source(&config(1, 16), file, to_bytes(&input).as_slice(), &mut sink).unwrap();

        let output = from_bytes(&sink);
        assert_eq!(output.len(), 64);
        assert_ne!(output, input);
        assert_eq!(stats.adopted_revision, Some(1));
    }

    #[test]
    fn short_reads_and_partial_frames() {
        let file = SharedFilterFile::new(48_000);
        let input: Vec<f32> = (0..3 * 10).map(|i| i as f32).collect();
        let mut bytes = to_bytes(&input);
        bytes.extend_from_slice(&[1, 2, 3, 4, 5]);
        let mut sink = Vec::new();

        let stats = run_with_source(
            &config(3, 4),
            file,
            Trickle {
                data: &bytes,
                chunk: 7,
            },
            &mut sink,
        )
        .unwrap();

        assert_eq!(from_bytes(&sink), input);
        assert_eq!(stats.frames, 10);
        assert_eq!(stats.discarded_bytes, 5);
        // A fresh file at revision 0 is a valid, empty configuration
        assert_eq!(stats.final_mode, EngineMode::Active);
        assert_eq!(stats.adopted_revision, Some(0));
    }

    #[test]
    fn unsupported_file_is_never_adopted() {
        let mut image = FilterFileImage::new(48_000, &[FilterParameter::new(-1.8, 0.85, 0.5)]);
        image.format_version = 2;
        let input: Vec<f32> = (0..2 * 40).map(|i| i as f32 * 0.1).collect();
        let mut sink = Vec::new();

        let stats = run_with_source(
            &config(2, 16),
            SharedFilterFile::from_image(&image),
            to_bytes(&input).as_slice(),
            &mut sink,
        )
        .unwrap();

        assert_eq!(from_bytes(&sink), input);
        assert_eq!(stats.final_mode, EngineMode::AwaitingConfig);
        assert_eq!(stats.adopted_revision, None);
    }

    #[test]
    fn file_sink_receives_processed_samples() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.raw");
        let config = HostConfig {
            channels: 1,
            sink: out.display().to_string(),
            ..HostConfig::default()
        };
        let input = [0.5_f32, -0.5, 0.25];

        let sink = open_sink(&config).unwrap();
        run_with_source(&config, SharedFilterFile::new(48_000), to_bytes(&input).as_slice(), sink)
            .unwrap();

        assert_eq!(from_bytes(&std::fs::read(&out).unwrap()), input);
    }

    #[test]
    fn missing_filter_file_fails_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig {
            filterfile: dir.path().join("absent.bin"),
            ..HostConfig::default()
        };
        let result = run(&config, io::empty(), Vec::new());
        assert!(result.is_err());
    }
}
