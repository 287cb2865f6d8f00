//! In-memory port implementations for use case tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::domain::audio::CompressedEncoding;

use super::ports::{
    AudioChunk, CaptureError, CodecEngine, EngineError, InputStream, Microphone, NativeRecorder,
    PlatformSignals, QrImage, QrOptions, QrRenderer, RecorderSession, RenderError, StreamFormat,
};

pub struct FakePlatform {
    isolated: AtomicBool,
    shared_memory: AtomicBool,
}

impl FakePlatform {
    pub fn isolated() -> Self {
        Self {
            isolated: AtomicBool::new(true),
            shared_memory: AtomicBool::new(true),
        }
    }

    pub fn not_isolated() -> Self {
        Self {
            isolated: AtomicBool::new(false),
            shared_memory: AtomicBool::new(true),
        }
    }

    pub fn set_isolated(&self, value: bool) {
        self.isolated.store(value, Ordering::SeqCst);
    }
}

impl PlatformSignals for FakePlatform {
    fn is_isolated(&self) -> bool {
        self.isolated.load(Ordering::SeqCst)
    }

    fn shared_memory_available(&self) -> bool {
        self.shared_memory.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy)]
enum MicMode {
    Ok,
    Denied,
    NoDevice,
}

/// Microphone emitting a 10 ms chunk of constant samples per tick
pub struct FakeMicrophone {
    mode: MicMode,
    sample_rate: u32,
    fail_after: Option<usize>,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl FakeMicrophone {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            mode: MicMode::Ok,
            sample_rate,
            fail_after: None,
            opened: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn denied() -> Self {
        Self {
            mode: MicMode::Denied,
            ..Self::new(48_000)
        }
    }

    pub fn no_device() -> Self {
        Self {
            mode: MicMode::NoDevice,
            ..Self::new(48_000)
        }
    }

    /// Stream errors after `chunks` chunks
    pub fn failing_after(mut self, chunks: usize) -> Self {
        self.fail_after = Some(chunks);
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Microphone for FakeMicrophone {
    async fn open(&self) -> Result<Box<dyn InputStream>, CaptureError> {
        match self.mode {
            MicMode::Denied => return Err(CaptureError::PermissionDenied),
            MicMode::NoDevice => {
                return Err(CaptureError::DeviceUnavailable(
                    "No input device available".to_string(),
                ))
            }
            MicMode::Ok => {}
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        let mut ticker = interval(StdDuration::from_millis(10));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
        Ok(Box::new(FakeStream {
            sample_rate: self.sample_rate,
            ticker,
            emitted: 0,
            fail_after: self.fail_after,
            stopped: false,
            released: Arc::clone(&self.released),
        }))
    }
}

struct FakeStream {
    sample_rate: u32,
    ticker: Interval,
    emitted: usize,
    fail_after: Option<usize>,
    stopped: bool,
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl InputStream for FakeStream {
    fn format(&self) -> StreamFormat {
        StreamFormat {
            sample_rate: self.sample_rate,
        }
    }

    async fn next_chunk(&mut self) -> Option<Result<AudioChunk, CaptureError>> {
        if self.stopped {
            return None;
        }
        self.ticker.tick().await;
        if self.fail_after.is_some_and(|n| self.emitted >= n) {
            return Some(Err(CaptureError::DeviceUnavailable(
                "device disconnected".to_string(),
            )));
        }
        self.emitted += 1;
        Some(Ok(vec![1_000; (self.sample_rate / 100) as usize]))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Native recorder producing a fixed-size blob
pub struct FakeRecorder {
    available: bool,
    supported: Vec<CompressedEncoding>,
    output_len: usize,
    started_with: Mutex<Option<(CompressedEncoding, Option<u32>)>>,
    pushed: Arc<AtomicUsize>,
}

impl FakeRecorder {
    pub fn supporting(encodings: &[CompressedEncoding]) -> Self {
        Self {
            available: true,
            supported: encodings.to_vec(),
            output_len: 1_000,
            started_with: Mutex::new(None),
            pushed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::supporting(&[])
        }
    }

    pub fn with_output_len(mut self, len: usize) -> Self {
        self.output_len = len;
        self
    }

    pub fn started_with(&self) -> Option<(CompressedEncoding, Option<u32>)> {
        *self.started_with.lock().unwrap()
    }

    pub fn pushed_samples(&self) -> usize {
        self.pushed.load(Ordering::SeqCst)
    }
}

impl NativeRecorder for FakeRecorder {
    fn is_available(&self) -> bool {
        self.available
    }

    fn is_encoding_supported(&self, encoding: CompressedEncoding) -> bool {
        self.available && self.supported.contains(&encoding)
    }

    fn start(
        &self,
        encoding: CompressedEncoding,
        bitrate_hint: Option<u32>,
        _input_rate: u32,
    ) -> Result<Box<dyn RecorderSession>, CaptureError> {
        *self.started_with.lock().unwrap() = Some((encoding, bitrate_hint));
        Ok(Box::new(FakeSession {
            output_len: self.output_len,
            pushed: Arc::clone(&self.pushed),
        }))
    }
}

struct FakeSession {
    output_len: usize,
    pushed: Arc<AtomicUsize>,
}

impl RecorderSession for FakeSession {
    fn push(&mut self, samples: &[i16]) -> Result<(), CaptureError> {
        self.pushed.fetch_add(samples.len(), Ordering::SeqCst);
        Ok(())
    }

    fn stop(self: Box<Self>) -> Result<Vec<u8>, CaptureError> {
        Ok(vec![0x4f; self.output_len])
    }
}

/// Codec engine writing a deterministic output derived from its input
pub struct FakeEngine {
    output_len: usize,
    load_delay: Option<StdDuration>,
    fail_load: bool,
    fail_run: bool,
    loaded: AtomicBool,
    loads: AtomicUsize,
    runs: AtomicUsize,
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeEngine {
    pub fn new(output_len: usize) -> Self {
        Self {
            output_len,
            load_delay: None,
            fail_load: false,
            fail_run: false,
            loaded: AtomicBool::new(false),
            loads: AtomicUsize::new(0),
            runs: AtomicUsize::new(0),
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_load_delay(mut self, delay: StdDuration) -> Self {
        self.load_delay = Some(delay);
        self
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodecEngine for FakeEngine {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn load(&self) -> Result<(), EngineError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_load {
            return Err(EngineError::LoadFailed("engine assets missing".to_string()));
        }
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        if !self.is_loaded() {
            return Err(EngineError::NotLoaded);
        }
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn run(&self, argv: &[String]) -> Result<(), EngineError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail_run {
            return Err(EngineError::RunFailed("exit status 1".to_string()));
        }

        let input_name = argv
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| argv.get(i + 1))
            .ok_or_else(|| EngineError::RunFailed("missing input".to_string()))?;
        let output_name = argv
            .last()
            .ok_or_else(|| EngineError::RunFailed("missing output".to_string()))?;

        let mut files = self.files.lock().unwrap();
        let input = files
            .get(input_name)
            .ok_or_else(|| EngineError::Io(format!("{} not found", input_name)))?;
        let seed = input.len() as u8;
        let output = (0..self.output_len)
            .map(|i| (i as u8).wrapping_mul(31) ^ seed)
            .collect();
        files.insert(output_name.clone(), output);
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::Io(format!("{} not found", name)))
    }
}

/// Renderer that remembers what it was asked to encode
#[derive(Default)]
pub struct FakeRenderer {
    fail: bool,
    rendered: Mutex<Vec<String>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }
}

impl QrRenderer for FakeRenderer {
    fn render(&self, data: &str, options: &QrOptions) -> Result<QrImage, RenderError> {
        if self.fail {
            return Err(RenderError::DataTooLong {
                version: options.version,
                message: "data too long".to_string(),
            });
        }
        self.rendered.lock().unwrap().push(data.to_string());
        Ok(QrImage::from_png(b"\x89PNG fake".to_vec()))
    }
}
