//! Public API surface, provider selection, and blocking helpers.

#[cfg(any(test, feature = "mock"))]
mod backend_mock;

#[cfg(all(target_os = "windows", feature = "win_sensors"))]
mod backend_win;

#[cfg(all(target_os = "linux", feature = "linux_iio_sys"))]
mod backend_linux;

pub mod display;
pub mod manager;
pub mod orientation;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub use crate::backend_mock::MockProvider;
pub use crate::display::{DisplaySink, DisplayState, float_text, format_sample};
pub use crate::manager::{ChannelState, Start, SubscriptionManager};
pub use crate::orientation::rotation_degrees;
pub use crate::types::{Backend, Channel, Error, RawSample, Result, SENSOR_NOT_FOUND, SamplingRate};

use futures_util::stream::BoxStream;
use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

const HAS_BACKENDS: bool = cfg!(any(
    feature = "mock",
    all(target_os = "windows", feature = "win_sensors"),
    all(target_os = "linux", feature = "linux_iio_sys")
));

/// Samples for one subscription. Dropping it unsubscribes.
pub type SampleStream = BoxStream<'static, RawSample>;
pub type ProviderClient = Box<dyn SensorProvider>;

// ===== Provider info =====

#[derive(Clone, Debug)]
pub struct ProviderInfo {
    pub backend: Backend,
    /// Short backend note like "linux_iio_sys", "win_sensors", or "mock".
    pub note: &'static str,
}

/// A provider's token for a channel it can deliver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelHandle {
    pub channel: Channel,
    /// Human-readable device name.
    pub name: String,
    /// Backend-specific locator (sysfs path, "default", ...).
    pub id: String,
}

// ===== Trait =====

pub trait SensorProvider: Send + Sync {
    /// `Err(Error::ChannelUnavailable)` when the device has no such sensor.
    fn channel(&self, kind: Channel) -> Result<ChannelHandle>;
    fn subscribe(&self, handle: &ChannelHandle, rate: SamplingRate) -> SampleStream;
    fn info(&self) -> ProviderInfo;

    fn available(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|&c| self.channel(c).is_ok())
            .collect()
    }
}

// ===== Global Tokio runtime for blocking variants =====

pub(crate) static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to init Tokio runtime")
});

// Blocking functions below create/use a global multithreaded Tokio runtime.
// Avoid calling them from async contexts.

// ===== Open options =====

#[derive(Clone, Debug)]
pub struct OpenOptions {
    pub allow_mock: bool,
    /// Channels the mock backend pretends to have.
    pub mock_channels: Vec<Channel>,
    /// Rate of the mock's synthetic waveforms; 0 disables them.
    pub mock_hz: f32,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self {
            allow_mock: false,
            mock_channels: Channel::ALL.to_vec(),
            mock_hz: 30.0,
        }
    }
    pub fn allow_mock(mut self, ok: bool) -> Self {
        self.allow_mock = ok;
        self
    }
    pub fn mock_channels(mut self, channels: impl Into<Vec<Channel>>) -> Self {
        self.mock_channels = channels.into();
        self
    }
    pub fn mock_hz(mut self, hz: f32) -> Self {
        self.mock_hz = hz;
        self
    }
}

// ===== Internal init config & report =====

pub struct InitConfig {
    pub allow_mock: bool,
    pub mock_channels: Vec<Channel>,
    pub mock_hz: f32,
}

impl From<OpenOptions> for InitConfig {
    fn from(opts: OpenOptions) -> Self {
        Self {
            allow_mock: opts.allow_mock,
            mock_channels: opts.mock_channels,
            mock_hz: opts.mock_hz,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SetupReport {
    pub chosen: Option<Backend>,
    pub tried: Vec<Backend>,
    /// Channels the chosen provider can deliver.
    pub channels: Vec<Channel>,
    pub used_mock: bool,
    pub duration: Duration,
}

#[cfg(any(
    test,
    feature = "mock",
    all(target_os = "windows", feature = "win_sensors"),
    all(target_os = "linux", feature = "linux_iio_sys")
))]
fn diagnostics() -> bool {
    std::env::var("SENSOR_PANEL_DIAGNOSTICS").ok().as_deref() == Some("1")
}

#[cfg(any(
    test,
    feature = "mock",
    all(target_os = "windows", feature = "win_sensors"),
    all(target_os = "linux", feature = "linux_iio_sys")
))]
fn accept(
    dev: ProviderClient,
    backend: Backend,
    tried: Vec<Backend>,
    t0: Instant,
) -> Option<(ProviderClient, SetupReport)> {
    let channels = dev.available();
    if channels.is_empty() {
        log::debug!("{backend:?}: no sensors exposed, skipping");
        return None;
    }
    let report = SetupReport {
        chosen: Some(backend),
        tried,
        channels,
        used_mock: backend == Backend::Mock,
        duration: t0.elapsed(),
    };
    if diagnostics() {
        log::info!(
            "sensor-panel: chosen={:?} tried={:?} channels={:?} took={:?}",
            report.chosen,
            report.tried,
            report.channels,
            report.duration
        );
    }
    Some((dev, report))
}

// ===== Unified init =====

pub async fn init(cfg: InitConfig) -> Result<(ProviderClient, SetupReport)> {
    if !HAS_BACKENDS {
        return Err(Error::Backend(
            "no backends enabled; enable one of: linux_iio_sys, win_sensors, mock".into(),
        ));
    }
    let t0 = Instant::now();
    #[allow(unused_mut)]
    let mut tried: Vec<Backend> = Vec::new();

    // Linux: Industrial I/O devices in sysfs
    #[cfg(all(target_os = "linux", feature = "linux_iio_sys"))]
    {
        tried.push(Backend::LinuxIio);
        match backend_linux::LinuxIio::open().await {
            Ok(dev) => {
                if let Some(found) = accept(Box::new(dev), Backend::LinuxIio, tried.clone(), t0) {
                    return Ok(found);
                }
            }
            Err(e) => log::debug!("linux iio: {e}"),
        }
    }

    // Windows sensors
    #[cfg(all(target_os = "windows", feature = "win_sensors"))]
    {
        tried.push(Backend::Windows);
        match backend_win::WinSensors::open().await {
            Ok(dev) => {
                if let Some(found) = accept(Box::new(dev), Backend::Windows, tried.clone(), t0) {
                    return Ok(found);
                }
            }
            Err(e) => log::debug!("win sensors: {e}"),
        }
    }

    // Optional mock (strictly opt-in)
    #[cfg(feature = "mock")]
    if cfg.allow_mock {
        tried.push(Backend::Mock);
        if let Ok(dev) = backend_mock::MockProvider::open(cfg.mock_channels, cfg.mock_hz).await {
            if let Some(found) = accept(Box::new(dev), Backend::Mock, tried.clone(), t0) {
                return Ok(found);
            }
        }
    }
    #[cfg(not(feature = "mock"))]
    let _ = cfg;

    Err(Error::NoBackend { tried })
}

// ===== Public API (thin) =====

/// Async: open the first available provider.
pub async fn open() -> Result<ProviderClient> {
    open_with(OpenOptions::new()).await
}

/// Async: open with options (allow_mock, mock channels and rate).
pub async fn open_with(opts: OpenOptions) -> Result<ProviderClient> {
    let (dev, _report) = init(opts.into()).await?;
    Ok(dev)
}

/// Blocking: open the first available provider.
/// Uses a global multithreaded Tokio runtime; avoid calling from async contexts.
pub fn open_blocking() -> Result<ProviderClient> {
    open_blocking_with(OpenOptions::new())
}

/// Blocking: open with options.
/// Uses a global multithreaded Tokio runtime; avoid calling from async contexts.
pub fn open_blocking_with(opts: OpenOptions) -> Result<ProviderClient> {
    let (dev, _report) = RUNTIME.block_on(init(opts.into()))?;
    Ok(dev)
}
