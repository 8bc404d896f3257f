use crate::{
    Backend, Channel, ChannelHandle, Error, ProviderInfo, RawSample, Result, SampleStream,
    SamplingRate, SensorProvider,
};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{self, Duration},
};
use tokio_stream::wrappers::BroadcastStream;

const MAX_WAVEFORM_HZ: f32 = 1000.0;

/// Scriptable provider: pick which sensors "exist", push samples by hand, or
/// let it generate smooth synthetic readings.
///
/// Delivery ignores the requested rate; samples arrive when injected.
#[derive(Clone)]
pub struct MockProvider {
    available: Arc<[Channel]>,
    tx: broadcast::Sender<RawSample>,
}

impl MockProvider {
    pub fn new(available: impl IntoIterator<Item = Channel>) -> Self {
        let (tx, _rx) = broadcast::channel::<RawSample>(256);
        Self {
            available: available.into_iter().collect(),
            tx,
        }
    }

    #[cfg(feature = "mock")]
    pub async fn open(available: Vec<Channel>, hz: f32) -> anyhow::Result<Self> {
        anyhow::ensure!(
            hz.is_finite() && hz >= 0.0,
            "mock rate must be finite and not negative, got {hz}"
        );
        let dev = Self::new(available);
        if hz > 0.0 {
            dev.spawn_waveforms(hz);
        }
        Ok(dev)
    }

    /// Hands `sample` to every live subscription of its channel. Returns the
    /// number of open subscriptions (of any channel) that saw it.
    pub fn inject(&self, sample: RawSample) -> usize {
        self.tx.send(sample).unwrap_or(0)
    }

    /// Open subscriptions across all channels.
    pub fn subscribers(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Feeds every available channel with a synthetic waveform at `hz`,
    /// held to 1..=1000 Hz. Runs until the returned task is aborted.
    pub fn spawn_waveforms(&self, hz: f32) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let channels = Arc::clone(&self.available);
        let hz = if hz.is_finite() { hz.clamp(1.0, MAX_WAVEFORM_HZ) } else { MAX_WAVEFORM_HZ };
        let period = Duration::from_secs_f32(1.0 / hz);
        tokio::spawn(async move {
            let mut t = 0.0f32;
            let mut interval = time::interval(period);
            loop {
                interval.tick().await;
                t += period.as_secs_f32();
                for &c in channels.iter() {
                    let _ = tx.send(waveform(c, t));
                }
            }
        })
    }
}

/// Synthetic reading for `channel` at time `t` seconds.
pub(crate) fn waveform(channel: Channel, t: f32) -> RawSample {
    match channel {
        // Hand waved over the sensor every few seconds
        Channel::Proximity => {
            let near = (0.5 * t).sin() > 0.0;
            RawSample::new(channel, [if near { 0.0 } else { 5.0 }])
        }
        Channel::Gyroscope => RawSample::new(channel, [0.3 * t.sin(), 0.2 * t.cos(), 0.0]),
        Channel::Accelerometer => RawSample::new(
            channel,
            [
                0.4 * t.sin(),
                0.3 * (1.3 * t).cos(),
                9.81 + 0.1 * (3.7 * t).sin(),
            ],
        ),
        // Lying flat, rocking ±60° around the long axis
        Channel::RotationVector => {
            let roll = 60f32.to_radians() * (0.3 * t).sin();
            let (s, c) = (roll / 2.0).sin_cos();
            let h = std::f32::consts::FRAC_1_SQRT_2;
            RawSample::new(channel, [c * h, s * h, -s * h, c * h, 0.0])
        }
    }
}

impl SensorProvider for MockProvider {
    fn channel(&self, kind: Channel) -> Result<ChannelHandle> {
        if !self.available.contains(&kind) {
            return Err(Error::ChannelUnavailable(kind));
        }
        Ok(ChannelHandle {
            channel: kind,
            name: format!("Mock {}", kind.label()),
            id: "mock".into(),
        })
    }

    fn subscribe(&self, handle: &ChannelHandle, _rate: SamplingRate) -> SampleStream {
        let channel = handle.channel;
        BroadcastStream::new(self.tx.subscribe())
            // drop lag/closed errors and other channels' samples
            .filter_map(move |it| async move { it.ok().filter(|s| s.channel == channel) })
            .boxed()
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            backend: Backend::Mock,
            note: "mock",
        }
    }
}
