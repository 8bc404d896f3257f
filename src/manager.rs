//! Per-channel start/stop on top of a [`SensorProvider`](crate::SensorProvider),
//! feeding formatted readings into a [`DisplaySink`].

use crate::display::{DisplaySink, format_sample};
use crate::{Channel, ProviderClient, RawSample, SENSOR_NOT_FOUND, SampleStream, SamplingRate, SensorProvider};
use futures_util::StreamExt;
use tokio_stream::StreamMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Active,
}

/// Outcome of [`SubscriptionManager::start`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Start {
    Started,
    /// Already running; nothing changed.
    AlreadyActive,
    /// The device has no such sensor. The sink was notified once.
    Unavailable,
}

/// Owns at most one subscription per channel and routes each sample to the
/// slot of the channel it came from.
///
/// Samples are pulled on the caller's task by [`next_update`](Self::next_update),
/// so the sink is never touched concurrently. Once [`stop`](Self::stop)
/// returns, that channel's stream is gone and none of its samples are seen.
pub struct SubscriptionManager<S> {
    provider: ProviderClient,
    sink: S,
    rate: SamplingRate,
    active: StreamMap<Channel, SampleStream>,
}

impl<S: DisplaySink> SubscriptionManager<S> {
    pub fn new(provider: ProviderClient, sink: S) -> Self {
        Self {
            provider,
            sink,
            rate: SamplingRate::default(),
            active: StreamMap::new(),
        }
    }

    /// Rate hint for subscriptions started from now on.
    pub fn with_rate(mut self, rate: SamplingRate) -> Self {
        self.rate = rate;
        self
    }

    pub fn start(&mut self, channel: Channel) -> Start {
        if self.active.contains_key(&channel) {
            log::debug!("{channel:?} already active");
            return Start::AlreadyActive;
        }
        let handle = match self.provider.channel(channel) {
            Ok(h) => h,
            Err(e) => {
                log::warn!("cannot start {channel:?}: {e}");
                self.sink.notify(SENSOR_NOT_FOUND);
                return Start::Unavailable;
            }
        };
        let stream = self.provider.subscribe(&handle, self.rate);
        log::debug!(
            "started {channel:?} on {} [{}] rate={:?}",
            handle.name,
            handle.id,
            self.rate
        );
        self.active.insert(channel, stream);
        Start::Started
    }

    /// Returns whether `channel` was active. Stopping an idle channel is a no-op.
    pub fn stop(&mut self, channel: Channel) -> bool {
        let was_active = self.active.remove(&channel).is_some();
        if was_active {
            log::debug!("stopped {channel:?}");
        }
        was_active
    }

    /// Drops every subscription, as when the panel goes away.
    pub fn stop_all(&mut self) {
        for c in self.active() {
            self.stop(c);
        }
    }

    /// A channel whose provider stream ended on its own reads as `Idle`.
    pub fn state(&self, channel: Channel) -> ChannelState {
        if self.active.contains_key(&channel) {
            ChannelState::Active
        } else {
            ChannelState::Idle
        }
    }

    pub fn active(&self) -> Vec<Channel> {
        self.active.keys().copied().collect()
    }

    /// Push-style delivery for hosts that receive samples through their own
    /// callbacks. Samples for channels that are not active are dropped.
    pub fn handle_sample(&mut self, sample: &RawSample) -> bool {
        if !self.active.contains_key(&sample.channel) {
            log::debug!("dropping {:?} sample: not active", sample.channel);
            return false;
        }
        self.apply(sample);
        true
    }

    /// Waits for the next sample of any active channel and writes it to the
    /// sink. `None` once nothing is active.
    pub async fn next_update(&mut self) -> Option<Channel> {
        loop {
            let (channel, sample) = self.active.next().await?;
            if sample.channel != channel {
                log::warn!("{channel:?} subscription delivered a {:?} sample", sample.channel);
                continue;
            }
            self.apply(&sample);
            return Some(channel);
        }
    }

    /// Blocking [`next_update`](Self::next_update) on the global runtime.
    /// Avoid calling from async contexts.
    pub fn next_update_blocking(&mut self) -> Option<Channel> {
        crate::RUNTIME.block_on(self.next_update())
    }

    fn apply(&mut self, sample: &RawSample) {
        let text = format_sample(sample);
        log::trace!("{:?} -> {text:?}", sample.channel);
        self.sink.set_text(sample.channel, text);
    }

    pub fn provider(&self) -> &dyn SensorProvider {
        self.provider.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
