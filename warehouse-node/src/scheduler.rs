/*
 * Warehouse Monitoring Node
 *
 * MIT license
 *
 * Copyright (c) 2024-2025 Warehouse Node Project
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 *
 * Apache license, Version 2.0
 *
 * Copyright (c) 2024-2025 Warehouse Node Project
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Cooperative multi-rate tick loop. One thread, three timers, no queue: the
//! caller drives [`Scheduler::tick`] as fast as it likes and each duty fires
//! at its own cadence.

use log::{info, warn};

use crate::errors::AcquireError;
use crate::httpd::SharedTelemetry;
use crate::platform::{Clock, Entropy, HttpTransport, Indicator, WifiDriver};
use crate::state::Reading;
use crate::uplink::UplinkSender;
use crate::wifi::LinkManager;

/// Anything the acquire cycle can pull a reading from (camera or sensor
/// bank). `probe` is the periodic health check; `try_acquire` is a single
/// attempt with no internal retry.
pub trait AcquisitionSource {
    fn probe(&mut self, clock: &dyn Clock);

    fn try_acquire(&mut self) -> Result<Reading, AcquireError>;
}

/// Fixed-period timer over the wrapping millisecond clock.
///
/// Elapsed time is `now.wrapping_sub(last_fire)`, which stays correct across
/// the `u32` wrap as long as a period never exceeds half the counter range.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleTimer {
    period_ms: u32,
    last_fire: u32,
}

impl ScheduleTimer {
    pub fn new(period_ms: u32, now: u32) -> Self {
        Self {
            period_ms,
            last_fire: now,
        }
    }

    pub fn due(&self, now: u32) -> bool {
        now.wrapping_sub(self.last_fire) >= self.period_ms
    }

    /// Re-arm unconditionally. Called before the duty runs, so a slow or
    /// failing duty cannot starve the schedule.
    pub fn arm(&mut self, now: u32) {
        self.last_fire = now;
    }
}

/// Wires the three periodic duties together and dispatches them in a fixed
/// order within one tick: network first, then the peripheral check, then
/// acquire-and-send. The ordering is load-bearing: an acquire that becomes
/// due together with a network check sees the link state refreshed first.
pub struct Scheduler<W, S, T, I, E>
where
    W: WifiDriver,
    S: AcquisitionSource,
    T: HttpTransport,
    I: Indicator,
    E: Entropy,
{
    link: LinkManager<W>,
    source: S,
    uplink: UplinkSender<T, I, E>,
    telemetry: Option<SharedTelemetry>,
    network_timer: ScheduleTimer,
    peripheral_timer: ScheduleTimer,
    acquire_timer: ScheduleTimer,
}

impl<W, S, T, I, E> Scheduler<W, S, T, I, E>
where
    W: WifiDriver,
    S: AcquisitionSource,
    T: HttpTransport,
    I: Indicator,
    E: Entropy,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: &dyn Clock,
        link: LinkManager<W>,
        source: S,
        uplink: UplinkSender<T, I, E>,
        telemetry: Option<SharedTelemetry>,
        network_interval_ms: u32,
        peripheral_interval_ms: u32,
        acquire_interval_ms: u32,
    ) -> Self {
        let now = clock.now_ms();
        Self {
            link,
            source,
            uplink,
            telemetry,
            network_timer: ScheduleTimer::new(network_interval_ms, now),
            peripheral_timer: ScheduleTimer::new(peripheral_interval_ms, now),
            acquire_timer: ScheduleTimer::new(acquire_interval_ms, now),
        }
    }

    pub fn link(&mut self) -> &mut LinkManager<W> {
        &mut self.link
    }

    /// One pass over the three timers. Each duty that is due is re-armed
    /// first and then run to completion; a duty that overruns its own period
    /// simply fires again on the next tick.
    pub fn tick(&mut self, clock: &dyn Clock) {
        if self.network_timer.due(clock.now_ms()) {
            self.network_timer.arm(clock.now_ms());
            self.link.check(clock);
        }

        if self.peripheral_timer.due(clock.now_ms()) {
            self.peripheral_timer.arm(clock.now_ms());
            self.source.probe(clock);
        }

        if self.acquire_timer.due(clock.now_ms()) {
            self.acquire_timer.arm(clock.now_ms());
            self.run_acquire_cycle(clock);
        }
    }

    /// Acquire, publish to the diagnostic store, upload. Every failure mode
    /// is logged and dropped; the cycle never retries and never blocks the
    /// other timers beyond its own duration.
    fn run_acquire_cycle(&mut self, clock: &dyn Clock) {
        let reading = match self.source.try_acquire() {
            Ok(reading) => reading,
            Err(err) => {
                warn!("{}, skipping this cycle", err);
                return;
            }
        };

        if let (Some(store), Reading::Telemetry(telemetry)) = (&self.telemetry, &reading) {
            store.lock().unwrap_or_else(|e| e.into_inner()).record(*telemetry);
        }

        match self.uplink.send(clock, reading, self.link.is_up()) {
            Ok(report) => info!("upload accepted with status {}", report.status),
            Err(err) => warn!("upload skipped: {}", err),
        }
    }
}
