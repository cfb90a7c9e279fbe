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
use log::{info, warn};

use crate::configuration::WifiSettings;
use crate::errors::BootError;
use crate::platform::{Clock, WifiDriver};
use crate::state::LinkState;

/// Owns the wifi association lifecycle. Loss is only detected when the
/// network-check timer calls [`LinkManager::check`]; the retry cadence is
/// exactly that timer's period, with no backoff.
pub struct LinkManager<W: WifiDriver> {
    driver: W,
    settings: WifiSettings,
    state: LinkState,
    poll_interval_ms: u32,
    connect_window_ms: u32,
}

impl<W: WifiDriver> LinkManager<W> {
    pub fn new(
        driver: W,
        settings: WifiSettings,
        poll_interval_ms: u32,
        connect_window_ms: u32,
    ) -> Self {
        Self {
            driver,
            settings,
            state: LinkState::Down,
            poll_interval_ms,
            connect_window_ms,
        }
    }

    /// Current association status, queried from the radio. Gates whether an
    /// upload attempt is made at all.
    pub fn is_up(&self) -> bool {
        self.driver.is_associated()
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Boot-time association. A failed interface configuration is logged and
    /// ignored (the radio falls back to DHCP); a failed association is
    /// reported to the caller, which decides whether it is fatal.
    pub fn establish(&mut self, clock: &dyn Clock) -> Result<(), BootError> {
        if let Err(err) = self.driver.configure(&self.settings) {
            warn!("failed to apply interface configuration: {}", err);
        }

        if self.associate(clock) {
            Ok(())
        } else {
            Err(BootError::NetworkAssociation)
        }
    }

    /// Timer-driven health check. No-op while associated; otherwise one
    /// bounded reconnect attempt. Failure is not escalated, the next check
    /// retries.
    pub fn check(&mut self, clock: &dyn Clock) {
        if self.driver.is_associated() {
            self.state = LinkState::Up;
            return;
        }

        if self.state == LinkState::Up {
            warn!("wifi association lost, reconnecting");
        }
        self.state = LinkState::Down;
        self.associate(clock);
    }

    fn associate(&mut self, clock: &dyn Clock) -> bool {
        self.state = LinkState::Connecting;
        self.driver.disconnect();
        if let Err(err) = self.driver.connect() {
            warn!("wifi connect request failed: {}", err);
            self.state = LinkState::Down;
            return false;
        }

        let start = clock.now_ms();
        while !self.driver.is_associated()
            && clock.now_ms().wrapping_sub(start) < self.connect_window_ms
        {
            clock.delay_ms(self.poll_interval_ms);
        }

        if self.driver.is_associated() {
            self.state = LinkState::Up;
            match self.driver.ip_address() {
                Some(ip) => info!("wifi associated, ip address {}", ip),
                None => info!("wifi associated"),
            }
            true
        } else {
            self.state = LinkState::Down;
            warn!("wifi association timed out, retrying next check");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DeviceError;
    use std::cell::Cell;
    use std::net::Ipv4Addr;

    struct TestClock(Cell<u32>);

    impl Clock for TestClock {
        fn now_ms(&self) -> u32 {
            self.0.get()
        }

        fn delay_ms(&self, ms: u32) {
            self.0.set(self.0.get().wrapping_add(ms));
        }
    }

    struct ScriptedWifi {
        associated: bool,
        /// Association completes after this many status polls following a
        /// connect request; `None` never associates.
        polls_until_associated: Option<u32>,
        polls: u32,
        connect_calls: u32,
        disconnect_calls: u32,
    }

    impl ScriptedWifi {
        fn new(polls_until_associated: Option<u32>) -> Self {
            Self {
                associated: false,
                polls_until_associated,
                polls: 0,
                connect_calls: 0,
                disconnect_calls: 0,
            }
        }
    }

    impl WifiDriver for &Cell<ScriptedWifi> {
        fn configure(&mut self, _settings: &WifiSettings) -> Result<(), DeviceError> {
            Ok(())
        }

        fn connect(&mut self) -> Result<(), DeviceError> {
            let mut inner = self.take();
            inner.connect_calls += 1;
            inner.polls = 0;
            self.set(inner);
            Ok(())
        }

        fn disconnect(&mut self) {
            let mut inner = self.take();
            inner.disconnect_calls += 1;
            inner.associated = false;
            self.set(inner);
        }

        fn is_associated(&self) -> bool {
            let mut inner = self.take();
            if let Some(limit) = inner.polls_until_associated {
                if inner.connect_calls > 0 {
                    inner.polls += 1;
                    if inner.polls > limit {
                        inner.associated = true;
                    }
                }
            }
            let associated = inner.associated;
            self.set(inner);
            associated
        }

        fn ip_address(&self) -> Option<Ipv4Addr> {
            Some(Ipv4Addr::new(192, 168, 252, 100))
        }
    }

    fn settings() -> WifiSettings {
        WifiSettings {
            ssid: "warehouse".to_string(),
            password: "secret".to_string(),
            static_ip: None,
        }
    }

    impl Default for ScriptedWifi {
        fn default() -> Self {
            Self::new(None)
        }
    }

    #[test]
    fn check_while_associated_makes_no_connect_attempt() {
        let cell = Cell::new(ScriptedWifi::new(None));
        {
            let mut inner = cell.take();
            inner.associated = true;
            cell.set(inner);
        }
        let clock = TestClock(Cell::new(0));
        let mut link = LinkManager::new(&cell, settings(), 500, 5_000);

        link.check(&clock);

        let inner = cell.take();
        assert_eq!(inner.connect_calls, 0);
        assert_eq!(inner.disconnect_calls, 0);
        assert_eq!(link.state(), LinkState::Up);
    }

    #[test]
    fn reconnect_succeeds_within_window() {
        let cell = Cell::new(ScriptedWifi::new(Some(3)));
        let clock = TestClock(Cell::new(0));
        let mut link = LinkManager::new(&cell, settings(), 500, 5_000);

        link.check(&clock);

        assert_eq!(link.state(), LinkState::Up);
        assert!(link.is_up());
        let inner = cell.take();
        assert_eq!(inner.connect_calls, 1);
    }

    #[test]
    fn reconnect_failure_stays_down_and_retries_next_check() {
        let cell = Cell::new(ScriptedWifi::new(None));
        let clock = TestClock(Cell::new(0));
        let mut link = LinkManager::new(&cell, settings(), 500, 5_000);

        link.check(&clock);
        assert_eq!(link.state(), LinkState::Down);
        let connects = cell.take();
        assert_eq!(connects.connect_calls, 1);
        cell.set(connects);

        // Next scheduled check issues exactly one more attempt, no backoff.
        link.check(&clock);
        let inner = cell.take();
        assert_eq!(inner.connect_calls, 2);
    }

    #[test]
    fn boot_establish_reports_association_failure() {
        let cell = Cell::new(ScriptedWifi::new(None));
        let clock = TestClock(Cell::new(0));
        let mut link = LinkManager::new(&cell, settings(), 500, 5_000);

        assert_eq!(
            link.establish(&clock).unwrap_err(),
            BootError::NetworkAssociation
        );
        assert_eq!(link.state(), LinkState::Down);
    }
}
