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
use std::env;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::errors::ConfigError;

const ENV_WIFI_SSID: &str = "WAREHOUSE_NODE_WIFI_SSID";
const ENV_WIFI_PASS: &str = "WAREHOUSE_NODE_WIFI_PASS";
const ENV_STATIC_IP: &str = "WAREHOUSE_NODE_STATIC_IP";
const ENV_GATEWAY: &str = "WAREHOUSE_NODE_GATEWAY";
const ENV_NETMASK: &str = "WAREHOUSE_NODE_NETMASK";
const ENV_UPLOAD_URL: &str = "WAREHOUSE_NODE_UPLOAD_URL";
const ENV_ACQUIRE_INTERVAL: &str = "WAREHOUSE_NODE_ACQUIRE_INTERVAL_MS";
const ENV_NET_CHECK_INTERVAL: &str = "WAREHOUSE_NODE_NET_CHECK_INTERVAL_MS";
const ENV_CAMERA_CHECK_INTERVAL: &str = "WAREHOUSE_NODE_CAMERA_CHECK_INTERVAL_MS";
const ENV_CAMERA_INIT_RETRIES: &str = "WAREHOUSE_NODE_CAMERA_INIT_RETRIES";
const ENV_MIN_IMAGE_SIZE: &str = "WAREHOUSE_NODE_MIN_IMAGE_SIZE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIpSettings {
    pub address: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiSettings {
    pub ssid: String,
    pub password: String,
    /// DHCP is used when unset.
    pub static_ip: Option<StaticIpSettings>,
}

/// Runtime configuration for one node. The hardware build compiled all of
/// this in; here everything can be overridden through `WAREHOUSE_NODE_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub wifi: WifiSettings,
    pub upload_url: String,

    /// Acquire-and-send cadence.
    pub acquire_interval_ms: u32,
    /// Wifi health check cadence; also the reconnect retry cadence (no
    /// backoff by design).
    pub network_check_interval_ms: u32,
    /// Camera liveness probe cadence.
    pub camera_check_interval_ms: u32,

    /// Bounded init attempts at boot; exhausting them is fatal.
    pub camera_init_retries: u32,
    /// Settle delay between camera init attempts.
    pub camera_settle_ms: u32,

    /// Captures below this size are presumed corrupt and dropped.
    pub min_image_size: usize,

    /// Total window to wait for association after a connect request.
    pub wifi_connect_window_ms: u32,
    /// Poll interval while waiting for association.
    pub wifi_poll_interval_ms: u32,

    pub http_timeout_ms: u32,
    pub indicator_pulse_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            wifi: WifiSettings {
                ssid: String::new(),
                password: String::new(),
                static_ip: None,
            },
            upload_url: "http://192.168.0.106:5000/upload_image".to_string(),
            acquire_interval_ms: 5_000,
            network_check_interval_ms: 5_000,
            camera_check_interval_ms: 10_000,
            camera_init_retries: 3,
            camera_settle_ms: 500,
            min_image_size: 1_000,
            wifi_connect_window_ms: 5_000,
            wifi_poll_interval_ms: 500,
            http_timeout_ms: 5_000,
            indicator_pulse_ms: 1_000,
        }
    }
}

impl NodeConfig {
    /// Defaults overridden by whatever `WAREHOUSE_NODE_*` variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(ssid) = env::var(ENV_WIFI_SSID) {
            config.wifi.ssid = ssid;
        }
        if let Ok(password) = env::var(ENV_WIFI_PASS) {
            config.wifi.password = password;
        }
        if let Ok(url) = env::var(ENV_UPLOAD_URL) {
            config.upload_url = url;
        }

        config.wifi.static_ip = static_ip_from_env()?;

        if let Some(value) = parse_env(ENV_ACQUIRE_INTERVAL)? {
            config.acquire_interval_ms = value;
        }
        if let Some(value) = parse_env(ENV_NET_CHECK_INTERVAL)? {
            config.network_check_interval_ms = value;
        }
        if let Some(value) = parse_env(ENV_CAMERA_CHECK_INTERVAL)? {
            config.camera_check_interval_ms = value;
        }
        if let Some(value) = parse_env(ENV_CAMERA_INIT_RETRIES)? {
            config.camera_init_retries = value;
        }
        if let Some(value) = parse_env(ENV_MIN_IMAGE_SIZE)? {
            config.min_image_size = value;
        }

        Ok(config)
    }
}

fn static_ip_from_env() -> Result<Option<StaticIpSettings>, ConfigError> {
    let address: Option<Ipv4Addr> = parse_env(ENV_STATIC_IP)?;
    let Some(address) = address else {
        return Ok(None);
    };

    let gateway = parse_env(ENV_GATEWAY)?.unwrap_or_else(|| {
        // Conventional .1 gateway on the same /24 when not given.
        let octets = address.octets();
        Ipv4Addr::new(octets[0], octets[1], octets[2], 1)
    });
    let netmask = parse_env(ENV_NETMASK)?.unwrap_or(Ipv4Addr::new(255, 255, 255, 0));

    Ok(Some(StaticIpSettings {
        address,
        gateway,
        netmask,
    }))
}

fn parse_env<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // from_env reads the whole process environment; tests touching it must
    // not interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_the_board_constants() {
        let config = NodeConfig::default();
        assert_eq!(config.acquire_interval_ms, 5_000);
        assert_eq!(config.network_check_interval_ms, 5_000);
        assert_eq!(config.camera_check_interval_ms, 10_000);
        assert_eq!(config.camera_init_retries, 3);
        assert_eq!(config.min_image_size, 1_000);
        assert_eq!(config.indicator_pulse_ms, 1_000);
        assert!(config.wifi.static_ip.is_none());
    }

    #[test]
    fn env_overrides_apply() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var(ENV_MIN_IMAGE_SIZE, "2000");
        env::set_var(ENV_CAMERA_INIT_RETRIES, "5");
        let config = NodeConfig::from_env().unwrap();
        env::remove_var(ENV_MIN_IMAGE_SIZE);
        env::remove_var(ENV_CAMERA_INIT_RETRIES);

        assert_eq!(config.min_image_size, 2_000);
        assert_eq!(config.camera_init_retries, 5);
    }

    #[test]
    fn garbage_values_are_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var(ENV_ACQUIRE_INTERVAL, "soon");
        let result = NodeConfig::from_env();
        env::remove_var(ENV_ACQUIRE_INTERVAL);

        assert_eq!(
            result.unwrap_err(),
            ConfigError::Invalid {
                key: ENV_ACQUIRE_INTERVAL,
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn static_ip_fills_in_gateway_and_netmask() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var(ENV_STATIC_IP, "192.168.252.100");
        let config = NodeConfig::from_env().unwrap();
        env::remove_var(ENV_STATIC_IP);

        let static_ip = config.wifi.static_ip.unwrap();
        assert_eq!(static_ip.address, Ipv4Addr::new(192, 168, 252, 100));
        assert_eq!(static_ip.gateway, Ipv4Addr::new(192, 168, 252, 1));
        assert_eq!(static_ip.netmask, Ipv4Addr::new(255, 255, 255, 0));
    }
}
