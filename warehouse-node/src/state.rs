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
use serde::{Deserialize, Serialize};

/// Wifi association lifecycle. `Down -> Connecting -> Up` on association,
/// `Up -> Down` on loss detected at the network-check timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Down,
    Connecting,
    Up,
}

/// Camera lifecycle. `Uninitialized -> Ready` only through a successful
/// bounded-retry init; `Ready <-> Degraded` afterwards, forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Uninitialized,
    Ready,
    Degraded,
}

/// One acquired datum, owned from capture until the upload attempt returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Image(ImageReading),
    Telemetry(TelemetryReading),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReading {
    pub bytes: Vec<u8>,
}

impl ImageReading {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub temperature: f32,
    pub humidity: f32,
    pub weight: f32,
}

impl TelemetryReading {
    /// NaN readings come straight from a misbehaving sensor and must never
    /// reach the uplink.
    pub fn is_finite(&self) -> bool {
        self.temperature.is_finite() && self.humidity.is_finite() && self.weight.is_finite()
    }
}
