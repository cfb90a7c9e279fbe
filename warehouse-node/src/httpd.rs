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

//! Read-only diagnostic endpoint for the sensor variant: a dashboard page and
//! a JSON route with the latest reading. Transport-agnostic; the binary wires
//! the routes into whatever HTTP server the platform provides.

use std::sync::{Arc, Mutex};

use crate::state::TelemetryReading;

pub type SharedTelemetry = Arc<Mutex<TelemetryStore>>;

/// Latest reading, shared between the acquire cycle and the HTTP handler.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    latest: Option<TelemetryReading>,
}

impl TelemetryStore {
    pub fn record(&mut self, reading: TelemetryReading) {
        self.latest = Some(reading);
    }

    pub fn latest(&self) -> Option<TelemetryReading> {
        self.latest
    }
}

pub fn shared_store() -> SharedTelemetry {
    Arc::new(Mutex::new(TelemetryStore::default()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

/// Routes `GET /` to the dashboard and `GET /data` to the latest reading as
/// JSON. Anything else is a 404.
pub struct DiagnosticService {
    store: SharedTelemetry,
}

impl DiagnosticService {
    pub fn new(store: SharedTelemetry) -> Self {
        Self { store }
    }

    pub fn handle(&self, method: &str, path: &str) -> DiagnosticResponse {
        if method != "GET" {
            return not_found();
        }
        match path {
            "/" => DiagnosticResponse {
                status: 200,
                content_type: "text/html",
                body: dashboard_page(),
            },
            "/data" => {
                let latest = self
                    .store
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .latest()
                    .unwrap_or_default();
                DiagnosticResponse {
                    status: 200,
                    content_type: "application/json",
                    body: serde_json::to_string(&latest).unwrap_or_else(|_| "{}".to_string()),
                }
            }
            _ => not_found(),
        }
    }
}

fn not_found() -> DiagnosticResponse {
    DiagnosticResponse {
        status: 404,
        content_type: "text/plain",
        body: "not found".to_string(),
    }
}

fn dashboard_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Warehouse Node</title>
</head>
<body>
<h1>Warehouse Node</h1>
<p>Temperature: <span id="temperature">--</span> &deg;C</p>
<p>Humidity: <span id="humidity">--</span> %</p>
<p>Weight: <span id="weight">--</span> g</p>
<script>
function refresh() {{
  fetch('/data').then(r => r.json()).then(d => {{
    document.getElementById('temperature').textContent = d.temperature.toFixed(1);
    document.getElementById('humidity').textContent = d.humidity.toFixed(1);
    document.getElementById('weight').textContent = d.weight.toFixed(1);
  }});
}}
setInterval(refresh, {refresh_ms});
refresh();
</script>
</body>
</html>"#,
        refresh_ms = 2_000
    )
}
