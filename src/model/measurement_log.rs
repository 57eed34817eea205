/*!
 * The application's measurement log
 */

use crate::error::Result;
use crate::proxy::{Proxy, RemoteClass, Wrapper};
use psbridge_dispatch::Variant;
use std::path::Path;

/// Measurements recorded by the measure tools
#[derive(Debug, Clone)]
pub struct MeasurementLog {
    proxy: Proxy,
}

impl MeasurementLog {
    /// Write measurements to a file
    ///
    /// `range` selects which measurements (all when `None`); `data_points` names the
    /// columns to export, all of them when empty.
    pub fn export_measurements(
        &self,
        path: &Path,
        range: Option<i64>,
        data_points: &[&str],
    ) -> Result<()> {
        let columns = data_points.iter().map(|&point| Variant::from(point)).collect();
        self.proxy.call(
            "exportMeasurements",
            &[
                Variant::from(path.to_string_lossy().into_owned()),
                Variant::from(range),
                Variant::Array(columns),
            ],
        )
    }

    pub fn delete_measurements(&self, range: Option<i64>) -> Result<()> {
        self.proxy
            .call("deleteMeasurements", &[Variant::from(range)])
    }
}

impl Wrapper for MeasurementLog {
    fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

impl RemoteClass for MeasurementLog {
    fn from_proxy(proxy: Proxy) -> Self {
        Self { proxy }
    }
}
