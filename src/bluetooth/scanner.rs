/// Bluetooth Low Energy scanning for the outdoor RuuviTag
use futures_util::StreamExt;
use log::{debug, error, warn};
use tokio::time::{sleep, Duration};

use crate::models::RuuviData;

// RuuviTag protocol constants
const RUUVITAG_MANUFACTURER_ID: u16 = 0x0499; // Ruuvi Innovations Ltd. manufacturer ID
const DATA_FORMAT: u8 = 5; // RuuviTag data format version 5
pub const SCAN_DURATION_SECS: u64 = 20; // How long to actively scan for devices

// Format 5 marks a quantity the sensor could not measure with these raw values
const INVALID_TEMPERATURE: i16 = i16::MIN;
const INVALID_UNSIGNED: u16 = u16::MAX;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Decode the weather part of a RuuviTag format 5 advertisement
///
/// Payload layout (24 bytes, big endian):
/// - Byte 0: Data format (5)
/// - Bytes 1-2: Temperature (signed, 0.005°C resolution)
/// - Bytes 3-4: Humidity (unsigned, 0.0025% resolution)
/// - Bytes 5-6: Pressure (unsigned, +50000 Pa offset, 1 Pa resolution)
/// - Bytes 7-23: acceleration, battery, counters and MAC (not used)
///
/// Returns None if the payload is not format 5.
pub fn decode_ruuvi_data(data: &[u8]) -> Option<RuuviData> {
    if data.len() != 24 || data[0] != DATA_FORMAT {
        if !data.is_empty() {
            warn!(
                "Invalid RuuviTag data: len={}, format={}",
                data.len(),
                data[0]
            );
        }
        return None;
    }

    let raw_temperature = i16::from_be_bytes([data[1], data[2]]);
    let raw_humidity = u16::from_be_bytes([data[3], data[4]]);
    let raw_pressure = u16::from_be_bytes([data[5], data[6]]);

    let temperature = (raw_temperature != INVALID_TEMPERATURE)
        .then(|| round2(f64::from(raw_temperature) * 0.005));
    // Humidity is capped at 100%
    let humidity = (raw_humidity != INVALID_UNSIGNED)
        .then(|| round2((f64::from(raw_humidity) * 0.0025).min(100.0)));
    // Pressure converted from Pa to hPa
    let pressure = (raw_pressure != INVALID_UNSIGNED)
        .then(|| round2((f64::from(raw_pressure) + 50000.0) / 100.0));

    Some(RuuviData {
        temperature,
        humidity,
        pressure,
    })
}

/// Scan for the configured RuuviTag and decode its latest advertisement
///
/// Discovery runs for a fixed duration, after which the tag's manufacturer
/// data is read. Returns Ok(None) if the tag was not heard during the scan.
pub async fn scan_for_ruuvitag(
    tag_mac: &str,
) -> Result<Option<RuuviData>, Box<dyn std::error::Error + Send + Sync>> {
    // Initialize Bluetooth session
    let session = match bluer::Session::new().await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create Bluetooth session: {}", e);
            return Err(e.into());
        }
    };

    let adapter = match session.default_adapter().await {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to get default Bluetooth adapter: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = adapter.set_powered(true).await {
        error!("Failed to power on adapter: {}", e);
        return Err(e.into());
    }

    // Low Energy devices only
    let filter = bluer::DiscoveryFilter {
        transport: bluer::DiscoveryTransport::Le,
        duplicate_data: false,
        ..Default::default()
    };

    if let Err(e) = adapter.set_discovery_filter(filter).await {
        warn!("Failed to set discovery filter: {}", e);
    }

    let discovery_handle = match adapter.discover_devices().await {
        Ok(discovery_stream) => tokio::spawn(async move {
            let mut stream = discovery_stream;
            while let Some(event) = stream.next().await {
                debug!("Discovery event: {:?}", event);
            }
        }),
        Err(e) => {
            error!("Failed to start device discovery: {}", e);
            return Err(e.into());
        }
    };

    sleep(Duration::from_secs(SCAN_DURATION_SECS)).await;
    discovery_handle.abort();

    let devices = match adapter.device_addresses().await {
        Ok(devices) => devices,
        Err(e) => {
            error!("Failed to get device addresses: {}", e);
            return Err(e.into());
        }
    };

    for addr in devices {
        if addr.to_string().to_uppercase() != tag_mac {
            continue;
        }
        let device = adapter.device(addr)?;

        match device.manufacturer_data().await {
            Ok(Some(manufacturer_data)) => {
                if let Some(payload) = manufacturer_data.get(&RUUVITAG_MANUFACTURER_ID) {
                    let reading = decode_ruuvi_data(payload);
                    if let Some(ref data) = reading {
                        debug!(
                            "Received data from {}: temp={:?}°C, humidity={:?}%, pressure={:?} hPa",
                            tag_mac, data.temperature, data.humidity, data.pressure
                        );
                    }
                    return Ok(reading);
                }
            }
            Ok(None) => debug!("No manufacturer data for {}", tag_mac),
            Err(e) => debug!("Failed to get manufacturer data for {}: {}", tag_mac, e),
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn decodes_reference_payload() {
        let payload = hex("0512FC5394C37C0004FFFC040CAC364200CDCBB8334C884F");
        let data = decode_ruuvi_data(&payload).unwrap();
        assert_eq!(data.temperature, Some(24.3));
        assert_eq!(data.humidity, Some(53.49));
        assert_eq!(data.pressure, Some(1000.44));
    }

    #[test]
    fn invalid_markers_are_absent() {
        let payload = hex("058000FFFFFFFF800080008000000000FFFFFFFFFFFFFFFF");
        let data = decode_ruuvi_data(&payload).unwrap();
        assert_eq!(data.temperature, None);
        assert_eq!(data.humidity, None);
        assert_eq!(data.pressure, None);
    }

    #[test]
    fn rejects_other_formats() {
        let format_3 = hex("0312FC5394C37C0004FFFC040CAC364200CDCBB8334C884F");
        assert!(decode_ruuvi_data(&format_3).is_none());
        assert!(decode_ruuvi_data(&[5, 1, 2]).is_none());
        assert!(decode_ruuvi_data(&[]).is_none());
    }
}
