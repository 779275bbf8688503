use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::{error, info};

/// 传感器上报数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    pub device_id: String,
    pub sensor_type: String,
    pub value: f64,
    /// 毫秒时间戳
    pub timestamp: i64,
}

/// 支持的传感器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorType {
    Temperature,
    Humidity,
    Pressure,
}

impl SensorType {
    /// 不区分大小写解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "TEMPERATURE" => Some(SensorType::Temperature),
            "HUMIDITY" => Some(SensorType::Humidity),
            "PRESSURE" => Some(SensorType::Pressure),
            _ => None,
        }
    }

    /// 合法取值范围（含端点）
    pub fn valid_range(&self) -> RangeInclusive<f64> {
        match self {
            SensorType::Temperature => -40.0..=125.0,
            SensorType::Humidity => 0.0..=100.0,
            // hPa
            SensorType::Pressure => 800.0..=1200.0,
        }
    }
}

/// 传感器数据处理器，目前只校验并记录日志
#[derive(Debug, Default, Clone)]
pub struct SensorProcessor;

impl SensorProcessor {
    pub fn new() -> Self {
        Self
    }

    /// 处理一条读数，返回是否接受
    pub fn process(&self, reading: &SensorReading) -> bool {
        if !Self::is_valid(reading) {
            error!(
                device_id = %reading.device_id,
                sensor_type = %reading.sensor_type,
                value = reading.value,
                timestamp = reading.timestamp,
                "Invalid sensor data received"
            );
            return false;
        }

        info!(
            device_id = %reading.device_id,
            sensor_type = %reading.sensor_type,
            value = reading.value,
            timestamp = reading.timestamp,
            "Processing sensor data"
        );
        true
    }

    fn is_valid(reading: &SensorReading) -> bool {
        if reading.device_id.is_empty() || reading.sensor_type.is_empty() || reading.timestamp <= 0 {
            return false;
        }

        SensorType::parse(&reading.sensor_type)
            .map(|t| t.valid_range().contains(&reading.value))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(sensor_type: &str, value: f64) -> SensorReading {
        SensorReading {
            device_id: "dev-001".to_string(),
            sensor_type: sensor_type.to_string(),
            value,
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_range_boundaries() {
        let processor = SensorProcessor::new();

        assert!(processor.process(&reading("TEMPERATURE", -40.0)));
        assert!(processor.process(&reading("TEMPERATURE", 125.0)));
        assert!(!processor.process(&reading("TEMPERATURE", 125.1)));
        assert!(processor.process(&reading("humidity", 0.0)));
        assert!(!processor.process(&reading("humidity", 100.5)));
        assert!(processor.process(&reading("Pressure", 1013.25)));
        assert!(!processor.process(&reading("PRESSURE", 799.9)));
    }

    #[test]
    fn test_unknown_sensor_type() {
        let processor = SensorProcessor::new();
        assert!(!processor.process(&reading("VOLTAGE", 3.3)));
    }

    #[test]
    fn test_required_fields() {
        let processor = SensorProcessor::new();

        let mut r = reading("TEMPERATURE", 20.0);
        r.device_id.clear();
        assert!(!processor.process(&r));

        let mut r = reading("TEMPERATURE", 20.0);
        r.timestamp = 0;
        assert!(!processor.process(&r));

        assert!(!processor.process(&reading("", 20.0)));
    }

    #[test]
    fn test_nan_rejected() {
        let processor = SensorProcessor::new();
        assert!(!processor.process(&reading("HUMIDITY", f64::NAN)));
    }
}
