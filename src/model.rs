//! 계산 입력/결과/저장 레코드 데이터 모델.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::i18n::keys;
use crate::units::LengthUnit;

/// 검증을 통과한 계산 입력값.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInputs {
    pub voltage: f64,
    /// LED 밀도 [LEDs/m]
    pub density: u32,
    pub length: f64,
    #[serde(default)]
    pub length_unit: LengthUnit,
    pub pieces: u32,
}

/// 계산 서비스가 내려주는 사전 번역된 결과 라벨.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMessages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watt_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amp_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_length_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_gauge_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_run_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_driver_label: Option<String>,
}

impl ResultMessages {
    /// 번역 키에 해당하는 서비스 라벨을 찾는다.
    pub fn get(&self, key: &str) -> Option<&str> {
        let field = match key {
            keys::RESULTS_TITLE => &self.results_title,
            keys::POWER_LABEL => &self.power_label,
            keys::CURRENT_LABEL => &self.current_label,
            keys::RECOMMENDED_LABEL => &self.recommended_label,
            keys::WATT_UNIT => &self.watt_unit,
            keys::AMP_UNIT => &self.amp_unit,
            keys::LENGTH_UNIT => &self.length_unit,
            keys::TOTAL_LENGTH_LABEL => &self.total_length_label,
            keys::METER_UNIT => &self.meter_unit,
            keys::WIRE_GAUGE_LABEL => &self.wire_gauge_label,
            keys::MAX_RUN_LABEL => &self.max_run_label,
            keys::STANDARD_DRIVER_LABEL => &self.standard_driver_label,
            _ => return None,
        };
        field.as_deref()
    }
}

/// 외부 계산 서비스의 결과 페이로드.
///
/// 알려지지 않은 필드는 `extra`에 그대로 보관해 저장/복원 시 손실이 없게 한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResults {
    /// 전체 소비 전력 [W]
    pub power: f64,
    /// 전류 [A]
    pub current: f64,
    /// 여유율을 포함한 권장 드라이버 전류 [A]
    pub recommended: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_driver: Option<String>,
    pub total_length_meters: f64,
    pub wire_gauge: String,
    /// 전압 강하 기준 최대 배선 길이 [m]
    pub max_run: f64,
    #[serde(default)]
    pub messages: ResultMessages,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CalculationResults {
    /// 표준 드라이버 표시값. 서비스가 주지 않으면 권장 전류를 올림해서 만든다.
    pub fn standard_driver_display(&self) -> String {
        match &self.standard_driver {
            Some(s) if !s.trim().is_empty() => s.clone(),
            _ => format!("{}A", self.recommended.ceil()),
        }
    }
}

/// 저장 목록의 한 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    #[serde(default)]
    pub name: String,
    pub timestamp: String,
    pub inputs: CalculationInputs,
    pub results: CalculationResults,
}

impl CalculationRecord {
    /// 방금 끝난 계산으로 이름 없는 레코드를 만든다.
    pub fn new(inputs: CalculationInputs, results: CalculationResults) -> Self {
        Self {
            name: String::new(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            inputs,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "power": 24.0,
        "current": 2.0,
        "recommended": 2.4,
        "total_length_meters": 5.0,
        "wire_gauge": "22 AWG",
        "max_run": 6.0,
        "standard_driver": "3A",
        "led_count": 300,
        "messages": { "power_label": "Total Power", "watt_unit": "Watts" }
    }"#;

    #[test]
    fn payload_keeps_unknown_fields() {
        let results: CalculationResults = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(results.extra.get("led_count"), Some(&serde_json::json!(300)));
        let again: CalculationResults =
            serde_json::from_str(&serde_json::to_string(&results).unwrap()).unwrap();
        assert_eq!(again, results);
    }

    #[test]
    fn messages_lookup_by_key() {
        let results: CalculationResults = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(results.messages.get(keys::WATT_UNIT), Some("Watts"));
        assert_eq!(results.messages.get(keys::AMP_UNIT), None);
        assert_eq!(results.messages.get(keys::APP_TITLE), None);
    }

    #[test]
    fn standard_driver_falls_back_to_ceiling() {
        let mut results: CalculationResults = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(results.standard_driver_display(), "3A");
        results.standard_driver = None;
        results.recommended = 7.01;
        assert_eq!(results.standard_driver_display(), "8A");
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let results: CalculationResults = serde_json::from_str(PAYLOAD).unwrap();
        let inputs = CalculationInputs {
            voltage: 12.0,
            density: 60,
            length: 5.0,
            length_unit: LengthUnit::Meter,
            pieces: 1,
        };
        let record = CalculationRecord::new(inputs, results);
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
        assert!(record.name.is_empty());
    }
}
