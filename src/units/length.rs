use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::i18n::keys;

/// 스트립 길이 단위. 내부 기준은 미터이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "in")]
    Inch,
    #[serde(rename = "ft")]
    Foot,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 4] = [
        LengthUnit::Meter,
        LengthUnit::Centimeter,
        LengthUnit::Inch,
        LengthUnit::Foot,
    ];

    /// 직렬화/요청에 쓰는 단위 코드(`m`, `cm`, `in`, `ft`).
    pub fn code(&self) -> &'static str {
        match self {
            LengthUnit::Meter => "m",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Inch => "in",
            LengthUnit::Foot => "ft",
        }
    }

    /// 단위 이름의 번역 키.
    pub fn label_key(&self) -> &'static str {
        match self {
            LengthUnit::Meter => keys::METER_UNIT,
            LengthUnit::Centimeter => keys::CENTIMETER_UNIT,
            LengthUnit::Inch => keys::INCH_UNIT,
            LengthUnit::Foot => keys::FOOT_UNIT,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 단위 문자열 해석 오류.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("알 수 없는 단위: {0}")]
    UnknownUnit(String),
}

impl FromStr for LengthUnit {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "meter" | "meters" => Ok(LengthUnit::Meter),
            "cm" | "centimeter" | "centimeters" => Ok(LengthUnit::Centimeter),
            "in" | "inch" | "inches" | "\"" => Ok(LengthUnit::Inch),
            "ft" | "foot" | "feet" | "'" => Ok(LengthUnit::Foot),
            other => Err(ConversionError::UnknownUnit(other.to_string())),
        }
    }
}

/// 길이를 미터로 환산한다.
pub fn to_meters(value: f64, unit: LengthUnit) -> f64 {
    match unit {
        LengthUnit::Meter => value,
        LengthUnit::Centimeter => value / 100.0,
        LengthUnit::Inch => value * 0.0254,
        LengthUnit::Foot => value * 0.3048,
    }
}

/// 스트립 한 개 길이 x 개수로 전체 길이(m)를 구한다.
pub fn total_length_meters(length: f64, unit: LengthUnit, pieces: u32) -> f64 {
    to_meters(length, unit) * f64::from(pieces)
}

/// 입력 폼 옆에 표시하는 실시간 전체 길이 표시.
#[derive(Debug, Clone, PartialEq)]
pub struct RealTimeLength {
    pub meters: f64,
    /// 소수 둘째 자리까지 포맷한 값
    pub display: String,
    /// 미터 단위 한 개짜리 입력이면 숨긴다.
    pub visible: bool,
}

impl RealTimeLength {
    /// 폼의 원시 문자열에서 계산한다. 길이를 못 읽으면 0, 개수를 못 읽으면 1로 본다.
    pub fn from_form(length: &str, unit: LengthUnit, pieces: &str) -> Self {
        let length = length.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0);
        let pieces = pieces
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let meters = total_length_meters(length, unit, pieces);
        Self {
            meters,
            display: format!("{meters:.2}"),
            visible: unit != LengthUnit::Meter || pieces > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_factors() {
        assert!((to_meters(100.0, LengthUnit::Centimeter) - 1.0).abs() < 1e-12);
        assert!((to_meters(1.0, LengthUnit::Foot) - 0.3048).abs() < 1e-12);
        assert!((to_meters(1.0, LengthUnit::Inch) - 0.0254).abs() < 1e-12);
        assert_eq!(to_meters(7.5, LengthUnit::Meter), 7.5);
    }

    #[test]
    fn parse_codes() {
        assert_eq!("cm".parse::<LengthUnit>().unwrap(), LengthUnit::Centimeter);
        assert_eq!(" FT ".parse::<LengthUnit>().unwrap(), LengthUnit::Foot);
        assert!(matches!(
            "yd".parse::<LengthUnit>(),
            Err(ConversionError::UnknownUnit(_))
        ));
    }

    #[test]
    fn unit_serializes_as_code() {
        let json = serde_json::to_string(&LengthUnit::Inch).unwrap();
        assert_eq!(json, "\"in\"");
        let back: LengthUnit = serde_json::from_str("\"ft\"").unwrap();
        assert_eq!(back, LengthUnit::Foot);
    }

    #[test]
    fn real_time_length_visibility() {
        let single_meter = RealTimeLength::from_form("5", LengthUnit::Meter, "1");
        assert!(!single_meter.visible);
        assert_eq!(single_meter.display, "5.00");

        let feet = RealTimeLength::from_form("10", LengthUnit::Foot, "2");
        assert!(feet.visible);
        assert_eq!(feet.display, "6.10");

        let garbage = RealTimeLength::from_form("abc", LengthUnit::Meter, "x");
        assert_eq!(garbage.meters, 0.0);
        assert!(!garbage.visible);
    }
}
