//! 단위 정의 및 변환 모듈.

pub mod length;

pub use length::{to_meters, total_length_meters, ConversionError, LengthUnit, RealTimeLength};
