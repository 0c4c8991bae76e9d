//! LED 스트립 드라이버 계산기 클라이언트. 입력 검증, 저장 목록, 화면 모델을 라이브러리로
//! 분리하여 CLI와 GUI가 같은 상태 머신을 공유한다.

pub mod app;
pub mod client;
pub mod config;
pub mod i18n;
pub mod model;
pub mod render;
pub mod session;
pub mod store;
pub mod ui_cli;
pub mod units;
