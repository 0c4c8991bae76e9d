//! 상태 -> 화면 모델 투영.
//!
//! GUI/CLI는 여기서 만든 [`View`]를 그리기만 한다. 같은 입력으로 두 번 투영하면
//! 같은 결과가 나온다.

use std::collections::BTreeMap;

use crate::i18n::{self, keys, Language, Translator};
use crate::model::CalculationRecord;
use crate::session::{FormInput, SessionController, SessionMessage};
use crate::units::RealTimeLength;

/// 번역 테이블로 갱신하는 고정 라벨 키.
pub const STATIC_LABEL_KEYS: &[&str] = &[
    keys::APP_TITLE,
    keys::APP_DESCRIPTION,
    keys::LANGUAGE_LABEL,
    keys::INPUT_PARAMETERS,
    keys::VOLTAGE_LABEL,
    keys::DENSITY_LABEL,
    keys::LENGTH_LABEL,
    keys::LENGTH_UNIT_LABEL,
    keys::PIECES_LABEL,
    keys::CALCULATE_BUTTON,
    keys::REAL_TIME_LENGTH,
    keys::USAGE_TIPS_TITLE,
    keys::RESULTS_TITLE,
    keys::POWER_LABEL,
    keys::CURRENT_LABEL,
    keys::RECOMMENDED_LABEL,
    keys::STANDARD_DRIVER_LABEL,
    keys::TOTAL_LENGTH_LABEL,
    keys::WIRE_GAUGE_LABEL,
    keys::MAX_RUN_LABEL,
    keys::WATT_UNIT,
    keys::AMP_UNIT,
    keys::LENGTH_UNIT,
    keys::METER_UNIT,
    keys::CENTIMETER_UNIT,
    keys::INCH_UNIT,
    keys::FOOT_UNIT,
    keys::SAVE_CALCULATION,
    keys::SAVED_CALCULATIONS,
    keys::DELETE_CALCULATION,
    keys::EDIT_CALCULATION,
    keys::NO_SAVED_CALCULATIONS,
    keys::SAVE_BUTTON,
    keys::CANCEL_BUTTON,
    keys::CALCULATION_NAME,
    keys::LOADING,
    keys::ERROR_NO_CURRENT,
    keys::LEDS_PER_METER,
    keys::CUSTOM_VALUE,
    keys::CLEAR_SAVED,
    keys::EXIT,
];

/// 투영에 필요한 상태 묶음.
pub struct RenderInput<'a> {
    pub translator: &'a Translator,
    pub records: &'a [CalculationRecord],
    pub session: &'a SessionController,
    pub form: &'a FormInput,
    /// 계산 외 작업(언어 전환, 저장)의 알림
    pub notice: Option<&'a SessionMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageIndicator {
    pub language: Language,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub label: String,
    pub value: String,
}

/// 현재 계산 결과 영역. 라벨은 서비스가 준 문구를 그대로 쓴다.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub title: String,
    pub power: ResultRow,
    pub current: ResultRow,
    pub recommended: ResultRow,
    pub standard_driver: ResultRow,
    pub total_length: ResultRow,
    pub wire_gauge: ResultRow,
    pub max_run: ResultRow,
}

impl ResultsView {
    pub fn rows(&self) -> [&ResultRow; 7] {
        [
            &self.power,
            &self.current,
            &self.recommended,
            &self.standard_driver,
            &self.total_length,
            &self.wire_gauge,
            &self.max_run,
        ]
    }
}

/// 저장 목록 한 항목의 요약.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSummary {
    pub index: usize,
    pub name: String,
    pub timestamp: String,
    pub edit_label: String,
    pub delete_label: String,
    pub input_lines: Vec<String>,
    pub result_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SavedListView {
    /// 비어 있을 때 보여줄 안내 문구
    Empty(String),
    Entries(Vec<SavedSummary>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub language: Language,
    labels: BTreeMap<&'static str, String>,
    pub languages: Vec<LanguageIndicator>,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub real_time_length: RealTimeLength,
    pub results: Option<ResultsView>,
    pub saved: SavedListView,
}

impl Default for View {
    /// 첫 화면은 내장 영어 문구로 채운다.
    fn default() -> Self {
        let labels = STATIC_LABEL_KEYS
            .iter()
            .map(|k| (*k, i18n::lookup(k, Language::En).unwrap_or(*k).to_string()))
            .collect();
        let no_saved = i18n::lookup(keys::NO_SAVED_CALCULATIONS, Language::En)
            .unwrap_or_default()
            .to_string();
        Self {
            language: Language::En,
            labels,
            languages: Vec::new(),
            loading: false,
            error: None,
            notice: None,
            real_time_length: FormInput::default().real_time_length(),
            results: None,
            saved: SavedListView::Empty(no_saved),
        }
    }
}

impl View {
    /// 고정 라벨. 등록되지 않은 키면 키 자체를 돌려준다.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        label_of(&self.labels, key)
    }
}

fn label_of<'a>(labels: &'a BTreeMap<&'static str, String>, key: &'a str) -> &'a str {
    labels.get(key).map(String::as_str).unwrap_or(key)
}

fn message_text(tr: &Translator, msg: &SessionMessage) -> String {
    match msg {
        SessionMessage::Text(text) => text.clone(),
        SessionMessage::Key(key) => tr
            .lookup(key)
            .or_else(|| i18n::lookup(key, Language::En))
            .unwrap_or(*key)
            .to_string(),
    }
}

fn results_view(
    record: &CalculationRecord,
    labels: &BTreeMap<&'static str, String>,
) -> ResultsView {
    let r = &record.results;
    let msg = |key: &'static str| -> String {
        r.messages
            .get(key)
            .map(str::to_string)
            .or_else(|| labels.get(key).cloned())
            .unwrap_or_else(|| key.to_string())
    };
    let watt = msg(keys::WATT_UNIT);
    let amp = msg(keys::AMP_UNIT);
    let meter = msg(keys::METER_UNIT);
    let row = |key: &'static str, value: String| ResultRow {
        label: msg(key),
        value,
    };
    ResultsView {
        title: msg(keys::RESULTS_TITLE),
        power: row(keys::POWER_LABEL, format!("{} {watt}", r.power)),
        current: row(keys::CURRENT_LABEL, format!("{} {amp}", r.current)),
        recommended: row(keys::RECOMMENDED_LABEL, format!("{} {amp}", r.recommended)),
        standard_driver: row(keys::STANDARD_DRIVER_LABEL, r.standard_driver_display()),
        total_length: row(
            keys::TOTAL_LENGTH_LABEL,
            format!("{} {meter}", r.total_length_meters),
        ),
        wire_gauge: row(keys::WIRE_GAUGE_LABEL, r.wire_gauge.clone()),
        max_run: row(keys::MAX_RUN_LABEL, format!("{} {meter}", r.max_run)),
    }
}

fn saved_summary(
    index: usize,
    record: &CalculationRecord,
    labels: &BTreeMap<&'static str, String>,
) -> SavedSummary {
    let l = |key: &'static str| label_of(labels, key);
    let inputs = &record.inputs;
    let results = &record.results;
    SavedSummary {
        index,
        name: record.name.clone(),
        timestamp: record.timestamp.clone(),
        edit_label: l(keys::EDIT_CALCULATION).to_string(),
        delete_label: l(keys::DELETE_CALCULATION).to_string(),
        input_lines: vec![
            format!("{}: {}V", l(keys::VOLTAGE_LABEL), inputs.voltage),
            format!("{}: {} LEDs/m", l(keys::DENSITY_LABEL), inputs.density),
            format!(
                "{}: {} {}",
                l(keys::LENGTH_LABEL),
                inputs.length,
                inputs.length_unit.code()
            ),
            format!("{}: {}", l(keys::PIECES_LABEL), inputs.pieces),
        ],
        result_lines: vec![
            format!("{}: {} {}", l(keys::POWER_LABEL), results.power, l(keys::WATT_UNIT)),
            format!("{}: {} {}", l(keys::CURRENT_LABEL), results.current, l(keys::AMP_UNIT)),
            format!(
                "{}: {} {}",
                l(keys::RECOMMENDED_LABEL),
                results.recommended,
                l(keys::AMP_UNIT)
            ),
            format!(
                "{}: {}",
                l(keys::STANDARD_DRIVER_LABEL),
                results.standard_driver_display()
            ),
        ],
    }
}

/// 상태를 화면 모델로 투영한다. 번역이 없는 라벨은 이전 화면의 문구를 유지한다.
pub fn project(input: &RenderInput<'_>, previous: &View) -> View {
    let tr = input.translator;
    let labels: BTreeMap<&'static str, String> = STATIC_LABEL_KEYS
        .iter()
        .map(|k| (*k, tr.text_or(k, previous.label(k))))
        .collect();

    let languages = Language::ALL
        .iter()
        .map(|lang| LanguageIndicator {
            language: *lang,
            label: tr.text_or(lang.name_key(), lang.as_code()),
            active: *lang == tr.language(),
        })
        .collect();

    let results = if input.session.results_visible() && !input.session.is_loading() {
        input.session.current().map(|rec| results_view(rec, &labels))
    } else {
        None
    };

    let saved = if input.records.is_empty() {
        SavedListView::Empty(labels[keys::NO_SAVED_CALCULATIONS].clone())
    } else {
        SavedListView::Entries(
            input
                .records
                .iter()
                .enumerate()
                .map(|(i, rec)| saved_summary(i, rec, &labels))
                .collect(),
        )
    };

    View {
        language: tr.language(),
        languages,
        loading: input.session.is_loading(),
        error: input.session.error().map(|m| message_text(tr, m)),
        notice: input.notice.map(|m| message_text(tr, m)),
        real_time_length: input.form.real_time_length(),
        results,
        saved,
        labels,
    }
}

/// 마지막 화면을 기억하면서 다시 투영한다.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    view: View,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, input: &RenderInput<'_>) -> &View {
        self.view = project(input, &self.view);
        &self.view
    }

    pub fn view(&self) -> &View {
        &self.view
    }
}
