use std::collections::HashMap;
use std::fs;
use std::path::Path;
use sys_locale::get_locale;

/// 문자열 키를 모아두는 네임스페이스.
pub mod keys {
    pub const APP_TITLE: &str = "app_title";
    pub const APP_DESCRIPTION: &str = "app_description";
    pub const LANGUAGE_LABEL: &str = "language_label";
    pub const ENGLISH: &str = "english";
    pub const HINDI: &str = "hindi";

    pub const INPUT_PARAMETERS: &str = "input_parameters";
    pub const VOLTAGE_LABEL: &str = "voltage_label";
    pub const DENSITY_LABEL: &str = "density_label";
    pub const LENGTH_LABEL: &str = "length_label";
    pub const LENGTH_UNIT_LABEL: &str = "length_unit_label";
    pub const PIECES_LABEL: &str = "pieces_label";
    pub const CALCULATE_BUTTON: &str = "calculate_button";
    pub const REAL_TIME_LENGTH: &str = "real_time_length";
    pub const USAGE_TIPS_TITLE: &str = "usage_tips_title";

    pub const RESULTS_TITLE: &str = "results_title";
    pub const POWER_LABEL: &str = "power_label";
    pub const CURRENT_LABEL: &str = "current_label";
    pub const RECOMMENDED_LABEL: &str = "recommended_label";
    pub const STANDARD_DRIVER_LABEL: &str = "standard_driver_label";
    pub const TOTAL_LENGTH_LABEL: &str = "total_length_label";
    pub const WIRE_GAUGE_LABEL: &str = "wire_gauge_label";
    pub const MAX_RUN_LABEL: &str = "max_run_label";

    pub const WATT_UNIT: &str = "watt_unit";
    pub const AMP_UNIT: &str = "amp_unit";
    pub const LENGTH_UNIT: &str = "length_unit";
    pub const METER_UNIT: &str = "meter_unit";
    pub const CENTIMETER_UNIT: &str = "centimeter_unit";
    pub const INCH_UNIT: &str = "inch_unit";
    pub const FOOT_UNIT: &str = "foot_unit";

    pub const SAVE_CALCULATION: &str = "save_calculation";
    pub const SAVED_CALCULATIONS: &str = "saved_calculations";
    pub const DELETE_CALCULATION: &str = "delete_calculation";
    pub const EDIT_CALCULATION: &str = "edit_calculation";
    pub const NO_SAVED_CALCULATIONS: &str = "no_saved_calculations";
    pub const SAVE_BUTTON: &str = "save_button";
    pub const CANCEL_BUTTON: &str = "cancel_button";
    pub const CALCULATION_NAME: &str = "calculation_name";

    pub const ERROR_FILL_ALL_FIELDS: &str = "error_fill_all_fields";
    pub const ERROR_VALUES_POSITIVE: &str = "error_values_positive";
    pub const ERROR_WHOLE_NUMBER: &str = "error_whole_number";
    pub const ERROR_VALUE_TOO_LARGE: &str = "error_value_too_large";
    pub const ERROR_CALCULATION_FAILED: &str = "error_calculation_failed";
    pub const ERROR_LANGUAGE_SWITCH_FAILED: &str = "error_language_switch_failed";
    pub const ERROR_NO_CURRENT: &str = "error_no_current";
    pub const LOADING: &str = "loading";
    pub const LEDS_PER_METER: &str = "leds_per_meter";
    pub const CUSTOM_VALUE: &str = "custom_value";
    pub const CLEAR_SAVED: &str = "clear_saved";
    pub const EXIT: &str = "exit";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Hi];

    /// 언어 코드(en, hi, en-US, hi_IN 등)를 해석한다. 지원하지 않으면 None.
    pub fn from_code(code: &str) -> Option<Self> {
        let base = code
            .trim()
            .split(['.', '_', '-'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match base.as_str() {
            "en" => Some(Language::En),
            "hi" => Some(Language::Hi),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }

    /// 언어 선택 버튼에 쓰는 이름 키.
    pub fn name_key(&self) -> &'static str {
        match self {
            Language::En => keys::ENGLISH,
            Language::Hi => keys::HINDI,
        }
    }
}

/// 내장 번역 테이블을 조회한다. 키나 언어가 없으면 None.
pub fn lookup(key: &str, lang: Language) -> Option<&'static str> {
    match lang {
        Language::En => en(key),
        Language::Hi => hi(key),
    }
}

/// 런타임 언어 번들을 제공한다.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    lang: Language,
    overrides: Option<HashMap<String, String>>,
}

impl Translator {
    pub fn new(lang: Language) -> Self {
        Self {
            lang,
            overrides: None,
        }
    }

    /// 언어 + 언어팩 디렉터리를 받아서 번역기를 생성한다.
    /// 디렉터리가 없거나 파일이 없으면 내장 문자열만 사용한다.
    pub fn new_with_pack(lang: Language, pack_dir: Option<&str>) -> Self {
        let overrides = pack_dir
            .and_then(|dir| load_overrides(dir, lang))
            .or_else(|| load_overrides("locales", lang));
        Self { lang, overrides }
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    pub fn language_code(&self) -> &'static str {
        self.lang.as_code()
    }

    /// 언어팩, 내장 테이블 순으로 키를 조회한다.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.overrides
            .as_ref()
            .and_then(|m| m.get(key))
            .map(String::as_str)
            .or_else(|| lookup(key, self.lang))
    }

    /// 번역이 없으면 기존 문자열을 그대로 돌려준다.
    pub fn text_or(&self, key: &str, prior: &str) -> String {
        self.lookup(key).unwrap_or(prior).to_string()
    }
}

/// CLI 플래그/설정/시스템 순으로 언어를 결정한다.
pub fn resolve_language(cli_arg: &str, config_lang: Option<&str>) -> Language {
    normalize_lang(cli_arg)
        .or_else(|| config_lang.and_then(normalize_lang))
        .or_else(detect_system_language)
        .unwrap_or_default()
}

fn normalize_lang(code: &str) -> Option<Language> {
    match code.trim().to_lowercase().as_str() {
        "auto" | "" => None,
        other => Language::from_code(other),
    }
}

/// 시스템 로케일에서 언어를 추정한다.
pub fn detect_system_language() -> Option<Language> {
    if let Some(lang) = get_locale().as_deref().and_then(Language::from_code) {
        return Some(lang);
    }
    ["LANG", "LC_ALL"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|v| Language::from_code(&v))
}

/// TOML 기반 언어팩을 로드한다. 형식: key = "value" 로 구성된 플랫 맵.
fn load_overrides(dir: &str, lang: Language) -> Option<HashMap<String, String>> {
    let path = Path::new(dir).join(format!("{}.toml", lang.as_code()));
    let content = fs::read_to_string(&path).ok()?;
    let map = parse_toml_to_map(&content);
    if map.is_none() {
        tracing::warn!(path = %path.display(), "language pack is empty or malformed");
    }
    map
}

fn parse_toml_to_map(src: &str) -> Option<HashMap<String, String>> {
    let value: toml::Value = toml::from_str(src).ok()?;
    let table = value.as_table()?;
    let mut map = HashMap::new();

    fn walk(prefix: &str, val: &toml::Value, out: &mut HashMap<String, String>) {
        match val {
            toml::Value::String(s) => {
                out.insert(prefix.to_string(), s.to_string());
            }
            toml::Value::Table(t) => {
                for (k, v) in t {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    walk(&key, v, out);
                }
            }
            _ => {}
        }
    }

    for (k, v) in table {
        walk(k, v, &mut map);
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn en(key: &str) -> Option<&'static str> {
    use keys::*;
    Some(match key {
        APP_TITLE => "LED Driver Calculator",
        APP_DESCRIPTION => "Calculate power requirements for LED strips",
        LANGUAGE_LABEL => "Language",
        ENGLISH => "English",
        HINDI => "Hindi",
        INPUT_PARAMETERS => "Input Parameters",
        VOLTAGE_LABEL => "Voltage (V)",
        DENSITY_LABEL => "LED Density (LEDs/m)",
        LENGTH_LABEL => "Strip Length",
        LENGTH_UNIT_LABEL => "Length Unit",
        PIECES_LABEL => "Number of Strips",
        CALCULATE_BUTTON => "Calculate",
        REAL_TIME_LENGTH => "Total Length in Meters",
        USAGE_TIPS_TITLE => "Usage Tips",
        RESULTS_TITLE => "Calculation Results",
        POWER_LABEL => "Total Power",
        CURRENT_LABEL => "Current Draw",
        RECOMMENDED_LABEL => "Recommended Driver",
        STANDARD_DRIVER_LABEL => "Standard Driver",
        TOTAL_LENGTH_LABEL => "Total Length",
        WIRE_GAUGE_LABEL => "Recommended Wire",
        MAX_RUN_LABEL => "Maximum Run Length",
        WATT_UNIT => "Watts",
        AMP_UNIT => "Amps",
        LENGTH_UNIT => "Unit",
        METER_UNIT => "meters",
        CENTIMETER_UNIT => "centimeters",
        INCH_UNIT => "inches",
        FOOT_UNIT => "feet",
        SAVE_CALCULATION => "Save Calculation",
        SAVED_CALCULATIONS => "Saved Calculations",
        DELETE_CALCULATION => "Delete",
        EDIT_CALCULATION => "Edit",
        NO_SAVED_CALCULATIONS => "No saved calculations yet",
        SAVE_BUTTON => "Save",
        CANCEL_BUTTON => "Cancel",
        CALCULATION_NAME => "Calculation Name",
        ERROR_FILL_ALL_FIELDS => "Please fill in all fields",
        ERROR_VALUES_POSITIVE => "Values must be greater than zero",
        ERROR_WHOLE_NUMBER => "LED density and number of strips must be whole numbers",
        ERROR_VALUE_TOO_LARGE => "LED density or number of strips is too large",
        ERROR_CALCULATION_FAILED => "Failed to calculate. Please try again.",
        ERROR_LANGUAGE_SWITCH_FAILED => "Failed to switch language",
        ERROR_NO_CURRENT => "Run a calculation before saving",
        LOADING => "Calculating...",
        LEDS_PER_METER => "LEDs/m",
        CUSTOM_VALUE => "Custom",
        CLEAR_SAVED => "Clear all",
        EXIT => "Exit",
        _ => return None,
    })
}

fn hi(key: &str) -> Option<&'static str> {
    use keys::*;
    Some(match key {
        APP_TITLE => "एलईडी ड्राइवर कैलकुलेटर",
        APP_DESCRIPTION => "एलईडी स्ट्रिप्स के लिए पावर आवश्यकताओं की गणना करें",
        LANGUAGE_LABEL => "भाषा",
        ENGLISH => "अंग्रेज़ी",
        HINDI => "हिन्दी",
        INPUT_PARAMETERS => "इनपुट पैरामीटर",
        VOLTAGE_LABEL => "वोल्टेज (V)",
        DENSITY_LABEL => "एलईडी घनत्व (एलईडी/मी)",
        LENGTH_LABEL => "स्ट्रिप लंबाई",
        LENGTH_UNIT_LABEL => "लंबाई इकाई",
        PIECES_LABEL => "स्ट्रिप्स की संख्या",
        CALCULATE_BUTTON => "गणना करें",
        REAL_TIME_LENGTH => "मीटर में कुल लंबाई",
        USAGE_TIPS_TITLE => "उपयोग के टिप्स",
        RESULTS_TITLE => "गणना परिणाम",
        POWER_LABEL => "कुल वाटेज",
        CURRENT_LABEL => "विद्युत धारा",
        RECOMMENDED_LABEL => "अनुशंसित ड्राइवर",
        STANDARD_DRIVER_LABEL => "मानक ड्राइवर",
        TOTAL_LENGTH_LABEL => "कुल लंबाई",
        WIRE_GAUGE_LABEL => "अनुशंसित तार",
        MAX_RUN_LABEL => "अधिकतम रन लंबाई",
        WATT_UNIT => "वाट",
        AMP_UNIT => "एम्पियर",
        LENGTH_UNIT => "इकाई",
        METER_UNIT => "मीटर",
        CENTIMETER_UNIT => "सेंटीमीटर",
        INCH_UNIT => "इंच",
        FOOT_UNIT => "फीट",
        SAVE_CALCULATION => "गणना सहेजें",
        SAVED_CALCULATIONS => "सहेजी गई गणनाएँ",
        DELETE_CALCULATION => "हटाएँ",
        EDIT_CALCULATION => "संपादित करें",
        NO_SAVED_CALCULATIONS => "अभी तक कोई गणना सहेजी नहीं गई",
        SAVE_BUTTON => "सहेजें",
        CANCEL_BUTTON => "रद्द करें",
        CALCULATION_NAME => "गणना का नाम",
        ERROR_FILL_ALL_FIELDS => "कृपया सभी फ़ील्ड भरें",
        ERROR_VALUES_POSITIVE => "मान शून्य से अधिक होने चाहिए",
        ERROR_WHOLE_NUMBER => "एलईडी घनत्व और स्ट्रिप्स की संख्या पूर्ण संख्या होनी चाहिए",
        ERROR_VALUE_TOO_LARGE => "एलईडी घनत्व या स्ट्रिप्स की संख्या बहुत बड़ी है",
        ERROR_CALCULATION_FAILED => "गणना विफल रही। कृपया पुनः प्रयास करें।",
        ERROR_LANGUAGE_SWITCH_FAILED => "भाषा बदलने में विफल",
        ERROR_NO_CURRENT => "सहेजने से पहले गणना करें",
        LOADING => "गणना हो रही है...",
        LEDS_PER_METER => "एलईडी/मी",
        CUSTOM_VALUE => "कस्टम",
        CLEAR_SAVED => "सभी हटाएँ",
        EXIT => "बाहर निकलें",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_hits_and_misses() {
        assert_eq!(lookup(keys::POWER_LABEL, Language::En), Some("Total Power"));
        assert_eq!(lookup(keys::POWER_LABEL, Language::Hi), Some("कुल वाटेज"));
        assert_eq!(lookup("no.such.key", Language::Hi), None);
    }

    #[test]
    fn every_english_key_has_hindi() {
        let extra = [
            keys::ENGLISH,
            keys::HINDI,
            keys::ERROR_FILL_ALL_FIELDS,
            keys::ERROR_VALUES_POSITIVE,
            keys::ERROR_WHOLE_NUMBER,
            keys::ERROR_VALUE_TOO_LARGE,
            keys::ERROR_CALCULATION_FAILED,
            keys::ERROR_LANGUAGE_SWITCH_FAILED,
        ];
        for key in crate::render::STATIC_LABEL_KEYS.iter().copied().chain(extra) {
            assert!(lookup(key, Language::En).is_some(), "{key}");
            assert!(lookup(key, Language::Hi).is_some(), "{key}");
        }
    }

    #[test]
    fn text_or_keeps_prior_on_miss() {
        let tr = Translator::new(Language::Hi);
        assert_eq!(tr.text_or("missing", "previous"), "previous");
        assert_eq!(tr.text_or(keys::SAVE_BUTTON, "Save"), "सहेजें");
    }

    #[test]
    fn language_codes() {
        assert_eq!(Language::from_code("hi_IN.UTF-8"), Some(Language::Hi));
        assert_eq!(Language::from_code("EN-us"), Some(Language::En));
        assert_eq!(Language::from_code("ko"), None);
        assert_eq!(resolve_language("hi", Some("en")), Language::Hi);
        assert_eq!(resolve_language("auto", Some("hi")), Language::Hi);
    }

    #[test]
    fn nested_pack_is_flattened() {
        let map = parse_toml_to_map("power_label = \"Power\"\n[gui]\ntitle = \"T\"\n").unwrap();
        assert_eq!(map.get("power_label").map(String::as_str), Some("Power"));
        assert_eq!(map.get("gui.title").map(String::as_str), Some("T"));
        assert!(parse_toml_to_map("not = [valid").is_none());
    }

    #[test]
    fn pack_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.toml"), "power_label = \"Wattage\"\n").unwrap();
        let tr = Translator::new_with_pack(Language::En, dir.path().to_str());
        assert_eq!(tr.lookup(keys::POWER_LABEL), Some("Wattage"));
        assert_eq!(tr.lookup(keys::AMP_UNIT), Some("Amps"));
    }
}
