use std::io::{self, Write};

use crate::app::{AppError, Calculator, DENSITY_PRESETS, VOLTAGE_PRESETS};
use crate::client::{ComputationService, LanguageService};
use crate::i18n::{keys, Language};
use crate::render::{SavedListView, View};
use crate::store::KeyValueStore;
use crate::units::LengthUnit;

/// 메인 메뉴 선택지를 표현한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Calculate,
    SaveCurrent,
    ListSaved,
    LoadSaved,
    DeleteSaved,
    ClearSaved,
    Language,
    Exit,
}

/// 메인 메뉴를 표시하고 선택값을 반환한다. 입력이 끝나면 종료로 본다.
pub fn main_menu<C, L, S>(calc: &mut Calculator<C, L, S>) -> Result<MenuChoice, AppError>
where
    C: ComputationService + Send + Sync + 'static,
    L: LanguageService,
    S: KeyValueStore,
{
    let view = calc.render();
    println!("\n=== {} ===", view.label(keys::APP_TITLE));
    println!("1) {}", view.label(keys::CALCULATE_BUTTON));
    println!("2) {}", view.label(keys::SAVE_CALCULATION));
    println!("3) {}", view.label(keys::SAVED_CALCULATIONS));
    println!("4) {}", view.label(keys::EDIT_CALCULATION));
    println!("5) {}", view.label(keys::DELETE_CALCULATION));
    println!("6) {}", view.label(keys::CLEAR_SAVED));
    println!("7) {}", view.label(keys::LANGUAGE_LABEL));
    println!("0) {}", view.label(keys::EXIT));
    loop {
        let sel = match read_line("> ") {
            Ok(s) => s,
            Err(AppError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Ok(MenuChoice::Exit)
            }
            Err(e) => return Err(e),
        };
        match sel.trim() {
            "1" => return Ok(MenuChoice::Calculate),
            "2" => return Ok(MenuChoice::SaveCurrent),
            "3" => return Ok(MenuChoice::ListSaved),
            "4" => return Ok(MenuChoice::LoadSaved),
            "5" => return Ok(MenuChoice::DeleteSaved),
            "6" => return Ok(MenuChoice::ClearSaved),
            "7" => return Ok(MenuChoice::Language),
            "0" => return Ok(MenuChoice::Exit),
            _ => println!("?"),
        }
    }
}

/// 폼 입력을 받아 계산을 실행하고 결과를 출력한다.
pub fn handle_calculate<C, L, S>(calc: &mut Calculator<C, L, S>) -> Result<(), AppError>
where
    C: ComputationService + Send + Sync + 'static,
    L: LanguageService,
    S: KeyValueStore,
{
    let view = calc.render().clone();
    println!("\n-- {} --", view.label(keys::INPUT_PARAMETERS));
    let presets = VOLTAGE_PRESETS.map(|v| v.to_string()).join("/");
    let form = calc.form().clone();
    let voltage = prompt_with_default(
        &format!("{} ({presets})", view.label(keys::VOLTAGE_LABEL)),
        &form.voltage,
    )?;
    let densities = DENSITY_PRESETS.map(|d| d.to_string()).join("/");
    let density = prompt_with_default(
        &format!("{} ({densities})", view.label(keys::DENSITY_LABEL)),
        &form.density,
    )?;
    let length = prompt_with_default(view.label(keys::LENGTH_LABEL), &form.length)?;
    let unit = loop {
        let codes: Vec<_> = LengthUnit::ALL.iter().map(LengthUnit::code).collect();
        let raw = prompt_with_default(
            &format!("{} ({})", view.label(keys::LENGTH_UNIT_LABEL), codes.join("/")),
            form.length_unit.code(),
        )?;
        match raw.parse::<LengthUnit>() {
            Ok(unit) => break unit,
            Err(e) => println!("{e}"),
        }
    };
    let pieces = prompt_with_default(view.label(keys::PIECES_LABEL), &form.pieces)?;

    let form = calc.form_mut();
    form.voltage = voltage;
    form.density = density;
    form.length = length;
    form.length_unit = unit;
    form.pieces = pieces;

    let rt = calc.form().real_time_length();
    if rt.visible {
        println!(
            "{}: {} {}",
            view.label(keys::REAL_TIME_LENGTH),
            rt.display,
            view.label(keys::METER_UNIT)
        );
    }
    println!("{}", view.label(keys::LOADING));
    // 검증 오류는 화면 모델의 error로 보여준다.
    let _ = calc.submit_blocking();
    print_outcome(calc.render());
    Ok(())
}

fn print_outcome(view: &View) {
    if let Some(err) = &view.error {
        println!("! {err}");
        return;
    }
    if let Some(results) = &view.results {
        println!("\n-- {} --", results.title);
        for row in results.rows() {
            println!("{}: {}", row.label, row.value);
        }
    }
}

/// 현재 계산을 이름을 받아 저장한다.
pub fn handle_save<C, L, S>(calc: &mut Calculator<C, L, S>) -> Result<(), AppError>
where
    C: ComputationService + Send + Sync + 'static,
    L: LanguageService,
    S: KeyValueStore,
{
    let view = calc.render().clone();
    if calc.session().current().is_none() {
        println!("! {}", view.label(keys::ERROR_NO_CURRENT));
        return Ok(());
    }
    let name = read_line(&format!("{}: ", view.label(keys::CALCULATION_NAME)))?;
    if let Some(index) = recover(calc.save_current(&name))?.flatten() {
        if let Some(record) = calc.store().get(index) {
            println!("{}: {}", view.label(keys::SAVE_BUTTON), record.name);
        }
    }
    Ok(())
}

/// 저장 목록을 출력한다.
pub fn handle_list<C, L, S>(calc: &mut Calculator<C, L, S>)
where
    C: ComputationService + Send + Sync + 'static,
    L: LanguageService,
    S: KeyValueStore,
{
    let view = calc.render();
    println!("\n-- {} --", view.label(keys::SAVED_CALCULATIONS));
    match &view.saved {
        SavedListView::Empty(msg) => println!("{msg}"),
        SavedListView::Entries(entries) => {
            for entry in entries {
                println!("[{}] {}  ({})", entry.index + 1, entry.name, entry.timestamp);
                for line in entry.input_lines.iter().chain(&entry.result_lines) {
                    println!("    {line}");
                }
            }
        }
    }
}

/// 저장된 입력값을 폼으로 불러온다.
pub fn handle_load<C, L, S>(calc: &mut Calculator<C, L, S>) -> Result<(), AppError>
where
    C: ComputationService + Send + Sync + 'static,
    L: LanguageService,
    S: KeyValueStore,
{
    handle_list(calc);
    let Some(index) = read_index()? else {
        return Ok(());
    };
    if calc.load_into_form(index) {
        let form = calc.form().clone();
        let view = calc.render();
        println!("{}: {}", view.label(keys::VOLTAGE_LABEL), form.voltage);
        println!("{}: {}", view.label(keys::DENSITY_LABEL), form.density);
        println!(
            "{}: {} {}",
            view.label(keys::LENGTH_LABEL),
            form.length,
            form.length_unit
        );
        println!("{}: {}", view.label(keys::PIECES_LABEL), form.pieces);
    }
    Ok(())
}

/// 저장 항목을 위치로 삭제한다.
pub fn handle_delete<C, L, S>(calc: &mut Calculator<C, L, S>) -> Result<(), AppError>
where
    C: ComputationService + Send + Sync + 'static,
    L: LanguageService,
    S: KeyValueStore,
{
    handle_list(calc);
    let Some(index) = read_index()? else {
        return Ok(());
    };
    if let Some(removed) = recover(calc.delete(index))?.flatten() {
        println!("- {}", removed.name);
    }
    Ok(())
}

/// 저장 목록을 모두 비운다.
pub fn handle_clear<C, L, S>(calc: &mut Calculator<C, L, S>) -> Result<(), AppError>
where
    C: ComputationService + Send + Sync + 'static,
    L: LanguageService,
    S: KeyValueStore,
{
    let label = calc.render().label(keys::CLEAR_SAVED).to_string();
    let answer = read_line(&format!("{label}? (y/N): "))?;
    if answer.trim().eq_ignore_ascii_case("y") {
        recover(calc.clear_saved())?;
    }
    Ok(())
}

/// 언어를 바꾼다. 바뀌었으면 true.
pub fn handle_language<C, L, S>(calc: &mut Calculator<C, L, S>) -> Result<bool, AppError>
where
    C: ComputationService + Send + Sync + 'static,
    L: LanguageService,
    S: KeyValueStore,
{
    let view = calc.render();
    println!("\n-- {} --", view.label(keys::LANGUAGE_LABEL));
    for (i, indicator) in view.languages.iter().enumerate() {
        let mark = if indicator.active { "*" } else { " " };
        println!("{mark}{}) {}", i + 1, indicator.label);
    }
    let sel = read_line("> ")?;
    let lang = match sel.trim() {
        "1" => Language::En,
        "2" => Language::Hi,
        _ => return Ok(false),
    };
    if lang == calc.language() {
        return Ok(false);
    }
    match calc.switch_language(lang) {
        Ok(()) => Ok(true),
        Err(AppError::Service(_)) => {
            if let Some(notice) = &calc.render().notice {
                println!("! {notice}");
            }
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// 저장/설정 오류는 출력하고 세션을 이어간다. 입출력(표준 입력) 오류만 올려보낸다.
pub(crate) fn recover<T>(result: Result<T, AppError>) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AppError::Io(e)) => Err(AppError::Io(e)),
        Err(e) => {
            println!("! {e}");
            Ok(None)
        }
    }
}

fn read_index() -> Result<Option<usize>, AppError> {
    let s = read_line("#: ")?;
    Ok(s.trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1)))
}

fn prompt_with_default(label: &str, current: &str) -> Result<String, AppError> {
    let s = read_line(&format!("{label} [{current}]: "))?;
    let s = s.trim();
    Ok(if s.is_empty() {
        current.to_string()
    } else {
        s.to_string()
    })
}

fn read_line(prompt: &str) -> Result<String, AppError> {
    print!("{prompt}");
    io::stdout().flush().map_err(AppError::Io)?;
    let mut buf = String::new();
    let n = io::stdin().read_line(&mut buf).map_err(AppError::Io)?;
    if n == 0 {
        return Err(AppError::Io(io::ErrorKind::UnexpectedEof.into()));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::store::StoreError;

    #[test]
    fn recover_keeps_session_on_store_and_config_errors() {
        let store_err: Result<(), AppError> =
            Err(StoreError::Io(io::Error::other("disk full")).into());
        assert!(matches!(recover(store_err), Ok(None)));

        let config_err: Result<(), AppError> =
            Err(ConfigError::Io(io::Error::other("read-only")).into());
        assert!(matches!(recover(config_err), Ok(None)));

        assert!(matches!(recover(Ok::<_, AppError>(3)), Ok(Some(3))));
    }

    #[test]
    fn recover_propagates_stdin_errors() {
        let eof: Result<(), AppError> = Err(AppError::Io(io::ErrorKind::UnexpectedEof.into()));
        assert!(matches!(recover(eof), Err(AppError::Io(_))));
    }
}
