#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! eframe/egui 기반 데스크톱 GUI 진입점.

use eframe::{egui, App, Frame};
use led_driver_calculator::{
    app::{Calculator, DENSITY_PRESETS, VOLTAGE_PRESETS},
    client::HttpBackend,
    config::{self, Config},
    i18n::{self, keys, Language, Translator},
    render::{SavedListView, View},
    store::{FileKeyValueStore, KeyValueStore},
    units::LengthUnit,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs};
use tracing_subscriber::EnvFilter;

type GuiCalculator = Calculator<HttpBackend, HttpBackend, Box<dyn KeyValueStore>>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // CLI 언어 옵션 처리: --lang xx 또는 --lang=xx (xx: auto/en/hi)
    let mut cli_lang = String::from("auto");
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        let a = &args[i];
        if let Some(val) = a.strip_prefix("--lang=") {
            cli_lang = val.to_string();
        } else if (a == "--lang" || a == "-L") && i + 1 < args.len() {
            cli_lang = args[i + 1].clone();
            i += 1;
        }
        i += 1;
    }

    let config_path = PathBuf::from(config::CONFIG_FILE);
    let app_cfg = config::load_or_default_at(&config_path).unwrap_or_default();
    let lang = i18n::resolve_language(&cli_lang, Some(app_cfg.language.as_str()));
    let translator = Translator::new_with_pack(lang, app_cfg.language_pack_dir.as_deref());
    let backend = HttpBackend::new(&app_cfg.server_url, app_cfg.request_timeout())?;
    let store: Box<dyn KeyValueStore> = Box::new(FileKeyValueStore::new(app_cfg.storage_path()));
    let calc = Calculator::new(
        Arc::new(backend.clone()),
        backend,
        store,
        translator,
        app_cfg.language_pack_dir.clone(),
    );

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size(egui::vec2(1000.0, 720.0))
        .with_transparent(true);
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "LED Driver Calculator",
        options,
        Box::new(move |cc| {
            if let Err(e) = setup_fonts(&cc.egui_ctx) {
                tracing::warn!("font setup: {e}");
            }
            Box::new(GuiApp::new(app_cfg, config_path, calc))
        }),
    )?;
    Ok(())
}

fn apply_font_bytes(ctx: &egui::Context, bytes: Vec<u8>, name: &str) {
    let mut fonts = egui::FontDefinitions::default();
    let font_name = name.to_string();
    fonts
        .font_data
        .insert(font_name.clone(), egui::FontData::from_owned(bytes));
    // 라틴 문자는 기본 폰트로 그리고 데바나가리만 대체 폰트로 그린다.
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .push(font_name.clone());
    }
    ctx.set_fonts(fonts);
}

/// 힌디어 표시용 데바나가리 폰트를 찾아 대체 폰트로 등록한다.
/// 1) assets/fonts 아래 번들 폰트
/// 2) 시스템 폰트(Windows Nirmala, Noto/Lohit 계열)
fn setup_fonts(ctx: &egui::Context) -> Result<(), String> {
    let mut candidates: Vec<PathBuf> = vec![
        PathBuf::from("assets/fonts/NotoSansDevanagari-Regular.ttf"),
        PathBuf::from("/usr/share/fonts/truetype/noto/NotoSansDevanagari-Regular.ttf"),
        PathBuf::from("/usr/share/fonts/noto/NotoSansDevanagari-Regular.ttf"),
        PathBuf::from("/usr/share/fonts/truetype/lohit-devanagari/Lohit-Devanagari.ttf"),
        PathBuf::from("/System/Library/Fonts/Supplemental/DevanagariMT.ttc"),
    ];
    if let Some(windir) = env::var_os("WINDIR") {
        let fonts = Path::new(&windir).join("Fonts");
        candidates.insert(0, fonts.join("Nirmala.ttf"));
        candidates.insert(1, fonts.join("mangal.ttf"));
    }
    for p in candidates {
        if p.exists() {
            let bytes = fs::read(&p)
                .map_err(|e| format!("Failed to read font file ({}): {e}", p.display()))?;
            apply_font_bytes(ctx, bytes, "devanagari");
            return Ok(());
        }
    }
    Err("Devanagari font not found; Hindi text may not render.".into())
}

/// 값이 프리셋 중 하나면 그 값을 돌려준다.
fn preset_choice(value: &str, presets: &[u32]) -> Option<u32> {
    let v: f64 = value.trim().parse().ok()?;
    presets.iter().copied().find(|p| f64::from(*p) == v)
}

/// 프레임 중에 모은 사용자 동작. 화면 모델을 다 그린 뒤 한꺼번에 적용한다.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Calculate,
    SwitchLanguage(Language),
    Edit(usize),
    Delete(usize),
    ClearSaved,
    OpenSave,
}

struct GuiApp {
    config: Config,
    config_path: PathBuf,
    calc: GuiCalculator,
    voltage_custom: bool,
    density_custom: bool,
    show_save_modal: bool,
    save_name: String,
    show_settings_modal: bool,
    window_alpha: f32,
    status: Option<String>,
}

impl GuiApp {
    fn new(config: Config, config_path: PathBuf, calc: GuiCalculator) -> Self {
        let mut app = Self {
            window_alpha: config.window_alpha.clamp(0.3, 1.0),
            config,
            config_path,
            calc,
            voltage_custom: false,
            density_custom: false,
            show_save_modal: false,
            save_name: String::new(),
            show_settings_modal: false,
            status: None,
        };
        app.sync_preset_flags();
        app
    }

    fn sync_preset_flags(&mut self) {
        let form = self.calc.form();
        self.voltage_custom = preset_choice(&form.voltage, &VOLTAGE_PRESETS).is_none();
        self.density_custom = preset_choice(&form.density, &DENSITY_PRESETS).is_none();
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Calculate => {
                // 검증 오류는 다음 화면에서 error로 보인다.
                let _ = self.calc.submit();
            }
            Action::SwitchLanguage(lang) => {
                if self.calc.switch_language(lang).is_ok() {
                    self.config.language = lang.as_code().to_string();
                    if let Err(e) = self.config.save_to(&self.config_path) {
                        self.status = Some(format!("Save error: {e}"));
                    }
                }
            }
            Action::Edit(index) => {
                if self.calc.load_into_form(index) {
                    self.sync_preset_flags();
                }
            }
            Action::Delete(index) => {
                if let Err(e) = self.calc.delete(index) {
                    self.status = Some(e.to_string());
                }
            }
            Action::ClearSaved => {
                if let Err(e) = self.calc.clear_saved() {
                    self.status = Some(e.to_string());
                }
            }
            Action::OpenSave => {
                self.save_name.clear();
                self.show_save_modal = true;
            }
        }
    }

    fn ui_form(&mut self, ui: &mut egui::Ui, view: &View, actions: &mut Vec<Action>) {
        let custom_label = view.label(keys::CUSTOM_VALUE).to_string();
        let per_meter = view.label(keys::LEDS_PER_METER).to_string();
        let form = self.calc.form_mut();

        egui::Grid::new("input_grid")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label(view.label(keys::VOLTAGE_LABEL));
                ui.horizontal(|ui| {
                    let selected = if self.voltage_custom {
                        custom_label.clone()
                    } else {
                        format!("{}V", form.voltage)
                    };
                    egui::ComboBox::from_id_source("voltage_choice")
                        .selected_text(selected)
                        .show_ui(ui, |ui| {
                            for v in VOLTAGE_PRESETS {
                                if ui
                                    .selectable_label(!self.voltage_custom && preset_choice(&form.voltage, &[v]).is_some(), format!("{v}V"))
                                    .clicked()
                                {
                                    form.voltage = v.to_string();
                                    self.voltage_custom = false;
                                }
                            }
                            if ui.selectable_label(self.voltage_custom, custom_label.as_str()).clicked() {
                                self.voltage_custom = true;
                            }
                        });
                    if self.voltage_custom {
                        ui.add(egui::TextEdit::singleline(&mut form.voltage).desired_width(80.0));
                    }
                });
                ui.end_row();

                ui.label(view.label(keys::DENSITY_LABEL));
                ui.horizontal(|ui| {
                    let selected = if self.density_custom {
                        custom_label.clone()
                    } else {
                        format!("{} {per_meter}", form.density)
                    };
                    egui::ComboBox::from_id_source("density_choice")
                        .selected_text(selected)
                        .show_ui(ui, |ui| {
                            for d in DENSITY_PRESETS {
                                if ui
                                    .selectable_label(!self.density_custom && preset_choice(&form.density, &[d]).is_some(), format!("{d} {per_meter}"))
                                    .clicked()
                                {
                                    form.density = d.to_string();
                                    self.density_custom = false;
                                }
                            }
                            if ui.selectable_label(self.density_custom, custom_label.as_str()).clicked() {
                                self.density_custom = true;
                            }
                        });
                    if self.density_custom {
                        ui.add(egui::TextEdit::singleline(&mut form.density).desired_width(80.0));
                    }
                });
                ui.end_row();

                ui.label(view.label(keys::LENGTH_LABEL));
                ui.horizontal(|ui| {
                    ui.add(egui::TextEdit::singleline(&mut form.length).desired_width(80.0));
                    egui::ComboBox::from_id_source("length_unit_choice")
                        .selected_text(view.label(form.length_unit.label_key()))
                        .show_ui(ui, |ui| {
                            for unit in LengthUnit::ALL {
                                ui.selectable_value(&mut form.length_unit, unit, view.label(unit.label_key()));
                            }
                        });
                });
                ui.end_row();

                ui.label(view.label(keys::PIECES_LABEL));
                ui.add(egui::TextEdit::singleline(&mut form.pieces).desired_width(80.0));
                ui.end_row();
            });

        // 입력 중 길이 미리보기는 이번 프레임 입력 기준으로 계산한다.
        let preview = self.calc.form().real_time_length();
        if preview.visible {
            ui.label(format!(
                "{}: {} {}",
                view.label(keys::REAL_TIME_LENGTH),
                preview.display,
                view.label(keys::METER_UNIT)
            ));
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let button = egui::Button::new(view.label(keys::CALCULATE_BUTTON));
            if ui.add_enabled(!view.loading, button).clicked() {
                actions.push(Action::Calculate);
            }
            if view.loading {
                ui.spinner();
                ui.label(view.label(keys::LOADING));
            }
        });
    }

    fn ui_results(&self, ui: &mut egui::Ui, view: &View, actions: &mut Vec<Action>) {
        if let Some(err) = &view.error {
            ui.colored_label(egui::Color32::from_rgb(200, 60, 60), err);
        }
        let Some(results) = &view.results else {
            return;
        };
        ui.separator();
        ui.heading(&results.title);
        egui::Grid::new("results_grid")
            .num_columns(2)
            .striped(true)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                for row in results.rows() {
                    ui.label(&row.label);
                    ui.strong(&row.value);
                    ui.end_row();
                }
            });
        ui.add_space(6.0);
        if ui.button(view.label(keys::SAVE_CALCULATION)).clicked() {
            actions.push(Action::OpenSave);
        }
    }

    fn ui_saved(&self, ui: &mut egui::Ui, view: &View, actions: &mut Vec<Action>) {
        ui.heading(view.label(keys::SAVED_CALCULATIONS));
        ui.separator();
        match &view.saved {
            SavedListView::Empty(msg) => {
                ui.label(msg);
            }
            SavedListView::Entries(entries) => {
                egui::ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        for entry in entries {
                            ui.group(|ui| {
                                ui.strong(&entry.name);
                                ui.small(&entry.timestamp);
                                for line in entry.input_lines.iter().chain(&entry.result_lines) {
                                    ui.label(line);
                                }
                                ui.horizontal(|ui| {
                                    if ui.button(&entry.edit_label).clicked() {
                                        actions.push(Action::Edit(entry.index));
                                    }
                                    if ui.button(&entry.delete_label).clicked() {
                                        actions.push(Action::Delete(entry.index));
                                    }
                                });
                            });
                        }
                        ui.add_space(6.0);
                        if ui.button(view.label(keys::CLEAR_SAVED)).clicked() {
                            actions.push(Action::ClearSaved);
                        }
                    });
            }
        }
    }
}

impl App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.calc.poll();

        // 투명도 적용
        let mut style = (*ctx.style()).clone();
        style.visuals.window_fill = style.visuals.window_fill.linear_multiply(self.window_alpha);
        style.visuals.panel_fill = style.visuals.panel_fill.linear_multiply(self.window_alpha);
        ctx.set_style(style);

        let view = self.calc.render().clone();
        if view.loading {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        let mut actions = Vec::new();

        // 상단 바
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(view.label(keys::APP_TITLE));
                ui.separator();
                ui.label(view.label(keys::LANGUAGE_LABEL));
                for indicator in &view.languages {
                    if ui.selectable_label(indicator.active, &indicator.label).clicked()
                        && !indicator.active
                    {
                        actions.push(Action::SwitchLanguage(indicator.language));
                    }
                }
                ui.separator();
                if ui.button("⚙").clicked() {
                    self.show_settings_modal = true;
                }
            });
            ui.small(view.label(keys::APP_DESCRIPTION));
            if let Some(notice) = &view.notice {
                ui.colored_label(egui::Color32::from_rgb(200, 140, 40), notice);
            }
            if let Some(status) = &self.status {
                ui.small(status);
            }
        });

        // 설정 모달
        if self.show_settings_modal {
            let mut open = self.show_settings_modal;
            egui::Window::new("Settings")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label("Window transparency");
                    ui.add(egui::Slider::new(&mut self.window_alpha, 0.3..=1.0).text("alpha"));
                    ui.label(format!("Server: {}", self.config.server_url));
                    if ui.button(view.label(keys::SAVE_BUTTON)).clicked() {
                        self.config.window_alpha = self.window_alpha;
                        self.status = match self.config.save_to(&self.config_path) {
                            Ok(()) => None,
                            Err(e) => Some(format!("Save error: {e}")),
                        };
                    }
                });
            self.show_settings_modal = open;
        }

        // 저장 모달
        if self.show_save_modal {
            egui::Window::new(view.label(keys::SAVE_CALCULATION))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(view.label(keys::CALCULATION_NAME));
                    ui.text_edit_singleline(&mut self.save_name);
                    ui.horizontal(|ui| {
                        if ui.button(view.label(keys::SAVE_BUTTON)).clicked() {
                            match self.calc.save_current(&self.save_name) {
                                Ok(Some(_)) => self.show_save_modal = false,
                                Ok(None) => {
                                    self.status = Some(view.label(keys::ERROR_NO_CURRENT).to_string());
                                    self.show_save_modal = false;
                                }
                                Err(e) => self.status = Some(e.to_string()),
                            }
                        }
                        if ui.button(view.label(keys::CANCEL_BUTTON)).clicked() {
                            self.show_save_modal = false;
                        }
                    });
                });
        }

        egui::SidePanel::right("saved")
            .resizable(true)
            .min_width(220.0)
            .default_width(300.0)
            .show(ctx, |ui| {
                self.ui_saved(ui, &view, &mut actions);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    ui.heading(view.label(keys::INPUT_PARAMETERS));
                    ui.separator();
                    self.ui_form(ui, &view, &mut actions);
                    self.ui_results(ui, &view, &mut actions);
                });
        });

        for action in actions {
            self.apply(action);
        }
    }
}
