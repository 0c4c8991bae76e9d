use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{ComputationService, LanguageService, ServiceError};
use crate::config::{Config, ConfigError};
use crate::i18n::{keys, Language, Translator};
use crate::model::CalculationRecord;
use crate::render::{RenderInput, Renderer, View};
use crate::session::{
    CalculationDispatcher, FormInput, SessionController, SessionMessage, SessionState, Ticket,
    ValidationError,
};
use crate::store::{CalculationStore, KeyValueStore, StoreError};
use crate::ui_cli::{self, MenuChoice};

/// 폼에서 바로 고를 수 있는 전압 [V].
pub const VOLTAGE_PRESETS: [u32; 3] = [5, 12, 24];
/// 폼에서 바로 고를 수 있는 LED 밀도 [LEDs/m].
pub const DENSITY_PRESETS: [u32; 9] = [30, 60, 90, 120, 144, 150, 180, 210, 240];

/// 애플리케이션 실행 중 발생 가능한 오류를 표현한다.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    #[error("설정 오류: {0}")]
    Config(#[from] ConfigError),
    #[error("저장 오류: {0}")]
    Store(#[from] StoreError),
    #[error("서비스 오류: {0}")]
    Service(#[from] ServiceError),
}

/// 저장 목록, 계산 세션, 번역기, 외부 서비스를 묶은 애플리케이션 컨텍스트.
pub struct Calculator<C, L, S> {
    store: CalculationStore<S>,
    session: SessionController,
    translator: Translator,
    pack_dir: Option<String>,
    language_service: L,
    dispatcher: CalculationDispatcher<C>,
    form: FormInput,
    notice: Option<SessionMessage>,
    renderer: Renderer,
}

impl<C, L, S> Calculator<C, L, S>
where
    C: ComputationService + Send + Sync + 'static,
    L: LanguageService,
    S: KeyValueStore,
{
    /// 컨텍스트를 만들고 저장 목록을 읽어 온다.
    pub fn new(
        computation: Arc<C>,
        language_service: L,
        backend: S,
        translator: Translator,
        pack_dir: Option<String>,
    ) -> Self {
        let store = CalculationStore::open(backend);
        info!(
            saved = store.len(),
            language = translator.language_code(),
            "calculator initialised"
        );
        Self {
            store,
            session: SessionController::new(),
            translator,
            pack_dir,
            language_service,
            dispatcher: CalculationDispatcher::new(computation),
            form: FormInput::default(),
            notice: None,
            renderer: Renderer::new(),
        }
    }

    pub fn store(&self) -> &CalculationStore<S> {
        &self.store
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn language(&self) -> Language {
        self.translator.language()
    }

    pub fn form(&self) -> &FormInput {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormInput {
        &mut self.form
    }

    /// 폼을 검증하고 작업 스레드로 계산을 요청한다. 결과는 `poll`로 받는다.
    pub fn submit(&mut self) -> Result<Ticket, ValidationError> {
        let (ticket, inputs) = self.session.submit(&self.form)?;
        self.dispatcher
            .dispatch(ticket, inputs, self.translator.language());
        Ok(ticket)
    }

    /// 현재 스레드에서 계산을 끝까지 수행한다.
    pub fn submit_blocking(&mut self) -> Result<SessionState, ValidationError> {
        let lang = self.translator.language();
        let service = Arc::clone(self.dispatcher.service());
        self.session.run_blocking(service.as_ref(), &self.form, lang)
    }

    /// 도착한 응답을 반영한다. 화면을 다시 그려야 하면 true.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for (ticket, outcome) in self.dispatcher.poll() {
            changed |= self.session.complete(ticket, outcome);
        }
        changed
    }

    /// 대기 중인 요청이 끝날 때까지 기다린다.
    pub fn wait_pending(&mut self) {
        while self.session.is_loading() {
            match self.dispatcher.wait() {
                Some((ticket, outcome)) => {
                    self.session.complete(ticket, outcome);
                }
                None => break,
            }
        }
    }

    /// 현재 계산을 저장한다. 이름이 비어 있으면 자동 이름을 붙인다.
    pub fn save_current(&mut self, name: &str) -> Result<Option<usize>, AppError> {
        let saved = self.session.save_current(name, &mut self.store)?;
        self.notice = None;
        Ok(saved)
    }

    /// 저장된 입력값을 폼으로 불러온다. 잘못된 위치면 false.
    pub fn load_into_form(&mut self, index: usize) -> bool {
        match self.store.get(index) {
            Some(record) => {
                self.form = FormInput::from_inputs(&record.inputs);
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, index: usize) -> Result<Option<CalculationRecord>, AppError> {
        Ok(self.store.delete_at(index)?)
    }

    pub fn clear_saved(&mut self) -> Result<(), AppError> {
        Ok(self.store.clear()?)
    }

    /// 언어 설정 서비스를 거쳐 언어를 바꾼다. 실패하면 이전 언어를 유지한다.
    pub fn switch_language(&mut self, lang: Language) -> Result<(), AppError> {
        match self.language_service.switch_language(lang) {
            Ok(()) => {
                self.translator = Translator::new_with_pack(lang, self.pack_dir.as_deref());
                self.notice = None;
                info!(language = lang.as_code(), "language switched");
                Ok(())
            }
            Err(e) => {
                warn!(language = lang.as_code(), error = %e, "language switch failed");
                self.notice = Some(SessionMessage::Key(keys::ERROR_LANGUAGE_SWITCH_FAILED));
                Err(e.into())
            }
        }
    }

    /// 현재 상태를 화면 모델로 투영한다.
    pub fn render(&mut self) -> &View {
        let input = RenderInput {
            translator: &self.translator,
            records: self.store.records(),
            session: &self.session,
            form: &self.form,
            notice: self.notice.as_ref(),
        };
        self.renderer.render(&input)
    }
}

/// CLI 애플리케이션의 메인 루프를 실행한다.
pub fn run<C, L, S>(
    config: &mut Config,
    config_path: &Path,
    calc: &mut Calculator<C, L, S>,
) -> Result<(), AppError>
where
    C: ComputationService + Send + Sync + 'static,
    L: LanguageService,
    S: KeyValueStore,
{
    loop {
        match ui_cli::main_menu(calc)? {
            MenuChoice::Calculate => ui_cli::handle_calculate(calc)?,
            MenuChoice::SaveCurrent => ui_cli::handle_save(calc)?,
            MenuChoice::ListSaved => ui_cli::handle_list(calc),
            MenuChoice::LoadSaved => ui_cli::handle_load(calc)?,
            MenuChoice::DeleteSaved => ui_cli::handle_delete(calc)?,
            MenuChoice::ClearSaved => ui_cli::handle_clear(calc)?,
            MenuChoice::Language => {
                if ui_cli::handle_language(calc)? {
                    config.language = calc.language().as_code().to_string();
                    ui_cli::recover(config.save_to(config_path).map_err(AppError::from))?;
                }
            }
            MenuChoice::Exit => {
                println!("{}", calc.render().label(keys::EXIT));
                break;
            }
        }
    }
    Ok(())
}
