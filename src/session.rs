//! 계산 요청 한 건의 상태 머신(Idle -> Pending -> Success/Failed)과 비동기 전달.

use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info};

use crate::client::{ComputationService, ServiceError};
use crate::i18n::{keys, Language};
use crate::model::{CalculationInputs, CalculationRecord, CalculationResults};
use crate::store::{CalculationStore, KeyValueStore, StoreError};
use crate::units::{LengthUnit, RealTimeLength};

/// 폼에서 바로 읽은 원시 입력값.
#[derive(Debug, Clone, PartialEq)]
pub struct FormInput {
    pub voltage: String,
    pub density: String,
    pub length: String,
    pub length_unit: LengthUnit,
    pub pieces: String,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            voltage: "12".into(),
            density: "60".into(),
            length: "5".into(),
            length_unit: LengthUnit::Meter,
            pieces: "1".into(),
        }
    }
}

impl FormInput {
    /// 저장된 입력값을 폼 필드로 되돌린다.
    pub fn from_inputs(inputs: &CalculationInputs) -> Self {
        Self {
            voltage: inputs.voltage.to_string(),
            density: inputs.density.to_string(),
            length: inputs.length.to_string(),
            length_unit: inputs.length_unit,
            pieces: inputs.pieces.to_string(),
        }
    }

    pub fn real_time_length(&self) -> RealTimeLength {
        RealTimeLength::from_form(&self.length, self.length_unit, &self.pieces)
    }
}

/// 로컬 입력 검증 오류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// 비었거나 숫자가 아니거나 0인 필드가 있음
    #[error("모든 필드를 입력하세요")]
    MissingFields,
    #[error("값은 0보다 커야 합니다")]
    NotPositive,
    /// 밀도/개수가 정수가 아님
    #[error("LED 밀도와 스트립 개수는 정수여야 합니다")]
    NotWholeNumber,
    /// 밀도/개수가 표현 범위를 넘음
    #[error("LED 밀도나 스트립 개수가 너무 큽니다")]
    TooLarge,
}

impl ValidationError {
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationError::MissingFields => keys::ERROR_FILL_ALL_FIELDS,
            ValidationError::NotPositive => keys::ERROR_VALUES_POSITIVE,
            ValidationError::NotWholeNumber => keys::ERROR_WHOLE_NUMBER,
            ValidationError::TooLarge => keys::ERROR_VALUE_TOO_LARGE,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn whole(value: f64) -> Result<u32, ValidationError> {
    if value.fract() != 0.0 {
        return Err(ValidationError::NotWholeNumber);
    }
    if value > f64::from(u32::MAX) {
        return Err(ValidationError::TooLarge);
    }
    Ok(value as u32)
}

/// 폼 입력을 검증해 계산 입력값으로 만든다.
pub fn validate(form: &FormInput) -> Result<CalculationInputs, ValidationError> {
    let fields = [
        parse_number(&form.voltage),
        parse_number(&form.density),
        parse_number(&form.length),
        parse_number(&form.pieces),
    ];
    let [voltage, density, length, pieces] = match fields {
        [Some(v), Some(d), Some(l), Some(p)] => [v, d, l, p],
        _ => return Err(ValidationError::MissingFields),
    };
    if [voltage, density, length, pieces].contains(&0.0) {
        return Err(ValidationError::MissingFields);
    }
    if voltage < 0.0 || density < 0.0 || length < 0.0 || pieces < 0.0 {
        return Err(ValidationError::NotPositive);
    }
    Ok(CalculationInputs {
        voltage,
        density: whole(density)?,
        length,
        length_unit: form.length_unit,
        pieces: whole(pieces)?,
    })
}

/// 요청 한 건을 식별하는 번호. 제출할 때마다 증가한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Pending(Ticket),
    Success,
    Failed,
}

/// 사용자에게 보여줄 메시지. 번역 키이거나 서비스가 준 문장 그대로이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMessage {
    Key(&'static str),
    Text(String),
}

pub type Outcome = Result<CalculationResults, ServiceError>;

/// 계산 세션 컨트롤러.
///
/// 겹친 제출은 취소하지 않지만, 마지막 제출의 응답만 반영한다.
#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
    next_ticket: u64,
    pending: Option<(Ticket, CalculationInputs)>,
    current: Option<CalculationRecord>,
    error: Option<SessionMessage>,
    results_visible: bool,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            next_ticket: 1,
            pending: None,
            current: None,
            error: None,
            results_visible: false,
        }
    }

    /// 검증 후 요청을 시작한다. 실패하면 요청은 나가지 않고, 이미 대기 중인 요청은
    /// 그대로 기다린다.
    pub fn submit(
        &mut self,
        form: &FormInput,
    ) -> Result<(Ticket, CalculationInputs), ValidationError> {
        let inputs = match validate(form) {
            Ok(inputs) => inputs,
            Err(e) => {
                debug!(error = %e, "validation failed");
                if !self.is_loading() {
                    self.state = SessionState::Idle;
                }
                self.error = Some(SessionMessage::Key(e.message_key()));
                return Err(e);
            }
        };
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.state = SessionState::Pending(ticket);
        self.pending = Some((ticket, inputs.clone()));
        self.error = None;
        self.results_visible = false;
        debug!(ticket = ticket.0, "calculation pending");
        Ok((ticket, inputs))
    }

    /// 응답을 반영한다. 대기 중인 최신 요청이 아니면 버리고 false를 돌려준다.
    pub fn complete(&mut self, ticket: Ticket, outcome: Outcome) -> bool {
        if self.state != SessionState::Pending(ticket) {
            debug!(ticket = ticket.0, "discarding superseded response");
            return false;
        }
        let Some((_, inputs)) = self.pending.take() else {
            return false;
        };
        match outcome {
            Ok(results) => {
                self.current = Some(CalculationRecord::new(inputs, results));
                self.state = SessionState::Success;
                self.error = None;
                self.results_visible = true;
                debug!(ticket = ticket.0, "calculation succeeded");
            }
            Err(ServiceError::Remote(msg)) => {
                info!(ticket = ticket.0, error = %msg, "calculation rejected by service");
                self.state = SessionState::Failed;
                self.error = Some(SessionMessage::Text(msg));
            }
            Err(ServiceError::Transport(e)) => {
                error!(ticket = ticket.0, error = %e, "calculation request failed");
                self.state = SessionState::Failed;
                self.error = Some(SessionMessage::Key(keys::ERROR_CALCULATION_FAILED));
            }
        }
        true
    }

    /// 서비스를 현재 스레드에서 바로 호출한다. CLI에서 쓴다.
    pub fn run_blocking<C: ComputationService + ?Sized>(
        &mut self,
        service: &C,
        form: &FormInput,
        lang: Language,
    ) -> Result<SessionState, ValidationError> {
        let (ticket, inputs) = self.submit(form)?;
        let outcome = service.calculate(&inputs, lang);
        self.complete(ticket, outcome);
        Ok(self.state)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Pending(_))
    }

    pub fn error(&self) -> Option<&SessionMessage> {
        self.error.as_ref()
    }

    pub fn current(&self) -> Option<&CalculationRecord> {
        self.current.as_ref()
    }

    /// 결과 영역을 보여줄지 여부. 제출 시 숨기고 성공하면 다시 보인다.
    pub fn results_visible(&self) -> bool {
        self.results_visible && self.current.is_some()
    }

    /// 현재 계산을 이름을 붙여 저장한다. 현재 계산이 없으면 Ok(None).
    pub fn save_current<S: KeyValueStore>(
        &mut self,
        name: &str,
        store: &mut CalculationStore<S>,
    ) -> Result<Option<usize>, StoreError> {
        let Some(current) = self.current.as_mut() else {
            return Ok(None);
        };
        current.name = name.trim().to_string();
        store.add(current.clone()).map(Some)
    }
}

/// 계산 요청을 작업 스레드에서 실행하고 결과를 채널로 돌려준다.
pub struct CalculationDispatcher<C> {
    service: Arc<C>,
    tx: flume::Sender<(Ticket, Outcome)>,
    rx: flume::Receiver<(Ticket, Outcome)>,
}

impl<C> CalculationDispatcher<C>
where
    C: ComputationService + Send + Sync + 'static,
{
    pub fn new(service: Arc<C>) -> Self {
        let (tx, rx) = flume::unbounded();
        Self { service, tx, rx }
    }

    pub fn service(&self) -> &Arc<C> {
        &self.service
    }

    pub fn dispatch(&self, ticket: Ticket, inputs: CalculationInputs, lang: Language) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("calc-request-{}", ticket.0))
            .spawn(move || {
                let outcome = service.calculate(&inputs, lang);
                // 수신 측이 사라졌으면 결과를 버린다.
                let _ = tx.send((ticket, outcome));
            });
        if let Err(e) = spawned {
            error!(error = %e, "could not start request worker");
            let _ = self
                .tx
                .send((ticket, Err(ServiceError::Transport(e.to_string()))));
        }
    }

    /// 도착한 응답을 모두 꺼낸다. 기다리지 않는다.
    pub fn poll(&self) -> Vec<(Ticket, Outcome)> {
        self.rx.try_iter().collect()
    }

    /// 응답이 올 때까지 기다린다.
    pub fn wait(&self) -> Option<(Ticket, Outcome)> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(voltage: &str, density: &str, length: &str, pieces: &str) -> FormInput {
        FormInput {
            voltage: voltage.into(),
            density: density.into(),
            length: length.into(),
            length_unit: LengthUnit::Meter,
            pieces: pieces.into(),
        }
    }

    fn results() -> CalculationResults {
        serde_json::from_value(serde_json::json!({
            "power": 24.0, "current": 2.0, "recommended": 2.4,
            "total_length_meters": 5.0, "wire_gauge": "22 AWG", "max_run": 6.0
        }))
        .unwrap()
    }

    #[test]
    fn validation_cases() {
        assert_eq!(validate(&form("12", "60", "0", "1")), Err(ValidationError::MissingFields));
        assert_eq!(validate(&form("", "60", "5", "1")), Err(ValidationError::MissingFields));
        assert_eq!(validate(&form("abc", "60", "5", "1")), Err(ValidationError::MissingFields));
        assert_eq!(validate(&form("-12", "60", "5", "1")), Err(ValidationError::NotPositive));
        assert_eq!(validate(&form("12", "-60", "5", "1")), Err(ValidationError::NotPositive));
        assert_eq!(validate(&form("12", "60.5", "5", "1")), Err(ValidationError::NotWholeNumber));
        assert_eq!(validate(&form("12", "60", "5", "1.5")), Err(ValidationError::NotWholeNumber));
        assert_eq!(validate(&form("12", "1e10", "5", "1")), Err(ValidationError::TooLarge));
        assert_eq!(validate(&form("12", "60", "5", "4294967296")), Err(ValidationError::TooLarge));
        assert_eq!(validate(&form("12", "60", "5", "4294967295")).map(|i| i.pieces), Ok(u32::MAX));
        let ok = validate(&form(" 24 ", "144", "2.5", "3")).unwrap();
        assert_eq!((ok.voltage, ok.density, ok.length, ok.pieces), (24.0, 144, 2.5, 3));
    }

    #[test]
    fn success_sets_current_and_clears_error() {
        let mut s = SessionController::new();
        let _ = s.submit(&form("12", "60", "0", "1"));
        assert!(s.error().is_some());
        let (ticket, _) = s.submit(&form("12", "60", "5", "1")).unwrap();
        assert!(s.is_loading());
        assert!(s.error().is_none());
        assert!(s.complete(ticket, Ok(results())));
        assert_eq!(s.state(), SessionState::Success);
        assert!(s.results_visible());
        assert_eq!(s.current().unwrap().inputs.density, 60);
    }

    #[test]
    fn failures_keep_previous_current() {
        let mut s = SessionController::new();
        let (t1, _) = s.submit(&form("12", "60", "5", "1")).unwrap();
        s.complete(t1, Ok(results()));
        let before = s.current().cloned();

        let (t2, _) = s.submit(&form("24", "60", "5", "1")).unwrap();
        s.complete(t2, Err(ServiceError::Remote("Invalid length unit".into())));
        assert_eq!(s.state(), SessionState::Failed);
        assert_eq!(s.error(), Some(&SessionMessage::Text("Invalid length unit".into())));
        assert_eq!(s.current().cloned(), before);

        let (t3, _) = s.submit(&form("24", "60", "5", "1")).unwrap();
        s.complete(t3, Err(ServiceError::Transport("connection refused".into())));
        assert_eq!(
            s.error(),
            Some(&SessionMessage::Key(keys::ERROR_CALCULATION_FAILED))
        );
        assert_eq!(s.current().cloned(), before);
        assert!(!s.is_loading());
    }

    #[test]
    fn superseded_response_is_ignored() {
        let mut s = SessionController::new();
        let (old, _) = s.submit(&form("12", "60", "5", "1")).unwrap();
        let (new, _) = s.submit(&form("24", "60", "5", "1")).unwrap();
        assert!(!s.complete(old, Ok(results())));
        assert!(s.is_loading());
        assert!(s.complete(new, Ok(results())));
        assert_eq!(s.current().unwrap().inputs.voltage, 24.0);
        assert!(!s.complete(old, Ok(results())));
    }

    #[test]
    fn invalid_resubmit_keeps_pending_request() {
        let mut s = SessionController::new();
        let (ticket, _) = s.submit(&form("12", "60", "5", "1")).unwrap();
        assert_eq!(s.submit(&form("12", "60", "0", "1")), Err(ValidationError::MissingFields));
        assert_eq!(s.state(), SessionState::Pending(ticket));
        assert!(s.is_loading());
        assert!(s.complete(ticket, Ok(results())));
        assert_eq!(s.state(), SessionState::Success);
        assert!(s.error().is_none());
    }

    #[test]
    fn save_without_current_is_noop() {
        let mut s = SessionController::new();
        let mut store = CalculationStore::new(crate::store::MemoryKeyValueStore::new());
        assert_eq!(s.save_current("x", &mut store).unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn form_round_trips_inputs() {
        let inputs = validate(&form("12", "60", "3.33", "2")).unwrap();
        let back = FormInput::from_inputs(&inputs);
        assert_eq!(back.length, "3.33");
        assert_eq!(back.voltage, "12");
        assert_eq!(validate(&back).unwrap(), inputs);
    }
}
