//! Dublês de GPIO e de cliente remoto para os testes do controlador.
//!
//! Registram cada chamada para que os testes verifiquem o histórico
//! completo sem tocar em hardware ou rede.

use crate::choreo::{ChoreoClient, ChoreoError};
use crate::gpio::{GpioError, GpioPort};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use tank_core::protocol::{FIELD_DELIMITER, RECORD_DELIMITER};
use tank_core::types::{Choreo, Level, PinDirection};

/// Monta um stream de registros a partir de pares nome/valor.
pub fn encode_records(records: &[(&str, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in records {
        out.extend_from_slice(name.as_bytes());
        out.push(FIELD_DELIMITER);
        out.extend_from_slice(value.as_bytes());
        out.push(RECORD_DELIMITER);
    }
    out
}

/// Valor da entrada `name` de um descritor, se existir.
pub fn input<'a>(choreo: &'a Choreo, name: &str) -> Option<&'a str> {
    choreo
        .inputs
        .iter()
        .find(|i| i.name == name)
        .map(|i| i.value.as_str())
}

// ── GPIO ──────────────────────────────────────

#[derive(Default)]
pub struct MockGpio {
    /// Amostras roteirizadas; `None` simula falha de leitura. Roteiro
    /// esgotado também falha.
    samples: VecDeque<Option<u32>>,
    pub levels: HashMap<u32, Level>,
    pub configured: Vec<(u32, PinDirection)>,
    pub writes: Vec<(u32, Level)>,
    pub analog_reads: usize,
    pub fail_configure: bool,
    pub fail_writes: bool,
}

fn unavailable(path: &str) -> GpioError {
    GpioError::Io {
        path: PathBuf::from(path),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock"),
    }
}

impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enfileira `count` amostras iguais a `value`.
    pub fn push_repeated(&mut self, value: u32, count: usize) {
        self.samples.extend(std::iter::repeat_n(Some(value), count));
    }

    pub fn push_samples(&mut self, values: &[u32]) {
        self.samples.extend(values.iter().copied().map(Some));
    }

    pub fn push_failure(&mut self) {
        self.samples.push_back(None);
    }

    pub fn last_write(&self) -> Option<(u32, Level)> {
        self.writes.last().copied()
    }
}

impl GpioPort for MockGpio {
    fn configure(&mut self, pin: u32, direction: PinDirection) -> Result<(), GpioError> {
        if self.fail_configure {
            return Err(unavailable("export"));
        }
        self.configured.push((pin, direction));
        Ok(())
    }

    fn read_digital(&mut self, pin: u32) -> Result<Level, GpioError> {
        self.levels
            .get(&pin)
            .copied()
            .ok_or_else(|| unavailable("value"))
    }

    fn write_digital(&mut self, pin: u32, level: Level) -> Result<(), GpioError> {
        self.writes.push((pin, level));
        if self.fail_writes {
            return Err(unavailable("value"));
        }
        self.levels.insert(pin, level);
        Ok(())
    }

    fn read_analog(&mut self, _channel: u32) -> Result<u32, GpioError> {
        self.analog_reads += 1;
        match self.samples.pop_front() {
            Some(Some(value)) => Ok(value),
            Some(None) | None => Err(unavailable("in_voltage_raw")),
        }
    }
}

// ── Cliente remoto ────────────────────────────

/// Cliente com respostas roteirizadas, consumidas em ordem.
#[derive(Default)]
pub struct ScriptedClient {
    script: VecDeque<Result<Vec<u8>, u16>>,
    pub calls: Vec<Choreo>,
    pub timeouts: Vec<Duration>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Próxima chamada tem sucesso com estes registros.
    pub fn respond(mut self, records: &[(&str, &str)]) -> Self {
        self.script.push_back(Ok(encode_records(records)));
        self
    }

    /// Próxima chamada falha com `status`.
    pub fn fail(mut self, status: u16) -> Self {
        self.script.push_back(Err(status));
        self
    }
}

impl ChoreoClient for ScriptedClient {
    type Results = Cursor<Vec<u8>>;

    fn run(&mut self, choreo: &Choreo, timeout: Duration) -> Result<Self::Results, ChoreoError> {
        self.calls.push(choreo.clone());
        self.timeouts.push(timeout);
        match self.script.pop_front() {
            Some(Ok(body)) => Ok(Cursor::new(body)),
            Some(Err(status)) => Err(ChoreoError::Status(status)),
            // Roteiro esgotado: ninguém atendeu
            None => Err(ChoreoError::Timeout(timeout)),
        }
    }
}
