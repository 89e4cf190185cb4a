//! Definição de tipos do domínio.
//!
//! Todos os valores vivem apenas durante o processo; nada é persistido.

use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// GPIO
// ──────────────────────────────────────────────

/// Direção de um pino GPIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    In,
    Out,
}

impl PinDirection {
    /// Texto aceito pelo arquivo `direction` do sysfs.
    pub fn as_sysfs(self) -> &'static str {
        match self {
            PinDirection::In => "in",
            PinDirection::Out => "out",
        }
    }
}

/// Nível lógico de um pino digital.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn as_sysfs(self) -> &'static str {
        match self {
            Level::Low => "0",
            Level::High => "1",
        }
    }
}

// ──────────────────────────────────────────────
// Sensor / bomba
// ──────────────────────────────────────────────

/// Leitura suavizada do sensor de nível (unidades brutas do ADC).
///
/// O sensor é invertido: valor maior significa menos água no tanque.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SensorReading(pub u32);

impl SensorReading {
    /// Média truncada das amostras brutas (`soma / n`, divisão inteira).
    ///
    /// Para 10 amostras equivale a `floor(soma * 0.1)`. Retorna `None`
    /// para uma lista vazia.
    pub fn from_samples(samples: &[u32]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let sum: u64 = samples.iter().map(|&s| u64::from(s)).sum();
        let mean = sum / samples.len() as u64;
        Some(Self(mean as u32))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Estado da bomba de reabastecimento.
///
/// "Alerta já disparado" e "bomba ligada" são o mesmo estado: enquanto a
/// bomba estiver ligada nenhum novo alerta é emitido.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PumpState {
    #[default]
    Off,
    On,
}

impl PumpState {
    pub fn is_on(self) -> bool {
        self == PumpState::On
    }
}

impl fmt::Display for PumpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PumpState::Off => f.write_str("desligada"),
            PumpState::On => f.write_str("ligada"),
        }
    }
}

// ──────────────────────────────────────────────
// Choreo (chamada remota)
// ──────────────────────────────────────────────

/// Entrada nomeada de um Choreo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoreoInput {
    pub name: String,
    pub value: String,
}

/// Filtro de saída: extrai `path` da variável `variable` do resultado e o
/// devolve no stream sob o nome `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoreoOutput {
    pub name: String,
    pub path: String,
    pub variable: String,
}

/// Descritor de uma chamada remota. Montado a cada chamada e descartado depois.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choreo {
    /// Caminho do serviço (ex: `/Library/Nexmo/Voice/CaptureTextToSpeechPrompt`)
    pub name: String,
    /// Perfil guardado no servidor com credenciais/parâmetros
    pub profile: Option<String>,
    pub inputs: Vec<ChoreoInput>,
    pub outputs: Vec<ChoreoOutput>,
}

impl Choreo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Seleciona o perfil do servidor. Perfil vazio é ignorado.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        let profile = profile.into();
        self.profile = (!profile.is_empty()).then_some(profile);
        self
    }

    pub fn input(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.push(ChoreoInput {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn output(
        mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        variable: impl Into<String>,
    ) -> Self {
        self.outputs.push(ChoreoOutput {
            name: name.into(),
            path: path.into(),
            variable: variable.into(),
        });
        self
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
