//! # Tank Core
//!
//! Crate compartilhada que define os tipos do domínio, o protocolo de
//! registros delimitados das respostas remotas, o buffer da mensagem de
//! alerta, a decisão por thresholds e a configuração TOML do controlador
//! de nível do tanque.
//!
//! ## Módulos
//! - [`types`] – Leitura do sensor, estado da bomba, descritor de Choreo
//! - [`protocol`] – Leitura do stream `nome 0x1F valor 0x1E`
//! - [`message`] – Buffer limitado da mensagem falada na chamada
//! - [`config`] – Configuração unificada via TOML
//! - [`alerts`] – Thresholds com histerese e decisão por ciclo

pub mod types;
pub mod protocol;
pub mod message;
pub mod config;
pub mod alerts;

// Re-exports convenientes
pub use types::{Choreo, PumpState, SensorReading};
pub use protocol::{parse_records, FieldSpec, RecordReader};
pub use message::MessageBuffer;
pub use config::AppConfig;
