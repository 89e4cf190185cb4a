//! Protocolo do stream de resultados das chamadas remotas.
//!
//! Depois de uma chamada bem-sucedida o servidor devolve uma sequência de
//! registros nome/valor:
//!
//! ```text
//! ┌──────────┬──────┬───────────┬──────┬──────────┬──────┬─────
//! │ nome (N) │ 0x1F │ valor (N) │ 0x1E │ nome (N) │ 0x1F │ ...
//! └──────────┴──────┴───────────┴──────┴──────────┴──────┴─────
//! ```
//!
//! Não há framing, versão ou checksum. Só os campos conhecidos pelo chamador
//! são lidos; os demais registros são descartados até o próximo `0x1E`.

use std::io::BufRead;
use tracing::{debug, warn};

/// Separa o nome do valor dentro de um registro.
pub const FIELD_DELIMITER: u8 = 0x1F;

/// Separa um registro completo do próximo.
pub const RECORD_DELIMITER: u8 = 0x1E;

/// Capacidade máxima (bytes) do nome de um campo.
pub const NAME_CAPACITY: usize = 63;

/// Erros do protocolo.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Token excede a capacidade de {capacity} bytes")]
    Overflow { capacity: usize },

    #[error("Erro de leitura do stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Leitor incremental de registros sobre qualquer [`BufRead`].
pub struct RecordReader<R> {
    inner: R,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// `true` enquanto ainda houver bytes no stream.
    pub fn available(&mut self) -> Result<bool, ProtocolError> {
        Ok(!self.inner.fill_buf()?.is_empty())
    }

    /// Lê um token até `delimiter` (consumindo o delimitador) ou até o fim
    /// do stream.
    ///
    /// Se o token passar de `capacity` bytes retorna
    /// [`ProtocolError::Overflow`]; o cursor fica em algum ponto dentro do
    /// token e o chamador deve pular até o próximo [`RECORD_DELIMITER`].
    pub fn read_token(&mut self, delimiter: u8, capacity: usize) -> Result<String, ProtocolError> {
        let mut token = Vec::new();
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                break;
            }

            let (chunk_len, found) = match buf.iter().position(|&b| b == delimiter) {
                Some(i) => (i, true),
                None => (buf.len(), false),
            };

            if token.len() + chunk_len > capacity {
                self.inner.consume(chunk_len);
                return Err(ProtocolError::Overflow { capacity });
            }

            token.extend_from_slice(&buf[..chunk_len]);
            self.inner.consume(chunk_len + usize::from(found));
            if found {
                break;
            }
        }
        Ok(String::from_utf8_lossy(&token).into_owned())
    }

    /// Descarta bytes até e incluindo `delimiter`. Retorna `false` se o
    /// stream acabou antes.
    pub fn skip_past(&mut self, delimiter: u8) -> Result<bool, ProtocolError> {
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                return Ok(false);
            }
            match buf.iter().position(|&b| b == delimiter) {
                Some(i) => {
                    self.inner.consume(i + 1);
                    return Ok(true);
                }
                None => {
                    let len = buf.len();
                    self.inner.consume(len);
                }
            }
        }
    }
}

/// Campo conhecido e a capacidade do seu valor.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub capacity: usize,
}

impl FieldSpec {
    pub const fn new(name: &'static str, capacity: usize) -> Self {
        Self { name, capacity }
    }
}

/// Par nome/valor extraído do stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Resultado do parse de um stream.
#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    /// Campos conhecidos na ordem em que chegaram
    pub fields: Vec<Field>,
    /// Campos conhecidos cujo valor excedeu a capacidade
    pub dropped: Vec<String>,
}

impl ParsedRecords {
    /// Primeiro valor recebido para `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Consome o stream inteiro, extraindo apenas os campos de `specs`.
///
/// Comparação de nomes é exata (case-sensitive). Overflow de valor não é
/// fatal: o campo é descartado e o parse continua no próximo registro.
/// Erro de I/O encerra o parse com o que já foi lido.
pub fn parse_records<R: BufRead>(reader: &mut RecordReader<R>, specs: &[FieldSpec]) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    if let Err(e) = parse_into(reader, specs, &mut parsed) {
        warn!("Stream de resultado interrompido: {e}");
    }
    parsed
}

fn parse_into<R: BufRead>(
    reader: &mut RecordReader<R>,
    specs: &[FieldSpec],
    parsed: &mut ParsedRecords,
) -> Result<(), ProtocolError> {
    while reader.available()? {
        let name = match reader.read_token(FIELD_DELIMITER, NAME_CAPACITY) {
            Ok(name) => name,
            Err(ProtocolError::Overflow { .. }) => {
                debug!("Nome de campo longo demais, registro ignorado");
                reader.skip_past(RECORD_DELIMITER)?;
                continue;
            }
            Err(e) => return Err(e),
        };

        let Some(spec) = specs.iter().find(|s| s.name == name) else {
            debug!("Campo desconhecido ignorado: {name:?}");
            reader.skip_past(RECORD_DELIMITER)?;
            continue;
        };

        match reader.read_token(RECORD_DELIMITER, spec.capacity) {
            Ok(value) => parsed.fields.push(Field { name, value }),
            Err(ProtocolError::Overflow { capacity }) => {
                warn!("Erro: valor de '{name}' não cabe em {capacity} bytes, descartado");
                parsed.dropped.push(name);
                reader.skip_past(RECORD_DELIMITER)?;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
