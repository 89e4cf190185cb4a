//! Mensagem falada ao responsável pelo tanque.

/// Texto inicial de toda mensagem de alerta.
pub const ALERT_PREAMBLE: &str = "Alert, your tank is running low.";

/// Capacidade máxima da mensagem em bytes.
pub const MESSAGE_CAPACITY: usize = 255;

/// Erros ao compor a mensagem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("Mensagem truncada: {needed} bytes excedem a capacidade de {capacity}")]
    Truncated { needed: usize, capacity: usize },
}

/// Buffer de texto com capacidade fixa.
///
/// Um `append` que não cabe é rejeitado por inteiro e o buffer fica como
/// estava.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBuffer {
    text: String,
    capacity: usize,
}

impl MessageBuffer {
    /// Cria o buffer com `seed`, cortado na capacidade se necessário.
    pub fn new(seed: &str, capacity: usize) -> Self {
        let mut text = String::with_capacity(capacity);
        let mut end = seed.len().min(capacity);
        while !seed.is_char_boundary(end) {
            end -= 1;
        }
        text.push_str(&seed[..end]);
        Self { text, capacity }
    }

    /// Buffer padrão começando com [`ALERT_PREAMBLE`].
    pub fn alert() -> Self {
        Self::new(ALERT_PREAMBLE, MESSAGE_CAPACITY)
    }

    pub fn append(&mut self, s: &str) -> Result<(), MessageError> {
        let needed = self.text.len() + s.len();
        if needed > self.capacity {
            return Err(MessageError::Truncated {
                needed,
                capacity: self.capacity,
            });
        }
        self.text.push_str(s);
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// `"Today's forecast is {text}. "`
pub fn today_sentence(text: &str) -> String {
    format!("Today's forecast is {text}. ")
}

/// `"Tomorrow's forecast is {text}. "`
pub fn tomorrow_sentence(text: &str) -> String {
    format!("Tomorrow's forecast is {text}. ")
}

/// Instrução final da chamada, ex: `"Press 1 to turn on the pump."`.
pub fn pump_prompt(digit: &str) -> String {
    format!("Press {digit} to turn on the pump.")
}
