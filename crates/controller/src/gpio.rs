//! GPIO/ADC via sysfs.
//!
//! Cada operação abre, lê/escreve e fecha o arquivo de controle; nada é
//! mantido em cache entre chamadas.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tank_core::config::GpioConfig;
use tank_core::types::{Level, PinDirection};
use tracing::debug;

/// Erros de acesso ao GPIO/ADC.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    #[error("Não foi possível acessar {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Valor inválido em {path}: {value:?}")]
    Parse { path: PathBuf, value: String },
}

/// Operações lógicas sobre pinos e canais analógicos.
pub trait GpioPort {
    /// Exporta o pino e define sua direção.
    fn configure(&mut self, pin: u32, direction: PinDirection) -> Result<(), GpioError>;

    fn read_digital(&mut self, pin: u32) -> Result<Level, GpioError>;

    fn write_digital(&mut self, pin: u32, level: Level) -> Result<(), GpioError>;

    /// Leitura bruta do ADC.
    fn read_analog(&mut self, channel: u32) -> Result<u32, GpioError>;
}

/// Implementação sobre `/sys/class/gpio` e o arquivo IIO do ADC.
pub struct SysfsGpio {
    config: GpioConfig,
}

impl SysfsGpio {
    pub fn new(config: GpioConfig) -> Self {
        Self { config }
    }

    fn pin_file(&self, pin: u32, leaf: &str) -> PathBuf {
        self.config.gpio_root.join(format!("gpio{pin}")).join(leaf)
    }
}

fn open_write(path: &Path) -> Result<fs::File, GpioError> {
    OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|source| GpioError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn write_line(path: &Path, text: &str) -> Result<(), GpioError> {
    let mut file = open_write(path)?;
    writeln!(file, "{text}").map_err(|source| GpioError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_text(path: &Path) -> Result<String, GpioError> {
    fs::read_to_string(path).map_err(|source| GpioError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl GpioPort for SysfsGpio {
    fn configure(&mut self, pin: u32, direction: PinDirection) -> Result<(), GpioError> {
        let export = self.config.gpio_root.join("export");
        let mut file = open_write(&export)?;
        // Pino já exportado responde EBUSY na escrita
        if let Err(e) = writeln!(file, "{pin}") {
            debug!("Export do pino {pin} ignorado: {e}");
        }
        drop(file);

        write_line(&self.pin_file(pin, "direction"), direction.as_sysfs())
    }

    fn read_digital(&mut self, pin: u32) -> Result<Level, GpioError> {
        let path = self.pin_file(pin, "value");
        let text = read_text(&path)?;
        match text.chars().next() {
            Some('0') => Ok(Level::Low),
            Some('1') => Ok(Level::High),
            _ => Err(GpioError::Parse {
                path,
                value: text,
            }),
        }
    }

    fn write_digital(&mut self, pin: u32, level: Level) -> Result<(), GpioError> {
        write_line(&self.pin_file(pin, "value"), level.as_sysfs())
    }

    fn read_analog(&mut self, channel: u32) -> Result<u32, GpioError> {
        let path = self.config.adc_path(channel);
        let text = read_text(&path)?;
        text.trim().parse::<u32>().map_err(|_| GpioError::Parse {
            path,
            value: text,
        })
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
