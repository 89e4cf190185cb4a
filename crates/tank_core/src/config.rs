//! Configuração unificada via TOML.
//!
//! Um único `config.toml` com pinos, thresholds, sessão remota e os dois
//! Choreos do fluxo de alerta.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Pinos e caminhos do sysfs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    /// Raiz da interface GPIO (contém `export` e `gpioN/`)
    pub gpio_root: PathBuf,
    /// Caminho do ADC com o placeholder `{channel}`
    pub adc_path_template: String,
    /// Canal ADC do sensor de nível
    pub sensor_channel: u32,
    /// Pino GPIO que aciona a bomba
    pub pump_pin: u32,
    /// Falha ao configurar o pino da bomba aborta a inicialização
    pub strict_setup: bool,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            gpio_root: PathBuf::from("/sys/class/gpio"),
            adc_path_template: "/sys/devices/12d10000.adc/iio:device0/in_voltage{channel}_raw".into(),
            sensor_channel: 2,
            pump_pin: 22,
            strict_setup: false,
        }
    }
}

impl GpioConfig {
    /// Caminho do arquivo do canal ADC.
    pub fn adc_path(&self, channel: u32) -> PathBuf {
        PathBuf::from(
            self.adc_path_template
                .replace("{channel}", &channel.to_string()),
        )
    }
}

/// Thresholds do nível (unidades brutas; valor maior = menos água).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Acima deste valor dispara o alerta (se a bomba estiver desligada)
    pub trigger_alert: u32,
    /// Abaixo deste valor a bomba é desligada
    pub pump_off: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            trigger_alert: 2100,
            pump_off: 2030,
        }
    }
}

/// Parâmetros do loop principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Amostras do ADC por leitura suavizada
    pub samples_per_reading: usize,
    /// Pausa entre ciclos (ms)
    pub cycle_delay_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            samples_per_reading: 10,
            cycle_delay_ms: 5,
        }
    }
}

/// Sessão com o serviço de Choreos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub account: String,
    pub app_key_name: String,
    pub app_key: String,
    /// Host; `{account}` é substituído pelo nome da conta
    pub host: String,
    /// Prefixo do caminho antes do nome do Choreo
    pub base_path: String,
    /// HTTPS com certificado de confiança próprio
    pub use_tls: bool,
    /// PEM adicional de confiança (vazio = só as raízes padrão)
    pub trust_certificate: PathBuf,
    /// Tempo máximo de cada chamada (segundos)
    pub choreo_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            app_key_name: String::new(),
            app_key: String::new(),
            host: "{account}.temboolive.com".into(),
            base_path: "/arcturus-web/api-1.0/ar".into(),
            use_tls: true,
            trust_certificate: PathBuf::from(
                "/opt/iothub/artik/temboo/temboo_artik_library/lib/temboo.pem",
            ),
            choreo_timeout_secs: 300,
        }
    }
}

/// Choreo de previsão do tempo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub choreo: String,
    /// Perfil do servidor com o endereço do tanque
    pub profile: String,
    pub app_source: String,
    /// Variável do resultado de onde os filtros extraem o texto
    pub response_variable: String,
    pub today_path: String,
    pub tomorrow_path: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            choreo: "/Library/Yahoo/Weather/GetWeatherByAddress".into(),
            profile: "weather".into(),
            app_source: "WaterManagementApp".into(),
            response_variable: "Response".into(),
            today_path: "/rss/channel/item/yweather:forecast[1]/@text".into(),
            tomorrow_path: "/rss/channel/item/yweather:forecast[2]/@text".into(),
        }
    }
}

/// Choreo da chamada de voz com captura de tecla.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub choreo: String,
    /// Perfil com APIKey, APISecret, ByeText, MaxDigits e To
    pub profile: String,
    pub app_source: String,
    /// Tecla que autoriza ligar a bomba
    pub confirm_digit: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            choreo: "/Library/Nexmo/Voice/CaptureTextToSpeechPrompt".into(),
            profile: "voice".into(),
            app_source: "WaterManagementApp".into(),
            confirm_digit: "1".into(),
        }
    }
}

/// Configuração raiz do controlador.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gpio: GpioConfig,
    pub thresholds: Thresholds,
    pub control: ControlConfig,
    pub session: SessionConfig,
    pub weather: WeatherConfig,
    pub voice: VoiceConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.thresholds.trigger_alert <= self.thresholds.pump_off {
            errors.push(format!(
                "Threshold de alerta ({}) deve ser maior que o de desligar a bomba ({})",
                self.thresholds.trigger_alert, self.thresholds.pump_off
            ));
        }
        if self.control.samples_per_reading == 0 {
            errors.push("Número de amostras por leitura não pode ser 0".into());
        }
        if !self.gpio.adc_path_template.contains("{channel}") {
            errors.push(format!(
                "Caminho do ADC sem placeholder {{channel}}: {}",
                self.gpio.adc_path_template
            ));
        }
        if self.session.choreo_timeout_secs == 0 {
            errors.push("Timeout das chamadas remotas não pode ser 0".into());
        }
        if self.voice.confirm_digit.is_empty() {
            errors.push("Tecla de confirmação não pode ser vazia".into());
        }

        errors
    }
}
