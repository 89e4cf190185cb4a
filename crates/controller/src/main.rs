//! # Tank Controller
//!
//! Monitora o nível de água do tanque por um sensor tipo eTape e, quando o
//! nível cai abaixo do limite, consulta a previsão do tempo e liga para o
//! responsável. Apertando `1` na chamada a bomba é ligada; ela desliga
//! sozinha quando o tanque volta ao nível.
//!
//! ## Uso
//! ```bash
//! tank_controller                         # config.toml ao lado do executável
//! tank_controller --config /etc/tank.toml
//! ```

mod choreo;
mod control;
mod gpio;
#[cfg(test)]
mod testing;
mod workflow;

use choreo::HttpSession;
use control::Controller;
use gpio::SysfsGpio;
use std::path::PathBuf;
use std::process::ExitCode;
use tank_core::config::AppConfig;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = config_path_from_args().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Configuração inválida: {e}");
        }
        return ExitCode::FAILURE;
    }

    // ── Sessão remota ──
    let session = match HttpSession::connect(&config.session) {
        Ok(session) => session,
        Err(e) => {
            error!("Falha ao iniciar sessão: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Sessão iniciada para a conta {}", config.session.account);

    // ── GPIO ──
    let gpio = SysfsGpio::new(config.gpio.clone());
    let strict = config.gpio.strict_setup;
    let pump_pin = config.gpio.pump_pin;
    let mut controller = Controller::new(gpio, session, config.clone());

    if let Err(e) = controller.setup() {
        if strict {
            error!("Erro ao configurar o pino da bomba {pump_pin}: {e}");
            return ExitCode::FAILURE;
        }
        warn!("Erro ao configurar o pino da bomba {pump_pin}: {e}");
        warn!("  → Continuando mesmo assim; a bomba pode não responder (gpio.strict_setup = false)");
    }

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   💧 TANK CONTROLLER – ATIVO");
    println!("══════════════════════════════════════════════");
    println!("  Sensor:    ADC canal {}", config.gpio.sensor_channel);
    println!("  Bomba:     GPIO {pump_pin}");
    println!(
        "  Alerta:    > {} | Desliga: < {}",
        config.thresholds.trigger_alert, config.thresholds.pump_off
    );
    println!(
        "  Amostras:  {} a cada {} ms",
        config.control.samples_per_reading, config.control.cycle_delay_ms
    );
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    controller.run()
}

/// `--config <caminho>` na linha de comando.
fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}
