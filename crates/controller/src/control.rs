//! Loop principal: amostra o sensor, decide pelos thresholds e aciona o
//! fluxo de alerta ou a bomba.

use crate::choreo::ChoreoClient;
use crate::gpio::{GpioError, GpioPort};
use crate::workflow::{self, AlertOutcome, Keypress};
use std::time::Duration;
use tank_core::alerts::{self, Action};
use tank_core::config::AppConfig;
use tank_core::types::{Level, PinDirection, PumpState, SensorReading};
use tracing::{debug, error, info, warn};

/// O que aconteceu em um ciclo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    /// Alguma amostra falhou; nenhuma decisão tomada
    SensorFault,
    Hold(SensorReading),
    Alerted {
        reading: SensorReading,
        outcome: AlertOutcome,
    },
    PumpStopped(SensorReading),
}

/// Contexto da aplicação: hardware, sessão remota, configuração e estado.
pub struct Controller<G, C> {
    gpio: G,
    client: C,
    config: AppConfig,
    pump: PumpState,
    last_reading: Option<SensorReading>,
}

impl<G: GpioPort, C: ChoreoClient> Controller<G, C> {
    pub fn new(gpio: G, client: C, config: AppConfig) -> Self {
        Self {
            gpio,
            client,
            config,
            pump: PumpState::Off,
            last_reading: None,
        }
    }

    /// Configura o pino da bomba como saída.
    pub fn setup(&mut self) -> Result<(), GpioError> {
        self.gpio
            .configure(self.config.gpio.pump_pin, PinDirection::Out)
    }

    pub fn pump(&self) -> PumpState {
        self.pump
    }

    /// Média de `samples_per_reading` leituras do ADC. Uma falha descarta tudo.
    pub fn sample(&mut self) -> Result<SensorReading, GpioError> {
        let count = self.config.control.samples_per_reading.max(1);
        let channel = self.config.gpio.sensor_channel;
        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            samples.push(self.gpio.read_analog(channel)?);
        }
        // count >= 1, nunca None
        Ok(SensorReading::from_samples(&samples).unwrap_or_default())
    }

    /// Executa um ciclo completo (sem a pausa).
    pub fn step(&mut self) -> Cycle {
        let reading = match self.sample() {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Leitura do sensor descartada: {e}");
                self.last_reading = None;
                return Cycle::SensorFault;
            }
        };
        self.last_reading = Some(reading);
        info!("Nível da água: {reading}");

        let thresholds = &self.config.thresholds;
        match alerts::decide(reading, self.pump, thresholds) {
            Action::RaiseAlert => {
                info!(
                    "Nível baixo ({reading} > {}), iniciando alerta",
                    thresholds.trigger_alert
                );
                let timeout = Duration::from_secs(self.config.session.choreo_timeout_secs);
                let outcome = workflow::run_alert(
                    &mut self.client,
                    &self.config.weather,
                    &self.config.voice,
                    timeout,
                );
                if !outcome.forecast {
                    warn!("Alerta enviado sem previsão do tempo");
                }
                if outcome.keypress == Keypress::Confirmed {
                    self.drive_pump(PumpState::On);
                }
                Cycle::Alerted { reading, outcome }
            }
            Action::StopPump => {
                info!(
                    "Tanque reabastecido ({reading} < {}), desligando bomba",
                    thresholds.pump_off
                );
                self.drive_pump(PumpState::Off);
                Cycle::PumpStopped(reading)
            }
            Action::Hold => Cycle::Hold(reading),
        }
    }

    /// Roda para sempre com a pausa configurada entre ciclos.
    pub fn run(&mut self) -> ! {
        let delay = Duration::from_millis(self.config.control.cycle_delay_ms);
        loop {
            let cycle = self.step();
            debug!("Ciclo: {cycle:?}");
            std::thread::sleep(delay);
        }
    }

    /// Escreve o nível do pino da bomba. O estado segue o comando mesmo se a
    /// escrita falhar.
    fn drive_pump(&mut self, state: PumpState) {
        let pin = self.config.gpio.pump_pin;
        let level = if state.is_on() { Level::High } else { Level::Low };

        if let Err(e) = self.gpio.write_digital(pin, level) {
            error!("Falha ao acionar a bomba ({state}): {e}");
        }
        self.pump = state;
        match self.last_reading {
            Some(reading) => info!("Bomba {state} (nível {reading})"),
            None => info!("Bomba {state}"),
        }

        match self.gpio.read_digital(pin) {
            Ok(actual) if actual != level => {
                warn!("Pino {pin} lido como {actual:?} após escrever {level:?}");
            }
            Ok(_) => {}
            Err(e) => debug!("Sem leitura de confirmação do pino {pin}: {e}"),
        }
    }

    #[cfg(test)]
    pub(crate) fn last_reading(&self) -> Option<SensorReading> {
        self.last_reading
    }

    #[cfg(test)]
    pub(crate) fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    #[cfg(test)]
    pub(crate) fn client(&self) -> &C {
        &self.client
    }

    #[cfg(test)]
    pub(crate) fn gpio(&self) -> &G {
        &self.gpio
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
