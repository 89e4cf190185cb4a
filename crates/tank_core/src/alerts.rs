//! Sistema de alertas – faixas de nível e decisão por ciclo.

use crate::config::Thresholds;
use crate::types::{PumpState, SensorReading};

/// Faixa em que a leitura se encontra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelBand {
    /// Abaixo do threshold de desligar (tanque cheio o bastante)
    Full,
    /// Dentro da faixa de histerese
    Normal,
    /// Acima do threshold de alerta (tanque baixo)
    Low,
}

/// Ação que o loop principal deve executar neste ciclo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Hold,
    RaiseAlert,
    StopPump,
}

/// Retorna a [`LevelBand`] de uma leitura.
pub fn band_for_reading(reading: SensorReading, thresholds: &Thresholds) -> LevelBand {
    if reading.raw() > thresholds.trigger_alert {
        LevelBand::Low
    } else if reading.raw() < thresholds.pump_off {
        LevelBand::Full
    } else {
        LevelBand::Normal
    }
}

/// Decide a ação do ciclo.
///
/// O alerta só dispara com a bomba desligada; a bomba só é desligada se
/// estiver ligada. Com `trigger_alert > pump_off` as duas condições nunca
/// valem ao mesmo tempo.
pub fn decide(reading: SensorReading, pump: PumpState, thresholds: &Thresholds) -> Action {
    match (band_for_reading(reading, thresholds), pump) {
        (LevelBand::Low, PumpState::Off) => Action::RaiseAlert,
        (LevelBand::Full, PumpState::On) => Action::StopPump,
        _ => Action::Hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn bands() {
        assert_eq!(band_for_reading(SensorReading(2200), &t()), LevelBand::Low);
        assert_eq!(band_for_reading(SensorReading(2100), &t()), LevelBand::Normal);
        assert_eq!(band_for_reading(SensorReading(2030), &t()), LevelBand::Normal);
        assert_eq!(band_for_reading(SensorReading(2029), &t()), LevelBand::Full);
    }

    #[test]
    fn alert_only_above_trigger_with_pump_off() {
        assert_eq!(decide(SensorReading(2101), PumpState::Off, &t()), Action::RaiseAlert);
        assert_eq!(decide(SensorReading(2101), PumpState::On, &t()), Action::Hold);
        assert_eq!(decide(SensorReading(2100), PumpState::Off, &t()), Action::Hold);
    }

    #[test]
    fn stop_only_below_pump_off_with_pump_on() {
        assert_eq!(decide(SensorReading(2029), PumpState::On, &t()), Action::StopPump);
        assert_eq!(decide(SensorReading(2029), PumpState::Off, &t()), Action::Hold);
        assert_eq!(decide(SensorReading(2030), PumpState::On, &t()), Action::Hold);
    }

    #[test]
    fn hysteresis_band_holds_both_states() {
        for raw in 2030..=2100 {
            assert_eq!(decide(SensorReading(raw), PumpState::On, &t()), Action::Hold);
            assert_eq!(decide(SensorReading(raw), PumpState::Off, &t()), Action::Hold);
        }
    }
}
