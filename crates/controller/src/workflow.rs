//! Fluxo de alerta: previsão do tempo + chamada de voz com captura de tecla.
//!
//! As duas chamadas são sequenciais e bloqueantes. Falha em qualquer uma
//! apenas pula o processamento do resultado daquela chamada; não há retry.

use crate::choreo::ChoreoClient;
use std::time::Duration;
use tank_core::config::{VoiceConfig, WeatherConfig};
use tank_core::message::{self, MessageBuffer};
use tank_core::protocol::{parse_records, FieldSpec, RecordReader};
use tank_core::types::Choreo;
use tracing::{debug, info, warn};

/// Entrada que identifica a aplicação de origem nas chamadas.
const APP_SOURCE_INPUT: &str = "TmbAppSrc";

const FORECAST_CAPACITY: usize = 63;
const DIGITS_CAPACITY: usize = 31;

/// Resposta do responsável à chamada de voz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keypress {
    /// Tecla de confirmação pressionada: ligar a bomba
    Confirmed,
    /// Outra tecla, ou nenhuma
    Declined(Option<String>),
    /// A chamada falhou; nada foi lido
    CallFailed,
}

/// Resultado de uma execução do fluxo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertOutcome {
    /// Texto falado na chamada
    pub message: String,
    /// A previsão do tempo foi obtida
    pub forecast: bool,
    pub keypress: Keypress,
}

/// Descritor do Choreo de previsão.
pub fn weather_choreo(config: &WeatherConfig) -> Choreo {
    Choreo::new(&config.choreo)
        .with_profile(&config.profile)
        .input(APP_SOURCE_INPUT, &config.app_source)
        .output("tomorrow", &config.tomorrow_path, &config.response_variable)
        .output("today", &config.today_path, &config.response_variable)
}

/// Descritor do Choreo de voz com o texto `text`.
pub fn voice_choreo(config: &VoiceConfig, text: &str) -> Choreo {
    Choreo::new(&config.choreo)
        .input("Text", text)
        .input(APP_SOURCE_INPUT, &config.app_source)
        .with_profile(&config.profile)
}

/// Busca a previsão e acrescenta hoje/amanhã à mensagem, nessa ordem.
///
/// Retorna `true` se a chamada teve sucesso.
pub fn fetch_forecast<C: ChoreoClient>(
    client: &mut C,
    config: &WeatherConfig,
    timeout: Duration,
    msg: &mut MessageBuffer,
) -> bool {
    let results = match client.run(&weather_choreo(config), timeout) {
        Ok(results) => results,
        Err(e) => {
            warn!("Previsão do tempo indisponível: {e}");
            return false;
        }
    };

    let parsed = parse_records(&mut RecordReader::new(results), &[
        FieldSpec::new("today", FORECAST_CAPACITY),
        FieldSpec::new("tomorrow", FORECAST_CAPACITY),
    ]);

    let sentences = [
        parsed.get("today").map(message::today_sentence),
        parsed.get("tomorrow").map(message::tomorrow_sentence),
    ];
    for sentence in sentences.into_iter().flatten() {
        if let Err(e) = msg.append(&sentence) {
            warn!("{e}; trecho da previsão descartado");
        }
    }

    debug!("Previsão: hoje {:?} | amanhã {:?}", parsed.get("today"), parsed.get("tomorrow"));
    true
}

/// Faz a chamada de voz com `text` e interpreta a tecla pressionada.
pub fn capture_keypress<C: ChoreoClient>(
    client: &mut C,
    config: &VoiceConfig,
    timeout: Duration,
    text: &str,
) -> Keypress {
    let results = match client.run(&voice_choreo(config, text), timeout) {
        Ok(results) => results,
        Err(e) => {
            warn!("Chamada de voz falhou: {e}");
            return Keypress::CallFailed;
        }
    };

    let parsed = parse_records(&mut RecordReader::new(results), &[FieldSpec::new(
        "Digits",
        DIGITS_CAPACITY,
    )]);

    match parsed.get("Digits") {
        Some(digits) if digits == config.confirm_digit => Keypress::Confirmed,
        other => Keypress::Declined(other.map(str::to_owned)),
    }
}

/// Executa o fluxo completo: previsão, prompt e chamada de voz.
pub fn run_alert<C: ChoreoClient>(
    client: &mut C,
    weather: &WeatherConfig,
    voice: &VoiceConfig,
    timeout: Duration,
) -> AlertOutcome {
    let mut msg = MessageBuffer::alert();

    let forecast = fetch_forecast(client, weather, timeout, &mut msg);

    if let Err(e) = msg.append(&message::pump_prompt(&voice.confirm_digit)) {
        warn!("{e}; instrução da tecla descartada");
    }

    info!("Ligando para o responsável: {:?}", msg.as_str());
    let keypress = capture_keypress(client, voice, timeout, msg.as_str());
    info!("Resposta da chamada: {keypress:?}");

    AlertOutcome {
        message: msg.into_string(),
        forecast,
        keypress,
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{input, ScriptedClient};

    const TIMEOUT: Duration = Duration::from_secs(300);

    #[test]
    fn weather_descriptor_matches_outputs() {
        let choreo = weather_choreo(&WeatherConfig::default());
        assert_eq!(choreo.name, "/Library/Yahoo/Weather/GetWeatherByAddress");
        assert_eq!(input(&choreo, "TmbAppSrc"), Some("WaterManagementApp"));
        let names: Vec<_> = choreo.outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["tomorrow", "today"]);
        assert!(choreo.outputs.iter().all(|o| o.variable == "Response"));
    }

    #[test]
    fn forecast_appends_today_then_tomorrow() {
        let mut client = ScriptedClient::new().respond(&[("today", "sunny"), ("tomorrow", "rain")]);
        let mut msg = MessageBuffer::new("", 255);
        assert!(fetch_forecast(&mut client, &WeatherConfig::default(), TIMEOUT, &mut msg));
        assert_eq!(
            msg.as_str(),
            "Today's forecast is sunny. Tomorrow's forecast is rain. "
        );
    }

    #[test]
    fn forecast_order_does_not_follow_stream_order() {
        let mut client = ScriptedClient::new().respond(&[("tomorrow", "rain"), ("today", "sunny")]);
        let mut msg = MessageBuffer::new("", 255);
        fetch_forecast(&mut client, &WeatherConfig::default(), TIMEOUT, &mut msg);
        assert!(msg.as_str().starts_with("Today's forecast is sunny."));
    }

    #[test]
    fn forecast_with_only_tomorrow() {
        let mut client = ScriptedClient::new().respond(&[("tomorrow", "storms")]);
        let mut msg = MessageBuffer::alert();
        fetch_forecast(&mut client, &WeatherConfig::default(), TIMEOUT, &mut msg);
        assert_eq!(
            msg.as_str(),
            "Alert, your tank is running low.Tomorrow's forecast is storms. "
        );
    }

    #[test]
    fn failed_forecast_leaves_message_untouched() {
        let mut client = ScriptedClient::new().fail(500);
        let mut msg = MessageBuffer::alert();
        assert!(!fetch_forecast(&mut client, &WeatherConfig::default(), TIMEOUT, &mut msg));
        assert_eq!(msg, MessageBuffer::alert());
    }

    #[test]
    fn unknown_forecast_fields_do_not_touch_message() {
        let mut client = ScriptedClient::new().respond(&[("Response", "<rss/>"), ("HTTP_CODE", "200")]);
        let mut msg = MessageBuffer::alert();
        fetch_forecast(&mut client, &WeatherConfig::default(), TIMEOUT, &mut msg);
        assert_eq!(msg, MessageBuffer::alert());
    }

    #[test]
    fn digit_one_confirms() {
        let mut client = ScriptedClient::new().respond(&[("Digits", "1")]);
        let keypress = capture_keypress(&mut client, &VoiceConfig::default(), TIMEOUT, "x");
        assert_eq!(keypress, Keypress::Confirmed);
    }

    #[test]
    fn other_digits_decline() {
        for digits in ["2", "11", " 1", ""] {
            let mut client = ScriptedClient::new().respond(&[("Digits", digits)]);
            let keypress = capture_keypress(&mut client, &VoiceConfig::default(), TIMEOUT, "x");
            assert_eq!(keypress, Keypress::Declined(Some(digits.to_string())));
        }
    }

    #[test]
    fn missing_digits_decline() {
        let mut client = ScriptedClient::new().respond(&[("CallID", "abc")]);
        let keypress = capture_keypress(&mut client, &VoiceConfig::default(), TIMEOUT, "x");
        assert_eq!(keypress, Keypress::Declined(None));
    }

    #[test]
    fn failed_voice_call() {
        let mut client = ScriptedClient::new().fail(401);
        let keypress = capture_keypress(&mut client, &VoiceConfig::default(), TIMEOUT, "x");
        assert_eq!(keypress, Keypress::CallFailed);
    }

    #[test]
    fn full_alert_message() {
        let mut client = ScriptedClient::new()
            .respond(&[("today", "sunny"), ("tomorrow", "rain")])
            .respond(&[("Digits", "1")]);
        let outcome = run_alert(
            &mut client,
            &WeatherConfig::default(),
            &VoiceConfig::default(),
            TIMEOUT,
        );
        let expected = "Alert, your tank is running low.\
                        Today's forecast is sunny. Tomorrow's forecast is rain. \
                        Press 1 to turn on the pump.";
        assert_eq!(outcome.message, expected);
        assert!(outcome.forecast);
        assert_eq!(outcome.keypress, Keypress::Confirmed);

        let voice = &client.calls[1];
        assert_eq!(voice.name, "/Library/Nexmo/Voice/CaptureTextToSpeechPrompt");
        assert_eq!(input(voice, "Text"), Some(expected));
        assert_eq!(input(voice, "TmbAppSrc"), Some("WaterManagementApp"));
        assert_eq!(voice.profile.as_deref(), Some("voice"));
    }

    #[test]
    fn weather_failure_still_places_call_with_base_message() {
        let mut client = ScriptedClient::new().fail(503).respond(&[("Digits", "3")]);
        let outcome = run_alert(
            &mut client,
            &WeatherConfig::default(),
            &VoiceConfig::default(),
            TIMEOUT,
        );
        assert_eq!(
            outcome.message,
            "Alert, your tank is running low.Press 1 to turn on the pump."
        );
        assert!(!outcome.forecast);
        assert_eq!(outcome.keypress, Keypress::Declined(Some("3".into())));
        assert_eq!(client.calls.len(), 2);
    }

    #[test]
    fn timeout_is_forwarded() {
        let mut client = ScriptedClient::new().respond(&[]).respond(&[]);
        run_alert(
            &mut client,
            &WeatherConfig::default(),
            &VoiceConfig::default(),
            Duration::from_secs(42),
        );
        assert!(client.timeouts.iter().all(|t| *t == Duration::from_secs(42)));
    }
}
