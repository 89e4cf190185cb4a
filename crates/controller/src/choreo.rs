//! Sessão com o serviço remoto de Choreos.
//!
//! O cliente só conhece o contrato: envia o descritor (nome, perfil,
//! entradas, filtros de saída) e devolve o corpo da resposta como stream de
//! registros delimitados, lido por [`tank_core::protocol::RecordReader`].
//! Soltar o stream fecha a conexão.

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;
use tank_core::config::SessionConfig;
use tank_core::types::{Choreo, ChoreoInput, ChoreoOutput};
use tracing::{debug, info};

/// Erros da sessão e das chamadas.
#[derive(Debug, thiserror::Error)]
pub enum ChoreoError {
    #[error("Credenciais incompletas (account, app_key_name e app_key são obrigatórios)")]
    MissingCredentials,

    #[error("Erro ao ler certificado {path}: {source}")]
    Certificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Erro ao montar cliente HTTP: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Chamada excedeu o timeout de {0:?}")]
    Timeout(Duration),

    #[error("Erro ao serializar o descritor: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Erro de transporte: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Choreo retornou status {0}")]
    Status(u16),
}

/// Executa Choreos de forma bloqueante.
pub trait ChoreoClient {
    /// Stream de resultados de uma chamada bem-sucedida.
    type Results: BufRead;

    /// Bloqueia até a conclusão ou até `timeout`. `Ok` só para status de
    /// sucesso; qualquer outro retorno vira [`ChoreoError`].
    fn run(&mut self, choreo: &Choreo, timeout: Duration) -> Result<Self::Results, ChoreoError>;
}

/// Corpo JSON enviado ao gateway.
#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<&'a str>,
    inputs: &'a [ChoreoInput],
    outputs: &'a [ChoreoOutput],
}

/// Serializa o descritor no corpo JSON da chamada.
fn request_body(choreo: &Choreo) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&RunRequest {
        profile: choreo.profile.as_deref(),
        inputs: &choreo.inputs,
        outputs: &choreo.outputs,
    })
}

/// Sessão HTTP(S). Deve existir apenas uma por dispositivo.
pub struct HttpSession {
    client: Client,
    base_url: String,
    domain: String,
    app_key_name: String,
    app_key: String,
}

impl HttpSession {
    /// Valida credenciais e monta o cliente (com o PEM de confiança, se TLS).
    pub fn connect(config: &SessionConfig) -> Result<Self, ChoreoError> {
        if config.account.is_empty() || config.app_key_name.is_empty() || config.app_key.is_empty() {
            return Err(ChoreoError::MissingCredentials);
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.choreo_timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if config.use_tls {
            info!("Habilitando TLS...");
            builder = builder.https_only(true);
            if !config.trust_certificate.as_os_str().is_empty() {
                let pem = std::fs::read(&config.trust_certificate).map_err(|source| {
                    ChoreoError::Certificate {
                        path: config.trust_certificate.clone(),
                        source,
                    }
                })?;
                let cert = reqwest::Certificate::from_pem(&pem).map_err(ChoreoError::Client)?;
                builder = builder.add_root_certificate(cert);
                debug!("Certificado de confiança: {}", config.trust_certificate.display());
            }
        }

        let client = builder.build().map_err(ChoreoError::Client)?;
        let scheme = if config.use_tls { "https" } else { "http" };
        let host = config.host.replace("{account}", &config.account);

        Ok(Self {
            client,
            base_url: format!("{scheme}://{host}{}", config.base_path),
            domain: format!("/{}/master", config.account),
            app_key_name: config.app_key_name.clone(),
            app_key: config.app_key.clone(),
        })
    }

    /// URL completa de um Choreo.
    pub fn url(&self, choreo: &str) -> String {
        format!("{}{choreo}", self.base_url)
    }
}

impl ChoreoClient for HttpSession {
    type Results = BufReader<Response>;

    fn run(&mut self, choreo: &Choreo, timeout: Duration) -> Result<Self::Results, ChoreoError> {
        debug!(
            "→ {} | perfil {:?} | {} entradas | {} filtros",
            choreo.name,
            choreo.profile,
            choreo.inputs.len(),
            choreo.outputs.len()
        );

        let body = request_body(choreo).map_err(ChoreoError::Encode)?;

        let response = self
            .client
            .post(self.url(&choreo.name))
            .timeout(timeout)
            .header("x-temboo-domain", self.domain.as_str())
            .basic_auth(&self.app_key_name, Some(&self.app_key))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ChoreoError::Timeout(timeout)
                } else {
                    ChoreoError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChoreoError::Status(status.as_u16()));
        }
        Ok(BufReader::new(response))
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
