//! Request-level signing facade.
//!
//! Validates a [`SignRequest`], decodes its hex payload, hands it to the
//! [`NativeInvoker`] and re-encodes the three result fields as hex.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::app_info::{AppInfo, AppInfoSource};
use crate::config::SignServiceConfig;
use crate::error::{Error, Result};
use crate::hex;
use crate::native::{EntryPoint, InvokerSettings, NativeInvoker, ServiceState, SignOutput};

/// Longest accepted `src`, in hex characters (checked before decoding)
pub const MAX_SRC_HEX_LEN: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignRequest {
    pub cmd: String,
    /// Hex-encoded payload
    pub src: String,
    pub seq: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueResponse {
    pub token: String,
    pub extra: String,
    pub sign: String,
}

impl From<&SignOutput> for ValueResponse {
    fn from(output: &SignOutput) -> Self {
        Self {
            token: hex::encode(&output.token),
            extra: hex::encode(&output.extra),
            sign: hex::encode(&output.sign),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    pub platform: String,
    pub version: String,
    pub value: ValueResponse,
}

impl SignRequest {
    /// Check the request shape. Returns the native `seq`.
    pub fn validate(&self) -> Result<i32> {
        if self.cmd.is_empty() {
            return Err(Error::Validation("cmd must not be empty".to_string()));
        }
        if self.src.is_empty() {
            return Err(Error::Validation("src must not be empty".to_string()));
        }
        if self.seq < 0 {
            return Err(Error::Validation(
                "seq must be greater than or equal to 0".to_string(),
            ));
        }
        let seq = i32::try_from(self.seq)
            .map_err(|_| Error::Validation(format!("seq {} is out of range", self.seq)))?;
        if self.src.len() > MAX_SRC_HEX_LEN {
            return Err(Error::Validation(format!(
                "src is too long: {} characters (max: {})",
                self.src.len(),
                MAX_SRC_HEX_LEN
            )));
        }
        Ok(seq)
    }
}

/// The signing service as seen by the hosting process.
pub struct SignService {
    settings: InvokerSettings,
    invoker: NativeInvoker,
    app_info: AppInfoSource,
}

impl SignService {
    pub fn new(config: &SignServiceConfig) -> Self {
        info!(
            "Signing service configured: host={}, port={}, libs={}",
            config.host,
            config.port,
            config.libs.len()
        );
        Self {
            settings: config.invoker_settings(),
            invoker: NativeInvoker::new(),
            app_info: AppInfoSource::new(config.app_info_paths.clone()),
        }
    }

    /// Build around an invoker that is already set up.
    pub fn with_invoker(invoker: NativeInvoker, app_info: AppInfoSource) -> Self {
        Self {
            settings: InvokerSettings::default(),
            invoker,
            app_info,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.invoker.state()
    }

    pub fn entry_point(&self) -> Option<EntryPoint> {
        self.invoker.entry_point()
    }

    pub fn app_info_source(&self) -> &AppInfoSource {
        &self.app_info
    }

    /// Load the configured module (or fall back to test mode).
    pub fn initialize(&mut self) -> Result<()> {
        self.invoker.initialize(&self.settings)
    }

    /// Release the module. In-flight calls must have finished; `&mut self`
    /// makes that the caller's obligation.
    pub fn unload(&mut self) {
        self.invoker.unload();
    }

    /// Sign one request.
    pub fn sign(&self, request: &SignRequest) -> Result<SignResponse> {
        info!(
            cmd = %request.cmd,
            seq = request.seq,
            len = request.src.len(),
            "Signing request"
        );

        let result = self.sign_inner(request);
        match &result {
            Ok(response) => info!(
                token_len = response.value.token.len(),
                extra_len = response.value.extra.len(),
                sign_len = response.value.sign.len(),
                "Signing completed"
            ),
            Err(e) if e.is_client_error() => warn!("Rejected signing request: {}", e),
            Err(e) => error!("Signing failed: {}", e),
        }
        result
    }

    fn sign_inner(&self, request: &SignRequest) -> Result<SignResponse> {
        let seq = request.validate()?;
        let src = hex::decode(&request.src).map_err(|e| Error::Validation(format!("src: {}", e)))?;

        let output = self.invoker.invoke(&request.cmd, &src, seq)?;
        let AppInfo { platform, version } = self.app_info.app_info();

        Ok(SignResponse {
            platform,
            version,
            value: ValueResponse::from(&output),
        })
    }
}
