use inference::ExecutionProvider;
use std::env;

pub use common::Environment;

/// MRI scans routinely exceed axum's 2 MiB default body limit.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub model_path: String,
    pub input_size: (u32, u32),
    pub execution_provider: ExecutionProvider,
    pub otel_endpoint: Option<String>,
}

impl GatewayConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);

        let model_path =
            env::var("MODEL_PATH").unwrap_or_else(|_| "models/brain_tumor_model.onnx".to_string());

        let input_width = env::var("INPUT_WIDTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(preprocess::DEFAULT_INPUT_SIZE.0);

        let input_height = env::var("INPUT_HEIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(preprocess::DEFAULT_INPUT_SIZE.1);

        let execution_provider = match env::var("EXECUTION_PROVIDER") {
            Ok(s) => s.parse().map_err(anyhow::Error::msg)?,
            Err(_) => ExecutionProvider::Cpu,
        };

        let otel_endpoint = env::var("OTEL_ENDPOINT").ok();

        Ok(Self {
            environment,
            host,
            port,
            model_path,
            input_size: (input_width, input_height),
            execution_provider,
            otel_endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "HOST",
            "PORT",
            "MODEL_PATH",
            "INPUT_WIDTH",
            "INPUT_HEIGHT",
            "EXECUTION_PROVIDER",
            "OTEL_ENDPOINT",
        ] {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn defaults_match_the_trained_model() {
        clear_env();
        let config = GatewayConfig::from_env().unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.input_size, (240, 240));
        assert_eq!(config.execution_provider, ExecutionProvider::Cpu);
        assert!(config.otel_endpoint.is_none());
    }

    #[test]
    #[serial]
    fn overrides_are_honored() {
        clear_env();
        unsafe {
            env::set_var("PORT", "9100");
            env::set_var("MODEL_PATH", "/opt/models/tumor.onnx");
            env::set_var("EXECUTION_PROVIDER", "cuda");
        }

        let config = GatewayConfig::from_env().unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.model_path, "/opt/models/tumor.onnx");
        assert_eq!(config.execution_provider, ExecutionProvider::Cuda);

        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_provider_is_an_error() {
        clear_env();
        unsafe { env::set_var("EXECUTION_PROVIDER", "npu") };

        assert!(GatewayConfig::from_env().is_err());

        clear_env();
    }
}
