//! External-process predictor
//!
//! Runs `<program> [args..] <features-json>` and reads one JSON object from
//! stdout: `{"risk_score": f64, "confidence": f64, "risk_level"?: u8}`.
//! A non-zero exit, an `error` field or anything unparsable is reported as
//! unavailable. The child is killed if the call times out or is dropped.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::features::MlFeatures;
use super::predictor::{MlPrediction, Prediction, RiskPredictor, UnavailableReason};

/// Default budget for one prediction
pub const DEFAULT_PREDICTOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Predictor backed by an external model process
#[derive(Debug, Clone)]
pub struct SubprocessPredictor {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct PredictorOutput {
    risk_score: Option<f64>,
    confidence: Option<f64>,
    risk_level: Option<u8>,
    error: Option<String>,
}

impl SubprocessPredictor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_PREDICTOR_TIMEOUT,
        }
    }

    /// Arguments placed before the features payload, e.g. a script path
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, features: &MlFeatures) -> Result<MlPrediction, UnavailableReason> {
        let payload = serde_json::to_string(features)
            .map_err(|e| UnavailableReason::Encoding(e.to_string()))?;

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(payload)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| UnavailableReason::Spawn(format!("{}: {}", self.program.display(), e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| UnavailableReason::Timeout(self.timeout))?
            .map_err(|e| UnavailableReason::ProcessFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UnavailableReason::ProcessFailed(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_prediction(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse and validate the predictor's stdout
pub fn parse_prediction(stdout: &str) -> Result<MlPrediction, UnavailableReason> {
    let output: PredictorOutput = serde_json::from_str(stdout.trim())
        .map_err(|e| UnavailableReason::MalformedOutput(e.to_string()))?;

    if let Some(error) = output.error {
        return Err(UnavailableReason::MalformedOutput(format!(
            "predictor reported error: {}",
            error
        )));
    }

    match (output.risk_score, output.confidence) {
        (Some(risk_score), Some(confidence)) => {
            MlPrediction::checked(risk_score, confidence, output.risk_level)
        }
        _ => Err(UnavailableReason::MalformedOutput(
            "missing risk_score or confidence".to_string(),
        )),
    }
}

#[async_trait]
impl RiskPredictor for SubprocessPredictor {
    #[instrument(skip(self, features), fields(program = %self.program.display()))]
    async fn predict(&self, features: &MlFeatures) -> Prediction {
        match self.run(features).await {
            Ok(prediction) => {
                debug!(
                    risk_score = prediction.risk_score,
                    confidence = prediction.confidence,
                    "ML prediction received"
                );
                Prediction::Available(prediction)
            }
            Err(reason) => {
                debug!(%reason, "ML prediction unavailable");
                Prediction::Unavailable(reason)
            }
        }
    }

    fn name(&self) -> &'static str {
        "subprocess"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> MlFeatures {
        MlFeatures {
            avg_speed: 45.0,
            max_speed: 72.0,
            speed_variance: 30.0,
            speeding_rate: 0.05,
            harsh_braking_rate: 0.01,
            harsh_accel_rate: 0.0,
            harsh_turning_rate: 0.0,
            phone_usage_rate: 0.0,
            night_driving_rate: 0.1,
            weekend_driving_rate: 0.2,
            total_trips: 4,
            avg_trip_length: 25.0,
            bad_weather_rate: 0.0,
            data_points: 100,
            time_span_days: 7,
        }
    }

    #[test]
    fn test_parse_valid_output() {
        let prediction =
            parse_prediction("{\"risk_score\": 41.5, \"confidence\": 0.82, \"risk_level\": 1}\n")
                .unwrap();
        assert_eq!(prediction.risk_score, 41.5);
        assert_eq!(prediction.confidence, 0.82);
        assert_eq!(prediction.risk_level, Some(1));
    }

    #[test]
    fn test_parse_rejects_error_field() {
        let result = parse_prediction(r#"{"error": "model not loaded", "risk_score": 50, "confidence": 0.5}"#);
        assert!(matches!(result, Err(UnavailableReason::MalformedOutput(_))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_prediction("Traceback (most recent call last)").is_err());
        assert!(parse_prediction(r#"{"risk_score": 50}"#).is_err());
        assert!(parse_prediction(r#"{"risk_score": 250, "confidence": 0.9}"#).is_err());
        assert!(parse_prediction("").is_err());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_failure() {
        let predictor = SubprocessPredictor::new("/nonexistent/risk-model");
        let prediction = predictor.predict(&features()).await;
        assert!(matches!(
            prediction,
            Prediction::Unavailable(UnavailableReason::Spawn(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_process() {
        let predictor = SubprocessPredictor::new("sh").with_args([
            "-c",
            r#"echo '{"risk_score": 33, "confidence": 0.9}'"#,
        ]);
        let prediction = predictor.predict(&features()).await;
        assert_eq!(
            prediction.available().map(|p| p.risk_score),
            Some(33.0)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_features_passed_as_last_argument() {
        // With `sh -c`, the first trailing argument becomes $0
        let predictor = SubprocessPredictor::new("sh").with_args([
            "-c",
            r#"case "$0" in *'"data_points":100'*) echo '{"risk_score": 12, "confidence": 0.75}';; *) exit 9;; esac"#,
        ]);
        let prediction = predictor.predict(&features()).await;
        assert_eq!(
            prediction.available().map(|p| p.risk_score),
            Some(12.0)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit() {
        let predictor = SubprocessPredictor::new("sh").with_args(["-c", "echo boom >&2; exit 3"]);
        let prediction = predictor.predict(&features()).await;
        match prediction {
            Prediction::Unavailable(UnavailableReason::ProcessFailed(message)) => {
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_process_times_out() {
        let predictor = SubprocessPredictor::new("sh")
            .with_args(["-c", "sleep 5"])
            .with_timeout(Duration::from_millis(100));
        let prediction = predictor.predict(&features()).await;
        assert_eq!(
            prediction,
            Prediction::Unavailable(UnavailableReason::Timeout(Duration::from_millis(100)))
        );
    }
}
