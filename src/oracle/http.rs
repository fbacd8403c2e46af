use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, error};

use super::{
    Identification, LivenessJudgment, OracleError, VerificationOracle, VerificationPrompt,
};
use crate::{model::student::Student, photo::PhotoDataUri};

/// JSON-over-HTTP client for the oracle flows.
///
/// No request timeout is configured; a session step waits until the oracle
/// answers or the connection fails.
#[derive(Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivenessRequest<'a> {
    photo_data_uri: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdentifyRequest<'a> {
    photo_data_uri: &'a str,
    students: &'a [Student],
}

impl HttpOracle {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn call<B, T>(&self, endpoint: &'static str, body: &B) -> Result<T, OracleError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, "Calling oracle");

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, endpoint, "Oracle unreachable");
            OracleError::Transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(endpoint, status = status.as_u16(), "Oracle returned an error status");
            return Err(OracleError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

impl VerificationOracle for HttpOracle {
    async fn generate_verification_prompt(&self) -> Result<VerificationPrompt, OracleError> {
        self.call("generateVerificationPrompt", &json!({})).await
    }

    async fn detect_liveness(&self, photo: &PhotoDataUri) -> Result<LivenessJudgment, OracleError> {
        self.call(
            "detectLiveness",
            &LivenessRequest {
                photo_data_uri: photo.as_str(),
            },
        )
        .await
    }

    async fn identify_student(
        &self,
        photo: &PhotoDataUri,
        students: &[Student],
    ) -> Result<Identification, OracleError> {
        self.call(
            "identifyStudent",
            &IdentifyRequest {
                photo_data_uri: photo.as_str(),
                students,
            },
        )
        .await
    }
}
