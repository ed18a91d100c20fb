use anyhow::bail;
use serde::Deserialize;

/// Generic cloud API response envelope.
#[derive(Deserialize)]
pub struct Response<R> {
    /// Non-zero means the request failed.
    #[serde(rename = "errno")]
    error_code: i32,

    #[serde(rename = "msg")]
    message: Option<String>,

    #[serde(rename = "result")]
    result: Option<R>,
}

impl<R> Response<R> {
    /// Check the error code and discard the result; some write endpoints
    /// return nothing on success.
    pub fn ensure_ok(&self) -> crate::prelude::Result<()> {
        if self.error_code != 0 {
            match &self.message {
                Some(message) => {
                    bail!(
                        r#"FoxESS Cloud error {error_code} ("{message}")"#,
                        error_code = self.error_code,
                    )
                }
                None => bail!("FoxESS Cloud error {error_code}", error_code = self.error_code),
            }
        }
        Ok(())
    }
}

impl<R> From<Response<R>> for crate::prelude::Result<R> {
    fn from(response: Response<R>) -> Self {
        response.ensure_ok()?;
        match response.result {
            Some(result) => Ok(result),
            None => bail!("FoxESS Cloud returned success without a result"),
        }
    }
}
