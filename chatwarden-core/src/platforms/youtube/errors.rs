use chatwarden_common::error::TransportError;

const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"];
const ENDED_REASONS: &[&str] = &["liveChatEnded", "liveChatNotFound", "liveChatDisabled"];

/// Maps a non-2xx Data API response onto a transport error.
///
/// The API reports the cause in `error.errors[].reason`; the HTTP status alone
/// does not distinguish an exhausted quota from a permissions problem (both 403).
pub fn map_api_error(status: u16, body: &str) -> TransportError {
    let reasons = error_reasons(body);

    if let Some(reason) = reasons.iter().find(|r| QUOTA_REASONS.contains(&r.as_str())) {
        return TransportError::QuotaExceeded(reason.clone());
    }
    if let Some(reason) = reasons.iter().find(|r| ENDED_REASONS.contains(&r.as_str())) {
        return TransportError::SessionEnded(reason.clone());
    }
    if status >= 500 {
        return TransportError::Network(format!("HTTP {status}"));
    }
    TransportError::Http {
        status,
        body: body.to_string(),
    }
}

fn error_reasons(body: &str) -> Vec<String> {
    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };
    parsed
        .pointer("/error/errors")
        .and_then(|e| e.as_array())
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("reason").and_then(|r| r.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
