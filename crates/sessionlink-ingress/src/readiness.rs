//! Readiness check backed by a codec self-test

use sessionlink_core::SessionUrlCodec;
use sessionlink_observability::{ComponentStatus, ReadinessChecker};
use std::sync::Arc;

const PROBE_TOKEN: &str = "c2Vzc2lvbmxpbms=";

/// Reports the codec ready when a token survives encode then decode
pub struct CodecReadinessChecker {
    codec: Arc<SessionUrlCodec>,
}

impl CodecReadinessChecker {
    pub fn new(codec: Arc<SessionUrlCodec>) -> Self {
        Self { codec }
    }
}

impl ReadinessChecker for CodecReadinessChecker {
    fn check(&self) -> Vec<ComponentStatus> {
        let name = format!("codec:{}", self.codec.encoding().name());
        let status = match self
            .codec
            .encode(PROBE_TOKEN)
            .and_then(|encoded| self.codec.decode(&encoded))
        {
            Ok(decoded) if decoded == PROBE_TOKEN => ComponentStatus::healthy(name),
            Ok(decoded) => ComponentStatus::unhealthy(
                name,
                format!("round trip produced '{}'", decoded),
            ),
            Err(err) => ComponentStatus::unhealthy(name, err.to_string()),
        };
        vec![status]
    }
}
