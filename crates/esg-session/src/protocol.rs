//! Wire codec for the report session: server frames are decoded into a closed
//! [`ServerMessage`] union and client frames are encoded from [`ClientFrame`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ProtocolError, SessionError};

#[derive(Debug, Clone, Deserialize)]
struct ServerEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDetailsPayload {
    pub gics_sector: String,
    pub gics_industry_group: String,
    pub gics_industry: String,
    pub company_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAssessmentPayload {
    pub gri_topic: String,
    pub reporting_requirements: String,
    #[serde(rename = "assesment")]
    pub assessment: String,
    #[serde(default)]
    pub source_texts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
/// Opaque question content surfaced verbatim to the reviewer.
pub struct PromptPayload(pub Value);

impl PromptPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self(Value::String(text.into()))
    }

    /// Plain strings render as-is; structured blocks fall back to pretty JSON.
    pub fn as_text(&self) -> String {
        match &self.0 {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Enumerates decoded server frames. Kinds this client does not know about land
/// in `Unknown` instead of failing the session.
pub enum ServerMessage {
    Progress(String),
    CompanyDetails(CompanyDetailsPayload),
    CompanyDetailsInputRequired(PromptPayload),
    GriTopics(Vec<String>),
    GriTopicsInputRequired(PromptPayload),
    TopicAssessment(TopicAssessmentPayload),
    UnSdgList(Vec<String>),
    ServerError(String),
    Unknown { kind: String },
}

impl ServerMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope =
            serde_json::from_str::<ServerEnvelope>(text).map_err(ProtocolError::Frame)?;
        Self::from_envelope(envelope)
    }

    fn from_envelope(envelope: ServerEnvelope) -> Result<Self, ProtocolError> {
        let ServerEnvelope { kind, payload } = envelope;
        let message = match kind.as_str() {
            "progress" => Self::Progress(payload_text(payload)),
            "company_details" => Self::CompanyDetails(decode_payload("company_details", payload)?),
            "input_required_company_details" => {
                Self::CompanyDetailsInputRequired(PromptPayload(payload))
            }
            "gri_topics" => Self::GriTopics(decode_payload("gri_topics", payload)?),
            "input_required_gri_topics" => Self::GriTopicsInputRequired(PromptPayload(payload)),
            "topic_assesment" => {
                Self::TopicAssessment(decode_payload("topic_assesment", payload)?)
            }
            "un_sdg_list" => Self::UnSdgList(decode_payload("un_sdg_list", payload)?),
            "error" => Self::ServerError(payload_text(payload)),
            other => Self::Unknown {
                kind: other.to_string(),
            },
        };
        Ok(message)
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Progress(_) => "progress",
            Self::CompanyDetails(_) => "company_details",
            Self::CompanyDetailsInputRequired(_) => "input_required_company_details",
            Self::GriTopics(_) => "gri_topics",
            Self::GriTopicsInputRequired(_) => "input_required_gri_topics",
            Self::TopicAssessment(_) => "topic_assesment",
            Self::UnSdgList(_) => "un_sdg_list",
            Self::ServerError(_) => "error",
            Self::Unknown { kind } => kind.as_str(),
        }
    }

    /// Whether handling this kind hides the transient activity indicator.
    ///
    /// `un_sdg_list` arrives after the workflow result rather than from a stage
    /// that showed progress, so it leaves the indicator alone.
    pub fn clears_activity(&self) -> bool {
        matches!(
            self,
            Self::CompanyDetails(_)
                | Self::GriTopics(_)
                | Self::TopicAssessment(_)
                | Self::ServerError(_)
        )
    }
}

fn decode_payload<T: DeserializeOwned>(
    kind: &'static str,
    payload: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::Payload { kind, source })
}

fn payload_text(payload: Value) -> String {
    match payload {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionResponse {
    Yes,
    No,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
/// Frames the client writes to the session transport.
pub enum ClientFrame {
    Start {
        company_name: String,
    },
    Decision {
        response: DecisionResponse,
        #[serde(skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
}

impl ClientFrame {
    pub fn start(company_name: impl Into<String>) -> Self {
        Self::Start {
            company_name: company_name.into(),
        }
    }

    pub fn approve() -> Self {
        Self::Decision {
            response: DecisionResponse::Yes,
            comment: None,
        }
    }

    pub fn reject_with_comment(comment: impl Into<String>) -> Self {
        Self::Decision {
            response: DecisionResponse::No,
            comment: Some(comment.into()),
        }
    }

    pub fn encode(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|error| SessionError::Encode(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ClientFrame, PromptPayload, ServerMessage};
    use crate::ProtocolError;

    #[test]
    fn unit_decode_maps_every_known_kind() {
        let progress = ServerMessage::decode(r#"{"type":"progress","payload":"Searching filings"}"#)
            .expect("progress");
        assert_eq!(
            progress,
            ServerMessage::Progress("Searching filings".to_string())
        );

        let details = ServerMessage::decode(
            &json!({
                "type": "company_details",
                "payload": {
                    "gics_sector": "Tech",
                    "gics_industry_group": "Software & Services",
                    "gics_industry": "Software",
                    "company_description": "Makes anvils."
                }
            })
            .to_string(),
        )
        .expect("company details");
        let ServerMessage::CompanyDetails(payload) = details else {
            panic!("expected company details");
        };
        assert_eq!(payload.gics_sector, "Tech");
        assert_eq!(payload.company_description, "Makes anvils.");

        let assessment = ServerMessage::decode(
            &json!({
                "type": "topic_assesment",
                "payload": {
                    "gri_topic": "GRI 305: Emissions",
                    "reporting_requirements": "Disclose scope 1.",
                    "assesment": "Partially covered.",
                    "source_texts": ["page 4", "page 9"]
                }
            })
            .to_string(),
        )
        .expect("assessment");
        let ServerMessage::TopicAssessment(payload) = assessment else {
            panic!("expected topic assessment");
        };
        assert_eq!(payload.assessment, "Partially covered.");
        assert_eq!(payload.source_texts, vec!["page 4", "page 9"]);

        let topics =
            ServerMessage::decode(r#"{"type":"gri_topics","payload":["GRI 301","GRI 305"]}"#)
                .expect("gri topics");
        assert_eq!(
            topics,
            ServerMessage::GriTopics(vec!["GRI 301".to_string(), "GRI 305".to_string()])
        );

        let goals = ServerMessage::decode(r#"{"type":"un_sdg_list","payload":["SDG 13"]}"#)
            .expect("sdg list");
        assert_eq!(goals, ServerMessage::UnSdgList(vec!["SDG 13".to_string()]));

        let error = ServerMessage::decode(r#"{"type":"error","payload":"workflow timed out"}"#)
            .expect("error");
        assert_eq!(
            error,
            ServerMessage::ServerError("workflow timed out".to_string())
        );
    }

    #[test]
    fn unit_decode_keeps_prompt_payload_opaque() {
        let text = ServerMessage::decode(
            r#"{"type":"input_required_company_details","payload":"Confirm sector?"}"#,
        )
        .expect("text prompt");
        assert_eq!(
            text,
            ServerMessage::CompanyDetailsInputRequired(PromptPayload::text("Confirm sector?"))
        );

        let structured = ServerMessage::decode(
            r#"{"type":"input_required_gri_topics","payload":{"question":"Keep these?","topics":["GRI 305"]}}"#,
        )
        .expect("structured prompt");
        let ServerMessage::GriTopicsInputRequired(payload) = structured else {
            panic!("expected gri prompt");
        };
        assert!(payload.as_text().contains("Keep these?"));
    }

    #[test]
    fn regression_decode_unknown_kind_falls_back_instead_of_failing() {
        let message = ServerMessage::decode(r#"{"type":"scope3_breakdown","payload":{"a":1}}"#)
            .expect("unknown kind still decodes");
        assert_eq!(
            message,
            ServerMessage::Unknown {
                kind: "scope3_breakdown".to_string()
            }
        );
        assert_eq!(message.kind(), "scope3_breakdown");
        assert!(!message.clears_activity());
    }

    #[test]
    fn regression_decode_rejects_malformed_frames_and_payloads() {
        assert!(matches!(
            ServerMessage::decode("not json"),
            Err(ProtocolError::Frame(_))
        ));
        assert!(matches!(
            ServerMessage::decode(r#"{"payload":"missing type"}"#),
            Err(ProtocolError::Frame(_))
        ));
        assert!(matches!(
            ServerMessage::decode(r#"{"type":"company_details","payload":{"gics_sector":"Tech"}}"#),
            Err(ProtocolError::Payload {
                kind: "company_details",
                ..
            })
        ));
        assert!(matches!(
            ServerMessage::decode(r#"{"type":"gri_topics","payload":"GRI 305"}"#),
            Err(ProtocolError::Payload {
                kind: "gri_topics",
                ..
            })
        ));
    }

    #[test]
    fn unit_clears_activity_is_an_explicit_per_kind_flag() {
        assert!(ServerMessage::GriTopics(vec![]).clears_activity());
        assert!(!ServerMessage::UnSdgList(vec![]).clears_activity());
        assert!(!ServerMessage::Progress("x".to_string()).clears_activity());
        assert!(!ServerMessage::GriTopicsInputRequired(PromptPayload::text("?")).clears_activity());
    }

    #[test]
    fn unit_client_frames_match_wire_shapes() {
        assert_eq!(
            ClientFrame::start("Acme").encode().expect("start"),
            r#"{"company_name":"Acme"}"#
        );
        assert_eq!(
            ClientFrame::approve().encode().expect("approve"),
            r#"{"response":"yes"}"#
        );
        assert_eq!(
            ClientFrame::reject_with_comment("wrong sector")
                .encode()
                .expect("reject"),
            r#"{"response":"no","comment":"wrong sector"}"#
        );
    }
}
