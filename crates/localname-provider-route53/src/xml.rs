//! Route 53 XML wire types

use serde::{Deserialize, Serialize};

pub(crate) const ROUTE53_XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

/// Body of `POST /2013-04-01/hostedzone/{id}/rrset`
#[derive(Debug, Serialize)]
pub(crate) struct ChangeResourceRecordSetsRequest {
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    #[serde(rename = "ChangeBatch")]
    pub change_batch: ChangeBatch,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangeBatch {
    #[serde(rename = "Comment")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "Changes")]
    pub changes: Changes,
}

#[derive(Debug, Serialize)]
pub(crate) struct Changes {
    #[serde(rename = "Change")]
    pub change: Vec<Change>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Change {
    #[serde(rename = "Action")]
    pub action: &'static str,
    #[serde(rename = "ResourceRecordSet")]
    pub resource_record_set: ResourceRecordSet,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResourceRecordSet {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: &'static str,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    #[serde(rename = "ResourceRecords")]
    pub resource_records: ResourceRecords,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResourceRecords {
    #[serde(rename = "ResourceRecord")]
    pub resource_record: Vec<ResourceRecord>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResourceRecord {
    #[serde(rename = "Value")]
    pub value: String,
}

impl ChangeResourceRecordSetsRequest {
    /// A batch holding a single UPSERT of one value
    pub fn upsert(
        name: &str,
        record_type: &'static str,
        ttl: u32,
        value: String,
        comment: Option<String>,
    ) -> Self {
        Self {
            xmlns: ROUTE53_XMLNS,
            change_batch: ChangeBatch {
                comment,
                changes: Changes {
                    change: vec![Change {
                        action: "UPSERT",
                        resource_record_set: ResourceRecordSet {
                            name: name.to_string(),
                            record_type,
                            ttl,
                            resource_records: ResourceRecords {
                                resource_record: vec![ResourceRecord { value }],
                            },
                        },
                    }],
                },
            },
        }
    }
}

/// AWS error envelope
///
/// ```xml
/// <ErrorResponse>
///   <Error><Type>Sender</Type><Code>Throttling</Code><Message>Rate exceeded</Message></Error>
///   <RequestId>...</RequestId>
/// </ErrorResponse>
/// ```
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(rename = "Error")]
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

/// Validation failures use their own envelope
///
/// ```xml
/// <InvalidChangeBatch>
///   <Messages><Message>...</Message></Messages>
/// </InvalidChangeBatch>
/// ```
#[derive(Debug, Deserialize)]
pub(crate) struct InvalidChangeBatch {
    #[serde(rename = "Messages")]
    pub messages: InvalidChangeBatchMessages,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InvalidChangeBatchMessages {
    #[serde(rename = "Message", default)]
    pub message: Vec<String>,
}

/// Extract `(code, message)` from an error body, if it is one we know
pub(crate) fn parse_error(body: &str) -> Option<(String, String)> {
    if let Ok(parsed) = quick_xml::de::from_str::<ErrorResponse>(body) {
        return Some((
            parsed.error.code,
            parsed.error.message.unwrap_or_default(),
        ));
    }

    if !body.contains("<InvalidChangeBatch") {
        return None;
    }

    quick_xml::de::from_str::<InvalidChangeBatch>(body)
        .ok()
        .map(|parsed| {
            (
                "InvalidChangeBatch".to_string(),
                parsed.messages.message.join("; "),
            )
        })
}
