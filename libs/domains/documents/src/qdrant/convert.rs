//! Conversions between domain types and Qdrant point/payload types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use qdrant_client::qdrant::{
    self, ListValue, PointId, Struct, Value as QdrantValue, point_id::PointIdOptions, value::Kind,
};
use uuid::Uuid;

use crate::error::{DocumentError, DocumentResult};
use crate::models::{DistanceMetric, DocumentPayload, Metadata};

const CONTENT_KEY: &str = "content";
const METADATA_KEY: &str = "metadata";
const INGESTED_AT_KEY: &str = "ingested_at";

pub(super) fn to_distance(metric: DistanceMetric) -> qdrant::Distance {
    match metric {
        DistanceMetric::Cosine => qdrant::Distance::Cosine,
        DistanceMetric::DotProduct => qdrant::Distance::Dot,
    }
}

pub(super) fn from_distance(distance: qdrant::Distance) -> DocumentResult<DistanceMetric> {
    match distance {
        qdrant::Distance::Cosine => Ok(DistanceMetric::Cosine),
        qdrant::Distance::Dot => Ok(DistanceMetric::DotProduct),
        other => Err(DocumentError::Config(format!(
            "Unsupported collection distance: {}",
            other.as_str_name()
        ))),
    }
}

pub(super) fn point_id(id: Uuid) -> PointId {
    PointId::from(id.to_string())
}

pub(super) fn point_uuid(point_id: Option<&PointId>) -> DocumentResult<Uuid> {
    match point_id.and_then(|p| p.point_id_options.as_ref()) {
        Some(PointIdOptions::Uuid(raw)) => Uuid::parse_str(raw)
            .map_err(|e| DocumentError::Internal(format!("Invalid point UUID '{}': {}", raw, e))),
        Some(PointIdOptions::Num(num)) => Ok(Uuid::from_u128(*num as u128)),
        None => Err(DocumentError::Internal("Missing point ID".to_string())),
    }
}

/// Render a cursor string for a scroll offset
pub(super) fn cursor_from_point(point_id: &PointId) -> Option<String> {
    match point_id.point_id_options.as_ref()? {
        PointIdOptions::Uuid(raw) => Some(raw.clone()),
        PointIdOptions::Num(num) => Some(num.to_string()),
    }
}

pub(super) fn point_from_cursor(cursor: &str) -> DocumentResult<PointId> {
    if let Ok(uuid) = Uuid::parse_str(cursor) {
        return Ok(point_id(uuid));
    }
    cursor
        .parse::<u64>()
        .map(PointId::from)
        .map_err(|_| DocumentError::Validation(format!("Invalid cursor: {}", cursor)))
}

pub(super) fn payload_to_qdrant(payload: DocumentPayload) -> HashMap<String, QdrantValue> {
    let mut fields = HashMap::with_capacity(3);
    fields.insert(CONTENT_KEY.to_string(), QdrantValue::from(payload.content));
    fields.insert(
        INGESTED_AT_KEY.to_string(),
        QdrantValue::from(payload.ingested_at.to_rfc3339()),
    );
    fields.insert(
        METADATA_KEY.to_string(),
        json_to_qdrant(serde_json::Value::Object(payload.metadata)),
    );
    fields
}

pub(super) fn payload_from_qdrant(
    mut fields: HashMap<String, QdrantValue>,
) -> DocumentResult<DocumentPayload> {
    let content = match fields.remove(CONTENT_KEY).and_then(|v| v.kind) {
        Some(Kind::StringValue(s)) => s,
        _ => {
            return Err(DocumentError::Internal(
                "Stored point has no content".to_string(),
            ));
        }
    };

    let ingested_at = match fields.remove(INGESTED_AT_KEY).and_then(|v| v.kind) {
        Some(Kind::StringValue(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| DocumentError::Internal(format!("Invalid ingested_at '{}': {}", s, e)))?,
        _ => {
            return Err(DocumentError::Internal(
                "Stored point has no ingested_at".to_string(),
            ));
        }
    };

    let metadata = match fields.remove(METADATA_KEY).map(qdrant_to_json) {
        Some(serde_json::Value::Object(map)) => map,
        _ => Metadata::new(),
    };

    Ok(DocumentPayload {
        content,
        metadata,
        ingested_at,
    })
}

pub(super) fn json_to_qdrant(value: serde_json::Value) -> QdrantValue {
    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, json_to_qdrant(v)))
                .collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

pub(super) fn qdrant_to_json(value: QdrantValue) -> serde_json::Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(i),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_to_json(v)))
                .collect(),
        ),
    }
}

/// Dense vector from a point's vector output
#[allow(deprecated)]
pub(super) fn dense_vector(vectors: Option<qdrant::VectorsOutput>) -> Option<Vec<f32>> {
    match vectors?.vectors_options? {
        qdrant::vectors_output::VectorsOptions::Vector(v) => Some(v.data),
        qdrant::vectors_output::VectorsOptions::Vectors(named) => {
            named.vectors.into_values().next().map(|v| v.data)
        }
    }
}
