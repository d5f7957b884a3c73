use serde::{Deserialize, Serialize};

/// One material recommendation returned by the estimator.
///
/// `quantity` is deliberately textual so the service can answer with ranges
/// such as "10-12". All four fields are required; a record missing any of
/// them fails the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedMaterial {
    pub material_name: String,
    pub quantity: String,
    pub unit: String,
    pub notes: String,
}
