use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitType {
    Electricity,
    Gas,
    Other(u8),
}

impl From<u8> for UnitType {
    fn from(v: u8) -> Self {
        match v {
            0 => UnitType::Electricity,
            1 => UnitType::Gas,
            other => UnitType::Other(other),
        }
    }
}

impl<'de> Deserialize<'de> for UnitType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u8::deserialize(deserializer).map(UnitType::from)
    }
}

impl serde::Serialize for UnitType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let code = match self {
            UnitType::Electricity => 0,
            UnitType::Gas => 1,
            UnitType::Other(v) => *v,
        };
        serializer.serialize_u8(code)
    }
}

/// A meter registered with the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasuringPoint {
    pub id: u64,
    pub unit_type: UnitType,
    #[serde(default)]
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_provider_shape() {
        let mp: MeasuringPoint = serde_json::from_str(
            r#"{"id": 1234, "unitType": 1, "label": "Gasmeter", "dayMin": "0.0"}"#,
        )
        .unwrap();
        assert_eq!(mp.id, 1234);
        assert_eq!(mp.unit_type, UnitType::Gas);
        assert_eq!(mp.label.as_deref(), Some("Gasmeter"));
    }
}
