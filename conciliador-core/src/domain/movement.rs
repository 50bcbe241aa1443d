//! Movement domain model

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::result::Error;

/// Which of the two lists a movement comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Bank statement side
    Banco,
    /// Auxiliary ledger side
    Auxiliar,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Banco => "banco",
            Origin::Auxiliar => "auxiliar",
        }
    }

    /// Human label used in prompts and tables
    pub fn label(&self) -> &'static str {
        match self {
            Origin::Banco => "bank",
            Origin::Auxiliar => "ledger",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "banco" => Ok(Origin::Banco),
            "auxiliar" => Ok(Origin::Auxiliar),
            other => Err(Error::UnknownOrigin(other.to_string())),
        }
    }
}

/// Transaction direction (`es` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Entrada: money in
    #[serde(rename = "E")]
    Entrada,
    /// Salida: money out
    #[serde(rename = "S")]
    Salida,
}

impl Direction {
    pub fn code(&self) -> &'static str {
        match self {
            Direction::Entrada => "E",
            Direction::Salida => "S",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "E" | "e" => Ok(Direction::Entrada),
            "S" | "s" => Ok(Direction::Salida),
            other => Err(Error::validation(format!(
                "Invalid direction '{}' (expected E or S)",
                other
            ))),
        }
    }
}

/// A single bank or ledger line as served by the reconciliation API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    pub es: Direction,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(deserialize_with = "deserialize_amount")]
    pub valor: Decimal,
    /// Origin label as sent by the server ("banco" / "auxiliar")
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub id_conciliacion: Option<i64>,
    #[serde(default)]
    pub estado_conciliacion: Option<String>,
}

impl Movement {
    pub fn new(id: i64, es: Direction, valor: Decimal) -> Self {
        Self {
            id,
            es,
            fecha: None,
            descripcion: None,
            valor,
            tipo: None,
            id_conciliacion: None,
            estado_conciliacion: None,
        }
    }

    /// Description with surrounding whitespace removed, empty treated as absent
    pub fn description(&self) -> &str {
        self.descripcion.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Deserialize an amount that can be a JSON number or string (the API sends floats)
pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .or_else(|_| {
                n.as_f64()
                    .and_then(|f| Decimal::try_from(f).ok())
                    .ok_or_else(|| D::Error::custom(format!("invalid decimal: {}", n)))
            }),
        JsonValue::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        JsonValue::Null => Ok(Decimal::ZERO),
        _ => Err(D::Error::custom("expected number or string for amount")),
    }
}
