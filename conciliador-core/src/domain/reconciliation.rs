//! Reconciliation detail and match models, as returned by the API

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::movement::{deserialize_amount, Movement, Origin};

/// Header of a reconciliation (one account, one month)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub id: i64,
    #[serde(default)]
    pub id_empresa: Option<i64>,
    #[serde(default)]
    pub mes_conciliado: Option<String>,
    #[serde(default, rename = "año_conciliado", alias = "anio_conciliado")]
    pub anio_conciliado: Option<String>,
    #[serde(default)]
    pub cuenta_conciliada: Option<String>,
    #[serde(default)]
    pub fecha_proceso: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub nombre_archivo_banco: Option<String>,
    #[serde(default)]
    pub nombre_archivo_auxiliar: Option<String>,
}

impl Reconciliation {
    /// Finished reconciliations no longer accept processing or closing
    pub fn is_finished(&self) -> bool {
        self.estado
            .as_deref()
            .map_or(false, |e| e.eq_ignore_ascii_case("finalizada"))
    }

    /// "<mes> <año>" period label
    pub fn period(&self) -> String {
        format!(
            "{} {}",
            self.mes_conciliado.as_deref().unwrap_or("-"),
            self.anio_conciliado.as_deref().unwrap_or("-")
        )
        .trim()
        .to_string()
    }
}

/// Progress counters computed by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationStats {
    #[serde(default)]
    pub total_movimientos: i64,
    #[serde(default)]
    pub conciliados: i64,
    #[serde(default)]
    pub pendientes: i64,
    /// Either an integer or a float depending on the endpoint
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub porcentaje_conciliacion: Decimal,
}

/// Movements still waiting for a counterpart, per origin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnreconciledMovements {
    #[serde(default)]
    pub banco: Vec<Movement>,
    #[serde(default)]
    pub auxiliar: Vec<Movement>,
}

impl UnreconciledMovements {
    pub fn for_origin(&self, origin: Origin) -> &[Movement] {
        match origin {
            Origin::Banco => &self.banco,
            Origin::Auxiliar => &self.auxiliar,
        }
    }
}

/// How a pairing was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchCriterion {
    Exacto,
    Aproximado,
    Manual,
    Other(String),
}

impl From<String> for MatchCriterion {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "exacto" => MatchCriterion::Exacto,
            "aproximado" => MatchCriterion::Aproximado,
            "manual" => MatchCriterion::Manual,
            _ => MatchCriterion::Other(s),
        }
    }
}

impl From<MatchCriterion> for String {
    fn from(c: MatchCriterion) -> Self {
        c.as_str().to_string()
    }
}

impl MatchCriterion {
    pub fn as_str(&self) -> &str {
        match self {
            MatchCriterion::Exacto => "exacto",
            MatchCriterion::Aproximado => "aproximado",
            MatchCriterion::Manual => "manual",
            MatchCriterion::Other(s) => s,
        }
    }
}

/// One bank/ledger pairing in the detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: i64,
    pub id_movimiento_banco: i64,
    pub id_movimiento_auxiliar: i64,
    #[serde(default)]
    pub fecha_match: Option<String>,
    pub criterio_match: MatchCriterion,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub diferencia_valor: Decimal,
}

/// Full payload of `GET /api/conciliaciones/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationDetail {
    #[serde(default)]
    pub stats: ReconciliationStats,
    pub conciliacion: Reconciliation,
    #[serde(default)]
    pub movimientos_no_conciliados: UnreconciledMovements,
    #[serde(default)]
    pub movimientos_conciliados: Vec<MatchRecord>,
}

/// Automatic match as listed by `matches_y_manuales`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomaticMatch {
    pub id: i64,
    #[serde(default)]
    pub movimiento_banco: Option<Movement>,
    #[serde(default)]
    pub movimiento_auxiliar: Option<Movement>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub diferencia: Decimal,
    pub criterio_match: MatchCriterion,
    #[serde(default)]
    pub fecha: Option<String>,
}

/// A manual reconciliation group (many bank lines against many ledger lines)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualReconciliationGroup {
    pub id_conciliacion_manual: i64,
    #[serde(default)]
    pub fecha_creacion: Option<String>,
    #[serde(default)]
    pub movimientos_banco: Vec<Movement>,
    #[serde(default)]
    pub movimientos_auxiliar: Vec<Movement>,
}

impl ManualReconciliationGroup {
    /// Bank total minus ledger total for the group
    pub fn difference(&self) -> Decimal {
        let bank: Decimal = self.movimientos_banco.iter().map(|m| m.valor).sum();
        let ledger: Decimal = self.movimientos_auxiliar.iter().map(|m| m.valor).sum();
        bank - ledger
    }
}

/// Payload of `GET /api/conciliaciones/{id}/matches_y_manuales`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchesOverview {
    #[serde(default)]
    pub matches: Vec<AutomaticMatch>,
    #[serde(default)]
    pub conciliaciones_manuales: Vec<ManualReconciliationGroup>,
}
