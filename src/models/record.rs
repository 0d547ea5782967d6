//! The allowance request record edited by the form.

use serde::{Deserialize, Serialize};

use super::{Finance, FinanceUpdate};

/// Default departure time shown on a fresh form.
pub const DEFAULT_DEPARTURE_TIME: &str = "08:00";
/// Default return time shown on a fresh form.
pub const DEFAULT_RETURN_TIME: &str = "18:00";
/// Default vehicle on a fresh form.
pub const DEFAULT_VEHICLE: &str = "Official";

/// Destination zone of the trip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Zone {
    #[default]
    Urban,
    Rural,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Urban => "Urban",
            Zone::Rural => "Rural",
        }
    }
}

/// Identity and banking details of the public servant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Servant {
    pub name: String,
    pub registration_id: String,
    pub role: String,
    pub department: String,
    pub tax_id: String,
    pub bank: String,
    pub branch: String,
    pub account: String,
}

/// Trip details. Dates and times are display strings and are never parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Trip {
    pub origin: String,
    pub destination: String,
    pub zone: Zone,
    pub departure_date: String,
    pub departure_time: String,
    pub return_date: String,
    pub return_time: String,
    /// Mission objective.
    pub purpose: String,
    pub vehicle: String,
    pub plate: String,
}

impl Default for Trip {
    fn default() -> Self {
        Self {
            origin: String::new(),
            destination: String::new(),
            zone: Zone::Urban,
            departure_date: String::new(),
            departure_time: DEFAULT_DEPARTURE_TIME.to_string(),
            return_date: String::new(),
            return_time: DEFAULT_RETURN_TIME.to_string(),
            purpose: String::new(),
            vehicle: DEFAULT_VEHICLE.to_string(),
            plate: String::new(),
        }
    }
}

/// A single travel allowance request: who travels, where, how much, and what was done.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DiariaRecord {
    pub servant: Servant,
    pub trip: Trip,
    pub finance: Finance,
    /// Narrative report of the activities carried out.
    pub report: String,
}

impl DiariaRecord {
    /// Apply a finance edit and return the record with its total recomputed.
    pub fn apply_finance(mut self, update: FinanceUpdate) -> Self {
        self.finance = self.finance.apply(update);
        self
    }

    /// Recompute derived fields. Inbound records never get to choose their own total.
    pub fn normalized(mut self) -> Self {
        self.finance = self.finance.recomputed();
        self
    }

    /// Whether this record carries enough identity to be kept in the history.
    pub fn is_history_worthy(&self) -> bool {
        !self.servant.name.is_empty() && !self.trip.departure_date.is_empty()
    }

    /// Whether both inputs of the report improvement are filled in.
    pub fn can_improve_report(&self) -> bool {
        !self.report.is_empty() && !self.trip.purpose.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record() {
        let record = DiariaRecord::default();

        assert_eq!(record.servant, Servant::default());
        assert!(record.servant.name.is_empty());
        assert_eq!(record.trip.zone, Zone::Urban);
        assert_eq!(record.trip.departure_time, "08:00");
        assert_eq!(record.trip.return_time, "18:00");
        assert_eq!(record.trip.vehicle, "Official");
        assert!(record.trip.plate.is_empty());
        assert_eq!(record.finance.unit_value, 0.0);
        assert_eq!(record.finance.quantity, 1.0);
        assert_eq!(record.finance.total, 0.0);
        assert!(record.report.is_empty());
    }

    #[test]
    fn test_record_json_shape() {
        let mut record = DiariaRecord::default();
        record.servant.registration_id = "123.456-7".to_string();
        record.trip.zone = Zone::Rural;

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["servant"]["registrationId"], "123.456-7");
        assert_eq!(value["trip"]["zone"], "Rural");
        assert_eq!(value["trip"]["departureTime"], "08:00");
        assert_eq!(value["finance"]["unitValue"], 0.0);
        assert_eq!(value["report"], "");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let record: DiariaRecord =
            serde_json::from_str(r#"{"servant":{"name":"Ana"},"trip":{"origin":"Recife"}}"#)
                .unwrap();

        assert_eq!(record.servant.name, "Ana");
        assert_eq!(record.trip.origin, "Recife");
        assert_eq!(record.trip.vehicle, "Official");
        assert_eq!(record.finance.quantity, 1.0);
    }

    #[test]
    fn test_populated_record_round_trip() {
        let record = DiariaRecord {
            servant: Servant {
                name: "João Silva".to_string(),
                registration_id: "000.123-4".to_string(),
                role: "Motorista".to_string(),
                department: "Secretaria de Saúde".to_string(),
                tax_id: "123.456.789-00".to_string(),
                bank: "001".to_string(),
                branch: "1234".to_string(),
                account: "98765-0".to_string(),
            },
            trip: Trip {
                origin: "Caruaru".to_string(),
                destination: "Recife".to_string(),
                zone: Zone::Rural,
                departure_date: "01/05/2024".to_string(),
                departure_time: "06:30".to_string(),
                return_date: "02/05/2024".to_string(),
                return_time: "20:00".to_string(),
                purpose: "Transporte de pacientes".to_string(),
                vehicle: "Ambulância".to_string(),
                plate: "ABC-1D23".to_string(),
            },
            finance: Finance::default().with_unit_value(150.5).with_quantity(1.5),
            report: "Linha 1\nLinha 2".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let restored: DiariaRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_normalized_recomputes_total() {
        let mut record = DiariaRecord::default();
        record.finance.unit_value = 80.0;
        record.finance.quantity = 3.0;
        record.finance.total = 1.0;

        assert_eq!(record.normalized().finance.total, 240.0);
    }

    #[test]
    fn test_history_worthiness() {
        let mut record = DiariaRecord::default();
        assert!(!record.is_history_worthy());

        record.servant.name = "Ana".to_string();
        assert!(!record.is_history_worthy());

        record.trip.departure_date = "2024-05-01".to_string();
        assert!(record.is_history_worthy());
    }

    #[test]
    fn test_zone_labels_match_serialized_names() {
        for zone in [Zone::Urban, Zone::Rural] {
            let value = serde_json::to_value(zone).unwrap();
            assert_eq!(value, zone.as_str());
        }
    }
}
