//! Emergency message payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alerting::{Concern, NotificationRequest};

/// One emergency notification, ready to serialize or render as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyMessage {
    pub id: Uuid,
    pub vehicle_id: String,
    pub concern: Concern,
    pub incident: String,
    pub timestamp: DateTime<Utc>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps_link: Option<String>,
}

impl EmergencyMessage {
    pub fn new(request: &NotificationRequest, vehicle_id: &str, timestamp: DateTime<Utc>) -> Self {
        let coordinates = request.gps.coordinates();
        Self {
            id: Uuid::new_v4(),
            vehicle_id: vehicle_id.to_string(),
            concern: request.concern,
            incident: request.incident.clone(),
            timestamp,
            lat: coordinates.map(|(lat, _)| lat),
            lon: coordinates.map(|(_, lon)| lon),
            maps_link: coordinates.map(|(lat, lon)| maps_link(lat, lon)),
        }
    }

    pub fn subject(&self) -> String {
        format!("EMERGENCY ALERT - {}", self.incident)
    }

    /// Plain-text body for mail-style transports
    pub fn render_body(&self) -> String {
        let coordinate = |value: Option<f64>| value.map_or_else(|| "N/A".to_string(), |v| v.to_string());
        let mut body = format!(
            "EMERGENCY ALERT - DRIVER SAFETY SYSTEM\n\n\
             Incident Type: {}\n\
             Vehicle: {}\n\
             Timestamp: {}\n\n\
             GPS Coordinates:\n\
             - Latitude: {}\n\
             - Longitude: {}\n",
            self.incident,
            self.vehicle_id,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            coordinate(self.lat),
            coordinate(self.lon),
        );
        if let Some(link) = &self.maps_link {
            body.push_str(&format!("\nGoogle Maps Link:\n{}\n", link));
        }
        body.push_str(
            "\nThis is an automated alert from the vehicle safety monitoring system.\n\
             Please check on the driver immediately.\n",
        );
        body
    }
}

pub fn maps_link(lat: f64, lon: f64) -> String {
    format!("https://www.google.com/maps?q={},{}", lat, lon)
}
